use std::io;
use std::sync::Arc;

use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use spdlog::{error, info};

use crate::admin;
use crate::config::Config;
use crate::pages::{load_portfolio, render_home, render_list, render_not_found, render_portfolio, render_post, render_project};
use crate::query_string::QueryString;
use crate::repository::ContentRepository;

pub struct AppState {
    pub config: Config,
    pub repo: Arc<dyn ContentRepository>,
}

type State = web::types::State<Arc<AppState>>;

fn html(res: io::Result<String>) -> web::HttpResponse {
    match res {
        Ok(body) => web::HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            error!("Error rendering page: {}", e);
            web::HttpResponse::InternalServerError()
                .body("Error rendering page")
        }
    }
}

fn not_found_page(config: &Config, path: &str) -> web::HttpResponse {
    match render_not_found(config, path) {
        Ok(body) => web::HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            error!("Error rendering the not found page: {}", e);
            web::HttpResponse::NotFound().body("Not found")
        }
    }
}

/// A path segment that would leave the served directory.
pub fn is_unsafe_path(path: &str) -> bool {
    path.contains("..") || path.contains('\\') || path.starts_with('/')
}

fn selected_category(req: &HttpRequest) -> Option<String> {
    let query = req.uri().query()?;
    QueryString::from(query).get_category().map(|c| c.to_string())
}

#[web::get("/")]
async fn index(state: State) -> web::HttpResponse {
    html(render_home(&state.config, &*state.repo).await)
}

#[web::get("/posts")]
async fn list(req: HttpRequest, state: State) -> web::HttpResponse {
    let category = selected_category(&req);
    html(render_list(&state.config, &*state.repo, category.as_deref()).await)
}

// Also serves `/posts/` itself, which lands here with an empty slug
#[web::get("/posts/{slug}*")]
async fn view(req: HttpRequest, slug: web::types::Path<String>, state: State) -> web::HttpResponse {
    let slug = slug.into_inner();
    let slug = slug.trim_matches('/');

    if slug.is_empty() {
        let category = selected_category(&req);
        return html(render_list(&state.config, &*state.repo, category.as_deref()).await);
    }

    match render_post(&state.config, &*state.repo, slug).await {
        Ok(Some(body)) => html(Ok(body)),
        Ok(None) => not_found_page(&state.config, req.path()),
        Err(e) => html(Err(e)),
    }
}

#[web::get("/portfolio")]
async fn portfolio(state: State) -> web::HttpResponse {
    html(render_portfolio(&state.config, &load_portfolio(&state.config)))
}

#[web::get("/portfolio/{id}")]
async fn project(req: HttpRequest, id: web::types::Path<String>, state: State) -> web::HttpResponse {
    let loaded = load_portfolio(&state.config);
    match render_project(&state.config, &loaded, &id) {
        Ok(Some(body)) => html(Ok(body)),
        Ok(None) => not_found_page(&state.config, req.path()),
        Err(e) => html(Err(e)),
    }
}

#[web::get("/public/{file_name}*")]
async fn public_files(path: web::types::Path<String>, state: State) -> Result<NamedFile, web::Error> {
    if is_unsafe_path(&path) {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

async fn fallback(req: HttpRequest, state: State) -> web::HttpResponse {
    not_found_page(&state.config, req.path())
}

pub async fn server_run(config: Config, repo: Arc<dyn ContentRepository>) -> io::Result<()> {
    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;

    if config.service_role_key().is_none() {
        info!("No service role key configured. Admin routes will reject every call");
    }

    let app_state = Arc::new(AppState {
        config,
        repo,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(list)
            .service(view)
            .service(portfolio)
            .service(project)
            .service(public_files)
            .service(admin::list_posts)
            .service(admin::create_post)
            .service(admin::update_post)
            .service(admin::delete_post)
            .default_service(web::route().to(fallback))
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_paths() {
        assert!(is_unsafe_path("../secret"));
        assert!(is_unsafe_path("css/../../secret"));
        assert!(is_unsafe_path("/etc/passwd"));
        assert!(is_unsafe_path("a\\b"));
        assert!(!is_unsafe_path("style.css"));
        assert!(!is_unsafe_path("img/logo.png"));
    }
}

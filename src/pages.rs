use std::io;
use std::path::Path;

use spdlog::{error, info};

use crate::aggregate::{category_sections, recent};
use crate::config::Config;
use crate::content::PostMetadata;
use crate::portfolio::{read_portfolio, Portfolio};
use crate::repository::ContentRepository;
use crate::view::index_renderer::IndexRenderer;
use crate::view::list_renderer::ListRenderer;
use crate::view::parse_template;
use crate::view::portfolio_renderer::{PortfolioRenderer, ProjectRenderer};
use crate::view::post_renderer::PostRenderer;

pub const INDEX_TEMPLATE: &str = "index.tpl";
pub const LIST_TEMPLATE: &str = "postlist.tpl";
pub const VIEW_TEMPLATE: &str = "view.tpl";
pub const NOT_FOUND_TEMPLATE: &str = "notfound.tpl";
pub const PORTFOLIO_TEMPLATE: &str = "portfolio.tpl";
pub const PROJECT_TEMPLATE: &str = "project.tpl";

#[derive(ramhorns::Content)]
struct NotFoundPage<'a> {
    path: &'a str,
}

pub fn read_template(tpl_dir: &Path, file_name: &str) -> io::Result<String> {
    let full_path = tpl_dir.join(file_name);
    std::fs::read_to_string(&full_path)
        .map_err(|e| io::Error::new(e.kind(), format!("Error loading template {}: {}", full_path.display(), e)))
}

// Listings degrade to an empty page when the source fails
fn or_empty<T: Default>(res: Result<T, crate::error::RepoError>, what: &str) -> T {
    match res {
        Ok(value) => value,
        Err(e) => {
            error!("Error retrieving {}: {}", what, e);
            T::default()
        }
    }
}

pub async fn render_home(config: &Config, repo: &dyn ContentRepository) -> io::Result<String> {
    let tpl_src = read_template(&config.paths.template_dir, INDEX_TEMPLATE)?;
    let renderer = IndexRenderer::new(&tpl_src)?;

    let posts = or_empty(repo.list_all().await, "the post list");
    let sections = category_sections(&posts, &config.listing.preferred_categories, config.listing.per_category);
    Ok(renderer.render(&sections))
}

pub async fn render_list(config: &Config, repo: &dyn ContentRepository, category: Option<&str>) -> io::Result<String> {
    let tpl_src = read_template(&config.paths.template_dir, LIST_TEMPLATE)?;
    let renderer = ListRenderer::new(&tpl_src)?;

    let all_posts = or_empty(repo.list_all().await, "the post list");
    let posts: Vec<PostMetadata> = match category {
        Some(category) => or_empty(repo.list_by_category(category).await, "the category list"),
        None => all_posts.clone(),
    };
    let categories: Vec<String> = or_empty(repo.list_categories().await, "the categories")
        .into_iter()
        .collect();
    let recent_posts = recent(&all_posts, config.listing.recent_count);

    Ok(renderer.render(&posts, category, &categories, &recent_posts))
}

/// `None` when there is no public post under `slug`.
pub async fn render_post(config: &Config, repo: &dyn ContentRepository, slug: &str) -> io::Result<Option<String>> {
    let post = match repo.get_by_identifier(slug).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            info!("Post not found: {}", slug);
            return Ok(None);
        }
        Err(e) => {
            error!("Error loading post {}: {}", slug, e);
            return Ok(None);
        }
    };

    let tpl_src = read_template(&config.paths.template_dir, VIEW_TEMPLATE)?;
    let renderer = PostRenderer::new(&tpl_src)?;
    Ok(Some(renderer.render(&post)))
}

/// The configured catalog. A missing or broken catalog shows as an empty portfolio.
pub fn load_portfolio(config: &Config) -> Portfolio {
    let Some(path) = &config.paths.portfolio_file else {
        return Portfolio::default();
    };
    match read_portfolio(path) {
        Ok(portfolio) => portfolio,
        Err(e) => {
            error!("Error loading the portfolio: {}", e);
            Portfolio::default()
        }
    }
}

pub fn render_portfolio(config: &Config, portfolio: &Portfolio) -> io::Result<String> {
    let tpl_src = read_template(&config.paths.template_dir, PORTFOLIO_TEMPLATE)?;
    let renderer = PortfolioRenderer::new(&tpl_src)?;
    Ok(renderer.render(portfolio))
}

/// `None` when no project has this id.
pub fn render_project(config: &Config, portfolio: &Portfolio, id: &str) -> io::Result<Option<String>> {
    let Some(item) = portfolio.by_id(id) else {
        info!("Project not found: {}", id);
        return Ok(None);
    };

    let tpl_src = read_template(&config.paths.template_dir, PROJECT_TEMPLATE)?;
    let renderer = ProjectRenderer::new(&tpl_src)?;
    Ok(Some(renderer.render(item)))
}

pub fn render_not_found(config: &Config, path: &str) -> io::Result<String> {
    let tpl_src = read_template(&config.paths.template_dir, NOT_FOUND_TEMPLATE)?;
    let template = parse_template(&tpl_src, "not found")?;
    Ok(template.render(&NotFoundPage { path }))
}

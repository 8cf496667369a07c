use std::sync::Arc;

use ntex::http::StatusCode;
use ntex::web;
use ntex::web::HttpRequest;
use serde_json::json;
use spdlog::{error, info, warn};

use crate::error::RepoError;
use crate::repository::{NewPost, PostPatch};
use crate::server::AppState;

type State = web::types::State<Arc<AppState>>;

/// Constant-time comparison of the bearer token against the configured key.
pub fn is_authorized(header: Option<&str>, key: Option<&str>) -> bool {
    let (Some(header), Some(key)) = (header, key) else {
        return false;
    };
    let Some(token) = header.strip_prefix("Bearer ") else {
        return false;
    };

    let token = token.trim().as_bytes();
    let key = key.as_bytes();
    if token.len() != key.len() {
        return false;
    }
    token.iter().zip(key).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Status and public message for a failed admin call. Backend details stay in the log.
pub fn error_status(err: &RepoError) -> (StatusCode, &'static str) {
    match err {
        RepoError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid post"),
        RepoError::NotFound(_) => (StatusCode::NOT_FOUND, "Post not found"),
        RepoError::ReadOnly => (StatusCode::METHOD_NOT_ALLOWED, "This content source is read-only"),
        RepoError::SlugConflict(_) => (StatusCode::CONFLICT, "Slug already in use"),
        RepoError::Io(_) | RepoError::MalformedContent { .. } | RepoError::Backend(_) =>
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

fn error_response(err: RepoError) -> web::HttpResponse {
    let (status, message) = error_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Admin call failed: {}", err);
    } else {
        warn!("Admin call rejected: {}", err);
    }
    web::HttpResponse::build(status).json(&json!({ "error": message }))
}

fn check_auth(req: &HttpRequest, state: &AppState) -> Option<web::HttpResponse> {
    let header = req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());
    let key = state.config.service_role_key();

    if is_authorized(header, key.as_deref()) {
        return None;
    }
    Some(web::HttpResponse::Unauthorized().json(&json!({ "error": "Unauthorized" })))
}

#[web::get("/admin/posts")]
pub async fn list_posts(req: HttpRequest, state: State) -> web::HttpResponse {
    if let Some(denied) = check_auth(&req, &state) {
        return denied;
    }

    match state.repo.list_admin().await {
        Ok(posts) => web::HttpResponse::Ok().json(&posts),
        Err(e) => error_response(e),
    }
}

#[web::post("/admin/posts")]
pub async fn create_post(req: HttpRequest, post: web::types::Json<NewPost>, state: State) -> web::HttpResponse {
    if let Some(denied) = check_auth(&req, &state) {
        return denied;
    }

    match state.repo.create(post.into_inner()).await {
        Ok(row) => {
            info!("Created post {} ({})", row.slug, row.id);
            web::HttpResponse::Created().json(&row)
        }
        Err(e) => error_response(e),
    }
}

#[web::patch("/admin/posts/{id}")]
pub async fn update_post(req: HttpRequest,
                         id: web::types::Path<String>,
                         patch: web::types::Json<PostPatch>,
                         state: State) -> web::HttpResponse {
    if let Some(denied) = check_auth(&req, &state) {
        return denied;
    }

    match state.repo.update(&id, patch.into_inner()).await {
        Ok(row) => {
            info!("Updated post {} ({})", row.slug, row.id);
            web::HttpResponse::Ok().json(&row)
        }
        Err(e) => error_response(e),
    }
}

#[web::delete("/admin/posts/{id}")]
pub async fn delete_post(req: HttpRequest, id: web::types::Path<String>, state: State) -> web::HttpResponse {
    if let Some(denied) = check_auth(&req, &state) {
        return denied;
    }

    match state.repo.delete(&id).await {
        Ok(deleted) => {
            if deleted {
                info!("Deleted post {}", id.as_str());
            }
            web::HttpResponse::Ok().json(&json!({ "deleted": deleted }))
        }
        Err(e) => error_response(e),
    }
}

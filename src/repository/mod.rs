use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spdlog::info;
use uuid::Uuid;

use crate::config::{Backend, Config};
use crate::content::normalizer::normalize;
use crate::content::{Post, PostMetadata, RawMetadata, SourcePost};
use crate::error::RepoError;
use crate::repository::file_repository::FileRepository;
use crate::repository::row_repository::RowRepository;
use crate::repository::row_store::memory::MemoryRowStore;
use crate::repository::row_store::postgres::PgRowStore;

pub mod file_repository;
pub mod row_repository;
pub mod row_store;

/// Read side used by every page, plus the admin mutations.
///
/// Lookups of something that does not exist are `Ok(None)` or an empty list,
/// never an error.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Public posts, newest first.
    async fn list_all(&self) -> Result<Vec<PostMetadata>, RepoError>;

    /// Every post including drafts, newest first.
    async fn list_admin(&self) -> Result<Vec<PostMetadata>, RepoError>;

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<Post>, RepoError>;

    async fn list_by_category(&self, category: &str) -> Result<Vec<PostMetadata>, RepoError> {
        let posts = self.list_all().await?;
        Ok(posts.into_iter().filter(|p| p.category == category).collect())
    }

    async fn list_categories(&self) -> Result<BTreeSet<String>, RepoError> {
        let posts = self.list_all().await?;
        Ok(posts.into_iter().map(|p| p.category).collect())
    }

    async fn create(&self, post: NewPost) -> Result<PostRow, RepoError>;

    async fn update(&self, id: &str, patch: PostPatch) -> Result<PostRow, RepoError>;

    async fn delete(&self, id: &str) -> Result<bool, RepoError>;
}

/// One row of the `posts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub cover: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    pub fn to_source_post(&self, today: NaiveDate) -> SourcePost {
        let raw = match json!({
            "id": self.id.to_string(),
            "title": self.title,
            "slug": self.slug,
            "excerpt": self.excerpt,
            "category": self.category,
            "tags": self.tags,
            "cover": self.cover,
            "published": self.published,
            "created_at": self.created_at.to_rfc3339(),
        }) {
            Value::Object(map) => map,
            _ => RawMetadata::new(),
        };

        SourcePost {
            metadata: normalize(&raw, today),
            markdown: self.content.clone(),
        }
    }
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default = "default_published")]
    pub published: bool,
}

/// Partial update. `None` leaves the column as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover: Option<String>,
    pub published: Option<bool>,
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn open_repository(config: &Config) -> Result<Arc<dyn ContentRepository>, RepoError> {
    let repo: Arc<dyn ContentRepository> = match config.content.backend {
        Backend::Files => {
            info!("Reading posts from {}", config.paths.content_dir.display());
            Arc::new(FileRepository::new(
                config.paths.content_dir.clone(),
                &config.content.index_base_name,
                &config.content.extensions,
            ))
        }
        Backend::Database => {
            let Some(ref database) = config.database else {
                return Err(RepoError::InvalidInput("backend is `database` but [database] is missing".to_string()));
            };
            let store = PgRowStore::connect(&database.url, database.max_connections).await?;
            info!("Connected to the posts database");
            Arc::new(RowRepository::new(store))
        }
        Backend::Memory => {
            info!("Using an in-memory post table. Changes are lost on exit");
            Arc::new(RowRepository::new(MemoryRowStore::default()))
        }
    };
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::content::{DEFAULT_CATEGORY, UNTITLED};

    use super::*;

    fn row() -> PostRow {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();
        PostRow {
            id: Uuid::new_v4(),
            title: "Row post".to_string(),
            slug: "row-post".to_string(),
            content: "Body".to_string(),
            excerpt: None,
            category: None,
            tags: vec!["db".to_string()],
            cover: None,
            published: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_row_to_source_post() {
        let row = row();
        let post = row.to_source_post(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(post.metadata.identifier, row.id.to_string());
        assert_eq!(post.metadata.slug, "row-post");
        assert_eq!(post.metadata.date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(post.metadata.category, DEFAULT_CATEGORY);
        assert_eq!(post.metadata.tags, ["db"]);
        assert_eq!(post.metadata.excerpt, "");
        assert!(!post.metadata.published);
        assert_eq!(post.markdown, "Body");
    }

    #[test]
    fn test_row_with_blank_title() {
        let mut row = row();
        row.title = "".to_string();
        let post = row.to_source_post(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(post.metadata.title, UNTITLED);
        assert_eq!(post.metadata.slug, "row-post");
    }

    #[test]
    fn test_new_post_defaults() {
        let post: NewPost = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        assert_eq!(post.title, "Only a title");
        assert!(post.published);
        assert!(post.tags.is_empty());
        assert_eq!(post.slug, None);
    }
}

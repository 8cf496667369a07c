use async_trait::async_trait;
use uuid::Uuid;

use crate::content::DEFAULT_CATEGORY;
use crate::error::RepoError;
use crate::repository::PostRow;

pub mod memory;
pub mod postgres;

/// Filters for a `select` on the posts table. Results always come newest
/// `created_at` first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    pub published: Option<bool>,
    pub category: Option<String>,
    pub identifier: Option<String>,
    pub slug: Option<String>,
}

impl PostQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(mut self) -> Self {
        self.published = Some(true);
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Matches the row id or, failing that, the slug.
    pub fn identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    pub fn matches(&self, row: &PostRow) -> bool {
        if let Some(published) = self.published {
            if row.published != published {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            // Rows without a category list under the default one
            let row_category = row.category.as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CATEGORY);
            if row_category != category.trim() {
                return false;
            }
        }
        if let Some(ref identifier) = self.identifier {
            if row.id.to_string() != *identifier && row.slug != *identifier {
                return false;
            }
        }
        if let Some(ref slug) = self.slug {
            if row.slug != *slug {
                return false;
            }
        }
        true
    }
}

/// The query-builder client of the posts table.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select(&self, query: &PostQuery) -> Result<Vec<PostRow>, RepoError>;

    /// Fails with `SlugConflict` when the slug is taken.
    async fn insert(&self, row: PostRow) -> Result<PostRow, RepoError>;

    /// Replaces the row with the same id. `None` when there is no such row.
    async fn update(&self, row: PostRow) -> Result<Option<PostRow>, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

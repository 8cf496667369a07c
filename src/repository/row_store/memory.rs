use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RepoError;
use crate::repository::row_store::{PostQuery, RowStore};
use crate::repository::PostRow;

/// In-process posts table with the same contract as the Postgres one,
/// slug uniqueness included.
#[derive(Default)]
pub struct MemoryRowStore {
    rows: RwLock<Vec<PostRow>>,
}

impl MemoryRowStore {
    pub fn with_rows(rows: Vec<PostRow>) -> Self {
        MemoryRowStore {
            rows: RwLock::new(rows),
        }
    }
}

fn slug_taken(rows: &[PostRow], slug: &str, except: Uuid) -> bool {
    rows.iter().any(|r| r.slug == slug && r.id != except)
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn select(&self, query: &PostQuery) -> Result<Vec<PostRow>, RepoError> {
        let rows = self.rows.read().await;
        let mut selected: Vec<PostRow> = rows.iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(selected)
    }

    async fn insert(&self, row: PostRow) -> Result<PostRow, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.id == row.id) {
            return Err(RepoError::Backend(format!("duplicate id {}", row.id)));
        }
        if slug_taken(&rows, &row.slug, row.id) {
            return Err(RepoError::SlugConflict(row.slug));
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, row: PostRow) -> Result<Option<PostRow>, RepoError> {
        let mut rows = self.rows.write().await;
        if slug_taken(&rows, &row.slug, row.id) {
            return Err(RepoError::SlugConflict(row.slug));
        }
        match rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }
}

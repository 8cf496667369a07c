use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::content::{sort_by_date_desc, Post, PostMetadata};
use crate::error::RepoError;
use crate::render::render_post;
use crate::repository::row_store::{PostQuery, RowStore};
use crate::repository::{today, ContentRepository, NewPost, PostPatch, PostRow};
use crate::slug::derive_slug;

/// Posts kept as rows of the `posts` table. Drafts (`published = false`) are
/// only visible through the admin operations.
pub struct RowRepository<S: RowStore> {
    store: S,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn valid_slug(requested: Option<String>, title: &str) -> Result<String, RepoError> {
    let slug = match non_empty(requested) {
        Some(slug) => derive_slug(&slug),
        None => derive_slug(title),
    };
    if slug.is_empty() {
        return Err(RepoError::InvalidInput("a slug cannot be derived from the title".to_string()));
    }
    Ok(slug)
}

impl<S: RowStore> RowRepository<S> {
    pub fn new(store: S) -> Self {
        RowRepository { store }
    }

    async fn list(&self, query: PostQuery) -> Result<Vec<PostMetadata>, RepoError> {
        let rows = self.store.select(&query).await?;
        let today = today();
        let mut posts: Vec<_> = rows.iter()
            .map(|row| row.to_source_post(today).metadata)
            .filter(|meta| meta.has_title())
            .collect();
        sort_by_date_desc(&mut posts);
        Ok(posts)
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), RepoError> {
        let taken = self.store.select(&PostQuery::new().slug(slug)).await?
            .iter()
            .any(|row| Some(row.id) != except);
        if taken {
            return Err(RepoError::SlugConflict(slug.to_string()));
        }
        Ok(())
    }

    async fn find_row(&self, id: Uuid) -> Result<Option<PostRow>, RepoError> {
        let rows = self.store.select(&PostQuery::new().identifier(&id.to_string())).await?;
        Ok(rows.into_iter().find(|row| row.id == id))
    }
}

#[async_trait]
impl<S: RowStore> ContentRepository for RowRepository<S> {
    async fn list_all(&self) -> Result<Vec<PostMetadata>, RepoError> {
        self.list(PostQuery::new().published()).await
    }

    async fn list_admin(&self) -> Result<Vec<PostMetadata>, RepoError> {
        self.list(PostQuery::new()).await
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<Post>, RepoError> {
        let identifier = identifier.trim_matches('/');
        if identifier.is_empty() {
            return Ok(None);
        }

        let rows = self.store.select(&PostQuery::new().published().identifier(identifier)).await?;
        // An id match is preferred over a slug that happens to look like an id
        let row = rows.iter()
            .find(|row| row.id.to_string() == identifier)
            .or_else(|| rows.first());

        let Some(row) = row else {
            return Ok(None);
        };

        let post = render_post(row.to_source_post(today()))
            .map_err(|e| RepoError::malformed(identifier, e))?;
        Ok(Some(post))
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<PostMetadata>, RepoError> {
        self.list(PostQuery::new().published().category(category)).await
    }

    async fn list_categories(&self) -> Result<BTreeSet<String>, RepoError> {
        let posts = self.list_all().await?;
        Ok(posts.into_iter().map(|p| p.category).collect())
    }

    async fn create(&self, post: NewPost) -> Result<PostRow, RepoError> {
        let title = post.title.trim().to_string();
        if title.is_empty() {
            return Err(RepoError::InvalidInput("title is required".to_string()));
        }

        let slug = valid_slug(post.slug, &title)?;
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let row = PostRow {
            id: Uuid::new_v4(),
            title,
            slug,
            content: post.content,
            excerpt: non_empty(post.excerpt),
            category: non_empty(post.category),
            tags: post.tags,
            cover: non_empty(post.cover),
            published: post.published,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(row).await
    }

    async fn update(&self, id: &str, patch: PostPatch) -> Result<PostRow, RepoError> {
        let not_found = || RepoError::NotFound(id.to_string());
        let uuid = Uuid::parse_str(id).map_err(|_| not_found())?;
        let mut row = self.find_row(uuid).await?.ok_or_else(not_found)?;

        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(RepoError::InvalidInput("title cannot be empty".to_string()));
            }
            row.title = title;
        }
        if patch.slug.is_some() {
            row.slug = valid_slug(patch.slug, &row.title)?;
            self.ensure_slug_free(&row.slug, Some(uuid)).await?;
        }
        if let Some(content) = patch.content {
            row.content = content;
        }
        if patch.excerpt.is_some() {
            row.excerpt = non_empty(patch.excerpt);
        }
        if patch.category.is_some() {
            row.category = non_empty(patch.category);
        }
        if let Some(tags) = patch.tags {
            row.tags = tags;
        }
        if patch.cover.is_some() {
            row.cover = non_empty(patch.cover);
        }
        if let Some(published) = patch.published {
            row.published = published;
        }
        row.updated_at = Utc::now();

        self.store.update(row).await?.ok_or_else(not_found)
    }

    async fn delete(&self, id: &str) -> Result<bool, RepoError> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Ok(false);
        };
        self.store.delete(uuid).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use crate::content::DEFAULT_CATEGORY;
    use crate::repository::row_store::memory::MemoryRowStore;

    use super::*;

    fn new_post(title: &str, category: Option<&str>, published: bool) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: format!("# {}\n\nSome **text**.\n", title),
            category: category.map(|c| c.to_string()),
            published,
            ..Default::default()
        }
    }

    fn row(title: &str, slug: &str, day: u32, published: bool) -> PostRow {
        let created_at = Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap();
        PostRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            content: "Body".to_string(),
            excerpt: None,
            category: Some("Dev".to_string()),
            tags: vec![],
            cover: None,
            published,
            created_at,
            updated_at: created_at,
        }
    }

    fn repository(rows: Vec<PostRow>) -> RowRepository<MemoryRowStore> {
        RowRepository::new(MemoryRowStore::with_rows(rows))
    }

    #[tokio::test]
    async fn test_unpublished_rows_are_hidden() {
        let draft = row("Draft", "draft", 3, false);
        let draft_id = draft.id.to_string();
        let repo = repository(vec![
            row("First", "first", 1, true),
            draft,
            row("Second", "second", 2, true),
        ]);

        let slugs: Vec<_> = repo.list_all().await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, ["second", "first"]);

        let slugs: Vec<_> = repo.list_by_category("Dev").await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, ["second", "first"]);

        assert!(repo.get_by_identifier("draft").await.unwrap().is_none());
        assert!(repo.get_by_identifier(&draft_id).await.unwrap().is_none());

        let slugs: Vec<_> = repo.list_admin().await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, ["draft", "second", "first"]);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let repo = repository(vec![]);
        let created = repo.create(new_post("Hello World", Some("Dev"), true)).await.unwrap();
        assert_eq!(created.slug, "hello-world");
        assert_eq!(created.created_at, created.updated_at);

        let by_slug = repo.get_by_identifier("hello-world").await.unwrap().unwrap();
        assert_eq!(by_slug.metadata.title, "Hello World");
        assert_eq!(by_slug.metadata.category, "Dev");
        assert_eq!(by_slug.metadata.identifier, created.id.to_string());
        assert!(by_slug.html.contains("<strong>text</strong>"));

        let by_id = repo.get_by_identifier(&created.id.to_string()).await.unwrap().unwrap();
        assert_eq!(by_id, by_slug);
    }

    #[tokio::test]
    async fn test_missing_identifier() {
        let repo = repository(vec![row("First", "first", 1, true)]);
        assert!(repo.get_by_identifier("nope").await.unwrap().is_none());
        assert!(repo.get_by_identifier("").await.unwrap().is_none());
        assert!(repo.get_by_identifier(&Uuid::new_v4().to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = repository(vec![]);
        let created = repo.create(new_post("Short lived", None, true)).await.unwrap();
        let id = created.id.to_string();

        assert!(repo.delete(&id).await.unwrap());
        assert!(!repo.delete(&id).await.unwrap());
        assert!(!repo.delete("not-a-uuid").await.unwrap());
        assert!(repo.get_by_identifier(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slug_conflicts() {
        let repo = repository(vec![]);
        repo.create(new_post("Same title", None, true)).await.unwrap();

        let res = repo.create(new_post("Same title", None, true)).await;
        assert!(matches!(res, Err(RepoError::SlugConflict(ref slug)) if slug == "same-title"));

        let other = repo.create(new_post("Other title", None, false)).await.unwrap();
        let patch = PostPatch {
            slug: Some("same-title".to_string()),
            ..Default::default()
        };
        let res = repo.update(&other.id.to_string(), patch).await;
        assert!(matches!(res, Err(RepoError::SlugConflict(_))));
    }

    #[tokio::test]
    async fn test_update_stamps_updated_at() {
        let old = row("Old title", "old-title", 1, false);
        let id = old.id.to_string();
        let repo = repository(vec![old.clone()]);

        let patch = PostPatch {
            title: Some("New title".to_string()),
            published: Some(true),
            category: Some("".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&id, patch).await.unwrap();
        assert_eq!(updated.title, "New title");
        assert_eq!(updated.slug, "old-title");
        assert!(updated.published);
        assert_eq!(updated.category, None);
        assert!(updated.updated_at > old.updated_at + Duration::days(1));
        assert_eq!(updated.created_at, old.created_at);

        let post = repo.get_by_identifier("old-title").await.unwrap().unwrap();
        assert_eq!(post.metadata.title, "New title");
        assert_eq!(post.metadata.category, DEFAULT_CATEGORY);

        let default_listed = repo.list_by_category(DEFAULT_CATEGORY).await.unwrap();
        assert_eq!(default_listed.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let repo = repository(vec![]);
        let res = repo.update(&Uuid::new_v4().to_string(), PostPatch::default()).await;
        assert!(matches!(res, Err(RepoError::NotFound(_))));
        let res = repo.update("garbage", PostPatch::default()).await;
        assert!(matches!(res, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let repo = repository(vec![]);
        assert!(matches!(repo.create(new_post("   ", None, true)).await, Err(RepoError::InvalidInput(_))));
        assert!(matches!(repo.create(new_post("!!!", None, true)).await, Err(RepoError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_categories_skip_drafts() {
        let mut life = row("Life post", "life-post", 4, true);
        life.category = Some("Life".to_string());
        let mut hidden = row("Hidden", "hidden", 5, false);
        hidden.category = Some("Secret".to_string());
        let repo = repository(vec![row("Dev post", "dev-post", 1, true), life, hidden]);

        let categories: Vec<_> = repo.list_categories().await.unwrap().into_iter().collect();
        assert_eq!(categories, ["Dev", "Life"]);
    }

    #[tokio::test]
    async fn test_padded_category_is_listed_and_filtered_alike() {
        let mut padded = row("Padded", "padded", 2, true);
        padded.category = Some(" Dev ".to_string());
        let repo = repository(vec![padded]);

        let categories: Vec<_> = repo.list_categories().await.unwrap().into_iter().collect();
        assert_eq!(categories, ["Dev"]);
        let listed = repo.list_by_category("Dev").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slug, "padded");
    }
}

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::content::DEFAULT_CATEGORY;
use crate::error::RepoError;
use crate::repository::row_store::{PostQuery, RowStore};
use crate::repository::PostRow;

const SCHEMA: &str = include_str!("../../../res/schema.sql");

const COLUMNS: &str = "id, title, slug, content, excerpt, category, tags, cover, published, created_at, updated_at";

fn schema_statements(schema: &str) -> impl Iterator<Item=&str> {
    schema.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

pub struct PgRowStore {
    pool: PgPool,
}

impl PgRowStore {
    /// Opens the pool and creates the table when it is not there yet.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        let store = PgRowStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), RepoError> {
        // One statement per prepared query
        for statement in schema_statements(SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn build_select(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM posts WHERE TRUE", COLUMNS));

    if let Some(published) = query.published {
        builder.push(" AND published = ").push_bind(published);
    }
    if let Some(ref category) = query.category {
        builder.push(" AND COALESCE(NULLIF(TRIM(category), ''), ")
            .push_bind(DEFAULT_CATEGORY)
            .push(") = ")
            .push_bind(category.trim().to_string());
    }
    if let Some(ref identifier) = query.identifier {
        builder.push(" AND (id::text = ")
            .push_bind(identifier.clone())
            .push(" OR slug = ")
            .push_bind(identifier.clone())
            .push(")");
    }
    if let Some(ref slug) = query.slug {
        builder.push(" AND slug = ").push_bind(slug.clone());
    }

    builder.push(" ORDER BY created_at DESC");
    builder
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn select(&self, query: &PostQuery) -> Result<Vec<PostRow>, RepoError> {
        let rows = build_select(query)
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, row: PostRow) -> Result<PostRow, RepoError> {
        let sql = format!(
            "INSERT INTO posts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            COLUMNS, COLUMNS,
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(row.id)
            .bind(row.title)
            .bind(row.slug)
            .bind(row.content)
            .bind(row.excerpt)
            .bind(row.category)
            .bind(row.tags)
            .bind(row.cover)
            .bind(row.published)
            .bind(row.created_at)
            .bind(row.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, row: PostRow) -> Result<Option<PostRow>, RepoError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET title = $2, slug = $3, content = $4, excerpt = $5, category = $6,
                tags = $7, cover = $8, published = $9, updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS,
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(row.id)
            .bind(row.title)
            .bind(row.slug)
            .bind(row.content)
            .bind(row.excerpt)
            .bind(row.category)
            .bind(row.tags)
            .bind(row.cover)
            .bind(row.published)
            .bind(row.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements() {
        let statements: Vec<_> = schema_statements(SCHEMA).collect();
        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS posts"));
        assert!(statements[0].contains("slug TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_select_sql() {
        let query = PostQuery::new().published().category("Dev").identifier("hello");
        let builder = build_select(&query);
        assert_eq!(builder.sql(), format!(
            "SELECT {} FROM posts WHERE TRUE AND published = $1 \
             AND COALESCE(NULLIF(TRIM(category), ''), $2) = $3 \
             AND (id::text = $4 OR slug = $5) ORDER BY created_at DESC",
            COLUMNS,
        ));
    }

    #[test]
    fn test_select_all_sql() {
        let builder = build_select(&PostQuery::new());
        assert_eq!(builder.sql(), format!("SELECT {} FROM posts WHERE TRUE ORDER BY created_at DESC", COLUMNS));
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod content_file;
pub mod front_matter;
pub mod normalizer;

/// Loose key-value shape read from front matter or built from a database row.
pub type RawMetadata = serde_json::Map<String, serde_json::Value>;

pub const UNTITLED: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "일반";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub identifier: String,
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub cover: Option<String>,
    pub published: bool,
}

impl PostMetadata {
    /// Posts without a real title are kept out of every listing.
    pub fn has_title(&self) -> bool {
        self.title != UNTITLED
    }
}

/// A post as stored: metadata plus the markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePost {
    pub metadata: PostMetadata,
    pub markdown: String,
}

/// A post ready to display: metadata plus the rendered HTML body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub metadata: PostMetadata,
    pub html: String,
}

/// Newest first. `sort_by` is stable, so posts sharing a date keep their order.
pub fn sort_by_date_desc(posts: &mut [PostMetadata]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

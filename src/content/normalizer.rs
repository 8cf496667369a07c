use chrono::NaiveDate;
use serde_json::Value;

use crate::content::{PostMetadata, RawMetadata, DEFAULT_CATEGORY, UNTITLED};
use crate::slug::derive_slug;
use crate::text_utils::parse_post_date;

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Empty strings count as missing, same as a missing key
fn text_field(raw: &RawMetadata, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(scalar_string)
        .filter(|s| !s.is_empty())
}

fn tags_field(raw: &RawMetadata) -> Vec<String> {
    match raw.get("tags") {
        Some(Value::Array(items)) => items.iter()
            .filter_map(scalar_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s.split(',')
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect(),
        _ => vec![],
    }
}

fn date_field(raw: &RawMetadata, today: NaiveDate) -> NaiveDate {
    ["date", "created_at"].iter()
        .filter_map(|key| text_field(raw, key))
        .find_map(|s| parse_post_date(&s).ok())
        .unwrap_or(today)
}

fn published_field(raw: &RawMetadata) -> bool {
    match raw.get("published") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.trim().eq_ignore_ascii_case("false"),
        _ => true,
    }
}

/// Fills every missing field with its default. Never fails.
///
/// `today` stands in for a missing or unreadable date.
pub fn normalize(raw: &RawMetadata, today: NaiveDate) -> PostMetadata {
    let title = text_field(raw, "title").unwrap_or_else(|| UNTITLED.to_string());
    let slug = text_field(raw, "slug").unwrap_or_else(|| derive_slug(&title));
    let identifier = text_field(raw, "id").unwrap_or_else(|| slug.clone());

    PostMetadata {
        identifier,
        slug,
        date: date_field(raw, today),
        category: text_field(raw, "category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        tags: tags_field(raw),
        excerpt: text_field(raw, "excerpt")
            .or_else(|| text_field(raw, "summary"))
            .unwrap_or_default(),
        cover: text_field(raw, "cover"),
        published: published_field(raw),
        title,
    }
}

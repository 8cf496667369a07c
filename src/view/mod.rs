use std::io;
use std::io::ErrorKind;

use ramhorns::Template;
use url::Url;

use crate::content::PostMetadata;
use crate::text_utils::format_date;

pub mod index_renderer;
pub mod list_renderer;
pub mod portfolio_renderer;
pub mod post_renderer;

// `base` followed by every segment of `path`, percent-encoded
fn segment_link(base: &str, path: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost").and_then(|root| root.join(base)) else {
        return format!("{}/{}", base, path);
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
    }
    url.path().to_string()
}

/// `/posts/<slug>` with every slug segment percent-encoded.
pub fn post_link(slug: &str) -> String {
    segment_link("/posts", slug)
}

pub fn project_link(id: &str) -> String {
    segment_link("/portfolio", id)
}

pub fn category_link(category: &str) -> String {
    match serde_urlencoded::to_string([("category", category)]) {
        Ok(query) => format!("/posts?{}", query),
        Err(_) => "/posts".to_string(),
    }
}

pub(crate) fn parse_template<'a>(src: &'a str, name: &str) -> io::Result<Template<'a>> {
    match Template::new(src) {
        Ok(template) => Ok(template),
        Err(e) => Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing {} template: {}", name, e))),
    }
}

#[derive(ramhorns::Content)]
pub(crate) struct ViewTag<'a> {
    pub tag: &'a str,
}

/// A post as shown in lists and sections.
#[derive(ramhorns::Content)]
pub(crate) struct PostCard<'a> {
    pub title: &'a str,
    pub link: String,
    pub date: String,
    pub category: &'a str,
    pub excerpt: &'a str,
    pub has_excerpt: bool,
    pub cover: &'a str,
    pub has_cover: bool,
    pub tags: Vec<ViewTag<'a>>,
}

impl<'a> PostCard<'a> {
    pub fn from_meta(meta: &'a PostMetadata) -> Self {
        let cover = meta.cover.as_deref().unwrap_or("");
        PostCard {
            title: &meta.title,
            link: post_link(&meta.slug),
            date: format_date(&meta.date),
            category: &meta.category,
            excerpt: &meta.excerpt,
            has_excerpt: !meta.excerpt.is_empty(),
            cover,
            has_cover: !cover.is_empty(),
            tags: meta.tags.iter().map(|t| ViewTag { tag: t }).collect(),
        }
    }
}

use std::io;

use ramhorns::Template;

use crate::content::Post;
use crate::text_utils::format_date;
use crate::view::{category_link, parse_template, ViewTag};

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    id: &'a str,
    slug: &'a str,
    tags: Vec<ViewTag<'a>>,
    date: String,
    category: &'a str,
    category_link: String,
    excerpt: &'a str,
    cover: &'a str,
    has_cover: bool,
    post_title: &'a str,
    post_content: &'a str,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'_> {
    pub fn new(view_tpl_src: &str) -> io::Result<PostRenderer> {
        Ok(PostRenderer {
            template: parse_template(view_tpl_src, "post view")?,
        })
    }

    /// `post_content` is already sanitized HTML and must go through `{{{ }}}`.
    pub fn render(&self, post: &Post) -> String {
        let meta = &post.metadata;
        let cover = meta.cover.as_deref().unwrap_or("");

        self.template.render(&ViewItem {
            id: &meta.identifier,
            slug: &meta.slug,
            tags: meta.tags.iter().map(|t| ViewTag { tag: t }).collect(),
            date: format_date(&meta.date),
            category: &meta.category,
            category_link: category_link(&meta.category),
            excerpt: &meta.excerpt,
            cover,
            has_cover: !cover.is_empty(),
            post_title: &meta.title,
            post_content: &post.html,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::content::PostMetadata;

    use super::*;

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{post_title}}]
DATE=[{{date}}]
CATEGORY=[{{category}}|{{category_link}}]
TAGS=[{{#tags}}({{tag}}){{/tags}}]
COVER=[{{#has_cover}}{{cover}}{{/has_cover}}]
POST_CONTENT=[{{{post_content}}}]
"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let post = Post {
            metadata: PostMetadata {
                identifier: "post-id".to_string(),
                slug: "post-id".to_string(),
                title: "<post-title>".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                category: "Dev".to_string(),
                tags: vec!["<rust>".to_string(), "programming".to_string()],
                excerpt: "".to_string(),
                cover: None,
                published: true,
            },
            html: "<p>post-content</p>".to_string(),
        };
        let res = post_renderer.render(&post);
        assert_eq!(res, r##"
TITLE=[&lt;post-title&gt;]
DATE=[2024-01-02]
CATEGORY=[Dev|/posts?category=Dev]
TAGS=[(&lt;rust&gt;)(programming)]
COVER=[]
POST_CONTENT=[<p>post-content</p>]"##);
    }
}

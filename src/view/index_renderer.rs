use std::io;

use ramhorns::Template;

use crate::aggregate::CategorySection;
use crate::view::{category_link, parse_template, PostCard};

#[derive(ramhorns::Content)]
struct IndexPage<'a> {
    no_posts: bool,
    post_count: u64,
    sections: Vec<ViewSection<'a>>,
}

#[derive(ramhorns::Content)]
struct ViewSection<'a> {
    category: &'a str,
    view_all_link: String,
    total: u64,
    has_more: bool,
    posts: Vec<PostCard<'a>>,
}

/// Home page: one section per category.
pub struct IndexRenderer<'a> {
    pub template: Template<'a>,
}

impl IndexRenderer<'_> {
    pub fn new(index_tpl_src: &str) -> io::Result<IndexRenderer> {
        Ok(IndexRenderer {
            template: parse_template(index_tpl_src, "index")?,
        })
    }

    pub fn render(&self, sections: &[CategorySection]) -> String {
        let post_count: u64 = sections.iter().map(|s| s.total as u64).sum();
        let sections: Vec<_> = sections.iter()
            .map(|section| ViewSection {
                category: &section.category,
                view_all_link: category_link(&section.category),
                total: section.total as u64,
                has_more: section.has_more(),
                posts: section.posts.iter().map(PostCard::from_meta).collect(),
            })
            .collect();

        self.template.render(&IndexPage {
            no_posts: sections.is_empty(),
            post_count,
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::aggregate::category_sections;
    use crate::content::PostMetadata;

    use super::*;

    fn meta(slug: &str, category: &str) -> PostMetadata {
        PostMetadata {
            identifier: slug.to_string(),
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            category: category.to_string(),
            tags: vec![],
            excerpt: "".to_string(),
            cover: None,
            published: true,
        }
    }

    const TEMPLATE: &str = "{{#no_posts}}WELCOME{{/no_posts}}\
{{#sections}}[{{category}}:{{total}}{{#posts}} {{title}}{{/posts}}{{#has_more}} MORE={{view_all_link}}{{/has_more}}]{{/sections}}";

    #[test]
    fn test_render_sections() {
        let posts = vec![meta("a", "Dev"), meta("b", "Dev"), meta("c", "Life")];
        let sections = category_sections(&posts, &["Life".to_string()], 1);

        let res = IndexRenderer::new(TEMPLATE).unwrap().render(&sections);
        assert_eq!(res, "[Life:1 C][Dev:2 A MORE=/posts?category=Dev]");
    }

    #[test]
    fn test_render_without_posts() {
        let res = IndexRenderer::new(TEMPLATE).unwrap().render(&[]);
        assert_eq!(res, "WELCOME");
    }
}

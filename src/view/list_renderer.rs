use std::io;

use ramhorns::Template;

use crate::content::PostMetadata;
use crate::text_utils::format_date;
use crate::view::{category_link, parse_template, post_link, PostCard};

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    heading: &'a str,
    count: u64,
    count_label: &'a str,
    no_posts: bool,
    post_list: Vec<PostCard<'a>>,
    all_selected: bool,
    categories: Vec<ViewCategory<'a>>,
    recent_posts: Vec<RecentItem<'a>>,
}

#[derive(ramhorns::Content)]
struct ViewCategory<'a> {
    name: &'a str,
    link: String,
    selected: bool,
}

#[derive(ramhorns::Content)]
struct RecentItem<'a> {
    title: &'a str,
    link: String,
    date: String,
}

/// The posts listing with its sidebar of categories and recent posts.
pub struct ListRenderer<'a> {
    pub template: Template<'a>,
}

impl ListRenderer<'_> {
    pub fn new(list_tpl_src: &str) -> io::Result<ListRenderer> {
        Ok(ListRenderer {
            template: parse_template(list_tpl_src, "list")?,
        })
    }

    pub fn render(&self,
                  posts: &[PostMetadata],
                  selected: Option<&str>,
                  categories: &[String],
                  recent: &[PostMetadata]) -> String {
        let categories = categories.iter()
            .map(|name| ViewCategory {
                name,
                link: category_link(name),
                selected: selected == Some(name.as_str()),
            })
            .collect();

        let recent_posts = recent.iter()
            .map(|meta| RecentItem {
                title: &meta.title,
                link: post_link(&meta.slug),
                date: format_date(&meta.date),
            })
            .collect();

        self.template.render(&ListPage {
            heading: selected.unwrap_or("All Posts"),
            count: posts.len() as u64,
            count_label: if posts.len() == 1 { "post" } else { "posts" },
            no_posts: posts.is_empty(),
            post_list: posts.iter().map(PostCard::from_meta).collect(),
            all_selected: selected.is_none(),
            categories,
            recent_posts,
        })
    }
}

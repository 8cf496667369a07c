use std::collections::BTreeMap;

use crate::content::PostMetadata;

/// Buckets posts by category. Every post lands in exactly one bucket and each
/// bucket keeps the input order.
pub fn group_by_category(posts: &[PostMetadata]) -> BTreeMap<String, Vec<PostMetadata>> {
    let mut groups: BTreeMap<String, Vec<PostMetadata>> = BTreeMap::new();
    for post in posts {
        groups.entry(post.category.clone())
            .or_default()
            .push(post.clone());
    }
    groups
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySection {
    pub category: String,
    pub posts: Vec<PostMetadata>,
    pub total: usize,
}

impl CategorySection {
    pub fn has_more(&self) -> bool {
        self.total > self.posts.len()
    }
}

/// Home page layout: the preferred categories that have posts, in the given
/// order, then the rest by name. Each section shows at most `per_category` posts.
pub fn category_sections(posts: &[PostMetadata], preferred: &[String], per_category: usize) -> Vec<CategorySection> {
    let mut groups = group_by_category(posts);
    let mut sections = vec![];

    let mut take_section = |category: &str, posts: Vec<PostMetadata>| {
        let total = posts.len();
        sections.push(CategorySection {
            category: category.to_string(),
            posts: posts.into_iter().take(per_category).collect(),
            total,
        });
    };

    for category in preferred {
        if let Some(posts) = groups.remove(category) {
            take_section(category, posts);
        }
    }

    // BTreeMap iterates by name
    for (category, posts) in groups {
        take_section(&category, posts);
    }

    sections
}

pub fn recent(posts: &[PostMetadata], count: usize) -> Vec<PostMetadata> {
    posts.iter().take(count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn meta(slug: &str, category: &str, day: u32) -> PostMetadata {
        PostMetadata {
            identifier: slug.to_string(),
            slug: slug.to_string(),
            title: slug.to_uppercase(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            category: category.to_string(),
            tags: vec![],
            excerpt: "".to_string(),
            cover: None,
            published: true,
        }
    }

    fn sample() -> Vec<PostMetadata> {
        vec![
            meta("a", "Dev", 9),
            meta("b", "Life", 8),
            meta("c", "Dev", 7),
            meta("d", "Art", 6),
            meta("e", "Dev", 5),
        ]
    }

    #[test]
    fn test_grouping_keeps_every_post_once() {
        let posts = sample();
        let groups = group_by_category(&posts);

        let total: usize = groups.values().map(|v| v.len()).sum();
        assert_eq!(total, posts.len());

        for post in &posts {
            let found = groups.values().flatten().filter(|p| p.slug == post.slug).count();
            assert_eq!(found, 1);
        }

        let dev: Vec<_> = groups["Dev"].iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(dev, ["a", "c", "e"]);
        assert_eq!(groups.keys().collect::<Vec<_>>(), ["Art", "Dev", "Life"]);
    }

    #[test]
    fn test_grouping_empty() {
        assert!(group_by_category(&[]).is_empty());
        assert!(category_sections(&[], &["Dev".to_string()], 6).is_empty());
    }

    #[test]
    fn test_sections_order_and_cap() {
        let preferred = vec!["Life".to_string(), "Missing".to_string(), "Dev".to_string()];
        let sections = category_sections(&sample(), &preferred, 2);

        let names: Vec<_> = sections.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, ["Life", "Dev", "Art"]);

        let dev = &sections[1];
        assert_eq!(dev.posts.len(), 2);
        assert_eq!(dev.total, 3);
        assert!(dev.has_more());
        assert!(!sections[0].has_more());
    }

    #[test]
    fn test_recent() {
        let posts = sample();
        let slugs: Vec<_> = recent(&posts, 3).into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, ["a", "b", "c"]);
        assert_eq!(recent(&posts, 10).len(), 5);
    }
}

use std::io;

use ramhorns::Template;

use crate::portfolio::{Portfolio, PortfolioItem};
use crate::text_utils::format_date;
use crate::view::{parse_template, project_link, ViewTag};

/// A project as shown on the portfolio page and on its own page.
#[derive(ramhorns::Content)]
struct ProjectCard<'a> {
    id: &'a str,
    title: &'a str,
    link: String,
    description: &'a str,
    image: &'a str,
    has_image: bool,
    category: &'a str,
    date: String,
    tags: Vec<ViewTag<'a>>,
    demo_url: &'a str,
    has_demo: bool,
    github_url: &'a str,
    has_github: bool,
}

impl<'a> ProjectCard<'a> {
    fn from_item(item: &'a PortfolioItem) -> Self {
        let image = item.image.as_deref().unwrap_or("");
        let demo_url = item.demo_url.as_deref().unwrap_or("");
        let github_url = item.github_url.as_deref().unwrap_or("");
        ProjectCard {
            id: &item.id,
            title: &item.title,
            link: project_link(&item.id),
            description: &item.description,
            image,
            has_image: !image.is_empty(),
            category: &item.category,
            date: format_date(&item.date),
            tags: item.tags.iter().map(|t| ViewTag { tag: t }).collect(),
            demo_url,
            has_demo: !demo_url.is_empty(),
            github_url,
            has_github: !github_url.is_empty(),
        }
    }
}

#[derive(ramhorns::Content)]
struct PortfolioSection<'a> {
    category: &'a str,
    total: u64,
    projects: Vec<ProjectCard<'a>>,
}

#[derive(ramhorns::Content)]
struct PortfolioPage<'a> {
    project_count: u64,
    no_projects: bool,
    sections: Vec<PortfolioSection<'a>>,
}

pub struct PortfolioRenderer<'a> {
    pub template: Template<'a>,
}

impl PortfolioRenderer<'_> {
    pub fn new(portfolio_tpl_src: &str) -> io::Result<PortfolioRenderer> {
        Ok(PortfolioRenderer {
            template: parse_template(portfolio_tpl_src, "portfolio")?,
        })
    }

    pub fn render(&self, portfolio: &Portfolio) -> String {
        let sections = portfolio.by_category().into_iter()
            .map(|(category, items)| PortfolioSection {
                category,
                total: items.len() as u64,
                projects: items.into_iter().map(ProjectCard::from_item).collect(),
            })
            .collect();

        self.template.render(&PortfolioPage {
            project_count: portfolio.items.len() as u64,
            no_projects: portfolio.items.is_empty(),
            sections,
        })
    }
}

pub struct ProjectRenderer<'a> {
    pub template: Template<'a>,
}

impl ProjectRenderer<'_> {
    pub fn new(project_tpl_src: &str) -> io::Result<ProjectRenderer> {
        Ok(ProjectRenderer {
            template: parse_template(project_tpl_src, "project")?,
        })
    }

    pub fn render(&self, item: &PortfolioItem) -> String {
        self.template.render(&ProjectCard::from_item(item))
    }
}

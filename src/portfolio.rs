use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::Path;
use std::{fs, io};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::slug::derive_slug;

/// One project of the portfolio catalog.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PortfolioItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub category: String,
    #[serde(deserialize_with = "catalog_date")]
    pub date: NaiveDate,
}

/// The projects in catalog order.
#[derive(Deserialize, Debug, Default)]
pub struct Portfolio {
    #[serde(default)]
    pub items: Vec<PortfolioItem>,
}

// TOML dates come as `Datetime`; only the date part matters here
fn catalog_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = toml::value::Datetime::deserialize(deserializer)?;
    let Some(date) = value.date else {
        return Err(Error::custom(format!("{} has no date part", value)));
    };
    NaiveDate::from_ymd_opt(date.year as i32, date.month as u32, date.day as u32)
        .ok_or_else(|| Error::custom(format!("{} is not a valid date", value)))
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, msg)
}

pub fn parse_portfolio(content: &str) -> io::Result<Portfolio> {
    let portfolio: Portfolio = toml::from_str(content)
        .map_err(|e| invalid(format!("Error parsing portfolio: {}", e)))?;

    // Ids end up as a single path segment of `/portfolio/<id>`
    let mut seen = HashSet::new();
    for item in &portfolio.items {
        if item.id.is_empty() || derive_slug(&item.id) != item.id {
            return Err(invalid(format!("Portfolio id {:?} must be a lowercase slug", item.id)));
        }
        if !seen.insert(item.id.as_str()) {
            return Err(invalid(format!("Portfolio id {} is used more than once", item.id)));
        }
    }

    Ok(portfolio)
}

pub fn read_portfolio(path: &Path) -> io::Result<Portfolio> {
    let content = fs::read_to_string(path)
        .map_err(|e| io::Error::new(e.kind(), format!("Error opening portfolio {}: {}", path.display(), e)))?;
    parse_portfolio(&content)
}

impl Portfolio {
    /// Projects per category. Catalog order is kept inside a category.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&PortfolioItem>> {
        let mut groups: BTreeMap<&str, Vec<&PortfolioItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.category.as_str()).or_default().push(item);
        }
        groups
    }

    pub fn by_id(&self, id: &str) -> Option<&PortfolioItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
[[items]]
id = "ecommerce-platform"
title = "E-commerce 플랫폼"
description = "An online shop with payments"
image = "/public/img/shop.png"
tags = ["Next.js", "Stripe"]
demo_url = "https://demo.example.com"
github_url = "https://github.com/example/shop"
category = "웹 애플리케이션"
date = 2024-01-15

[[items]]
id = "weather-app"
title = "날씨 정보 앱"
description = "Forecasts by location"
category = "모바일 앱"
date = 2023-11-20

[[items]]
id = "task-management-app"
title = "팀 협업 도구"
description = "Tasks with live updates"
tags = ["React"]
category = "웹 애플리케이션"
date = 2023-12-10T09:30:00
"#;

    #[test]
    fn test_parse() {
        let portfolio = parse_portfolio(CATALOG).unwrap();
        assert_eq!(portfolio.items.len(), 3);

        let shop = &portfolio.items[0];
        assert_eq!(shop.title, "E-commerce 플랫폼");
        assert_eq!(shop.image.as_deref(), Some("/public/img/shop.png"));
        assert_eq!(shop.tags, ["Next.js", "Stripe"]);
        assert_eq!(shop.demo_url.as_deref(), Some("https://demo.example.com"));
        assert_eq!(shop.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        let weather = &portfolio.items[1];
        assert!(weather.image.is_none());
        assert!(weather.tags.is_empty());
        assert!(weather.github_url.is_none());

        assert_eq!(portfolio.items[2].date, NaiveDate::from_ymd_opt(2023, 12, 10).unwrap());
    }

    #[test]
    fn test_by_category() {
        let portfolio = parse_portfolio(CATALOG).unwrap();
        let groups = portfolio.by_category();

        let names: Vec<_> = groups.keys().copied().collect();
        assert_eq!(names, ["모바일 앱", "웹 애플리케이션"]);

        let web: Vec<_> = groups["웹 애플리케이션"].iter().map(|i| i.id.as_str()).collect();
        assert_eq!(web, ["ecommerce-platform", "task-management-app"]);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), portfolio.items.len());
    }

    #[test]
    fn test_by_id() {
        let portfolio = parse_portfolio(CATALOG).unwrap();
        assert_eq!(portfolio.by_id("weather-app").unwrap().title, "날씨 정보 앱");
        assert!(portfolio.by_id("nope").is_none());
        assert!(Portfolio::default().by_id("weather-app").is_none());
    }

    #[test]
    fn test_rejects_bad_catalogs() {
        let twice = format!("{}\n[[items]]\nid = \"weather-app\"\ntitle = \"Again\"\ndescription = \"\"\ncategory = \"x\"\ndate = 2020-01-01\n", CATALOG);
        let err = parse_portfolio(&twice).err().unwrap();
        assert!(err.to_string().contains("more than once"));

        let bad_id = "[[items]]\nid = \"../up\"\ntitle = \"T\"\ndescription = \"\"\ncategory = \"x\"\ndate = 2020-01-01\n";
        assert_eq!(parse_portfolio(bad_id).err().unwrap().kind(), ErrorKind::InvalidData);

        let time_only = "[[items]]\nid = \"t\"\ntitle = \"T\"\ndescription = \"\"\ncategory = \"x\"\ndate = 10:00:00\n";
        assert!(parse_portfolio(time_only).is_err());

        let not_a_date = "[[items]]\nid = \"t\"\ntitle = \"T\"\ndescription = \"\"\ncategory = \"x\"\ndate = \"yesterday\"\n";
        assert!(parse_portfolio(not_a_date).is_err());
    }

    #[test]
    fn test_shipped_catalog() {
        let portfolio = parse_portfolio(include_str!("../res/portfolio.toml")).unwrap();
        assert_eq!(portfolio.items.len(), 4);
        assert_eq!(portfolio.by_category()["웹 애플리케이션"].len(), 2);
    }

    #[test]
    fn test_empty_catalog() {
        let portfolio = parse_portfolio("").unwrap();
        assert!(portfolio.items.is_empty());
        assert!(portfolio.by_category().is_empty());
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use spdlog::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::pages::{load_portfolio, render_home, render_list, render_not_found, render_portfolio, render_post, render_project};
use crate::repository::ContentRepository;

/// What an export run produced.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub pages: usize,
    pub assets: usize,
    pub skipped: Vec<String>,
}

/// Slugs of every public post, newest first.
pub async fn public_slugs(repo: &dyn ContentRepository) -> Result<Vec<String>> {
    let posts = repo.list_all().await
        .map_err(|e| anyhow!("Error listing posts: {}", e))?;
    Ok(posts.into_iter().map(|p| p.slug).collect())
}

fn write_page(out_dir: &Path, rel_path: &Path, body: &str) -> Result<()> {
    let full_path = out_dir.join(rel_path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Error creating directory {}", parent.display()))?;
    }
    fs::write(&full_path, body)
        .with_context(|| format!("Error writing {}", full_path.display()))
}

fn copy_dir(src: &Path, dst: &Path) -> Result<usize> {
    if !src.is_dir() {
        warn!("Public directory {} not found. No assets exported", src.display());
        return Ok(0);
    }

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.with_context(|| format!("Error walking {}", src.display()))?;
        let rel_path = entry.path().strip_prefix(src)?;
        let target = dst.join(rel_path);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Error creating directory {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Error copying {}", entry.path().display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn post_page_path(slug: &str) -> PathBuf {
    slug.split('/')
        .fold(PathBuf::from("posts"), |path, segment| path.join(segment))
        .join("index.html")
}

fn project_page_path(id: &str) -> PathBuf {
    Path::new("portfolio").join(id).join("index.html")
}

/// Writes the whole public site into `config.paths.export_dir`.
pub async fn export_site(config: &Config, repo: &dyn ContentRepository) -> Result<ExportSummary> {
    let out_dir = &config.paths.export_dir;
    info!("Exporting site to {}", out_dir.display());
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Error creating export directory {}", out_dir.display()))?;

    let mut summary = ExportSummary::default();

    write_page(out_dir, Path::new("index.html"), &render_home(config, repo).await?)?;
    write_page(out_dir, Path::new("posts/index.html"), &render_list(config, repo, None).await?)?;
    summary.pages += 2;

    for slug in public_slugs(repo).await? {
        match render_post(config, repo, &slug).await? {
            Some(body) => {
                write_page(out_dir, &post_page_path(&slug), &body)?;
                summary.pages += 1;
            }
            None => {
                warn!("Post {} disappeared during export. Skipping", slug);
                summary.skipped.push(slug);
            }
        }
    }

    let portfolio = load_portfolio(config);
    write_page(out_dir, Path::new("portfolio/index.html"), &render_portfolio(config, &portfolio)?)?;
    summary.pages += 1;
    for item in &portfolio.items {
        if let Some(body) = render_project(config, &portfolio, &item.id)? {
            write_page(out_dir, &project_page_path(&item.id), &body)?;
            summary.pages += 1;
        }
    }

    write_page(out_dir, Path::new("404.html"), &render_not_found(config, "/404")?)?;
    summary.pages += 1;

    summary.assets = copy_dir(&config.paths.public_dir, &out_dir.join("public"))?;

    info!("Export done. {} pages, {} assets", summary.pages, summary.assets);
    Ok(summary)
}

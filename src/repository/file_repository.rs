use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use spdlog::{debug, warn};
use walkdir::WalkDir;

use crate::content::content_file::ContentFile;
use crate::content::{sort_by_date_desc, Post, PostMetadata, SourcePost};
use crate::error::RepoError;
use crate::render::render_post;
use crate::repository::{today, ContentRepository, NewPost, PostPatch, PostRow};

/// Posts read from a directory of markdown files.
///
/// `notes/rust.md` and `notes/rust/index.md` both map to the slug `notes/rust`.
/// When both exist the plain file wins, same as in `get_by_identifier`.
pub struct FileRepository {
    root_dir: PathBuf,
    index_base_name: String,
    extensions: Vec<String>,
}

struct Candidate {
    rank: (bool, usize),
    path: PathBuf,
}

impl FileRepository {
    pub fn new(root_dir: PathBuf, index_base_name: &str, extensions: &[String]) -> Self {
        FileRepository {
            root_dir,
            index_base_name: index_base_name.to_string(),
            extensions: extensions.to_vec(),
        }
    }

    fn extension_rank(&self, path: &Path) -> Option<usize> {
        let ext = path.extension()?.to_str()?;
        self.extensions.iter().position(|e| e == ext)
    }

    /// Returns the slug and whether the file is a directory index.
    fn slug_from_path(&self, path: &Path) -> Option<(String, bool)> {
        let relative = path.strip_prefix(&self.root_dir).ok()?;
        let mut parts: Vec<String> = relative.with_extension("")
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str().map(|s| s.to_string()),
                _ => None,
            })
            .collect();

        let is_index = parts.len() > 1 && parts.last() == Some(&self.index_base_name);
        if is_index {
            parts.pop();
        }

        if parts.is_empty() {
            return None;
        }
        Some((parts.join("/").replace('\\', "/"), is_index))
    }

    /// Slug to file, following the lookup order. Slugs trying to leave the
    /// content directory are never resolved.
    fn find_file(&self, slug: &str) -> Option<PathBuf> {
        let slug = slug.trim_matches('/');
        if slug.is_empty() || slug.contains('\\') {
            return None;
        }
        if Path::new(slug).components().any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }

        let plain = self.extensions.iter()
            .map(|ext| self.root_dir.join(format!("{}.{}", slug, ext)));
        let index = self.extensions.iter()
            .map(|ext| self.root_dir.join(slug).join(format!("{}.{}", self.index_base_name, ext)));

        // A candidate only counts if the listing would give it this same slug
        plain.chain(index).find(|path| {
            path.is_file() && self.slug_from_path(path).is_some_and(|(found, _)| found == slug)
        })
    }

    /// Walks the content directory. One entry per slug, in file name order.
    fn content_files(&self) -> Vec<(String, PathBuf)> {
        if !self.root_dir.is_dir() {
            warn!("Content directory {} does not exist. No posts to show", self.root_dir.display());
            return vec![];
        }

        let mut order: Vec<String> = vec![];
        let mut chosen: HashMap<String, Candidate> = HashMap::new();

        for entry in WalkDir::new(&self.root_dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error walking the content directory: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(ext_rank) = self.extension_rank(path) else { continue };
            let Some((slug, is_index)) = self.slug_from_path(path) else { continue };
            let candidate = Candidate {
                rank: (is_index, ext_rank),
                path: path.to_path_buf(),
            };

            match chosen.get_mut(&slug) {
                None => {
                    order.push(slug.clone());
                    chosen.insert(slug, candidate);
                }
                Some(current) => {
                    let (kept, shadowed) = if candidate.rank < current.rank {
                        (candidate.path.clone(), std::mem::replace(current, candidate).path)
                    } else {
                        (current.path.clone(), candidate.path)
                    };
                    warn!("Slug {} is used by more than one file. Using {} and ignoring {}",
                        slug, kept.display(), shadowed.display());
                }
            }
        }

        order.into_iter()
            .filter_map(|slug| chosen.remove(&slug).map(|c| (slug, c.path)))
            .collect()
    }

    fn read_post(&self, slug: &str, path: PathBuf, today: NaiveDate) -> Result<SourcePost, RepoError> {
        let content_file = ContentFile::from_file(slug.to_string(), path)?;
        content_file.to_source_post(today)
            .map_err(|e| RepoError::malformed(slug, e))
    }

    fn scan(&self) -> Vec<PostMetadata> {
        let today = today();
        let mut posts = vec![];

        for (slug, path) in self.content_files() {
            match self.read_post(&slug, path, today) {
                Ok(post) if post.metadata.has_title() => posts.push(post.metadata),
                Ok(_) => debug!("Skipping untitled post {}", slug),
                Err(e) => warn!("Skipping post {}: {}", slug, e),
            }
        }

        sort_by_date_desc(&mut posts);
        posts
    }
}

#[async_trait]
impl ContentRepository for FileRepository {
    async fn list_all(&self) -> Result<Vec<PostMetadata>, RepoError> {
        Ok(self.scan())
    }

    async fn list_admin(&self) -> Result<Vec<PostMetadata>, RepoError> {
        Ok(self.scan())
    }

    async fn get_by_identifier(&self, identifier: &str) -> Result<Option<Post>, RepoError> {
        let Some(path) = self.find_file(identifier) else {
            return Ok(None);
        };

        let slug = identifier.trim_matches('/');
        let source = self.read_post(slug, path, today())?;
        let post = render_post(source)
            .map_err(|e| RepoError::malformed(slug, e))?;
        Ok(Some(post))
    }

    async fn create(&self, _post: NewPost) -> Result<PostRow, RepoError> {
        Err(RepoError::ReadOnly)
    }

    async fn update(&self, _id: &str, _patch: PostPatch) -> Result<PostRow, RepoError> {
        Err(RepoError::ReadOnly)
    }

    async fn delete(&self, _id: &str) -> Result<bool, RepoError> {
        Err(RepoError::ReadOnly)
    }
}

use std::{fs, io};
use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::Value;

use crate::content::front_matter::split_front_matter;
use crate::content::normalizer::normalize;
use crate::content::SourcePost;

pub struct ContentFile {
    pub slug: String,
    pub file_path: PathBuf,
    pub raw_content: String,
}

impl ContentFile {
    pub fn from_file(slug: String, file_path: PathBuf) -> io::Result<ContentFile> {
        let raw_content = fs::read_to_string(&file_path)?;

        Ok(ContentFile {
            slug,
            file_path,
            raw_content,
        })
    }

    pub fn to_source_post(&self, today: NaiveDate) -> io::Result<SourcePost> {
        let (mut raw, markdown) = split_front_matter(&self.file_path, &self.raw_content)?;

        // The path decides the slug and the identifier of a file-backed post
        raw.remove("id");
        raw.remove("published");
        raw.insert("slug".to_string(), Value::String(self.slug.clone()));

        Ok(SourcePost {
            metadata: normalize(&raw, today),
            markdown,
        })
    }
}

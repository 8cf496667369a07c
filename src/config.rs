use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::content::DEFAULT_CATEGORY;

pub const SERVICE_ROLE_KEY_ENV: &str = "POSTFOLIO_SERVICE_ROLE_KEY";

#[derive(Deserialize)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
    pub content_dir: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// TOML catalog of portfolio projects. No file means an empty portfolio.
    #[serde(default)]
    pub portfolio_file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Copy, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Files,
    Database,
    Memory,
}

#[derive(Deserialize)]
pub struct ContentSettings {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_index_base_name")]
    pub index_base_name: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Deserialize)]
pub struct Database {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize)]
pub struct Listing {
    #[serde(default = "default_per_category")]
    pub per_category: usize,
    #[serde(default = "default_preferred_categories")]
    pub preferred_categories: Vec<String>,
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize, Default)]
pub struct Admin {
    pub service_role_key: Option<String>,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub paths: Paths,
    #[serde(default)]
    pub content: ContentSettings,
    pub database: Option<Database>,
    #[serde(default)]
    pub listing: Listing,
    pub server: Server,
    #[serde(default)]
    pub admin: Admin,
    pub log: Option<Log>,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_index_base_name() -> String {
    "index".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "mdx".to_string()]
}

fn default_max_connections() -> u32 {
    5
}

fn default_per_category() -> usize {
    6
}

fn default_preferred_categories() -> Vec<String> {
    // Uncategorized posts come last
    vec!["개발".to_string(), "디자인".to_string(), DEFAULT_CATEGORY.to_string()]
}

fn default_recent_count() -> usize {
    5
}

impl Default for ContentSettings {
    fn default() -> Self {
        ContentSettings {
            backend: Backend::default(),
            index_base_name: default_index_base_name(),
            extensions: default_extensions(),
        }
    }
}

impl Default for Listing {
    fn default() -> Self {
        Listing {
            per_category: default_per_category(),
            preferred_categories: default_preferred_categories(),
            recent_count: default_recent_count(),
        }
    }
}

impl Config {
    /// The admin key. The environment variable wins over the file.
    pub fn service_role_key(&self) -> Option<String> {
        env::var(SERVICE_ROLE_KEY_ENV).ok()
            .or_else(|| self.admin.service_role_key.clone())
            .filter(|key| !key.is_empty())
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("${exe_dir}") else {
        return path;
    };

    match env::current_exe() {
        Ok(cur_exe) => match cur_exe.parent() {
            Some(exe_dir) => exe_dir.join(rest),
            None => path,
        },
        Err(_) => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir),
        public_dir: parse_path(cfg.paths.public_dir),
        content_dir: parse_path(cfg.paths.content_dir),
        export_dir: parse_path(cfg.paths.export_dir),
        portfolio_file: cfg.paths.portfolio_file.map(parse_path),
    };

    if cfg.content.extensions.is_empty() {
        return Err(io::Error::new(ErrorKind::InvalidData, "[content] extensions cannot be empty"));
    }

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

#[cfg(test)]
mod tests {
    use crate::aggregate::category_sections;
    use crate::content::normalizer::normalize;

    use super::*;

    const MINIMAL: &str = r#"
[paths]
template_dir = "res/template"
public_dir = "public"
content_dir = "content/posts"

[server]
address = "127.0.0.1"
port = 8001
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let cfg = parse_config(MINIMAL).unwrap();
        assert_eq!(cfg.content.backend, Backend::Files);
        assert_eq!(cfg.content.index_base_name, "index");
        assert_eq!(cfg.content.extensions, ["md", "mdx"]);
        assert_eq!(cfg.listing.per_category, 6);
        assert_eq!(cfg.listing.recent_count, 5);
        assert_eq!(cfg.listing.preferred_categories, ["개발", "디자인", "일반"]);
        assert!(cfg.listing.preferred_categories.iter().any(|c| c == DEFAULT_CATEGORY));
        assert_eq!(cfg.paths.export_dir, PathBuf::from("dist"));
        assert!(cfg.paths.portfolio_file.is_none());
        assert!(cfg.database.is_none());
        assert!(cfg.log.is_none());
        assert!(cfg.admin.service_role_key.is_none());
    }

    #[test]
    fn test_uncategorized_posts_get_a_preferred_section() {
        let cfg = parse_config(MINIMAL).unwrap();
        let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let raw = |value: serde_json::Value| normalize(value.as_object().unwrap(), today);
        let posts = vec![
            raw(serde_json::json!({"title": "Tagged", "category": "Archive"})),
            raw(serde_json::json!({"title": "Loose"})),
        ];

        let sections = category_sections(&posts, &cfg.listing.preferred_categories, cfg.listing.per_category);
        let order: Vec<_> = sections.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(order, [DEFAULT_CATEGORY, "Archive"]);
    }

    #[test]
    fn test_full_config() {
        let content = format!(r#"{}
[content]
backend = "database"
extensions = ["md"]

[database]
url = "postgres://localhost/blog"

[listing]
per_category = 3
preferred_categories = ["Dev"]

[admin]
service_role_key = "secret"

[log]
level = "Info"
log_to_console = true
"#, MINIMAL);
        let cfg = parse_config(&content).unwrap();
        assert_eq!(cfg.content.backend, Backend::Database);
        assert_eq!(cfg.content.extensions, ["md"]);
        assert_eq!(cfg.database.as_ref().unwrap().max_connections, 5);
        assert_eq!(cfg.listing.per_category, 3);
        assert_eq!(cfg.listing.recent_count, 5);
        assert_eq!(cfg.admin.service_role_key.as_deref(), Some("secret"));
        assert!(cfg.log.as_ref().unwrap().log_to_console);
    }

    #[test]
    fn test_portfolio_file() {
        let content = MINIMAL.replace(
            "content_dir = \"content/posts\"",
            "content_dir = \"content/posts\"\nportfolio_file = \"${exe_dir}/portfolio.toml\"");
        let cfg = parse_config(&content).unwrap();
        let path = cfg.paths.portfolio_file.unwrap();
        assert!(path.ends_with("portfolio.toml"));
        assert!(!path.to_string_lossy().contains("${exe_dir}"));
    }

    #[test]
    fn test_bad_backend() {
        let content = format!("{}\n[content]\nbackend = \"sqlite\"\n", MINIMAL);
        let err = parse_config(&content).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_exe_dir_expansion() {
        let path = parse_path(PathBuf::from("${exe_dir}/template"));
        assert!(path.ends_with("template"));
        assert!(!path.to_string_lossy().contains("${exe_dir}"));

        assert_eq!(parse_path(PathBuf::from("relative/dir")), PathBuf::from("relative/dir"));
    }
}

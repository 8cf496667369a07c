use std::fmt::{Display, Formatter, Write};
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use serde::Serialize;

use postfolio::slug::derive_slug;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Title of the post. Required for file and dir outputs
    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    category: Option<String>,

    /// Comma separated tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Post generation options
    #[arg(short, long, default_value_t = PostOutput::Stdout)]
    output: PostOutput,
}

#[derive(Clone, Debug, ValueEnum)]
enum PostOutput {
    /// Writes the new post content to the stdout
    Stdout,
    /// Writes the new post content to `<slug>.md` (posts without images)
    File,
    /// Writes the new post content to `<slug>/index.md` (posts with images)
    Dir,
}

impl Display for PostOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PostOutput::Stdout => "stdout",
            PostOutput::File => "file",
            PostOutput::Dir => "dir",
        };
        write!(f, "{}", name)
    }
}

/// Only the fields a file-backed post reads. The path gives its identifier.
#[derive(Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    date: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tags: &'a [String],
}

fn render_header(front_matter: &FrontMatter) -> Result<String> {
    let yaml = serde_yaml::to_string(front_matter)?;
    let yaml = yaml.strip_prefix("---\n").unwrap_or(&yaml);

    let mut buf = String::new();
    writeln!(&mut buf, "---")?;
    write!(&mut buf, "{}", yaml)?;
    if !yaml.ends_with('\n') {
        writeln!(&mut buf)?;
    }
    writeln!(&mut buf, "---")?;
    Ok(buf)
}

fn render_body() -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "This is a body example");
    let _ = writeln!(&mut buf, "Please remove it and replace with your content");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "## A section");
    let _ = writeln!(&mut buf);
    let _ = writeln!(&mut buf, "And this is the rest of your post");

    buf
}

fn output_path(output: &PostOutput, slug: &str) -> Option<PathBuf> {
    match output {
        PostOutput::Stdout => None,
        PostOutput::File => Some(PathBuf::from(format!("{}.md", slug))),
        PostOutput::Dir => Some(PathBuf::from(slug).join("index.md")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let title = match (&args.output, args.title.as_deref()) {
        (PostOutput::Stdout, title) => title.unwrap_or("Replace with title"),
        (_, Some(title)) => title,
        (_, None) => return Err(anyhow!("For file and dir outputs, title is required")),
    };

    let slug = derive_slug(title);
    if slug.is_empty() {
        return Err(anyhow!("The title {:?} has no characters usable in a slug", title));
    }

    let date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let header = render_header(&FrontMatter {
        title,
        date: &date,
        category: args.category.as_deref(),
        tags: &args.tags,
    })?;
    let content = format!("{}{}", header, render_body());

    match output_path(&args.output, &slug) {
        None => print!("{}", content),
        Some(path) => {
            if path.exists() {
                return Err(anyhow!("{} already exists", path.display()));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Error creating directory {}", parent.display()))?;
            }
            println!("Creating post {}", path.display());
            fs::write(&path, content)
                .with_context(|| format!("Error writing {}", path.display()))?;
        }
    }

    Ok(())
}

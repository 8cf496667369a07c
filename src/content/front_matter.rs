use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::str::Lines;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::content::RawMetadata;

const FENCE: &str = "---";

/// Splits a content file into its metadata block and its markdown body.
///
/// Two header styles are understood: a YAML block between `---` lines, and the
/// link-reference style (`[DATE]: # (2024-01-15)`) where a following `# Heading`
/// gives the title. A file with neither is all body.
pub fn split_front_matter(file_name: &Path, content: &str) -> io::Result<(RawMetadata, String)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    if let Some((yaml, body)) = yaml_block(file_name, content)? {
        let raw = parse_yaml(file_name, yaml)?;
        return Ok((raw, body.to_string()));
    }

    if let Some((raw, body)) = link_header(file_name, content.lines())? {
        return Ok((raw, body));
    }

    Ok((RawMetadata::new(), content.to_string()))
}

fn yaml_block<'a>(file_name: &Path, content: &'a str) -> io::Result<Option<(&'a str, &'a str)>> {
    let mut lines = content.split_inclusive('\n');
    let first = match lines.next() {
        Some(line) if line.trim_end() == FENCE => line,
        _ => return Ok(None),
    };

    let mut offset = first.len();
    for line in lines {
        if line.trim_end() == FENCE {
            let yaml = &content[first.len()..offset];
            let body = &content[offset + line.len()..];
            return Ok(Some((yaml, body)));
        }
        offset += line.len();
    }

    Err(io::Error::new(
        ErrorKind::InvalidData,
        format!("Missing closing `---` in the front matter - file={}", file_name.display()),
    ))
}

fn parse_yaml(file_name: &Path, yaml: &str) -> io::Result<RawMetadata> {
    if yaml.trim().is_empty() {
        return Ok(RawMetadata::new());
    }

    let value: Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("Invalid front matter: {} - file={}", e, file_name.display()),
        )),
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(RawMetadata::new()),
        _ => Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("Front matter is not a mapping - file={}", file_name.display()),
        )),
    }
}

fn link_header(file_name: &Path, lines: Lines) -> io::Result<Option<(RawMetadata, String)>> {
    let mut raw = RawMetadata::new();
    let mut lines = lines;
    let mut maybe_line = lines.next();

    // Skip optional HTML comment in the beginning
    let mut start_with_comment = false;

    while let Some(line) = maybe_line {
        let line = line.trim();

        // Empty lines are ok
        if line.is_empty() {
            maybe_line = lines.next();
            continue;
        }

        if line == "<!--" {
            maybe_line = lines.next();
            start_with_comment = true;
        }
        break;
    }

    while let Some(line) = maybe_line {
        if line.trim().is_empty() {
            maybe_line = lines.next();
            continue;
        }

        let (key, val) = match extract_header(line) {
            None => break,
            Some((k, v)) => (k.to_lowercase(), v.trim()),
        };

        let val = match key.as_str() {
            "tags" => Value::Array(extract_tags(val).into_iter().map(Value::String).collect()),
            _ => Value::String(val.to_string()),
        };
        raw.insert(key, val);

        maybe_line = lines.next();
    }

    if raw.is_empty() {
        return Ok(None);
    }

    if start_with_comment {
        // Let's find the end of the comment
        loop {
            match maybe_line {
                Some(line) if line.trim() == "-->" => {
                    maybe_line = lines.next();
                    break;
                }
                Some(_) => maybe_line = lines.next(),
                None => return Err(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("End of comment in the header is missing - file={}", file_name.display()),
                )),
            }
        }
    }

    // After the header, comes the title
    while let Some(line) = maybe_line {
        if !line.trim().is_empty() {
            break;
        }
        maybe_line = lines.next();
    }

    if let Some(line) = maybe_line {
        if let Some(title) = line.strip_prefix("# ") {
            if !raw.contains_key("title") {
                raw.insert("title".to_string(), Value::String(title.trim().to_string()));
            }
            maybe_line = lines.next();
        }
    }

    let mut body = String::new();
    while let Some(line) = maybe_line {
        body.push_str(line);
        body.push('\n');
        maybe_line = lines.next();
    }

    Ok(Some((raw, body)))
}

fn extract_tags(tags_str: &str) -> Vec<String> {
    tags_str.split(' ')
        .filter(|x| !x.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn extract_header(line: &str) -> Option<(&str, &str)> {
    lazy_static! {
        static ref HEADER_REGEX: Regex = Regex::new(r"^\[(?P<key>\w+)\]: # \((?P<value>.*)\)\s*$").unwrap();
    }

    HEADER_REGEX.captures(line).and_then(|cap| {
        let key = cap.name("key").map(|key| key.as_str());
        let val = cap.name("value").map(|val| val.as_str());
        match (key, val) {
            (Some(key), Some(val)) => Some((key, val)),
            _ => None
        }
    })
}

use std::collections::HashMap;
use std::mem;

use markdown::mdast::{Image, Link, Node};
use markdown::ParseOptions;
use thiserror::Error;

use crate::content::{Post, SourcePost};
use crate::render::highlight::highlight;
use crate::render::html_tree::{serialize, to_html_tree};

pub mod highlight;
pub mod html_tree;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid markdown: {0}")]
    Parse(String),
}

type Definitions = HashMap<String, (String, Option<String>)>;

/// Markdown to mdast, with the GFM extensions on.
pub fn parse(markdown: &str) -> Result<Node, RenderError> {
    markdown::to_mdast(markdown, &ParseOptions::gfm())
        .map_err(|e| RenderError::Parse(e.reason))
}

/// Resolves reference links and images and drops their definitions.
pub fn enrich(mut tree: Node) -> Node {
    let mut definitions = Definitions::new();
    collect_definitions(&tree, &mut definitions);
    resolve_references(&mut tree, &definitions);
    tree
}

fn collect_definitions(node: &Node, definitions: &mut Definitions) {
    if let Node::Definition(def) = node {
        // First definition wins
        definitions.entry(def.identifier.clone())
            .or_insert_with(|| (def.url.clone(), def.title.clone()));
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, definitions);
        }
    }
}

fn resolve_references(node: &mut Node, definitions: &Definitions) {
    let Some(children) = node.children_mut() else { return };
    children.retain(|child| !matches!(child, Node::Definition(_)));

    for child in children.iter_mut() {
        let resolved = match child {
            Node::LinkReference(r) => definitions.get(&r.identifier).map(|(url, title)| {
                Node::Link(Link {
                    children: mem::take(&mut r.children),
                    position: r.position.take(),
                    url: url.clone(),
                    title: title.clone(),
                })
            }),
            Node::ImageReference(r) => definitions.get(&r.identifier).map(|(url, title)| {
                Node::Image(Image {
                    alt: r.alt.clone(),
                    position: r.position.take(),
                    url: url.clone(),
                    title: title.clone(),
                })
            }),
            _ => None,
        };
        if let Some(node) = resolved {
            *child = node;
        }
        resolve_references(child, definitions);
    }
}

/// Runs the whole chain: parse, enrich, HTML tree, highlight, serialize.
pub fn render(markdown: &str) -> Result<String, RenderError> {
    let tree = enrich(parse(markdown)?);
    let html = highlight(to_html_tree(&tree));
    Ok(serialize(&html))
}

pub fn render_post(source: SourcePost) -> Result<Post, RenderError> {
    let html = render(&source.markdown)?;
    Ok(Post {
        metadata: source.metadata,
        html,
    })
}

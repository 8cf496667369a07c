use lazy_static::lazy_static;
use spdlog::warn;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::render::html_tree::{Element, HtmlNode};

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

lazy_static! {
    static ref SYNTAXES: SyntaxSet = SyntaxSet::load_defaults_newlines();
}

/// Classed spans for `source`, or `None` when the language is unknown.
fn highlight_source(language: &str, source: &str) -> Option<String> {
    let syntax = SYNTAXES.find_syntax_by_token(language)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, CLASS_STYLE);

    for line in LinesWithEndings::from(source) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            warn!("Error highlighting a {} block. Leaving it plain: {}", language, e);
            return None;
        }
    }
    Some(generator.finalize())
}

fn highlight_code(code: &mut Element) {
    let language = code.classes()
        .find_map(|c| c.strip_prefix("language-"))
        .map(|l| l.to_string());
    code.prepend_class("hljs");

    let Some(language) = language else { return };
    if let Some(markup) = highlight_source(&language, &code.text_content()) {
        code.children = vec![HtmlNode::Raw(markup)];
    }
}

fn highlight_node(node: HtmlNode) -> HtmlNode {
    match node {
        HtmlNode::Element(mut el) => {
            if el.tag == "pre" {
                for child in el.children.iter_mut() {
                    if let HtmlNode::Element(code) = child {
                        if code.tag == "code" {
                            highlight_code(code);
                        }
                    }
                }
            } else {
                el.children = el.children.into_iter().map(highlight_node).collect();
            }
            HtmlNode::Element(el)
        }
        other => other,
    }
}

/// Marks every `pre > code` block with `hljs` and hands the blocks of a known
/// language to syntect, which splits them into `hljs-*` scope spans.
pub fn highlight(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    nodes.into_iter().map(highlight_node).collect()
}

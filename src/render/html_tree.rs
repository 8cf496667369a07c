use std::collections::HashMap;

use markdown::mdast::{AlignKind, List, ListItem, Node, Table};

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
    /// Markup that is already escaped, written out as is.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<HtmlNode>,
}

const VOID_ELEMENTS: [&str; 4] = ["br", "hr", "img", "input"];
const BOOLEAN_ATTRS: [&str; 2] = ["checked", "disabled"];
const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Element {
            tag,
            attrs: vec![],
            children: vec![],
        }
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn with_children(mut self, children: Vec<HtmlNode>) -> Self {
        self.children = children;
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn classes(&self) -> impl Iterator<Item=&str> {
        self.get_attr("class")
            .unwrap_or("")
            .split_whitespace()
    }

    /// Puts `class` first in the class list, if not there yet.
    pub fn prepend_class(&mut self, class: &str) {
        if self.classes().any(|c| c == class) {
            return;
        }
        match self.attrs.iter_mut().find(|(n, _)| *n == "class") {
            Some((_, value)) => *value = format!("{} {}", class, value),
            None => self.attrs.push(("class", class.to_string())),
        }
    }

    pub fn text_content(&self) -> String {
        let mut buf = String::new();
        for child in &self.children {
            match child {
                HtmlNode::Text(text) => buf.push_str(text),
                HtmlNode::Element(el) => buf.push_str(&el.text_content()),
                HtmlNode::Raw(_) => {}
            }
        }
        buf
    }
}

impl From<Element> for HtmlNode {
    fn from(value: Element) -> Self {
        HtmlNode::Element(value)
    }
}

fn text(value: &str) -> HtmlNode {
    HtmlNode::Text(value.to_string())
}

fn newline() -> HtmlNode {
    text("\n")
}

fn safe_url(url: &str) -> String {
    let scheme: String = url.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if UNSAFE_SCHEMES.iter().any(|s| scheme.starts_with(s)) {
        return String::new();
    }
    url.to_string()
}

#[derive(Default)]
struct TreeBuilder {
    footnote_order: Vec<String>,
    footnote_bodies: HashMap<String, Vec<HtmlNode>>,
}

/// mdast -> HTML tree. Raw HTML found in the markdown is dropped.
pub fn to_html_tree(root: &Node) -> Vec<HtmlNode> {
    let mut builder = TreeBuilder::default();
    let children = match root.children() {
        Some(children) => children.as_slice(),
        None => std::slice::from_ref(root),
    };
    let mut nodes = builder.flow(children);
    builder.append_footnotes(&mut nodes);
    nodes
}

impl TreeBuilder {
    fn flow(&mut self, nodes: &[Node]) -> Vec<HtmlNode> {
        let mut out = vec![];
        for node in nodes {
            if let Some(html) = self.node(node) {
                out.push(html);
                out.push(newline());
            }
        }
        out
    }

    fn phrasing(&mut self, nodes: &[Node]) -> Vec<HtmlNode> {
        nodes.iter()
            .filter_map(|node| self.node(node))
            .collect()
    }

    fn element(&mut self, tag: &'static str, children: &[Node]) -> HtmlNode {
        let children = self.phrasing(children);
        Element::new(tag).with_children(children).into()
    }

    fn node(&mut self, node: &Node) -> Option<HtmlNode> {
        let html = match node {
            Node::Paragraph(p) => self.element("p", &p.children),
            Node::Heading(h) => {
                let tag = match h.depth {
                    1 => "h1",
                    2 => "h2",
                    3 => "h3",
                    4 => "h4",
                    5 => "h5",
                    _ => "h6",
                };
                self.element(tag, &h.children)
            }
            Node::Text(t) => text(&t.value),
            Node::Emphasis(e) => self.element("em", &e.children),
            Node::Strong(s) => self.element("strong", &s.children),
            Node::Delete(d) => self.element("del", &d.children),
            Node::InlineCode(c) => Element::new("code").with_children(vec![text(&c.value)]).into(),
            Node::Break(_) => Element::new("br").into(),
            Node::ThematicBreak(_) => Element::new("hr").into(),
            Node::Blockquote(b) => {
                let mut children = vec![newline()];
                children.extend(self.flow(&b.children));
                Element::new("blockquote").with_children(children).into()
            }
            Node::Code(c) => {
                let mut code = Element::new("code");
                if let Some(ref lang) = c.lang {
                    code = code.attr("class", format!("language-{}", lang));
                }
                let code = code.with_children(vec![HtmlNode::Text(format!("{}\n", c.value))]);
                Element::new("pre").with_children(vec![code.into()]).into()
            }
            Node::Link(l) => {
                let mut a = Element::new("a").attr("href", safe_url(&l.url));
                if let Some(ref title) = l.title {
                    a = a.attr("title", title.clone());
                }
                let children = self.phrasing(&l.children);
                a.with_children(children).into()
            }
            Node::Image(i) => {
                let mut img = Element::new("img")
                    .attr("src", safe_url(&i.url))
                    .attr("alt", i.alt.clone());
                if let Some(ref title) = i.title {
                    img = img.attr("title", title.clone());
                }
                img.into()
            }
            Node::List(l) => self.list(l),
            Node::Table(t) => self.table(t),
            Node::FootnoteReference(f) => self.footnote_reference(&f.identifier),
            Node::FootnoteDefinition(f) => {
                let body = self.flow(&f.children);
                self.footnote_bodies.entry(f.identifier.clone()).or_insert(body);
                return None;
            }
            // Only left when no definition matched
            Node::LinkReference(r) => {
                let mut children = vec![text("[")];
                children.extend(self.phrasing(&r.children));
                children.push(text("]"));
                Element::new("span").with_children(children).into()
            }
            Node::ImageReference(r) => text(&r.alt),
            _ => return None,
        };
        Some(html)
    }

    fn list(&mut self, list: &List) -> HtmlNode {
        let loose = list.spread || list.children.iter().any(|child| match child {
            Node::ListItem(item) => item.spread,
            _ => false,
        });

        let mut el = Element::new(if list.ordered { "ol" } else { "ul" });
        if list.ordered {
            if let Some(start) = list.start {
                if start != 1 {
                    el = el.attr("start", start.to_string());
                }
            }
        }

        let mut children = vec![newline()];
        for child in &list.children {
            if let Node::ListItem(item) = child {
                children.push(self.list_item(item, loose));
                children.push(newline());
            }
        }
        el.with_children(children).into()
    }

    fn list_item(&mut self, item: &ListItem, loose: bool) -> HtmlNode {
        let mut li = Element::new("li");
        let mut children = vec![];

        if let Some(checked) = item.checked {
            li = li.attr("class", "task-list-item");
            let mut input = Element::new("input")
                .attr("type", "checkbox")
                .attr("disabled", "");
            if checked {
                input = input.attr("checked", "");
            }
            children.push(input.into());
            children.push(text(" "));
        }

        if loose {
            children.push(newline());
            children.extend(self.flow(&item.children));
        } else {
            // Tight items show their paragraphs inline
            for (idx, child) in item.children.iter().enumerate() {
                if idx > 0 {
                    children.push(newline());
                }
                match child {
                    Node::Paragraph(p) => {
                        let inline = self.phrasing(&p.children);
                        children.extend(inline);
                    }
                    other => {
                        if let Some(html) = self.node(other) {
                            children.push(html);
                        }
                    }
                }
            }
            if let Some(last) = item.children.last() {
                if !matches!(last, Node::Paragraph(_)) {
                    children.push(newline());
                }
            }
        }

        li.with_children(children).into()
    }

    fn table(&mut self, table: &Table) -> HtmlNode {
        let mut head = vec![];
        let mut body = vec![];

        for (row_idx, row) in table.children.iter().enumerate() {
            let Node::TableRow(row) = row else { continue };
            let cell_tag = if row_idx == 0 { "th" } else { "td" };

            let mut cells = vec![newline()];
            for (cell_idx, cell) in row.children.iter().enumerate() {
                let Node::TableCell(cell) = cell else { continue };
                let mut el = Element::new(cell_tag);
                match table.align.get(cell_idx) {
                    Some(AlignKind::Left) => el = el.attr("align", "left"),
                    Some(AlignKind::Right) => el = el.attr("align", "right"),
                    Some(AlignKind::Center) => el = el.attr("align", "center"),
                    _ => {}
                }
                let children = self.phrasing(&cell.children);
                cells.push(el.with_children(children).into());
                cells.push(newline());
            }

            let tr: HtmlNode = Element::new("tr").with_children(cells).into();
            if row_idx == 0 {
                head.push(newline());
                head.push(tr);
                head.push(newline());
            } else {
                body.push(newline());
                body.push(tr);
            }
        }

        let mut children = vec![newline(), Element::new("thead").with_children(head).into(), newline()];
        if !body.is_empty() {
            body.push(newline());
            children.push(Element::new("tbody").with_children(body).into());
            children.push(newline());
        }
        Element::new("table").with_children(children).into()
    }

    fn footnote_reference(&mut self, identifier: &str) -> HtmlNode {
        let index = match self.footnote_order.iter().position(|id| id == identifier) {
            Some(pos) => pos + 1,
            None => {
                self.footnote_order.push(identifier.to_string());
                self.footnote_order.len()
            }
        };

        let a = Element::new("a")
            .attr("href", format!("#fn-{}", identifier))
            .attr("id", format!("fnref-{}", identifier))
            .with_children(vec![HtmlNode::Text(index.to_string())]);
        Element::new("sup").with_children(vec![a.into()]).into()
    }

    fn append_footnotes(&mut self, nodes: &mut Vec<HtmlNode>) {
        let mut items = vec![newline()];
        for identifier in &self.footnote_order {
            let Some(body) = self.footnote_bodies.get(identifier) else { continue };
            let mut children = vec![newline()];
            children.extend(body.iter().cloned());
            children.push(Element::new("a")
                .attr("href", format!("#fnref-{}", identifier))
                .attr("class", "footnote-backref")
                .with_children(vec![text("↩")])
                .into());
            children.push(newline());
            items.push(Element::new("li")
                .attr("id", format!("fn-{}", identifier))
                .with_children(children)
                .into());
            items.push(newline());
        }

        if items.len() == 1 {
            return;
        }

        let section = Element::new("section")
            .attr("class", "footnotes")
            .with_children(vec![
                newline(),
                Element::new("h2").with_children(vec![text("Footnotes")]).into(),
                newline(),
                Element::new("ol").with_children(items).into(),
                newline(),
            ]);
        nodes.push(section.into());
        nodes.push(newline());
    }
}

fn escape(value: &str, out: &mut String, quote: bool) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

fn write_node(node: &HtmlNode, out: &mut String) {
    match node {
        HtmlNode::Text(value) => escape(value, out, false),
        HtmlNode::Raw(markup) => out.push_str(markup),
        HtmlNode::Element(el) => {
            out.push('<');
            out.push_str(el.tag);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                if BOOLEAN_ATTRS.contains(name) && value.is_empty() {
                    continue;
                }
                out.push_str("=\"");
                escape(value, out, true);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&el.tag) {
                return;
            }

            for child in &el.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(el.tag);
            out.push('>');
        }
    }
}

pub fn serialize(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use markdown::ParseOptions;

    use super::*;

    fn to_html(md: &str) -> String {
        let tree = markdown::to_mdast(md, &ParseOptions::gfm()).unwrap();
        serialize(&to_html_tree(&tree))
    }

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!(to_html("Some *soft* and **strong** ~~gone~~ text"),
                   "<p>Some <em>soft</em> and <strong>strong</strong> <del>gone</del> text</p>\n");
    }

    #[test]
    fn test_headings_and_rule() {
        assert_eq!(to_html("# One\n\n### Three\n\n---\n"), "<h1>One</h1>\n<h3>Three</h3>\n<hr>\n");
    }

    #[test]
    fn test_code_block() {
        assert_eq!(to_html("```sh\nls -la\n```\n"), "<pre><code class=\"language-sh\">ls -la\n</code></pre>\n");
        assert_eq!(to_html("`a < b`"), "<p><code>a &lt; b</code></p>\n");
    }

    #[test]
    fn test_tight_lists() {
        assert_eq!(to_html("- a\n- b\n"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
        assert_eq!(to_html("3. c\n4. d\n"), "<ol start=\"3\">\n<li>c</li>\n<li>d</li>\n</ol>\n");
    }

    #[test]
    fn test_task_list() {
        let html = to_html("- [x] done\n- [ ] todo\n");
        assert!(html.contains("<li class=\"task-list-item\"><input type=\"checkbox\" disabled checked>"));
        assert!(html.contains("<li class=\"task-list-item\"><input type=\"checkbox\" disabled>"));
        assert!(html.contains("done</li>"));
    }

    #[test]
    fn test_table() {
        let html = to_html("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        assert_eq!(html, "<table>\n<thead>\n<tr>\n<th align=\"left\">a</th>\n<th align=\"right\">b</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td align=\"left\">1</td>\n<td align=\"right\">2</td>\n</tr>\n</tbody>\n</table>\n");
    }

    #[test]
    fn test_raw_html_is_dropped() {
        let html = to_html("<script>alert(1)</script>\n\nText <b>bold</b>\n");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("<p>Text bold</p>"));
    }

    #[test]
    fn test_unsafe_links_are_blanked() {
        assert_eq!(to_html("[x](javascript:alert(1))"), "<p><a href=\"\">x</a></p>\n");
        assert_eq!(to_html("[x](https://example.com \"Ex\")"), "<p><a href=\"https://example.com\" title=\"Ex\">x</a></p>\n");
        assert_eq!(to_html("![alt](/a.png)"), "<p><img src=\"/a.png\" alt=\"alt\"></p>\n");
    }

    #[test]
    fn test_footnotes() {
        let html = to_html("Text[^note].\n\n[^note]: The note.\n");
        assert!(html.contains("<sup><a href=\"#fn-note\" id=\"fnref-note\">1</a></sup>"));
        assert!(html.contains("<section class=\"footnotes\">"));
        assert!(html.contains("<li id=\"fn-note\">\n<p>The note.</p>\n<a href=\"#fnref-note\" class=\"footnote-backref\">↩</a>\n</li>"));
    }

    #[test]
    fn test_prepend_class() {
        let mut el = Element::new("code").attr("class", "language-rust");
        el.prepend_class("hljs");
        el.prepend_class("hljs");
        assert_eq!(el.get_attr("class"), Some("hljs language-rust"));

        let mut el = Element::new("code");
        el.prepend_class("hljs");
        assert_eq!(el.get_attr("class"), Some("hljs"));
    }
}

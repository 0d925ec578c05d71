//! Boundary to the external HTML parser.
//!
//! The core consumes already-parsed rcdom trees and never mutates them.
//! Everything here is a thin helper over `markup5ever_rcdom::Handle`.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

pub fn html5_parse(input: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(input)
}

pub fn tag_lower(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string().to_ascii_lowercase()),
        _ => None,
    }
}

pub fn attrs_vec(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn attr_get(attrs: &[(String, String)], name: &str) -> Option<String> {
    for (k, v) in attrs {
        if k.eq_ignore_ascii_case(name) {
            return Some(v.to_string());
        }
    }
    None
}

/// Concatenated text of the node's whole subtree, in document order.
pub fn flatten_text(node: &Handle) -> String {
    let mut out = String::new();
    fn walk(node: &Handle, out: &mut String) {
        if let NodeData::Text { contents } = &node.data {
            out.push_str(&contents.borrow());
        }
        for c in node.children.borrow().iter() {
            walk(c, out);
        }
    }
    walk(node, &mut out);
    out
}

/// Collects every descendant element named `name`, in document order.
pub fn find_elements(node: &Handle, name: &str, out: &mut Vec<Handle>) {
    if tag_lower(node).as_deref() == Some(name) {
        out.push(node.clone());
    }
    for c in node.children.borrow().iter() {
        find_elements(c, name, out);
    }
}

/// Splits the input text at each top-level `<html` tag occurrence.
///
/// html5ever folds sibling `<html>` elements into a single tree, so inputs
/// carrying several roots have to be cut apart lexically before parsing.
/// An input with no `<html>` tag is treated as one root.
pub fn split_roots(input: &str) -> Vec<&str> {
    let lower = input.to_ascii_lowercase();
    let mut starts: Vec<usize> = Vec::new();
    let mut from = 0usize;
    while let Some(rel) = lower[from..].find("<html") {
        let at = from + rel;
        // Require a real tag boundary so "<htmlx" is not a root.
        let boundary = match lower.as_bytes().get(at + 5) {
            Some(b) => !b.is_ascii_alphanumeric(),
            None => true,
        };
        if boundary {
            starts.push(at);
        }
        from = at + 5;
    }
    if starts.is_empty() {
        return vec![input];
    }
    let mut chunks = Vec::with_capacity(starts.len());
    for (i, &s) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(input.len());
        chunks.push(&input[s..end]);
    }
    chunks
}

/// One parsed root chunk. Dropping the backing `RcDom` strips the children
/// of every node in the tree, so this keeps it alive for as long as the
/// subtree is walked.
pub struct ParsedRoot {
    dom: RcDom,
}

impl ParsedRoot {
    pub fn parse(chunk: &str) -> ParsedRoot {
        ParsedRoot {
            dom: html5_parse(chunk),
        }
    }

    /// The chunk's `<html>` element node (the document node if the parser
    /// produced none).
    pub fn root(&self) -> Handle {
        let mut found: Vec<Handle> = Vec::new();
        find_elements(&self.dom.document, "html", &mut found);
        found.into_iter().next().unwrap_or_else(|| self.dom.document.clone())
    }
}

/// Text of the first `<style>` element found across the given roots.
pub fn style_text(roots: &[ParsedRoot]) -> Option<String> {
    for root in roots {
        let mut styles: Vec<Handle> = Vec::new();
        find_elements(&root.root(), "style", &mut styles);
        if let Some(style) = styles.first() {
            return Some(flatten_text(style));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_roots() {
        let input = "<html><body><p>a</p></body></html><html><body><p>b</p></body></html>";
        let chunks = split_roots(input);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("<p>a</p>"));
        assert!(chunks[1].contains("<p>b</p>"));
    }

    #[test]
    fn bare_fragment_is_one_root() {
        let chunks = split_roots("<p>hello</p>");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn html_prefix_in_longer_name_is_not_a_root() {
        let chunks = split_roots("<htmlish>x</htmlish>");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "<htmlish>x</htmlish>");
    }

    #[test]
    fn finds_style_text() {
        let parsed = ParsedRoot::parse("<html><head><style>p { color: red; }</style></head></html>");
        let css = style_text(&[parsed]).unwrap();
        assert!(css.contains("color: red"));
    }

    #[test]
    fn flattens_nested_text() {
        let parsed = ParsedRoot::parse("<html><body><p>a<b>b<i>c</i></b></p></body></html>");
        let mut ps = Vec::new();
        find_elements(&parsed.root(), "p", &mut ps);
        assert_eq!(flatten_text(&ps[0]), "abc");
    }

    #[test]
    fn root_subtree_stays_populated_while_parse_is_alive() {
        let parsed = ParsedRoot::parse(
            "<html><head><style>p {}</style></head><body><p>x</p><table><tr><td>c</td></tr></table></body></html>",
        );
        let root = parsed.root();
        assert!(!root.children.borrow().is_empty());
        let mut ps = Vec::new();
        find_elements(&root, "p", &mut ps);
        assert_eq!(ps.len(), 1);
        let mut styles = Vec::new();
        find_elements(&root, "style", &mut styles);
        assert_eq!(styles.len(), 1);
    }
}

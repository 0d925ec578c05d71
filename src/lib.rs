//! html2docx converts structured HTML into a styled DOCX document and,
//! through an external converter, into a fixed-layout PDF.
//!
//! The transformation walks the parsed tag tree into a [`StructuredDocument`]
//! (headings, paragraphs with bold/line-break runs, tables with a synthetic
//! header row, sized images, page breaks between `<html>` roots), then
//! re-applies a minimal inline CSS rule set over the finished document
//! before it is serialized once.

pub mod convert;
pub mod document;
pub mod docx;
pub mod dom;
pub mod error;
pub mod style;
pub mod walker;

use log::debug;

pub use document::StructuredDocument;
pub use error::{Error, Result};

/// Builds the structured document from input text: split roots, walk each
/// into blocks (page breaks between roots), then resolve `<style>` rules
/// against the materialized blocks.
pub fn build_document(input: &str, marker: &str) -> Result<StructuredDocument> {
    if input.trim().is_empty() {
        return Err(Error::EmptyInput);
    }

    // The parsed roots stay alive until traversal and style resolution are
    // both done; their subtrees are emptied when the backing dom drops.
    let roots: Vec<_> = dom::split_roots(input)
        .into_iter()
        .map(dom::ParsedRoot::parse)
        .collect();
    debug!("parsed {} document root(s)", roots.len());

    let mut doc = StructuredDocument::with_marker(marker);
    for (i, parsed) in roots.iter().enumerate() {
        if i > 0 {
            doc.push(document::Block::PageBreak);
        }
        walker::append_root(&mut doc, &parsed.root())?;
    }

    if let Some(css) = dom::style_text(&roots) {
        let rules = style::parse_rules(&css);
        style::apply_rules(&mut doc, &rules);
    }

    Ok(doc)
}

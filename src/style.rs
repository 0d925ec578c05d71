//! Style resolver: a minimal CSS rule table applied as a post-pass over the
//! materialized document.
//!
//! Rules are parsed into a typed selector plus a declaration list; malformed
//! groups and declarations are skipped, never fatal. Application is
//! last-write-wins in declaration order, with no specificity computation.

use log::debug;

use crate::document::{Alignment, Block, StructuredDocument};

/// The category of a rule target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Exact `table` selector. Reserved; currently applies nothing.
    Table,
    /// A `.class` selector. Matches paragraphs whose assigned style name
    /// equals the class name.
    Class(String),
    /// An `h<digits>` selector. Matches headings at exactly that level.
    Heading(u8),
    /// A `th` selector. Matches every non-empty header-row cell of every
    /// table.
    HeaderCell,
}

impl Selector {
    fn parse(s: &str) -> Option<Selector> {
        if s == "table" {
            return Some(Selector::Table);
        }
        if s == "th" {
            return Some(Selector::HeaderCell);
        }
        if let Some(class) = s.strip_prefix('.') {
            if !class.is_empty() {
                return Some(Selector::Class(class.to_string()));
            }
            return None;
        }
        if let Some(digits) = s.strip_prefix('h') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(level) = digits.parse::<u8>() {
                    return Some(Selector::Heading(level));
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct CssRule {
    pub selector: Selector,
    /// `property -> value` pairs in declaration order.
    pub declarations: Vec<(String, String)>,
}

/// Parses a style block into a rule table. Groups are `}`-delimited, each
/// split on `{` into selector and `;`-delimited declarations; anything that
/// fails to split cleanly is dropped.
pub fn parse_rules(css: &str) -> Vec<CssRule> {
    let mut rules = Vec::new();
    for group in css.split('}') {
        let mut parts = group.trim().splitn(2, '{');
        let (Some(selector), Some(body)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(selector) = Selector::parse(selector.trim()) else {
            continue;
        };
        let mut declarations = Vec::new();
        for decl in body.split(';') {
            let pieces: Vec<&str> = decl.split(':').collect();
            if pieces.len() == 2 {
                declarations.push((pieces[0].trim().to_string(), pieces[1].trim().to_string()));
            }
        }
        rules.push(CssRule {
            selector,
            declarations,
        });
    }
    debug!("parsed {} style rules", rules.len());
    rules
}

/// Applies the rule table to the finished document, mutating alignment and
/// appearance fields in place. Never adds or removes blocks.
pub fn apply_rules(doc: &mut StructuredDocument, rules: &[CssRule]) {
    for rule in rules {
        for (name, value) in &rule.declarations {
            apply_declaration(doc, &rule.selector, name, value);
        }
    }
}

fn apply_declaration(doc: &mut StructuredDocument, selector: &Selector, name: &str, value: &str) {
    match selector {
        // Reserved for table-wide styling; intentionally applies nothing.
        Selector::Table => {}
        Selector::Class(class) => {
            if let Some(alignment) = text_align(name, value) {
                for block in &mut doc.blocks {
                    if let Block::Paragraph(p) = block {
                        if p.style_name.as_deref() == Some(class) {
                            p.alignment = alignment;
                        }
                    }
                }
            }
        }
        Selector::Heading(level) => {
            if let Some(alignment) = text_align(name, value) {
                for block in &mut doc.blocks {
                    if let Block::Heading(h) = block {
                        if h.level == *level {
                            h.alignment = alignment;
                        }
                    }
                }
            }
        }
        // Any `th` declaration centers the non-empty header cells,
        // regardless of property name or value.
        Selector::HeaderCell => {
            for block in &mut doc.blocks {
                if let Block::Table(t) = block {
                    if let Some(row) = t.header_row_mut() {
                        for cell in &mut row.cells {
                            if !cell.text.trim().is_empty() {
                                cell.alignment = Alignment::Center;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Only `text-align: center|right` maps to a mutation; every other value
/// (including `left` and `justify`) leaves the prior alignment in place.
fn text_align(name: &str, value: &str) -> Option<Alignment> {
    if name != "text-align" {
        return None;
    }
    match value {
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        _ => None,
    }
}

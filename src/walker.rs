//! Tree walker and per-tag element handlers.
//!
//! The walker is a depth-first pre-order pass over every element node of a
//! parsed root. Dispatch is an explicit tag classification rather than
//! string matching scattered through the traversal; unrecognized tags emit
//! nothing themselves but their children are still visited.

use log::debug;
use markup5ever_rcdom::{Handle, NodeData};

use crate::document::{Block, Cell, Heading, Image, Paragraph, Run, StructuredDocument, Table, TableRow};
use crate::dom::{attr_get, attrs_vec, find_elements, flatten_text, tag_lower};
use crate::error::{Error, Result};

/// Header-row shading fill, light gray.
const HEADER_FILL: &str = "F2F2F2";

/// The supported tag kinds. Everything else is `Other`: no content of its
/// own, children still visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Heading(u8),
    Paragraph,
    Table,
    Image,
    Other,
}

impl TagKind {
    pub fn classify(name: &str) -> TagKind {
        match name {
            "p" => TagKind::Paragraph,
            "table" => TagKind::Table,
            "img" => TagKind::Image,
            _ => {
                if let Some(digits) = name.strip_prefix('h') {
                    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                        if let Ok(level) = digits.parse::<u8>() {
                            return TagKind::Heading(level);
                        }
                    }
                }
                TagKind::Other
            }
        }
    }
}

/// Walks one top-level root, appending blocks to the document.
pub fn append_root(doc: &mut StructuredDocument, root: &Handle) -> Result<()> {
    walk(doc, root)
}

fn walk(doc: &mut StructuredDocument, node: &Handle) -> Result<()> {
    if let Some(tag) = tag_lower(node) {
        match TagKind::classify(&tag) {
            TagKind::Heading(level) => handle_heading(doc, node, level),
            TagKind::Paragraph => handle_paragraph(doc, node),
            TagKind::Table => handle_table(doc, node),
            TagKind::Image => handle_image(doc, node)?,
            TagKind::Other => {}
        }
    }
    for child in node.children.borrow().iter() {
        walk(doc, child)?;
    }
    Ok(())
}

/// Runs from the element's immediate content: text nodes as plain runs,
/// `<b>` children as one bold run over their flattened text, `<br>` as an
/// explicit line break. Any other inline child contributes nothing.
fn collect_runs(node: &Handle) -> Vec<Run> {
    let mut runs = Vec::new();
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let text = contents.borrow().to_string();
                if !text.is_empty() {
                    runs.push(Run::text(text));
                }
            }
            NodeData::Element { .. } => match tag_lower(child).as_deref() {
                Some("b") => runs.push(Run::bold(flatten_text(child))),
                Some("br") => runs.push(Run::line_break()),
                _ => {}
            },
            _ => {}
        }
    }
    runs
}

fn first_class(node: &Handle) -> Option<String> {
    let attrs = attrs_vec(node);
    attr_get(&attrs, "class")
        .and_then(|c| c.split_whitespace().next().map(str::to_string))
}

fn handle_heading(doc: &mut StructuredDocument, node: &Handle, level: u8) {
    doc.push(Block::Heading(Heading {
        level,
        runs: collect_runs(node),
        alignment: Default::default(),
    }));
}

fn handle_paragraph(doc: &mut StructuredDocument, node: &Handle) {
    doc.push(Block::Paragraph(Paragraph {
        style_name: first_class(node),
        runs: collect_runs(node),
        alignment: Default::default(),
    }));
}

fn handle_image(doc: &mut StructuredDocument, node: &Handle) -> Result<()> {
    let attrs = attrs_vec(node);
    let src = attr_get(&attrs, "src").ok_or(Error::MissingImageSource)?;
    let width_px = parse_px(attr_get(&attrs, "width"))?;
    let height_px = parse_px(attr_get(&attrs, "height"))?;
    doc.push(Block::Image(Image {
        src: src.into(),
        width_px,
        height_px,
    }));
    Ok(())
}

fn parse_px(attr: Option<String>) -> Result<Option<u32>> {
    match attr {
        None => Ok(None),
        Some(v) => {
            let px = v
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::BadImageDimension(v))?;
            // A zero dimension is no dimension; the image falls back to
            // its intrinsic size.
            Ok((px > 0).then_some(px))
        }
    }
}

/// Builds a table block per the leniency rules: column count is the widest
/// source row, all `<th>` cells anywhere form one synthetic header row,
/// all-empty data rows are dropped, short rows stay short.
fn handle_table(doc: &mut StructuredDocument, node: &Handle) {
    let mut trs: Vec<Handle> = Vec::new();
    find_elements(node, "tr", &mut trs);
    if trs.is_empty() {
        // Tolerated, not an error: nothing to lay out.
        return;
    }

    let mut cols = trs
        .iter()
        .map(|tr| {
            tr.children
                .borrow()
                .iter()
                .filter(|c| matches!(tag_lower(c).as_deref(), Some("td") | Some("th")))
                .count()
        })
        .max()
        .unwrap_or(0);

    let mut rows: Vec<TableRow> = Vec::new();

    let mut ths: Vec<Handle> = Vec::new();
    find_elements(node, "th", &mut ths);
    // Header cells scattered across rows concatenate into one synthetic
    // row, which can be wider than any source row; the table must still
    // come out rectangular.
    cols = cols.max(ths.len());
    if !ths.is_empty() {
        let cells = ths
            .iter()
            .map(|th| Cell {
                text: flatten_text(th).trim().to_string(),
                bold: true,
                fill: Some(HEADER_FILL.to_string()),
                alignment: Default::default(),
            })
            .collect();
        rows.push(TableRow {
            header: true,
            cells,
        });
    }

    for tr in &trs {
        let cells: Vec<Cell> = tr
            .children
            .borrow()
            .iter()
            .filter(|c| tag_lower(c).as_deref() == Some("td"))
            .map(|td| Cell {
                text: flatten_text(td).trim().replace(',', ",\n"),
                ..Default::default()
            })
            .collect();
        if cells.iter().any(|c| !c.text.is_empty()) {
            rows.push(TableRow {
                header: false,
                cells,
            });
        }
    }

    debug!("table: {} cols, {} rows", cols, rows.len());
    doc.push(Block::Table(Table { cols, rows }));
    // Vertical spacing after the table.
    doc.push(Block::Paragraph(Paragraph::default()));
}

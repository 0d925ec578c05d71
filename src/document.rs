//! The structured document model built by the walker and mutated in place
//! by the style resolver before serialization.

use std::path::PathBuf;

/// Paragraph-level justification. `Left` is the default and emits no
/// explicit justification in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A contiguous span of text with one formatting state. A line-break run
/// carries empty text and `line_break` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub line_break: bool,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            bold: false,
            line_break: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Run {
            text: text.into(),
            bold: true,
            line_break: false,
        }
    }

    pub fn line_break() -> Self {
        Run {
            text: String::new(),
            bold: false,
            line_break: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Heading {
    pub level: u8,
    pub runs: Vec<Run>,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    /// Style name assigned at creation (the element's first class token);
    /// class selectors match against it.
    pub style_name: Option<String>,
    pub runs: Vec<Run>,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub text: String,
    pub bold: bool,
    /// Shading fill as an RRGGBB hex string.
    pub fill: Option<String>,
    pub alignment: Alignment,
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub header: bool,
    pub cells: Vec<Cell>,
}

/// Rows may be narrower than `cols`; the serializer pads them with empty
/// cells so the rendered table stays rectangular.
#[derive(Debug, Clone)]
pub struct Table {
    pub cols: usize,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn header_row(&self) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.header)
    }

    pub fn header_row_mut(&mut self) -> Option<&mut TableRow> {
        self.rows.iter_mut().find(|r| r.header)
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|r| !r.header)
    }
}

/// An embedded image reference. Dimensions come from the `width`/`height`
/// pixel attributes when both are present, otherwise from the file itself.
#[derive(Debug, Clone)]
pub struct Image {
    pub src: PathBuf,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
}

/// A top-level structural unit of the output document.
#[derive(Debug, Clone)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    Table(Table),
    Image(Image),
    PageBreak,
}

/// Header or footer region configuration: fixed marker text, paragraph
/// alignment, and whether the live "Page X of Y" field is embedded.
#[derive(Debug, Clone)]
pub struct HeaderFooterConfig {
    pub marker: String,
    pub alignment: Alignment,
    pub page_field: bool,
}

/// Uniform page margins in twips (1/20 pt; 1440 = one inch).
#[derive(Debug, Clone, Copy)]
pub struct PageMargins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl PageMargins {
    pub fn one_inch() -> Self {
        PageMargins {
            top: 1440,
            right: 1440,
            bottom: 1440,
            left: 1440,
        }
    }
}

/// The output artifact being built: block sequence plus the document-level
/// header/footer regions and page geometry.
#[derive(Debug, Clone)]
pub struct StructuredDocument {
    pub blocks: Vec<Block>,
    pub header: HeaderFooterConfig,
    pub footer: HeaderFooterConfig,
    pub margins: PageMargins,
}

impl StructuredDocument {
    /// One-inch margins, right-aligned marker header, centered footer with
    /// the live page-number field. The marker is caller-supplied; there is
    /// no process-wide default.
    pub fn with_marker(marker: &str) -> Self {
        StructuredDocument {
            blocks: Vec::new(),
            header: HeaderFooterConfig {
                marker: marker.to_string(),
                alignment: Alignment::Right,
                page_field: false,
            },
            footer: HeaderFooterConfig {
                marker: marker.to_string(),
                alignment: Alignment::Center,
                page_field: true,
            },
            margins: PageMargins::one_inch(),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn page_break_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::PageBreak))
            .count()
    }
}

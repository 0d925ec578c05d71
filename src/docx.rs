//! WordprocessingML serialization: assembles the docx package (document,
//! styles, header, footer, media) and writes it as a zip archive.

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::document::{
    Alignment, Block, Cell, HeaderFooterConfig, Image, Run, StructuredDocument, Table,
};
use crate::error::{Error, Result};

/// 914400 EMU per inch at the 96 px/inch assumption.
const EMU_PER_PX: u64 = 9525;

pub(crate) fn px_to_emu(px: u32) -> u64 {
    px as u64 * EMU_PER_PX
}

fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// One embedded image: package part name, relationship id, payload, and
/// extent in EMU.
struct MediaImage {
    part: String,
    ext: &'static str,
    rid: String,
    bytes: Vec<u8>,
    cx: u64,
    cy: u64,
}

fn image_ext(image: &Image) -> Result<&'static str> {
    let ext = image
        .src
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => Ok("png"),
        Some("jpg") | Some("jpeg") => Ok("jpeg"),
        _ => Err(Error::UnsupportedImageFormat(image.src.clone())),
    }
}

/// Reads every image referenced by the document. Explicit pixel attributes
/// win; otherwise the file is probed for its intrinsic dimensions.
fn collect_media(doc: &StructuredDocument) -> Result<Vec<MediaImage>> {
    let mut media = Vec::new();
    let mut rid = 10u32;
    for block in &doc.blocks {
        let Block::Image(image) = block else {
            continue;
        };
        let ext = image_ext(image)?;
        let bytes = fs::read(&image.src)?;
        let (w, h) = match (image.width_px, image.height_px) {
            (Some(w), Some(h)) => (w, h),
            _ => image::image_dimensions(&image.src)?,
        };
        media.push(MediaImage {
            part: format!("media/image{}.{}", media.len() + 1, ext),
            ext,
            rid: format!("rId{rid}"),
            bytes,
            cx: px_to_emu(w),
            cy: px_to_emu(h),
        });
        rid += 1;
    }
    Ok(media)
}

fn jc_xml(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "",
        Alignment::Center => "<w:jc w:val=\"center\"/>",
        Alignment::Right => "<w:jc w:val=\"right\"/>",
    }
}

fn run_xml(text: &str, bold: bool) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str("<w:r>");
    if bold {
        out.push_str("<w:rPr><w:b/></w:rPr>");
    }
    out.push_str("<w:t xml:space=\"preserve\">");
    out.push_str(&xml_escape_text(text));
    out.push_str("</w:t></w:r>");
    out
}

fn runs_xml(runs: &[Run]) -> String {
    let mut out = String::new();
    for run in runs {
        if run.line_break {
            out.push_str("<w:r><w:br/></w:r>");
        } else {
            out.push_str(&run_xml(&run.text, run.bold));
        }
    }
    out
}

fn paragraph_xml(runs: &[Run], style_id: Option<String>, alignment: Alignment) -> String {
    let mut out = String::new();
    out.push_str("<w:p>");
    let jc = jc_xml(alignment);
    if style_id.is_some() || !jc.is_empty() {
        out.push_str("<w:pPr>");
        if let Some(id) = style_id {
            out.push_str(&format!("<w:pStyle w:val=\"{id}\"/>"));
        }
        out.push_str(jc);
        out.push_str("</w:pPr>");
    }
    out.push_str(&runs_xml(runs));
    out.push_str("</w:p>");
    out
}

fn cell_xml(cell: &Cell) -> String {
    let mut out = String::new();
    out.push_str("<w:tc><w:tcPr><w:tcW w:w=\"0\" w:type=\"auto\"/>");
    if let Some(fill) = &cell.fill {
        out.push_str(&format!("<w:shd w:val=\"clear\" w:fill=\"{fill}\"/>"));
    }
    out.push_str("</w:tcPr><w:p>");
    let jc = jc_xml(cell.alignment);
    if !jc.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(jc);
        out.push_str("</w:pPr>");
    }
    // Cell text line breaks (comma rewriting) become explicit break runs.
    let mut first = true;
    for line in cell.text.split('\n') {
        if !first {
            out.push_str("<w:r><w:br/></w:r>");
        }
        first = false;
        out.push_str(&run_xml(line, cell.bold));
    }
    out.push_str("</w:p></w:tc>");
    out
}

fn table_xml(t: &Table) -> String {
    if t.rows.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str("<w:tbl>");
    out.push_str("<w:tblPr><w:tblStyle w:val=\"TableGrid\"/><w:tblW w:w=\"0\" w:type=\"auto\"/></w:tblPr>");
    for row in &t.rows {
        out.push_str("<w:tr>");
        for cell in &row.cells {
            out.push_str(&cell_xml(cell));
        }
        // A short row is padded here so the rendered table stays
        // rectangular; the model keeps the row at its source width.
        for _ in row.cells.len()..t.cols {
            out.push_str(&cell_xml(&Cell::default()));
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
    out
}

fn drawing_xml(media: &MediaImage, id: usize) -> String {
    format!(
        concat!(
            "<w:p><w:r><w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{id}\" name=\"Picture {id}\"/>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"Picture {id}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill><a:blip r:embed=\"{rid}\"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>",
        ),
        cx = media.cx,
        cy = media.cy,
        id = id,
        rid = media.rid,
    )
}

fn document_xml(doc: &StructuredDocument, media: &[MediaImage]) -> String {
    let mut body = String::new();
    let mut image_idx = 0usize;
    for block in &doc.blocks {
        match block {
            Block::Heading(h) => body.push_str(&paragraph_xml(
                &h.runs,
                Some(format!("Heading{}", h.level)),
                h.alignment,
            )),
            Block::Paragraph(p) => body.push_str(&paragraph_xml(&p.runs, None, p.alignment)),
            Block::Table(t) => body.push_str(&table_xml(t)),
            Block::Image(_) => {
                body.push_str(&drawing_xml(&media[image_idx], image_idx + 1));
                image_idx += 1;
            }
            Block::PageBreak => body.push_str("<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>"),
        }
    }

    let m = doc.margins;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
 xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
 xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
 xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
 xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordprocessingml"
 mc:Ignorable="w14">
  <w:body>
    {body}
    <w:sectPr>
      <w:headerReference w:type="default" r:id="rId2"/>
      <w:footerReference w:type="default" r:id="rId3"/>
      <w:pgSz w:w="12240" w:h="15840"/>
      <w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="708" w:footer="708" w:gutter="0"/>
      <w:cols w:space="708"/>
      <w:docGrid w:linePitch="360"/>
    </w:sectPr>
  </w:body>
</w:document>"#,
        body = body,
        top = m.top,
        right = m.right,
        bottom = m.bottom,
        left = m.left,
    )
}

/// Live "Page {current} of {total}" built from PAGE/NUMPAGES field codes so
/// the host viewer keeps it correct across repagination.
fn page_field_xml() -> String {
    let field = |instr: &str| {
        format!(
            concat!(
                "<w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>",
                "<w:r><w:instrText xml:space=\"preserve\">{}</w:instrText></w:r>",
                "<w:r><w:fldChar w:fldCharType=\"end\"/></w:r>",
            ),
            instr
        )
    };
    format!(
        "<w:r><w:t xml:space=\"preserve\">Page </w:t></w:r>{}<w:r><w:t xml:space=\"preserve\"> of </w:t></w:r>{}",
        field("PAGE"),
        field("NUMPAGES"),
    )
}

fn header_footer_paragraph(cfg: &HeaderFooterConfig) -> String {
    let mut out = String::new();
    out.push_str("<w:p>");
    let jc = jc_xml(cfg.alignment);
    if !jc.is_empty() {
        out.push_str("<w:pPr>");
        out.push_str(jc);
        out.push_str("</w:pPr>");
    }
    out.push_str(&run_xml(&cfg.marker, false));
    if cfg.page_field {
        out.push_str("<w:r><w:tab/></w:r>");
        out.push_str(&page_field_xml());
    }
    out.push_str("</w:p>");
    out
}

fn header_xml(cfg: &HeaderFooterConfig) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:hdr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">{}</w:hdr>",
        header_footer_paragraph(cfg)
    )
}

fn footer_xml(cfg: &HeaderFooterConfig) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:ftr xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">{}</w:ftr>",
        header_footer_paragraph(cfg)
    )
}

fn content_types_xml(media: &[MediaImage]) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    out.push('\n');
    out.push_str(r#"  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Default Extension="xml" ContentType="application/xml"/>"#);
    out.push('\n');
    if media.iter().any(|m| m.ext == "png") {
        out.push_str(r#"  <Default Extension="png" ContentType="image/png"/>"#);
        out.push('\n');
    }
    if media.iter().any(|m| m.ext == "jpeg") {
        out.push_str(r#"  <Default Extension="jpeg" ContentType="image/jpeg"/>"#);
        out.push('\n');
    }
    out.push_str(r#"  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#);
    out.push('\n');
    out.push_str("</Types>");
    out
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
}

fn document_rels_xml(media: &[MediaImage]) -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    out.push('\n');
    out.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#);
    out.push('\n');
    out.push_str(r#"  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#);
    out.push('\n');
    for m in media {
        out.push_str(&format!(
            r#"  <Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{}"/>"#,
            m.rid, m.part,
        ));
        out.push('\n');
    }
    out.push_str("</Relationships>");
    out
}

fn styles_xml() -> String {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
"#);
    // Heading sizes taper off in half-points: 32, 28, 26, 24, 22, 22.
    let sizes = [32u32, 28, 26, 24, 22, 22];
    for (i, sz) in sizes.iter().enumerate() {
        let level = i + 1;
        out.push_str(&format!(
            r#"  <w:style w:type="paragraph" w:styleId="Heading{level}">
    <w:name w:val="heading {level}"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:keepNext/>
      <w:spacing w:before="240" w:after="120"/>
      <w:outlineLvl w:val="{outline}"/>
    </w:pPr>
    <w:rPr>
      <w:b/>
      <w:sz w:val="{sz}"/>
    </w:rPr>
  </w:style>
"#,
            level = level,
            outline = i,
            sz = sz,
        ));
    }
    out.push_str(r#"  <w:style w:type="table" w:styleId="TableGrid">
    <w:name w:val="Table Grid"/>
    <w:basedOn w:val="TableNormal"/>
    <w:uiPriority w:val="39"/>
    <w:tblPr>
      <w:tblBorders>
        <w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/>
        <w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>
      </w:tblBorders>
    </w:tblPr>
  </w:style>
</w:styles>"#);
    out
}

/// Persists the finished document as a docx package. Single save; the
/// document is never reopened or mutated afterwards.
pub fn save_docx(doc: &StructuredDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let media = collect_media(doc)?;
    debug!("embedding {} images", media.len());

    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(content_types_xml(&media).as_bytes())?;

    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(rels_xml().as_bytes())?;

    zip.start_file("word/document.xml", opts)?;
    zip.write_all(document_xml(doc, &media).as_bytes())?;

    zip.start_file("word/styles.xml", opts)?;
    zip.write_all(styles_xml().as_bytes())?;

    zip.start_file("word/header1.xml", opts)?;
    zip.write_all(header_xml(&doc.header).as_bytes())?;

    zip.start_file("word/footer1.xml", opts)?;
    zip.write_all(footer_xml(&doc.footer).as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", opts)?;
    zip.write_all(document_rels_xml(&media).as_bytes())?;

    for m in &media {
        zip.start_file(format!("word/{}", m.part), opts)?;
        zip.write_all(&m.bytes)?;
    }

    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Heading, Paragraph, TableRow};
    use std::io::Read;

    #[test]
    fn pixel_to_emu_uses_96_dpi() {
        assert_eq!(px_to_emu(96), 914_400);
        assert_eq!(px_to_emu(192), 1_828_800);
    }

    #[test]
    fn escapes_xml_metacharacters() {
        assert_eq!(xml_escape_text("a<b&c>\"d'"), "a&lt;b&amp;c&gt;&quot;d&apos;");
    }

    #[test]
    fn short_rows_are_padded_in_output_only() {
        let table = Table {
            cols: 3,
            rows: vec![TableRow {
                header: false,
                cells: vec![Cell {
                    text: "only".to_string(),
                    ..Default::default()
                }],
            }],
        };
        let xml = table_xml(&table);
        assert_eq!(xml.matches("<w:tc>").count(), 3);
        assert_eq!(table.rows[0].cells.len(), 1);
    }

    #[test]
    fn empty_table_serializes_to_nothing() {
        let xml = table_xml(&Table {
            cols: 0,
            rows: vec![],
        });
        assert!(xml.is_empty());
    }

    #[test]
    fn footer_embeds_live_page_fields() {
        let cfg = HeaderFooterConfig {
            marker: "CONFIDENTIAL".to_string(),
            alignment: Alignment::Center,
            page_field: true,
        };
        let xml = footer_xml(&cfg);
        assert!(xml.contains(">PAGE<"));
        assert!(xml.contains(">NUMPAGES<"));
        assert!(xml.contains("w:fldCharType=\"begin\""));
        assert!(xml.contains("CONFIDENTIAL"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
    }

    #[test]
    fn header_is_right_aligned_without_fields() {
        let cfg = HeaderFooterConfig {
            marker: "M&M".to_string(),
            alignment: Alignment::Right,
            page_field: false,
        };
        let xml = header_xml(&cfg);
        assert!(xml.contains("<w:jc w:val=\"right\"/>"));
        assert!(xml.contains("M&amp;M"));
        assert!(!xml.contains("PAGE"));
    }

    fn read_part(archive: &mut zip::ZipArchive<File>, name: &str) -> String {
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn package_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let img_path = dir.path().join("pic.png");
        fs::write(&img_path, b"not a real png, attrs fix the size").unwrap();

        let mut doc = StructuredDocument::with_marker("SECRET");
        doc.push(Block::Heading(Heading {
            level: 2,
            runs: vec![Run::text("Title")],
            alignment: Alignment::Center,
        }));
        doc.push(Block::Paragraph(Paragraph {
            style_name: None,
            runs: vec![Run::text("a"), Run::line_break(), Run::bold("b")],
            alignment: Alignment::Left,
        }));
        doc.push(Block::Table(Table {
            cols: 2,
            rows: vec![TableRow {
                header: true,
                cells: vec![Cell {
                    text: "H".to_string(),
                    bold: true,
                    fill: Some("F2F2F2".to_string()),
                    alignment: Alignment::Center,
                }],
            }],
        }));
        doc.push(Block::PageBreak);
        doc.push(Block::Image(Image {
            src: img_path,
            width_px: Some(192),
            height_px: Some(96),
        }));

        let out = dir.path().join("out.docx");
        save_docx(&doc, &out).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();
        let document = read_part(&mut archive, "word/document.xml");
        assert!(document.contains("<w:pStyle w:val=\"Heading2\"/>"));
        assert!(document.contains("<w:br w:type=\"page\"/>"));
        assert!(document.contains("<w:tblStyle w:val=\"TableGrid\"/>"));
        assert!(document.contains("w:fill=\"F2F2F2\""));
        assert!(document.contains("cx=\"1828800\" cy=\"914400\""));
        assert!(document.contains("<w:pgMar w:top=\"1440\""));
        assert!(document.contains("r:embed=\"rId10\""));

        let styles = read_part(&mut archive, "word/styles.xml");
        assert!(styles.contains("w:val=\"Table Grid\""));
        assert!(styles.contains("w:styleId=\"Heading2\""));

        let header = read_part(&mut archive, "word/header1.xml");
        assert!(header.contains("SECRET"));

        let footer = read_part(&mut archive, "word/footer1.xml");
        assert!(footer.contains("NUMPAGES"));

        let types = read_part(&mut archive, "[Content_Types].xml");
        assert!(types.contains("header+xml"));
        assert!(types.contains("image/png"));

        let rels = read_part(&mut archive, "word/_rels/document.xml.rels");
        assert!(rels.contains("Target=\"media/image1.png\""));

        assert!(archive.by_name("word/media/image1.png").is_ok());
    }

    #[test]
    fn unknown_image_extension_is_rejected() {
        let image = Image {
            src: "diagram.svg".into(),
            width_px: None,
            height_px: None,
        };
        assert!(matches!(
            image_ext(&image),
            Err(Error::UnsupportedImageFormat(_))
        ));
    }
}

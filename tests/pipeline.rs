//! End-to-end pipeline test: HTML text in, docx package out.

use std::fs::File;
use std::io::Read;

use html2docx::{build_document, docx};

fn read_part(archive: &mut zip::ZipArchive<File>, name: &str) -> String {
    let mut out = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn two_root_document_round_trips_through_the_package() {
    let input = "\
<html>\
<head><style>.intro { text-align: center; } th { color: red; }</style></head>\
<body>\
<h1>Report</h1>\
<p class=\"intro\">Summary line<br><b>emphasis</b></p>\
<table>\
<tr><th>Name</th><th>Values</th></tr>\
<tr><td>row</td><td>a,b,c</td></tr>\
<tr><td> </td><td></td></tr>\
</table>\
</body>\
</html>\
<html><body><p>second page</p></body></html>";

    let doc = build_document(input, "ACME INTERNAL").unwrap();
    assert_eq!(doc.page_break_count(), 1);

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.docx");
    docx::save_docx(&doc, &out).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&out).unwrap()).unwrap();

    let document = read_part(&mut archive, "word/document.xml");
    // Center alignment from the .intro class rule.
    assert!(document.contains("<w:jc w:val=\"center\"/>"));
    // Bold run and explicit line break inside one paragraph.
    assert!(document.contains("<w:rPr><w:b/></w:rPr>"));
    assert!(document.contains("<w:br/>"));
    // Comma-split cell text renders as multiple lines.
    assert!(document.contains(">a,<"));
    // The all-empty row was dropped: synthetic header row + one data row.
    assert_eq!(document.matches("<w:tr>").count(), 2);
    // One page break between the two roots.
    assert_eq!(document.matches("<w:br w:type=\"page\"/>").count(), 1);
    assert!(document.contains("second page"));

    let header = read_part(&mut archive, "word/header1.xml");
    assert!(header.contains("ACME INTERNAL"));
    assert!(header.contains("<w:jc w:val=\"right\"/>"));

    let footer = read_part(&mut archive, "word/footer1.xml");
    assert!(footer.contains("ACME INTERNAL"));
    assert!(footer.contains(">PAGE<"));
    assert!(footer.contains(">NUMPAGES<"));
}

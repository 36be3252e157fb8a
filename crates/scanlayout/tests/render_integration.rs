//! Rendering the document model to txt, docx and xlsx.

use scanlayout::core::config::RenderConfig;
use scanlayout::render::{
    DocxElement, DocxRenderer, LineClassifier, LineKind, OutputFormat, XlsxRenderer, render_all, render_text,
    write_artifacts,
};
use scanlayout::types::{DocumentModel, Page, TableRegion, TableRow};
use std::io::{Cursor, Read};

fn page(number: usize, text: &str) -> Page {
    Page {
        transcription: text.to_string(),
        ..Page::empty(number)
    }
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
    content
}

#[test]
fn test_text_empty_first_page() {
    let model = DocumentModel::from_pages(vec![page(1, ""), page(2, "Dear sir,\n\n\n\nWe write\n\n")]);
    let text = render_text(&model);

    assert!(!text.contains("\n\n\n"), "{text:?}");
    assert_eq!(text.matches("PAGE ").count(), 1);
    let banner_at = text.find("PAGE 2").unwrap();
    assert!(banner_at < text.find("Dear sir,").unwrap());
    assert!(text.ends_with("We write\n"));
}

#[test]
fn test_text_never_doubles_blank_lines() {
    let model = DocumentModel::from_pages(vec![
        page(1, "\n\na\n\n\n"),
        page(2, ""),
        page(3, "   \n\t\nb"),
        page(4, "\n"),
    ]);
    let text = render_text(&model);
    assert!(!text.contains("\n\n\n"), "{text:?}");
    assert_eq!(text.matches("PAGE ").count(), 3);
    assert!(!text.contains("PAGE 1"));
}

#[test]
fn test_total_colon_is_title_heading() {
    let config = RenderConfig::default();
    let classifier = LineClassifier::new(&config.label_prefixes);
    assert_eq!(classifier.classify("TOTAL:"), LineKind::TitleHeading);

    let layout = DocxRenderer::new(config.clone()).layout(&DocumentModel::from_pages(vec![page(1, "amount due\nTOTAL:")]));
    assert_eq!(
        layout,
        vec![
            DocxElement::Paragraph("amount due".into()),
            DocxElement::Heading {
                level: 3,
                text: "TOTAL:".into()
            },
        ]
    );
}

#[test]
fn test_docx_tables_after_paragraphs() {
    let mut first = page(1, "Summary\nsee below");
    let mut table = TableRegion::new(10, 10, 300, 200);
    table.rows = vec![TableRow::from_iter(["A", "B"]), TableRow::from_iter(["C"])];
    first.tables.push(table);
    let model = DocumentModel::from_pages(vec![first, page(2, "end")]);

    let layout = DocxRenderer::default().layout(&model);
    assert_eq!(layout[0], DocxElement::Paragraph("Summary see below".into()));
    assert_eq!(layout[1], DocxElement::EmptyParagraph);
    assert_eq!(
        layout[2],
        DocxElement::Table(vec![vec!["A".into(), "B".into()], vec!["C".into(), String::new()]])
    );
    assert_eq!(layout[3], DocxElement::EmptyParagraph);
    assert_eq!(layout[4], DocxElement::PageBreak);
    assert_eq!(layout.iter().filter(|e| **e == DocxElement::PageBreak).count(), 1);

    let bytes = render_all(&model, &[OutputFormat::Docx], &RenderConfig::default())
        .remove(0)
        .1
        .unwrap();
    let document = read_part(&bytes, "word/document.xml");
    assert_eq!(document.matches("<w:tbl>").count(), 1);
    assert_eq!(document.matches("<w:tr>").count(), 2);
    assert_eq!(document.matches(r#"<w:br w:type="page"/>"#).count(), 1);
}

#[test]
fn test_xlsx_sheet_per_page() {
    let mut with_table = page(2, "ignored");
    let mut table = TableRegion::new(0, 0, 10, 10);
    table.rows = vec![TableRow::from_iter(["x", "y"]), TableRow::from_iter(["z", "w"])];
    with_table.tables.push(table);
    let model = DocumentModel::from_pages(vec![page(1, "line one\nline two"), with_table, page(3, "")]);

    let sheets = XlsxRenderer.sheets(&model);
    let names: Vec<_> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Page_1", "Page_2", "Page_3"]);
    assert_eq!(sheets[0].cell(0, 0), Some("Content"));
    assert_eq!(sheets[0].cell(2, 0), Some("line two"));
    assert_eq!(sheets[1].cell(0, 0), Some("x"));
    assert_eq!(sheets[2].cell(1, 0), Some("No content extracted"));
}

#[test]
fn test_all_formats_written() {
    let dir = tempfile::tempdir().unwrap();
    let model = DocumentModel::from_pages(vec![page(1, "HELLO\nworld")]);
    let written = write_artifacts(
        &model,
        &OutputFormat::ALL,
        &RenderConfig::default(),
        dir.path(),
        "0f3a",
        "letters/hello.pdf",
    );

    let names: Vec<String> = written
        .iter()
        .map(|(_, r)| r.as_ref().unwrap().file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["0f3a_hello.txt", "0f3a_hello.docx", "0f3a_hello.xlsx"]);
    let text = std::fs::read_to_string(dir.path().join("0f3a_hello.txt")).unwrap();
    assert_eq!(text, "HELLO\nworld\n");
}

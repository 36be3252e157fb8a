//! Rich document (docx) rendering.
//!
//! The transcription, not the block tree, is reflowed into paragraphs with the
//! [`LineClassifier`] rules. Tables follow the page's paragraphs, and a page
//! break separates consecutive pages. The document is first laid out as a
//! flat list of [`DocxElement`]s and then serialized to WordprocessingML.

use super::heading::{LineClassifier, LineKind};
use super::ooxml::{self, Package, XmlWriter, empty, text_element};
use super::{OutputFormat, Renderer};
use crate::Result;
use crate::core::config::RenderConfig;
use crate::types::{DocumentModel, Page, TableRegion};
use std::io;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// One block-level element of the rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocxElement {
    Heading { level: u8, text: String },
    BoldParagraph(String),
    Paragraph(String),
    EmptyParagraph,
    /// Rows already padded to the table's column count.
    Table(Vec<Vec<String>>),
    PageBreak,
}

#[derive(Debug, Clone, Default)]
pub struct DocxRenderer {
    config: RenderConfig,
}

impl DocxRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Lay the model out as block-level elements.
    pub fn layout(&self, model: &DocumentModel) -> Vec<DocxElement> {
        let classifier = LineClassifier::new(&self.config.label_prefixes);
        let mut elements = Vec::new();

        for (index, page) in model.pages.iter().enumerate() {
            if index > 0 {
                elements.push(DocxElement::Heading {
                    level: 2,
                    text: format!("Page {}", page.page_number),
                });
            }
            reflow_page(page, &classifier, &mut elements);
            for table in &page.tables {
                push_table(table, &mut elements);
            }
            if index + 1 < model.pages.len() {
                elements.push(DocxElement::PageBreak);
            }
        }
        elements
    }
}

impl Renderer for DocxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn render(&self, model: &DocumentModel) -> Result<Vec<u8>> {
        let elements = self.layout(model);

        let mut package = Package::new(OutputFormat::Docx.extension());
        package.add_xml("[Content_Types].xml", |w| {
            ooxml::write_content_types(
                w,
                &[
                    ("/word/document.xml".to_string(), DOCUMENT_CONTENT_TYPE),
                    ("/word/styles.xml".to_string(), STYLES_CONTENT_TYPE),
                ],
            )
        })?;
        package.add_xml("_rels/.rels", |w| {
            ooxml::write_relationships(w, &[(ooxml::RELATIONSHIP_OFFICE_DOCUMENT, "word/document.xml".to_string())])
        })?;
        package.add_xml("word/_rels/document.xml.rels", |w| {
            ooxml::write_relationships(w, &[(ooxml::RELATIONSHIP_STYLES, "styles.xml".to_string())])
        })?;
        package.add_xml("word/styles.xml", |w| write_styles(w, &self.config))?;
        package.add_xml("word/document.xml", |w| write_document(w, &elements))?;
        package.finish()
    }
}

fn reflow_page(page: &Page, classifier: &LineClassifier<'_>, elements: &mut Vec<DocxElement>) {
    let mut paragraph: Vec<&str> = Vec::new();

    let flush = |paragraph: &mut Vec<&str>, elements: &mut Vec<DocxElement>| {
        if !paragraph.is_empty() {
            elements.push(DocxElement::Paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in page.transcription.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match classifier.classify(line) {
            LineKind::TitleHeading => {
                flush(&mut paragraph, elements);
                elements.push(DocxElement::Heading {
                    level: 3,
                    text: line.to_string(),
                });
            }
            LineKind::LabelHeading => {
                flush(&mut paragraph, elements);
                elements.push(DocxElement::BoldParagraph(line.to_string()));
            }
            LineKind::NumberedItem => {
                flush(&mut paragraph, elements);
                paragraph.push(line);
            }
            LineKind::Continuation => paragraph.push(line),
        }
    }
    flush(&mut paragraph, elements);
}

fn push_table(table: &TableRegion, elements: &mut Vec<DocxElement>) {
    if table.column_count() == 0 {
        return;
    }
    elements.push(DocxElement::EmptyParagraph);
    elements.push(DocxElement::Table(table.padded_rows()));
    elements.push(DocxElement::EmptyParagraph);
}

const DOCUMENT_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const STYLES_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

const TABLE_BORDERS: [&str; 6] = ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"];

fn write_styles(w: &mut XmlWriter, config: &RenderConfig) -> io::Result<()> {
    // Sizes are in half-points.
    let size = (config.font_size_pt * 2).to_string();
    let font = config.font.as_str();

    w.create_element("w:styles")
        .with_attribute(("xmlns:w", WORDML_NS))
        .write_inner_content(|w| {
            w.create_element("w:docDefaults").write_inner_content(|w| {
                w.create_element("w:rPrDefault").write_inner_content(|w| {
                    w.create_element("w:rPr").write_inner_content(|w| {
                        empty(w, "w:rFonts", &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)])?;
                        empty(w, "w:sz", &[("w:val", size.as_str())])?;
                        empty(w, "w:szCs", &[("w:val", size.as_str())])
                    })?;
                    Ok(())
                })?;
                Ok(())
            })?;

            w.create_element("w:style")
                .with_attributes([("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")])
                .write_inner_content(|w| {
                    empty(w, "w:name", &[("w:val", "Normal")])?;
                    empty(w, "w:qFormat", &[])
                })?;

            write_heading_style(w, "Heading2", "heading 2", 26, 200)?;
            write_heading_style(w, "Heading3", "heading 3", 24, 240)?;

            w.create_element("w:style")
                .with_attributes([("w:type", "table"), ("w:styleId", "TableGrid")])
                .write_inner_content(|w| {
                    empty(w, "w:name", &[("w:val", "Table Grid")])?;
                    w.create_element("w:tblPr").write_inner_content(|w| {
                        w.create_element("w:tblBorders").write_inner_content(|w| {
                            for side in TABLE_BORDERS {
                                empty(
                                    w,
                                    side,
                                    &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
                                )?;
                            }
                            Ok(())
                        })?;
                        Ok(())
                    })?;
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(())
}

fn write_heading_style(w: &mut XmlWriter, id: &str, name: &str, size: u32, before: u32) -> io::Result<()> {
    let size = size.to_string();
    let before = before.to_string();

    w.create_element("w:style")
        .with_attributes([("w:type", "paragraph"), ("w:styleId", id)])
        .write_inner_content(|w| {
            empty(w, "w:name", &[("w:val", name)])?;
            empty(w, "w:basedOn", &[("w:val", "Normal")])?;
            empty(w, "w:next", &[("w:val", "Normal")])?;
            empty(w, "w:qFormat", &[])?;
            w.create_element("w:pPr").write_inner_content(|w| {
                empty(w, "w:keepNext", &[])?;
                empty(w, "w:spacing", &[("w:before", before.as_str()), ("w:after", "120")])
            })?;
            w.create_element("w:rPr").write_inner_content(|w| {
                empty(w, "w:b", &[])?;
                empty(w, "w:color", &[("w:val", "1F3864")])?;
                empty(w, "w:sz", &[("w:val", size.as_str())])
            })?;
            Ok(())
        })?;
    Ok(())
}

fn write_run(w: &mut XmlWriter, text: &str, bold: bool) -> io::Result<()> {
    w.create_element("w:r").write_inner_content(|w| {
        if bold {
            w.create_element("w:rPr").write_inner_content(|w| empty(w, "w:b", &[]))?;
        }
        text_element(w, "w:t", &[("xml:space", "preserve")], text)
    })?;
    Ok(())
}

/// A paragraph holding one run, with properties written by `properties`.
fn write_paragraph<F>(w: &mut XmlWriter, properties: F, text: &str, bold: bool) -> io::Result<()>
where
    F: FnOnce(&mut XmlWriter) -> io::Result<()>,
{
    w.create_element("w:p").write_inner_content(|w| {
        w.create_element("w:pPr").write_inner_content(properties)?;
        write_run(w, text, bold)
    })?;
    Ok(())
}

fn write_element(w: &mut XmlWriter, element: &DocxElement) -> io::Result<()> {
    match element {
        DocxElement::Heading { level, text } => {
            let style = format!("Heading{level}");
            write_paragraph(w, |w| empty(w, "w:pStyle", &[("w:val", style.as_str())]), text, false)
        }
        DocxElement::BoldParagraph(text) => {
            write_paragraph(w, |w| empty(w, "w:spacing", &[("w:after", "160")]), text, true)
        }
        DocxElement::Paragraph(text) => write_paragraph(
            w,
            |w| empty(w, "w:spacing", &[("w:after", "120"), ("w:line", "276"), ("w:lineRule", "auto")]),
            text,
            false,
        ),
        DocxElement::EmptyParagraph => empty(w, "w:p", &[]),
        DocxElement::Table(rows) => write_table(w, rows),
        DocxElement::PageBreak => {
            w.create_element("w:p").write_inner_content(|w| {
                w.create_element("w:r")
                    .write_inner_content(|w| empty(w, "w:br", &[("w:type", "page")]))?;
                Ok(())
            })?;
            Ok(())
        }
    }
}

fn write_document(w: &mut XmlWriter, elements: &[DocxElement]) -> io::Result<()> {
    w.create_element("w:document")
        .with_attribute(("xmlns:w", WORDML_NS))
        .write_inner_content(|w| {
            w.create_element("w:body").write_inner_content(|w| {
                for element in elements {
                    write_element(w, element)?;
                }
                // A4 with one-inch margins.
                w.create_element("w:sectPr").write_inner_content(|w| {
                    empty(w, "w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
                    empty(
                        w,
                        "w:pgMar",
                        &[
                            ("w:top", "1440"),
                            ("w:right", "1440"),
                            ("w:bottom", "1440"),
                            ("w:left", "1440"),
                            ("w:header", "708"),
                            ("w:footer", "708"),
                            ("w:gutter", "0"),
                        ],
                    )
                })?;
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(())
}

fn write_table(w: &mut XmlWriter, rows: &[Vec<String>]) -> io::Result<()> {
    let columns = rows.first().map(Vec::len).unwrap_or(0);

    w.create_element("w:tbl").write_inner_content(|w| {
        w.create_element("w:tblPr").write_inner_content(|w| {
            empty(w, "w:tblStyle", &[("w:val", "TableGrid")])?;
            empty(w, "w:tblW", &[("w:w", "0"), ("w:type", "auto")])
        })?;
        w.create_element("w:tblGrid").write_inner_content(|w| {
            for _ in 0..columns {
                empty(w, "w:gridCol", &[])?;
            }
            Ok(())
        })?;
        for row in rows {
            w.create_element("w:tr").write_inner_content(|w| {
                for cell in row {
                    w.create_element("w:tc").write_inner_content(|w| {
                        w.create_element("w:tcPr")
                            .write_inner_content(|w| empty(w, "w:tcW", &[("w:w", "0"), ("w:type", "auto")]))?;
                        if cell.is_empty() {
                            empty(w, "w:p", &[])
                        } else {
                            w.create_element("w:p").write_inner_content(|w| write_run(w, cell, false))?;
                            Ok(())
                        }
                    })?;
                }
                Ok(())
            })?;
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableRow;
    use std::io::{Cursor, Read};

    fn page(number: usize, text: &str) -> Page {
        Page {
            transcription: text.to_string(),
            ..Page::empty(number)
        }
    }

    fn layout(model: &DocumentModel) -> Vec<DocxElement> {
        DocxRenderer::default().layout(model)
    }

    #[test]
    fn test_paragraph_reflow() {
        let model = DocumentModel::from_pages(vec![page(
            1,
            "INVOICE\nThis is the first\nparagraph.\n\n1. First item\ncontinues here\n2) Second\nTotal due:\nREF: 44/2024 long reference text",
        )]);
        assert_eq!(
            layout(&model),
            vec![
                DocxElement::Heading {
                    level: 3,
                    text: "INVOICE".into()
                },
                DocxElement::Paragraph("This is the first paragraph.".into()),
                DocxElement::Paragraph("1. First item continues here".into()),
                DocxElement::Paragraph("2) Second".into()),
                DocxElement::BoldParagraph("Total due:".into()),
                DocxElement::BoldParagraph("REF: 44/2024 long reference text".into()),
            ]
        );
    }

    #[test]
    fn test_pages_headed_and_separated() {
        let model = DocumentModel::from_pages(vec![page(1, "one"), page(2, "two")]);
        assert_eq!(
            layout(&model),
            vec![
                DocxElement::Paragraph("one".into()),
                DocxElement::PageBreak,
                DocxElement::Heading {
                    level: 2,
                    text: "Page 2".into()
                },
                DocxElement::Paragraph("two".into()),
            ]
        );
    }

    #[test]
    fn test_ragged_table_padded() {
        let mut table = TableRegion::new(0, 0, 100, 100);
        table.rows = vec![
            TableRow::from_iter(["Item", "Qty", "Price"]),
            TableRow::from_iter(["Pens"]),
        ];
        let mut p = page(1, "");
        p.tables.push(table);

        let elements = layout(&DocumentModel::from_pages(vec![p]));
        assert_eq!(
            elements,
            vec![
                DocxElement::EmptyParagraph,
                DocxElement::Table(vec![
                    vec!["Item".into(), "Qty".into(), "Price".into()],
                    vec!["Pens".into(), String::new(), String::new()],
                ]),
                DocxElement::EmptyParagraph,
            ]
        );
    }

    #[test]
    fn test_package_contains_document() {
        let model = DocumentModel::from_pages(vec![page(1, "Fish & Chips <menu>")]);
        let bytes = DocxRenderer::default().render(&model).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(document.contains("Fish &amp; Chips &lt;menu&gt;"));
        assert!(archive.by_name("word/styles.xml").is_ok());
        assert!(archive.by_name("[Content_Types].xml").is_ok());
    }

    #[test]
    fn test_styles_use_configured_font() {
        let config = RenderConfig {
            font: "Arial".into(),
            font_size_pt: 12,
            ..Default::default()
        };
        let styles = String::from_utf8(ooxml::xml_part(|w| write_styles(w, &config)).unwrap()).unwrap();
        assert!(styles.contains(r#"w:ascii="Arial""#));
        assert!(styles.contains(r#"<w:sz w:val="24"/>"#));
        assert!(styles.contains(r#"w:styleId="Heading3""#));
    }

    #[test]
    fn test_parts_are_well_formed_with_hostile_text() {
        let mut table = TableRegion::new(0, 0, 100, 100);
        table.rows = vec![
            TableRow::from_iter(["<b>", "\"quoted\""]),
            TableRow::from_iter(["a]]>b", "x\u{1}y"]),
        ];
        let mut first = page(1, "</w:t></w:r> & <w:p>\nform\u{c}feed");
        first.tables.push(table);
        let model = DocumentModel::from_pages(vec![first, page(2, "two")]);
        let bytes = DocxRenderer::default().render(&model).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in ["[Content_Types].xml", "_rels/.rels", "word/styles.xml", "word/document.xml"] {
            let mut xml = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();

            let mut reader = quick_xml::Reader::from_str(&xml);
            let mut depth = 0i32;
            loop {
                match reader.read_event().unwrap() {
                    quick_xml::events::Event::Start(_) => depth += 1,
                    quick_xml::events::Event::End(_) => depth -= 1,
                    quick_xml::events::Event::Eof => break,
                    _ => {}
                }
            }
            assert_eq!(depth, 0, "{name} is unbalanced");
        }

        let mut document = String::new();
        archive.by_name("word/document.xml").unwrap().read_to_string(&mut document).unwrap();
        assert!(document.contains("&lt;/w:t&gt;&lt;/w:r&gt; &amp; &lt;w:p&gt;"));
        assert!(document.contains("&quot;quoted&quot;"));
        assert!(!document.contains('\u{c}'));
        assert!(!document.contains('\u{1}'));
    }
}

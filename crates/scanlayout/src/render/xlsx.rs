//! Spreadsheet (xlsx) rendering, one sheet per page.
//!
//! Pages with tables get each table written as a padded grid, two blank rows
//! apart and without a header row. Pages without tables list their
//! non-blank transcription lines under a `Content` header. A page with
//! neither gets a placeholder row.

use super::ooxml::{self, Package, XmlWriter, empty, text_element};
use super::{OutputFormat, Renderer};
use crate::Result;
use crate::types::{DocumentModel, Page};
use std::io;

const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const OFFICE_REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const CONTENT_HEADER: &str = "Content";
pub const EMPTY_PLACEHOLDER: &str = "No content extracted";
/// Blank rows left between consecutive tables on a sheet.
pub const TABLE_GAP_ROWS: u32 = 2;

/// A row of cells at a 0-based sheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub index: u32,
    pub cells: Vec<String>,
}

/// The cell content of one worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    /// Lay out one page.
    pub fn from_page(page: &Page) -> Self {
        let name = format!("Page_{}", page.page_number);
        let mut rows = Vec::new();

        if page.has_tables() {
            let mut offset = 0u32;
            for table in page.tables.iter().filter(|t| t.column_count() > 0) {
                let grid = table.padded_rows();
                let height = grid.len() as u32;
                rows.extend(grid.into_iter().enumerate().map(|(i, cells)| SheetRow {
                    index: offset + i as u32,
                    cells,
                }));
                offset += height + TABLE_GAP_ROWS;
            }
        } else {
            let lines: Vec<String> = page
                .transcription
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            if !lines.is_empty() {
                rows.push(SheetRow {
                    index: 0,
                    cells: vec![CONTENT_HEADER.to_string()],
                });
                rows.extend(lines.into_iter().enumerate().map(|(i, line)| SheetRow {
                    index: i as u32 + 1,
                    cells: vec![line],
                }));
            }
        }

        if rows.is_empty() {
            rows = vec![
                SheetRow {
                    index: 0,
                    cells: vec![CONTENT_HEADER.to_string()],
                },
                SheetRow {
                    index: 1,
                    cells: vec![EMPTY_PLACEHOLDER.to_string()],
                },
            ];
        }

        Self { name, rows }
    }

    /// Cell text at a 0-based row and column.
    pub fn cell(&self, row: u32, column: usize) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.index == row)
            .and_then(|r| r.cells.get(column))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxRenderer;

impl XlsxRenderer {
    /// One sheet per page. An empty model still yields one placeholder
    /// sheet, since a workbook must contain at least one.
    pub fn sheets(&self, model: &DocumentModel) -> Vec<Sheet> {
        if model.pages.is_empty() {
            return vec![Sheet::from_page(&Page::empty(1))];
        }
        model.pages.iter().map(Sheet::from_page).collect()
    }
}

impl Renderer for XlsxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xlsx
    }

    fn render(&self, model: &DocumentModel) -> Result<Vec<u8>> {
        let sheets = self.sheets(model);

        let mut package = Package::new(OutputFormat::Xlsx.extension());
        package.add_xml("[Content_Types].xml", |w| write_content_types(w, sheets.len()))?;
        package.add_xml("_rels/.rels", |w| {
            ooxml::write_relationships(w, &[(ooxml::RELATIONSHIP_OFFICE_DOCUMENT, "xl/workbook.xml".to_string())])
        })?;
        package.add_xml("xl/workbook.xml", |w| write_workbook(w, &sheets))?;
        package.add_xml("xl/_rels/workbook.xml.rels", |w| write_workbook_relationships(w, sheets.len()))?;
        package.add_xml("xl/styles.xml", write_styles)?;
        for (i, sheet) in sheets.iter().enumerate() {
            package.add_xml(&format!("xl/worksheets/sheet{}.xml", i + 1), |w| write_worksheet(w, sheet))?;
        }
        package.finish()
    }
}

/// Spreadsheet column letters for a 0-based column index: 0 is `A`, 26 is `AA`.
pub fn column_name(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (column % 26) as u8);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

const WORKBOOK_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const STYLES_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
const WORKSHEET_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

fn write_content_types(w: &mut XmlWriter, sheet_count: usize) -> io::Result<()> {
    let mut overrides = vec![
        ("/xl/workbook.xml".to_string(), WORKBOOK_CONTENT_TYPE),
        ("/xl/styles.xml".to_string(), STYLES_CONTENT_TYPE),
    ];
    overrides.extend((1..=sheet_count).map(|i| (format!("/xl/worksheets/sheet{i}.xml"), WORKSHEET_CONTENT_TYPE)));
    ooxml::write_content_types(w, &overrides)
}

fn write_workbook(w: &mut XmlWriter, sheets: &[Sheet]) -> io::Result<()> {
    w.create_element("workbook")
        .with_attributes([("xmlns", SPREADSHEETML_NS), ("xmlns:r", OFFICE_REL_NS)])
        .write_inner_content(|w| {
            w.create_element("sheets").write_inner_content(|w| {
                for (i, sheet) in sheets.iter().enumerate() {
                    let id = (i + 1).to_string();
                    let relationship = format!("rId{id}");
                    empty(
                        w,
                        "sheet",
                        &[
                            ("name", sheet.name.as_str()),
                            ("sheetId", id.as_str()),
                            ("r:id", relationship.as_str()),
                        ],
                    )?;
                }
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(())
}

/// Worksheets take `rId1..=rIdN` so they line up with the workbook's
/// `r:id`s; styles come last.
fn write_workbook_relationships(w: &mut XmlWriter, sheet_count: usize) -> io::Result<()> {
    let mut targets: Vec<(&str, String)> = (1..=sheet_count)
        .map(|i| (ooxml::RELATIONSHIP_WORKSHEET, format!("worksheets/sheet{i}.xml")))
        .collect();
    targets.push((ooxml::RELATIONSHIP_STYLES, "styles.xml".to_string()));
    ooxml::write_relationships(w, &targets)
}

/// The minimal stylesheet: one font, the two mandatory fills, one border.
fn write_styles(w: &mut XmlWriter) -> io::Result<()> {
    w.create_element("styleSheet")
        .with_attribute(("xmlns", SPREADSHEETML_NS))
        .write_inner_content(|w| {
            w.create_element("fonts")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("font").write_inner_content(|w| {
                        empty(w, "sz", &[("val", "11")])?;
                        empty(w, "name", &[("val", "Calibri")])
                    })?;
                    Ok(())
                })?;
            w.create_element("fills")
                .with_attribute(("count", "2"))
                .write_inner_content(|w| {
                    for pattern in ["none", "gray125"] {
                        w.create_element("fill")
                            .write_inner_content(|w| empty(w, "patternFill", &[("patternType", pattern)]))?;
                    }
                    Ok(())
                })?;
            w.create_element("borders")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("border").write_inner_content(|w| {
                        for side in ["left", "right", "top", "bottom", "diagonal"] {
                            empty(w, side, &[])?;
                        }
                        Ok(())
                    })?;
                    Ok(())
                })?;
            let format = [("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")];
            w.create_element("cellStyleXfs")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| empty(w, "xf", &format))?;
            w.create_element("cellXfs")
                .with_attribute(("count", "1"))
                .write_inner_content(|w| {
                    w.create_element("xf")
                        .with_attributes(format)
                        .with_attribute(("xfId", "0"))
                        .write_empty()?;
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(())
}

fn write_worksheet(w: &mut XmlWriter, sheet: &Sheet) -> io::Result<()> {
    w.create_element("worksheet")
        .with_attribute(("xmlns", SPREADSHEETML_NS))
        .write_inner_content(|w| {
            w.create_element("sheetData").write_inner_content(|w| {
                for row in &sheet.rows {
                    let number = (row.index + 1).to_string();
                    w.create_element("row")
                        .with_attribute(("r", number.as_str()))
                        .write_inner_content(|w| {
                            for (column, text) in row.cells.iter().enumerate() {
                                if text.is_empty() {
                                    continue;
                                }
                                let reference = format!("{}{number}", column_name(column));
                                w.create_element("c")
                                    .with_attributes([("r", reference.as_str()), ("t", "inlineStr")])
                                    .write_inner_content(|w| {
                                        w.create_element("is").write_inner_content(|w| {
                                            text_element(w, "t", &[("xml:space", "preserve")], text)
                                        })?;
                                        Ok(())
                                    })?;
                            }
                            Ok(())
                        })?;
                }
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(())
}

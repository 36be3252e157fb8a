use serde::{Deserialize, Serialize};

/// Tokens below this confidence never reach a line or a table cell.
pub const MIN_TOKEN_CONFIDENCE: i32 = 30;

/// One recognized word with its pixel box and its place in the recognizer's
/// block/line numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// 0-100; the recognizer reports -1 for rows that are not words.
    pub confidence: i32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    pub block_index: i32,
    pub line_index: i32,
}

impl Token {
    /// Whether the token survives the confidence and empty-text filter.
    pub fn is_retained(&self) -> bool {
        self.confidence >= MIN_TOKEN_CONFIDENCE && !self.text.trim().is_empty()
    }
}

/// Space-joined text of consecutive tokens sharing a line index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub line_index: i32,
}

/// Consecutive lines sharing a block index. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_index: i32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub lines: Vec<Line>,
}

impl Block {
    /// Lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Cell strings ordered left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TableRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Pixel rectangle of a ruled table in the page image, plus its rows once
/// extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

impl TableRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rows: Vec::new(),
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Widest row's cell count; shorter rows are padded to this in renderings.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(TableRow::len).max().unwrap_or(0)
    }

    /// Rows padded with empty strings to [`column_count`](Self::column_count).
    pub fn padded_rows(&self) -> Vec<Vec<String>> {
        let columns = self.column_count();
        self.rows
            .iter()
            .map(|row| {
                let mut cells = row.cells.clone();
                cells.resize(columns, String::new());
                cells
            })
            .collect()
    }
}

/// Everything recovered from one input image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub page_number: usize,
    pub transcription: String,
    pub blocks: Vec<Block>,
    pub tables: Vec<TableRegion>,
}

impl Page {
    /// A page with no transcription, blocks or tables.
    pub fn empty(page_number: usize) -> Self {
        Self {
            page_number,
            transcription: String::new(),
            blocks: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn has_tables(&self) -> bool {
        !self.tables.is_empty()
    }
}

/// Ordered pages of one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentModel {
    pub pages: Vec<Page>,
}

impl DocumentModel {
    /// Build a model, ordering pages by page number.
    pub fn from_pages(mut pages: Vec<Page>) -> Self {
        pages.sort_by_key(|p| p.page_number);
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Result of processing a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutcome {
    pub page_number: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl PageOutcome {
    pub fn succeeded(page_number: usize) -> Self {
        Self {
            page_number,
            success: true,
            error: None,
        }
    }

    pub fn failed(page_number: usize, error: impl Into<String>) -> Self {
        Self {
            page_number,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A processed document: the model built from the pages that succeeded plus
/// one outcome per input page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub model: DocumentModel,
    pub outcomes: Vec<PageOutcome>,
}

impl DocumentResult {
    /// True when at least one page succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().any(|o| o.success)
    }

    pub fn failed_pages(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.page_number)
            .collect()
    }
}

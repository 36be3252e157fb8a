//! Plain text rendering.
//!
//! Each page's transcription keeps its lines (trailing whitespace removed) with
//! blank-line runs collapsed to a single paragraph separator. Every page after
//! the first is introduced by a `PAGE <n>` banner. Blank-line collapsing runs
//! over the whole output, so an empty page never produces a double gap.

use super::{OutputFormat, Renderer};
use crate::Result;
use crate::types::DocumentModel;

const BANNER_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Txt
    }

    fn render(&self, model: &DocumentModel) -> Result<Vec<u8>> {
        Ok(render_text(model).into_bytes())
    }
}

/// Render the model as plain text.
pub fn render_text(model: &DocumentModel) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    for (index, page) in model.pages.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
            lines.push(banner.clone());
            lines.push(format!("PAGE {}", page.page_number));
            lines.push(banner.clone());
            lines.push(String::new());
        }
        lines.extend(page.transcription.lines().map(|line| line.trim_end().to_string()));
        lines.push(String::new());
    }

    let collapsed = collapse_blank_lines(lines);
    if collapsed.is_empty() {
        return String::new();
    }
    let mut out = collapsed.join("\n");
    out.push('\n');
    out
}

/// Collapse blank runs to one blank line and strip leading and trailing blanks.
fn collapse_blank_lines(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && out.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        out.push(if blank { String::new() } else { line });
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out
}

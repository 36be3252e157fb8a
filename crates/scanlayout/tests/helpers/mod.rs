//! Shared fixtures for integration tests: a scripted recognizer and synthetic
//! page images.
#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma};
use scanlayout::ocr::{Recognition, Recognizer, RecognizerConfig};
use scanlayout::types::Token;
use scanlayout::{Result, ScanConfig, ScanLayoutError};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays fixed recognitions: one for full pages and one for table crops,
/// told apart by the page segmentation mode of the call.
pub struct ScriptedRecognizer {
    page: Option<Recognition>,
    table: Recognition,
    pub page_calls: AtomicUsize,
    pub table_calls: AtomicUsize,
    pub languages: Mutex<Vec<String>>,
    pub crop_sizes: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedRecognizer {
    pub fn new(page: Recognition) -> Self {
        Self {
            page: Some(page),
            table: Recognition::default(),
            page_calls: AtomicUsize::new(0),
            table_calls: AtomicUsize::new(0),
            languages: Mutex::new(Vec::new()),
            crop_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Every full-page call fails.
    pub fn failing() -> Self {
        Self {
            page: None,
            ..Self::new(Recognition::default())
        }
    }

    pub fn with_table(mut self, table: Recognition) -> Self {
        self.table = table;
        self
    }
}

impl Recognizer for ScriptedRecognizer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(&self, image: &DynamicImage, language: &str, config: &RecognizerConfig) -> Result<Recognition> {
        self.languages.lock().unwrap().push(language.to_string());

        if *config == RecognizerConfig::table_crop() {
            self.table_calls.fetch_add(1, Ordering::SeqCst);
            self.crop_sizes.lock().unwrap().push((image.width(), image.height()));
            return Ok(self.table.clone());
        }

        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.page
            .clone()
            .ok_or_else(|| ScanLayoutError::recognition(None, "scripted failure"))
    }
}

pub fn token(text: &str, confidence: i32, block: i32, line: i32, left: i32, top: i32) -> Token {
    Token {
        text: text.to_string(),
        confidence,
        left,
        top,
        width: 8 * text.len() as i32,
        height: 20,
        block_index: block,
        line_index: line,
    }
}

/// Tokens for a table crop: row `r` sits 100px below row `r - 1`, cells
/// 300px apart. Tokens are emitted right to left to exercise sorting.
pub fn table_tokens(rows: &[&[&str]]) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate().rev() {
            tokens.push(token(text, 90, 1, r as i32 + 1, 40 + 300 * c as i32, 30 + 100 * r as i32));
        }
    }
    tokens
}

/// Page recognition whose transcription is `lines` joined by newlines, one
/// token per word.
pub fn page_recognition(lines: &[&str]) -> Recognition {
    let mut tokens = Vec::new();
    for (l, line) in lines.iter().enumerate() {
        for (w, word) in line.split_whitespace().enumerate() {
            tokens.push(token(word, 92, 1, l as i32 + 1, 50 + 120 * w as i32, 60 + 40 * l as i32));
        }
    }
    Recognition {
        transcription: lines.join("\n"),
        tokens,
    }
}

pub fn blank_page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Draw a ruled grid with 2px black lines. `cols` and `rows` are offsets of
/// the rulings from `(x, y)`; the last entries give the grid size.
pub fn draw_grid(gray: &mut GrayImage, x: u32, y: u32, cols: &[u32], rows: &[u32]) {
    let width = cols.last().copied().unwrap_or(0);
    let height = rows.last().copied().unwrap_or(0);
    for &ry in rows {
        for dx in 0..=width + 1 {
            for t in 0..2 {
                gray.put_pixel(x + dx, y + ry + t, Luma([0]));
            }
        }
    }
    for &cx in cols {
        for dy in 0..=height + 1 {
            for t in 0..2 {
                gray.put_pixel(x + cx + t, y + dy, Luma([0]));
            }
        }
    }
}

/// Horizontal black bars, `thickness` px high, starting at `(x, y)` and
/// spaced `spacing` px apart.
pub fn draw_bars(gray: &mut GrayImage, x: u32, y: u32, length: u32, count: u32, spacing: u32, thickness: u32) {
    for i in 0..count {
        let top = y + i * spacing;
        for dy in 0..thickness {
            for dx in 0..length {
                gray.put_pixel(x + dx, top + dy, Luma([0]));
            }
        }
    }
}

/// Config for tests: denoising off, which is slow and irrelevant to
/// geometry.
pub fn test_config() -> ScanConfig {
    let mut config = ScanConfig::default();
    config.normalize.denoise = false;
    config.max_concurrent_pages = 2;
    config
}

//! Conversion of raw recognizer output into [`Token`]s.
//!
//! Two shapes are accepted: Tesseract TSV rows and column-oriented data (one
//! array per field, as returned by many recognizer wrappers). Both are lenient:
//! malformed rows are skipped and unparsable numbers become 0, so a bad token
//! can only drop out of the layout, never fail the page.

use crate::Result;
use crate::types::Token;
use serde::{Deserialize, Serialize};

/// TSV level of word rows.
pub const TSV_WORD_LEVEL: u32 = 5;
/// Field count of a complete TSV row.
pub const TSV_MIN_FIELDS: usize = 12;

/// Extract word tokens from Tesseract TSV output.
///
/// The header line is skipped. Rows that are not word level or have fewer
/// than [`TSV_MIN_FIELDS`] fields are ignored. Token order follows the input.
pub fn parse_tsv_tokens(tsv_data: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (line_num, line) in tsv_data.lines().enumerate() {
        if line_num == 0 || line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        if fields[0].trim().parse::<u32>().ok() != Some(TSV_WORD_LEVEL) {
            continue;
        }

        tokens.push(Token {
            text: fields[11..].join("\t").trim().to_string(),
            confidence: parse_confidence(fields[10]),
            left: parse_int(fields[6]),
            top: parse_int(fields[7]),
            width: parse_int(fields[8]),
            height: parse_int(fields[9]),
            block_index: parse_int(fields[2]),
            line_index: parse_int(fields[4]),
        });
    }

    tokens
}

/// Column-oriented recognizer output, one array per field.
///
/// Missing columns default to empty. Values may be numbers or strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenColumns {
    #[serde(default)]
    pub text: Vec<serde_json::Value>,
    #[serde(default)]
    pub conf: Vec<serde_json::Value>,
    #[serde(default)]
    pub left: Vec<serde_json::Value>,
    #[serde(default)]
    pub top: Vec<serde_json::Value>,
    #[serde(default)]
    pub width: Vec<serde_json::Value>,
    #[serde(default)]
    pub height: Vec<serde_json::Value>,
    #[serde(default)]
    pub block_num: Vec<serde_json::Value>,
    #[serde(default)]
    pub line_num: Vec<serde_json::Value>,
}

impl TokenColumns {
    /// Parse column data from a JSON object.
    ///
    /// # Errors
    ///
    /// `Serialization` when `json` is not an object of arrays.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Zip the columns into tokens.
    ///
    /// The token count is the length of the `text` column. Any other column
    /// that is shorter yields 0 for the missing positions.
    pub fn into_tokens(self) -> Vec<Token> {
        let at = |column: &[serde_json::Value], i: usize| column.get(i).map(value_to_int).unwrap_or(0);

        self.text
            .iter()
            .enumerate()
            .map(|(i, text)| Token {
                text: value_to_text(text),
                confidence: self.conf.get(i).map(value_to_confidence).unwrap_or(0),
                left: at(&self.left, i),
                top: at(&self.top, i),
                width: at(&self.width, i),
                height: at(&self.height, i),
                block_index: at(&self.block_num, i),
                line_index: at(&self.line_num, i),
            })
            .collect()
    }
}

fn parse_int(field: &str) -> i32 {
    field.trim().parse().unwrap_or(0)
}

/// Confidence as an integer percentage. Tesseract emits fractional values.
fn parse_confidence(field: &str) -> i32 {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite())
        .map(|c| c as i32)
        .unwrap_or(0)
}

fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn value_to_int(value: &serde_json::Value) -> i32 {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|v| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
            .unwrap_or(0),
        serde_json::Value::String(s) => parse_int(s),
        _ => 0,
    }
}

fn value_to_confidence(value: &serde_json::Value) -> i32 {
    match value {
        serde_json::Value::String(s) => parse_confidence(s),
        other => value_to_int(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_words() {
        let tsv = format!(
            "{HEADER}\n\
             5\t1\t1\t1\t1\t1\t100\t50\t80\t30\t95.5\tHello\n\
             5\t1\t1\t1\t1\t2\t190\t50\t70\t30\t92.3\tWorld"
        );

        let tokens = parse_tsv_tokens(&tsv);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "Hello");
        assert_eq!(tokens[0].confidence, 95);
        assert_eq!(tokens[0].left, 100);
        assert_eq!(tokens[0].top, 50);
        assert_eq!(tokens[0].block_index, 1);
        assert_eq!(tokens[0].line_index, 1);
        assert_eq!(tokens[1].text, "World");
    }

    #[test]
    fn test_parse_tsv_skips_non_word_levels() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t1000\t1000\t-1\t\n\
             4\t1\t1\t1\t1\t0\t100\t50\t200\t30\t-1\t\n\
             5\t1\t1\t1\t1\t1\t100\t50\t80\t30\t88\tword"
        );

        let tokens = parse_tsv_tokens(&tsv);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "word");
    }

    #[test]
    fn test_parse_tsv_tolerates_malformed_rows() {
        let tsv = format!(
            "{HEADER}\n\
             5\t1\t1\n\
             5\t1\tx\t1\t1\t1\t100\t50\t80\t30\tnan-ish\tkept\n\
             \n"
        );

        let tokens = parse_tsv_tokens(&tsv);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "kept");
        assert_eq!(tokens[0].confidence, 0);
        assert_eq!(tokens[0].block_index, 0);
    }

    #[test]
    fn test_columns_inconsistent_lengths() {
        let columns = TokenColumns::from_json(
            r#"{
                "text": ["Item", "Qty", "Pens"],
                "conf": [96, "91.2"],
                "left": [10, 200, 10],
                "top": [5, 5],
                "block_num": [1, 1, 1],
                "line_num": [1, 1, 2]
            }"#,
        )
        .unwrap();

        let tokens = columns.into_tokens();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].confidence, 91);
        assert_eq!(tokens[2].confidence, 0);
        assert_eq!(tokens[2].top, 0);
        assert_eq!(tokens[2].width, 0);
        assert_eq!(tokens[2].line_index, 2);
    }

    #[test]
    fn test_columns_non_numeric_values() {
        let columns = TokenColumns::from_json(
            r#"{"text": ["a", null], "conf": ["high", 90], "left": [null, "12"]}"#,
        )
        .unwrap();

        let tokens = columns.into_tokens();
        assert_eq!(tokens[0].confidence, 0);
        assert_eq!(tokens[0].left, 0);
        assert_eq!(tokens[1].text, "");
        assert_eq!(tokens[1].left, 12);
    }

    #[test]
    fn test_columns_malformed_json() {
        let err = TokenColumns::from_json(r#"{"text": "Item"}"#).unwrap_err();
        assert!(matches!(err, crate::ScanLayoutError::Serialization { .. }));

        let err = TokenColumns::from_json("{not json").unwrap_err();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}

//! Token stream to block/line tree.
//!
//! A single forward pass with two accumulators, the line being built and the
//! block being built. Tokens are taken in recognizer order and never re-sorted,
//! so a block index that reappears after another block starts a new block.

use crate::types::{Block, Line, Token};

#[derive(Debug)]
struct LineAccumulator {
    words: Vec<String>,
    left: i32,
    top: i32,
    line_index: i32,
}

impl LineAccumulator {
    fn start(token: &Token) -> Self {
        Self {
            words: Vec::new(),
            left: token.left,
            top: token.top,
            line_index: token.line_index,
        }
    }

    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn push(&mut self, text: &str) {
        self.words.push(text.to_string());
    }

    fn finish(self) -> Option<Line> {
        (!self.words.is_empty()).then(|| Line {
            text: self.words.join(" "),
            left: self.left,
            top: self.top,
            line_index: self.line_index,
        })
    }
}

#[derive(Debug)]
struct BlockAccumulator {
    lines: Vec<Line>,
    block_index: i32,
    left: i32,
    top: i32,
    width: i32,
}

impl BlockAccumulator {
    fn start(token: &Token) -> Self {
        Self {
            lines: Vec::new(),
            block_index: token.block_index,
            left: token.left,
            top: token.top,
            width: token.width,
        }
    }

    fn finish(self) -> Option<Block> {
        (!self.lines.is_empty()).then(|| Block {
            block_index: self.block_index,
            left: self.left,
            top: self.top,
            width: self.width,
            lines: self.lines,
        })
    }
}

/// Accumulator state between tokens.
#[derive(Debug, Default)]
struct LayoutBuilder {
    blocks: Vec<Block>,
    current: Option<(BlockAccumulator, LineAccumulator)>,
}

impl LayoutBuilder {
    fn feed(&mut self, token: &Token) {
        if !token.is_retained() {
            return;
        }
        let text = token.text.trim();

        match self.current.take() {
            Some((block, line)) if block.block_index == token.block_index => {
                let (mut block, mut line) = (block, line);
                if line.line_index != token.line_index && !line.is_empty() {
                    if let Some(done) = line.finish() {
                        block.lines.push(done);
                    }
                    line = LineAccumulator::start(token);
                }
                line.push(text);
                self.current = Some((block, line));
            }
            previous => {
                if let Some((block, line)) = previous {
                    self.flush(block, line);
                }
                let mut line = LineAccumulator::start(token);
                line.push(text);
                self.current = Some((BlockAccumulator::start(token), line));
            }
        }
    }

    fn flush(&mut self, mut block: BlockAccumulator, line: LineAccumulator) {
        if let Some(done) = line.finish() {
            block.lines.push(done);
        }
        if let Some(done) = block.finish() {
            self.blocks.push(done);
        }
    }

    fn finish(mut self) -> Vec<Block> {
        if let Some((block, line)) = self.current.take() {
            self.flush(block, line);
        }
        self.blocks
    }
}

/// Group a recognizer token stream into blocks of lines.
///
/// Tokens below the confidence floor or with blank text are skipped. A change
/// of block index between consecutive kept tokens closes the current line and
/// block; a change of line index within a block closes the current line.
/// Empty lines and blocks are never produced.
pub fn build_blocks(tokens: &[Token]) -> Vec<Block> {
    let mut builder = LayoutBuilder::default();
    for token in tokens {
        builder.feed(token);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, confidence: i32, block: i32, line: i32, left: i32) -> Token {
        Token {
            text: text.to_string(),
            confidence,
            left,
            top: line * 30,
            width: 40,
            height: 20,
            block_index: block,
            line_index: line,
        }
    }

    #[test]
    fn test_empty_stream() {
        assert!(build_blocks(&[]).is_empty());
    }

    #[test]
    fn test_single_line() {
        let tokens = vec![token("Hello", 90, 1, 1, 10), token("world", 85, 1, 1, 60)];
        let blocks = build_blocks(&tokens);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines.len(), 1);
        assert_eq!(blocks[0].lines[0].text, "Hello world");
        assert_eq!(blocks[0].lines[0].left, 10);
    }

    #[test]
    fn test_line_break_within_block() {
        let tokens = vec![
            token("first", 90, 1, 1, 10),
            token("line", 90, 1, 1, 60),
            token("second", 90, 1, 2, 10),
        ];
        let blocks = build_blocks(&tokens);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "first line\nsecond");
        assert_eq!(blocks[0].lines[1].top, 60);
    }

    #[test]
    fn test_low_confidence_and_blank_tokens_dropped() {
        let tokens = vec![
            token("keep", 30, 1, 1, 10),
            token("noise", 29, 1, 1, 50),
            token("", 99, 1, 1, 90),
            token("   ", 99, 1, 1, 95),
            token("also", 77, 1, 1, 100),
        ];
        let blocks = build_blocks(&tokens);
        assert_eq!(blocks[0].lines[0].text, "keep also");
    }

    #[test]
    fn test_block_seeded_from_first_retained_token() {
        let tokens = vec![token("ghost", 5, 2, 1, 0), token("real", 90, 2, 1, 123)];
        let blocks = build_blocks(&tokens);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].left, 123);
        assert_eq!(blocks[0].width, 40);
    }

    #[test]
    fn test_revisited_block_index_is_new_block() {
        let tokens = vec![
            token("a", 90, 0, 0, 0),
            token("b", 90, 0, 0, 10),
            token("c", 90, 1, 0, 0),
            token("d", 90, 1, 0, 10),
            token("e", 90, 0, 0, 20),
        ];
        let blocks = build_blocks(&tokens);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].text(), "a b");
        assert_eq!(blocks[1].text(), "c d");
        assert_eq!(blocks[2].text(), "e");
    }

    #[test]
    fn test_all_filtered_stream_yields_nothing() {
        let tokens = vec![token("x", 10, 0, 0, 0), token("", 90, 1, 0, 0)];
        assert!(build_blocks(&tokens).is_empty());
    }
}

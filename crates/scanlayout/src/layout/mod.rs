//! Layout reconstruction: blocks and lines from the token stream, ruled table
//! regions from the page image, and table rows from per-region recognition.
pub mod blocks;
pub mod cells;
pub mod tables;

pub use blocks::build_blocks;
pub use cells::{extract_cells, extract_table};
pub use tables::{detect_tables, detect_tables_gray, ruling_mask};

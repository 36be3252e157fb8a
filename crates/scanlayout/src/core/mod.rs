//! Core processing: configuration, input loading, the per-page pipeline and
//! document assembly.
pub mod config;
pub mod document;
pub mod io;
pub mod pipeline;

pub use config::{NormalizeConfig, RecognizerSettings, RenderConfig, ScanConfig, TableConfig};
pub use document::{DocumentProcessor, build_document, build_page};
pub use io::{SUPPORTED_EXTENSIONS, check_page_limit, is_supported_input, load_pages, load_pages_from_bytes};
pub use pipeline::process_page;

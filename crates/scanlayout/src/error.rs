//! Error types for scanlayout.
//!
//! Every fallible operation in the crate returns [`ScanLayoutError`]. The four
//! domain failures a caller has to distinguish are:
//!
//! - `UnreadableImage` - an input could not be decoded into page images
//! - `RecognitionFailed` - the recognizer call failed, tagged with the page when known
//! - `PageLimitExceeded` - the input has more pages than the configured ceiling
//! - `RenderFailed` - one output format could not be serialized
//!
//! `Io` errors bubble up unchanged. `Validation` covers bad configuration,
//! unsupported language codes and unknown output format names.
//! `Serialization` covers recognizer output that is not well-formed JSON.
//!
//! Degraded outcomes (a discarded one-row table, a heading rule that does not
//! match) are never errors.
use thiserror::Error;

/// Result type alias using `ScanLayoutError`.
pub type Result<T> = std::result::Result<T, ScanLayoutError>;

/// Main error type for all scanlayout operations.
#[derive(Debug, Error)]
pub enum ScanLayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable image: {message}")]
    UnreadableImage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{}", recognition_message(.page, .message))]
    RecognitionFailed {
        /// 1-based page number, when the failure belongs to a page.
        page: Option<usize>,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Page limit exceeded: document has {pages} pages, limit is {limit}")]
    PageLimitExceeded { pages: usize, limit: usize },

    #[error("Render failed for {format}: {message}")]
    RenderFailed {
        format: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn recognition_message(page: &Option<usize>, message: &str) -> String {
    match page {
        Some(page) => format!("Recognition failed on page {page}: {message}"),
        None => format!("Recognition failed: {message}"),
    }
}

impl From<serde_json::Error> for ScanLayoutError {
    fn from(err: serde_json::Error) -> Self {
        ScanLayoutError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<image::ImageError> for ScanLayoutError {
    fn from(err: image::ImageError) -> Self {
        ScanLayoutError::UnreadableImage {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "pdf")]
impl From<crate::pdf::PdfError> for ScanLayoutError {
    fn from(err: crate::pdf::PdfError) -> Self {
        ScanLayoutError::UnreadableImage {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl ScanLayoutError {
    error_constructor!(unreadable_image, UnreadableImage);
    error_constructor!(validation, Validation);

    /// Create a `RecognitionFailed` error, optionally tied to a 1-based page.
    pub fn recognition<S: Into<String>>(page: Option<usize>, message: S) -> Self {
        Self::RecognitionFailed {
            page,
            message: message.into(),
            source: None,
        }
    }

    pub fn recognition_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        page: Option<usize>,
        message: S,
        source: E,
    ) -> Self {
        Self::RecognitionFailed {
            page,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a `RenderFailed` error for the named output format.
    pub fn render<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::RenderFailed {
            format: format.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn render_with_source<F: Into<String>, S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: F,
        message: S,
        source: E,
    ) -> Self {
        Self::RenderFailed {
            format: format.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Attach a page number to a recognition failure that was raised without one.
    ///
    /// Other variants are returned untouched.
    pub fn with_page(self, page_number: usize) -> Self {
        match self {
            Self::RecognitionFailed {
                page: None,
                message,
                source,
            } => Self::RecognitionFailed {
                page: Some(page_number),
                message,
                source,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScanLayoutError = io_err.into();
        assert!(matches!(err, ScanLayoutError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_unreadable_image_error() {
        let err = ScanLayoutError::unreadable_image("truncated PNG");
        assert_eq!(err.to_string(), "Unreadable image: truncated PNG");
    }

    #[test]
    fn test_unreadable_image_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad header");
        let err = ScanLayoutError::unreadable_image_with_source("decode failed", source);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_recognition_error_with_page() {
        let err = ScanLayoutError::recognition(Some(3), "engine unavailable");
        assert_eq!(err.to_string(), "Recognition failed on page 3: engine unavailable");
    }

    #[test]
    fn test_recognition_error_without_page() {
        let err = ScanLayoutError::recognition(None, "engine unavailable");
        assert_eq!(err.to_string(), "Recognition failed: engine unavailable");
    }

    #[test]
    fn test_with_page_fills_missing_page() {
        let err = ScanLayoutError::recognition(None, "boom").with_page(2);
        assert!(matches!(err, ScanLayoutError::RecognitionFailed { page: Some(2), .. }));

        let err = ScanLayoutError::recognition(Some(5), "boom").with_page(2);
        assert!(matches!(err, ScanLayoutError::RecognitionFailed { page: Some(5), .. }));

        let err = ScanLayoutError::validation("bad").with_page(2);
        assert!(matches!(err, ScanLayoutError::Validation { .. }));
    }

    #[test]
    fn test_page_limit_exceeded() {
        let err = ScanLayoutError::PageLimitExceeded { pages: 51, limit: 50 };
        assert_eq!(
            err.to_string(),
            "Page limit exceeded: document has 51 pages, limit is 50"
        );
    }

    #[test]
    fn test_render_failed() {
        let err = ScanLayoutError::render("xlsx", "zip writer closed");
        assert_eq!(err.to_string(), "Render failed for xlsx: zip writer closed");
    }

    #[test]
    fn test_serde_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ScanLayoutError = json_err.into();
        assert!(matches!(err, ScanLayoutError::Serialization { .. }));
    }
}

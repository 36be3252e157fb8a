//! Document model building and page-level concurrency.
//!
//! Pages of one document are independent. [`DocumentProcessor`] fans them out
//! to workers, collects each page's result by index and assembles the
//! [`DocumentModel`] from the pages that succeeded. A failing, panicking or
//! timed-out page is recorded in the outcomes and never takes its siblings
//! down with it.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "tesseract")]
//! # fn example() -> scanlayout::Result<()> {
//! use scanlayout::core::config::ScanConfig;
//! use scanlayout::core::document::DocumentProcessor;
//! use scanlayout::ocr::TesseractRecognizer;
//! use std::sync::Arc;
//!
//! let processor = DocumentProcessor::new(Arc::new(TesseractRecognizer::new(None)), ScanConfig::default());
//! let result = processor.process_file("invoice.png")?;
//! println!("{} pages, failed: {:?}", result.model.page_count(), result.failed_pages());
//! # Ok(())
//! # }
//! ```

use crate::core::config::ScanConfig;
use crate::core::io::{check_page_limit, load_pages};
use crate::core::pipeline::process_page;
use crate::ocr::Recognizer;
use crate::types::{Block, DocumentModel, DocumentResult, Page, PageOutcome, TableRegion};
use crate::Result;
use image::DynamicImage;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

/// Per-page result as collected from workers. The error side is the
/// message recorded in the page's outcome.
type PageResult = std::result::Result<Page, String>;

/// Assemble one page. Tables whose extraction produced no rows are dropped.
pub fn build_page(page_number: usize, transcription: String, blocks: Vec<Block>, tables: Vec<TableRegion>) -> Page {
    Page {
        page_number,
        transcription,
        blocks,
        tables: tables.into_iter().filter(|t| !t.rows.is_empty()).collect(),
    }
}

/// Assemble a document from its pages, in page-number order.
pub fn build_document(pages: Vec<Page>) -> DocumentModel {
    DocumentModel::from_pages(pages)
}

/// Runs the page pipeline over every page of a document.
#[derive(Clone)]
pub struct DocumentProcessor {
    recognizer: Arc<dyn Recognizer>,
    config: Arc<ScanConfig>,
}

impl std::fmt::Debug for DocumentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("recognizer", &self.recognizer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl DocumentProcessor {
    pub fn new(recognizer: Arc<dyn Recognizer>, config: ScanConfig) -> Self {
        Self {
            recognizer,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn recognizer(&self) -> &dyn Recognizer {
        self.recognizer.as_ref()
    }

    /// Load `path` and process all of its pages on the rayon pool.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<DocumentResult> {
        let pages = load_pages(path, &self.config)?;
        self.process_pages(pages)
    }

    /// Process page images on a rayon pool of `max_concurrent_pages` threads.
    ///
    /// # Errors
    ///
    /// Only `PageLimitExceeded`, checked before any page is touched. Page
    /// failures are reported in the returned outcomes.
    pub fn process_pages(&self, pages: Vec<DynamicImage>) -> Result<DocumentResult> {
        check_page_limit(pages.len(), self.config.max_pages)?;
        tracing::info!(pages = pages.len(), recognizer = self.recognizer.name(), "Processing document");

        let run = || {
            pages
                .into_par_iter()
                .enumerate()
                .map(|(index, image)| Some(self.run_page(image, index + 1)))
                .collect::<Vec<_>>()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrent_pages.max(1))
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!(error = %e, "Could not build page pool, using the global rayon pool");
                run()
            }
        };

        Ok(assemble(results))
    }

    fn run_page(&self, image: DynamicImage, page_number: usize) -> PageResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            process_page(self.recognizer.as_ref(), image, page_number, &self.config)
        }));
        match outcome {
            Ok(Ok(page)) => Ok(page),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("Task panicked while processing page {page_number}")),
        }
    }

    /// Load `path` off the async runtime and process its pages concurrently.
    #[cfg(feature = "tokio-runtime")]
    pub async fn process_file_async(&self, path: impl AsRef<Path>) -> Result<DocumentResult> {
        let path = path.as_ref().to_path_buf();
        let config = Arc::clone(&self.config);
        let pages = tokio::task::spawn_blocking(move || load_pages(path, &config))
            .await
            .map_err(|e| crate::ScanLayoutError::unreadable_image_with_source("Input loading task panicked", e))??;
        self.process_pages_async(pages).await
    }

    /// Process page images as blocking tasks on the tokio runtime.
    ///
    /// At most `max_concurrent_pages` pages run at once. With
    /// `page_timeout_secs` set, a page that does not finish in time is
    /// reported failed; its worker thread is left to finish on its own and
    /// keeps its slot until it does.
    #[cfg(feature = "tokio-runtime")]
    pub async fn process_pages_async(&self, pages: Vec<DynamicImage>) -> Result<DocumentResult> {
        use std::time::Duration;
        use tokio::sync::Semaphore;
        use tokio::task::JoinSet;

        check_page_limit(pages.len(), self.config.max_pages)?;
        tracing::info!(pages = pages.len(), recognizer = self.recognizer.name(), "Processing document");

        let page_count = pages.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_pages.max(1)));
        let timeout = self.config.page_timeout_secs.map(Duration::from_secs);

        let mut tasks = JoinSet::new();
        for (index, image) in pages.into_iter().enumerate() {
            let page_number = index + 1;
            let recognizer = Arc::clone(&self.recognizer);
            let config = Arc::clone(&self.config);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let Ok(permit) = semaphore.acquire_owned().await else {
                    return (index, Err("Page scheduler closed".to_string()));
                };

                // The permit lives as long as the blocking work, so a page
                // that outlives its timeout still counts against the bound.
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    process_page(recognizer.as_ref(), image, page_number, &config)
                });

                let joined = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            return (index, Err(format!("Page timed out after {}s", limit.as_secs())));
                        }
                    },
                    None => work.await,
                };

                let result = match joined {
                    Ok(Ok(page)) => Ok(page),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(join_err) => Err(format!("Task panicked: {join_err}")),
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<PageResult>> = vec![None; page_count];
        while let Some(task_result) = tasks.join_next().await {
            match task_result {
                Ok((index, result)) => results[index] = Some(result),
                Err(join_err) => {
                    tracing::warn!(error = %join_err, "Page task aborted");
                }
            }
        }

        Ok(assemble(results))
    }
}

/// Merge per-page results, in index order, into a document result. A missing
/// slot is a task that never reported back.
fn assemble(results: Vec<Option<PageResult>>) -> DocumentResult {
    let mut pages = Vec::with_capacity(results.len());
    let mut outcomes = Vec::with_capacity(results.len());

    for (index, slot) in results.into_iter().enumerate() {
        let page_number = index + 1;
        match slot {
            Some(Ok(page)) => {
                pages.push(page);
                outcomes.push(PageOutcome::succeeded(page_number));
            }
            Some(Err(message)) => {
                tracing::warn!(page = page_number, error = %message, "Page failed");
                outcomes.push(PageOutcome::failed(page_number, message));
            }
            None => {
                tracing::warn!(page = page_number, "Page task did not report a result");
                outcomes.push(PageOutcome::failed(page_number, "Task panicked"));
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    tracing::info!(pages = pages.len(), failed, "Document processed");

    DocumentResult {
        model: build_document(pages),
        outcomes,
    }
}

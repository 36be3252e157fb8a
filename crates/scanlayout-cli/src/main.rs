//! scanlayout CLI - scanned documents to txt, docx and xlsx.

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use scanlayout::core::io::load_pages;
use scanlayout::image::{normalize, resize_for_ocr};
use scanlayout::ocr::{SUPPORTED_LANGUAGES, TesseractRecognizer, validate_language};
use scanlayout::{DocumentProcessor, OutputFormat, ScanConfig, is_supported_input, write_artifacts};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scanlayout",
    version,
    about = "Reconstruct the layout of scanned documents",
    after_help = "EXAMPLES:\n  \
                  scanlayout process invoice.png --format docx --format xlsx\n  \
                  scanlayout process letter.pdf --lang fra --output-dir out\n  \
                  scanlayout normalize scan.jpg scan_clean.png\n  \
                  scanlayout languages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize a document and write one artifact per output format
    Process {
        /// Input file (pdf, png, jpg, jpeg, tif, tiff, bmp)
        input: PathBuf,

        /// Output format, repeatable or comma separated
        #[arg(short, long = "format", value_delimiter = ',', default_value = "txt")]
        formats: Vec<OutputFormat>,

        /// Recognition language code, e.g. eng or eng+fra
        #[arg(short, long)]
        lang: Option<String>,

        /// Directory the artifacts are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Artifact identifier prefix (random when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Configuration file (toml, yaml or json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum number of pages accepted
        #[arg(long)]
        max_pages: Option<usize>,

        /// Per-page timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Write the normalized first page of an input as an image
    Normalize {
        input: PathBuf,
        output: PathBuf,

        /// Configuration file (toml, yaml or json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List supported recognition languages
    Languages,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScanConfig> {
    if let Some(path) = path {
        return ScanConfig::from_file(path).with_context(|| format!("Failed to load config {}", path.display()));
    }
    Ok(ScanConfig::discover()
        .context("Failed to discover scanlayout.toml")?
        .unwrap_or_default())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process {
            input,
            formats,
            lang,
            output_dir,
            id,
            config,
            max_pages,
            timeout,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(lang) = lang {
                validate_language(&lang)?;
                config.language = lang;
            }
            if let Some(max_pages) = max_pages {
                config.max_pages = max_pages;
            }
            if timeout.is_some() {
                config.page_timeout_secs = timeout;
            }
            config.validate()?;
            process(&input, &formats, &output_dir, id, config).await
        }
        Commands::Normalize { input, output, config } => {
            let config = load_config(config.as_deref())?;
            let page = load_pages(&input, &config)?
                .into_iter()
                .next()
                .context("Input has no pages")?;
            let normalized = normalize(&resize_for_ocr(page)?, &config.normalize);
            normalized
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", output.display());
            Ok(())
        }
        Commands::Languages => {
            for (code, name) in SUPPORTED_LANGUAGES {
                println!("{code:<8} {name}");
            }
            Ok(())
        }
    }
}

async fn process(
    input: &Path,
    formats: &[OutputFormat],
    output_dir: &Path,
    id: Option<String>,
    config: ScanConfig,
) -> Result<()> {
    if !is_supported_input(input) {
        bail!("Unsupported input type: {}", input.display());
    }
    std::fs::create_dir_all(output_dir).with_context(|| format!("Failed to create {}", output_dir.display()))?;
    tracing::info!(input = %input.display(), ?formats, language = %config.language, "Processing");

    let recognizer = TesseractRecognizer::new(config.recognizer.tessdata_path.clone());
    let render_config = config.render.clone();
    let processor = DocumentProcessor::new(Arc::new(recognizer), config);

    let result = processor.process_file_async(input).await?;
    for outcome in result.outcomes.iter().filter(|o| !o.success) {
        eprintln!(
            "page {} failed: {}",
            outcome.page_number,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    if !result.is_success() {
        bail!("No page of {} could be processed", input.display());
    }

    let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let original_name = input.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let mut failed = 0;
    for (format, written) in write_artifacts(&result.model, formats, &render_config, output_dir, &id, original_name) {
        match written {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{format}: {e}");
            }
        }
    }
    if failed == formats.len() {
        bail!("No output format could be written");
    }
    Ok(())
}

//! Binary for pdf2md-service.
//!
//! With no subcommand it serves `POST /extract_markdown`. The `convert`
//! subcommand converts a single file locally, without the HTTP layer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf2md_service::config::{
    DEFAULT_LEGACY_INPUT_ROOT, DEFAULT_LEGACY_OUTPUT_DIR, DEFAULT_SHARED_DATA_ROOT,
};
use pdf2md_service::{
    serve, ConversionConfig, ConversionHandler, PageSeparator, PdfiumConverter, ServiceConfig,
};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Characters of Markdown shown by `convert` after a successful run.
const PREVIEW_CHARS: usize = 500;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on 0.0.0.0:8002, allowing the working directory, /app/data and /app/input
  pdf2md-service

  # Additionally allow /mnt/shared
  ALLOWED_BASE_PATH=/mnt/shared pdf2md-service

  # Call the service
  curl -s localhost:8002/extract_markdown \
       -H 'content-type: application/json' \
       -d '{"file_path": "./data/report.pdf"}'

  # Convert one file locally; writes report.md next to it
  pdf2md-service convert ./data/report.pdf

ENVIRONMENT VARIABLES:
  ALLOWED_BASE_PATH          Extra directory appended to the allow-list
  PDF2MD_HOST / PDF2MD_PORT  Listen address (default 0.0.0.0:8002)
  PDF2MD_SHARED_DATA_ROOT    Inputs below get a sibling .md (default /app/data, "" disables)
  PDF2MD_LEGACY_INPUT_ROOT   Inputs below are written to the legacy output dir (default /app/input, "" disables)
  PDF2MD_LEGACY_OUTPUT_DIR   Legacy output directory (default /app/output)
  PDFIUM_LIB_PATH            Path to libpdfium (file or directory)
  RUST_LOG                   Log filter, e.g. pdf2md_service=debug
"#;

/// Serve PDF-to-Markdown conversion over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-service",
    version,
    about = "Serve PDF-to-Markdown conversion for files on local storage",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to listen on.
    #[arg(long, env = "PDF2MD_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PDF2MD_PORT", default_value_t = 8002)]
    port: u16,

    /// Extra directory appended to the allow-list.
    #[arg(long, env = "ALLOWED_BASE_PATH")]
    allowed_base_path: Option<String>,

    /// Inputs under this directory get a sibling .md file ("" disables).
    #[arg(long, env = "PDF2MD_SHARED_DATA_ROOT", default_value = DEFAULT_SHARED_DATA_ROOT)]
    shared_data_root: String,

    /// Inputs under this directory are written to the legacy output dir ("" disables).
    #[arg(long, env = "PDF2MD_LEGACY_INPUT_ROOT", default_value = DEFAULT_LEGACY_INPUT_ROOT)]
    legacy_input_root: String,

    /// Destination for outputs of legacy inputs.
    #[arg(long, env = "PDF2MD_LEGACY_OUTPUT_DIR", default_value = DEFAULT_LEGACY_OUTPUT_DIR)]
    legacy_output_dir: PathBuf,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "PDF2MD_PAGE_SEPARATOR", default_value = "none")]
    page_separator: String,

    /// Prepend YAML front-matter with document metadata.
    #[arg(long, env = "PDF2MD_METADATA")]
    metadata: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2MD_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one PDF locally and write the Markdown next to it.
    Convert {
        /// PDF file to convert.
        input: PathBuf,

        /// Write Markdown here instead of `<input stem>.md` beside the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full ConversionOutput as JSON instead of a preview.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pdf2md_service=debug,tower_http=debug"
    } else {
        "pdf2md_service=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let conversion = build_conversion_config(&cli)?;

    match cli.command {
        Some(Command::Convert {
            ref input,
            ref output,
            json,
        }) => convert_one(conversion, input.clone(), output.clone(), json).await,
        None => run_server(&cli, conversion).await,
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_conversion_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .page_separator(PageSeparator::parse(&cli.page_separator))
        .include_metadata(cli.metadata);
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    builder.build().context("Invalid conversion options")
}

fn non_empty(s: &str) -> Option<PathBuf> {
    if s.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(s))
    }
}

async fn run_server(cli: &Cli, conversion: ConversionConfig) -> Result<()> {
    let mut builder = ServiceConfig::builder()
        .bind_addr(SocketAddr::new(cli.host, cli.port))
        .shared_data_root(non_empty(&cli.shared_data_root))
        .legacy_input_root(non_empty(&cli.legacy_input_root))
        .legacy_output_dir(&cli.legacy_output_dir)
        .conversion(conversion);
    if let Some(ref extra) = cli.allowed_base_path {
        builder = builder.allowed_base_path(extra);
    }
    let config = Arc::new(builder.build().context("Invalid service configuration")?);

    info!("Working directory: {}", config.working_dir.display());
    for base in config.allowed.bases() {
        info!("Allowed base path: {}", base.display());
    }

    let converter = Arc::new(PdfiumConverter::new(config.conversion.clone()));
    let handler = Arc::new(ConversionHandler::new(Arc::clone(&config), converter));

    serve(config.bind_addr, handler)
        .await
        .with_context(|| format!("Server on {} failed", config.bind_addr))
}

async fn convert_one(
    conversion: ConversionConfig,
    input: PathBuf,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let start = Instant::now();
    let converter = PdfiumConverter::new(conversion);
    let source = input.clone();
    let result = tokio::task::spawn_blocking(move || converter.convert_document(&source))
        .await
        .context("Conversion task panicked")?
        .with_context(|| format!("Conversion failed for {}", input.display()))?;

    let target = output.unwrap_or_else(|| input.with_extension("md"));
    tokio::fs::write(&target, &result.markdown)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let preview: String = result.markdown.chars().take(PREVIEW_CHARS).collect();
        let truncated = result.markdown.chars().count() > PREVIEW_CHARS;
        println!("{}", dim(&"-".repeat(50)));
        println!("{preview}{}", if truncated { "..." } else { "" });
        println!("{}", dim(&"-".repeat(50)));
    }

    eprintln!(
        "{}  {} pages  {}ms  →  {}",
        green("✔"),
        result.metadata.page_count,
        start.elapsed().as_millis(),
        bold(&target.display().to_string()),
    );
    if !result.empty_pages.is_empty() {
        eprintln!(
            "   {}",
            dim(&format!("no text layer on pages {:?}", result.empty_pages))
        );
    }
    Ok(())
}

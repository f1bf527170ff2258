//! CTM Mindmap CLI
//!
//! The `mindmap` command validates CTM documents and generates mind maps
//! from text, PDF files or web pages.
//!
//! ## Commands
//!
//! - `validate`: Check a CTM document against the grammar
//! - `generate text|file|url`: Run the generate → validate → retry loop and
//!   stream NDJSON progress events to stdout

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mindmap_core::{
    parse_with_report, validate, write_ndjson, CtmDocument, Generator, ProgressEvent, Settings,
    StreamStatus, METRICS,
};
use mindmap_ingest::{stream_from_source, HttpPageFetcher, PageFetcher, TextSource};
use mindmap_llm::{build_generator, LlmConfig, LlmType};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "mindmap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate and validate CTM mind maps", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CTM document
    Validate {
        /// CTM file to check (reads stdin when omitted or `-`)
        path: Option<PathBuf>,

        /// Print the parsed outline when valid
        #[arg(long)]
        tree: bool,
    },

    /// Generate a mind map and stream progress as NDJSON
    Generate {
        /// Generation backend
        #[arg(long, env = mindmap_llm::LLM_TYPE_ENV, default_value = "ollama", value_parser = parse_llm_type)]
        provider: LlmType,

        /// API key for hosted backends
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Attempt budget (overrides MINDMAP_GENERATE_MAX_RETRY)
        #[arg(long, value_parser = mindmap_core::config::parse_max_retry)]
        max_retry: Option<u32>,

        #[command(subcommand)]
        source: SourceArg,
    },
}

#[derive(Subcommand)]
enum SourceArg {
    /// Raw article text
    Text {
        /// Text to summarise (reads stdin when omitted)
        text: Option<String>,
    },
    /// A PDF document
    File {
        /// Path to the PDF
        path: PathBuf,
    },
    /// A web page
    Url {
        /// Page address
        url: String,
    },
}

fn parse_llm_type(raw: &str) -> std::result::Result<LlmType, mindmap_llm::LlmError> {
    raw.parse()
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    mindmap_core::init_tracing(cli.json, level);

    let ok = match cli.command {
        Commands::Validate { path, tree } => cmd_validate(path.as_deref(), tree)?,
        Commands::Generate {
            provider,
            api_key,
            max_retry,
            source,
        } => {
            let settings = match max_retry {
                Some(max_retry) => Settings { max_retry },
                None => Settings::from_env().context("Invalid configuration")?,
            };
            let mut llm = LlmConfig::new(provider);
            if let Some(key) = api_key {
                llm = llm.with_api_key(key);
            }
            let generator = build_generator(&llm)
                .with_context(|| format!("Failed to set up the {provider} backend"))?;
            let fetcher: Arc<dyn PageFetcher> =
                Arc::new(HttpPageFetcher::new().context("Failed to set up the HTTP client")?);
            let source = read_source(source)?;

            let mut stdout = tokio::io::stdout();
            let ok = cmd_generate(source, generator, fetcher, settings, &mut stdout).await?;
            METRICS.flush();
            ok
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Validate a document, print the verdict and return whether it passed
fn cmd_validate(path: Option<&Path>, tree: bool) -> Result<bool> {
    let text = read_input(path)?;
    let outcome = validate(&text);
    println!("{}", outcome.message);

    if outcome.is_valid && tree {
        let report = parse_with_report(&text).context("Document validated but failed to parse")?;
        print!("{}", outline(&report.document));
    }
    Ok(outcome.is_valid)
}

/// Stream the events of one generation run to `out`. Returns `true` when
/// the run ended in `SUCCESS`.
async fn cmd_generate<W>(
    source: TextSource,
    generator: Arc<dyn Generator>,
    fetcher: Arc<dyn PageFetcher>,
    settings: Settings,
    out: &mut W,
) -> Result<bool>
where
    W: AsyncWrite + Unpin,
{
    info!(
        backend = generator.name(),
        max_retry = settings.max_retry,
        "Starting generation"
    );
    let events = stream_from_source(source, generator, fetcher, settings.max_retry);
    let last = write_ndjson(events, out)
        .await
        .context("Failed to write progress events")?;

    Ok(last
        .as_ref()
        .map(ProgressEvent::status)
        .is_some_and(|s| s == StreamStatus::Success))
}

fn read_source(arg: SourceArg) -> Result<TextSource> {
    match arg {
        SourceArg::Text { text } => {
            let text = match text {
                Some(text) => text,
                None => read_input(None)?,
            };
            Ok(TextSource::Text(text))
        }
        SourceArg::File { path } => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file.pdf".to_string());
            Ok(TextSource::Pdf { bytes, filename })
        }
        SourceArg::Url { url } => Ok(TextSource::Url(url)),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Indented outline of a parsed document, two spaces per level
fn outline(document: &CtmDocument) -> String {
    let mut out = String::new();
    for node in &document.nodes {
        out.push_str(&"  ".repeat(node.level));
        out.push_str(&node.label);
        if !node.attributes.is_empty() {
            let attrs: Vec<String> = node
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            out.push_str(&format!(" [{}]", attrs.join(", ")));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_core::ScriptedGenerator;
    use mindmap_ingest::SourceError;

    struct Offline;

    #[async_trait::async_trait]
    impl PageFetcher for Offline {
        async fn fetch(&self, url: &str) -> std::result::Result<String, SourceError> {
            Err(SourceError::FetchFailed {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    fn lines(buf: &[u8]) -> Vec<serde_json::Value> {
        std::str::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_generate_writes_one_line_per_event() {
        let generator = Arc::new(ScriptedGenerator::new(["Root\n>>Deep", "Root\n>Child"]));
        let mut buf = Vec::new();

        let ok = cmd_generate(
            TextSource::Text("article".into()),
            generator,
            Arc::new(Offline),
            Settings { max_retry: 3 },
            &mut buf,
        )
        .await
        .unwrap();

        assert!(ok);
        let events = lines(&buf);
        let statuses: Vec<_> = events.iter().map(|e| e["status"].as_str().unwrap()).collect();
        assert_eq!(
            statuses,
            vec![
                "CONNECTING",
                "PREPARING",
                "PROCESSING",
                "VALIDATING",
                "RETRY",
                "PROCESSING",
                "VALIDATING",
                "SUCCESS"
            ]
        );
        assert_eq!(events[7]["data"]["ctm"], "Root\n>Child");
    }

    #[tokio::test]
    async fn test_generate_reports_failure() {
        let generator = Arc::new(ScriptedGenerator::new(["Root"]));
        let mut buf = Vec::new();

        let ok = cmd_generate(
            TextSource::Url("https://example.com".into()),
            generator,
            Arc::new(Offline),
            Settings::default(),
            &mut buf,
        )
        .await
        .unwrap();

        assert!(!ok);
        let events = lines(&buf);
        assert_eq!(events.last().unwrap()["status"], "ERROR");
        assert_eq!(events.last().unwrap()["data"]["kind"], "fetch_failed");
    }

    #[test]
    fn test_validate_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.ctm");
        let bad = dir.path().join("bad.ctm");
        std::fs::write(&good, "Root\n>Child|id:1").unwrap();
        std::fs::write(&bad, "Root\n> Child").unwrap();

        assert!(cmd_validate(Some(&good), true).unwrap());
        assert!(!cmd_validate(Some(&bad), false).unwrap());
        assert!(cmd_validate(Some(&dir.path().join("missing.ctm")), false).is_err());
    }

    #[test]
    fn test_file_source_keeps_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecture.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        match read_source(SourceArg::File { path }).unwrap() {
            TextSource::Pdf { bytes, filename } => {
                assert_eq!(filename, "lecture.pdf");
                assert_eq!(bytes, b"%PDF-1.4");
            }
            other => panic!("Expected Pdf source, got {:?}", other),
        }
    }

    #[test]
    fn test_outline_indents_by_level() {
        let report = parse_with_report("Root\n>A|k:v\n>>B").unwrap();
        assert_eq!(outline(&report.document), "Root\n  A [k=v]\n    B\n");
    }

    #[test]
    fn test_cli_parses_generate_url() {
        let cli = Cli::try_parse_from([
            "mindmap",
            "generate",
            "--provider",
            "gemini",
            "--max-retry",
            "5",
            "url",
            "https://example.com",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                provider,
                max_retry,
                source: SourceArg::Url { url },
                ..
            } => {
                assert_eq!(provider, LlmType::Gemini);
                assert_eq!(max_retry, Some(5));
                assert_eq!(url, "https://example.com");
            }
            _ => panic!("Expected generate url"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_retry() {
        assert!(Cli::try_parse_from(["mindmap", "generate", "--max-retry", "0", "text", "x"]).is_err());
    }
}

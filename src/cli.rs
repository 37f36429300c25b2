use crate::client::KbClient;
use crate::export;
use crate::model::{AnswerResult, ClientConfig, DEFAULT_TOP_K};
use crate::summary;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "kbase",
    version,
    about = "Knowledge-base RAG client with optional TUI"
)]
pub struct Cli {
    /// Base URL of the knowledge-base backend
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Request timeout (uploads and answer generation can be slow)
    #[arg(long, global = true, default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Preload the TUI upload selection with these files
    #[arg(long, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Ask a question against the indexed documents
    Ask {
        /// The question to ask
        question: String,

        /// How many context chunks to retrieve
        #[arg(long, default_value_t = DEFAULT_TOP_K, value_parser = clap::value_parser!(u32).range(1..))]
        top_k: u32,

        /// Print the raw response JSON instead of the text summary
        #[arg(long)]
        json: bool,

        /// Write the rendered HTML report to this path
        #[arg(long, value_name = "PATH")]
        export_html: Option<PathBuf>,

        /// Write the raw response JSON to this path
        #[arg(long, value_name = "PATH")]
        export_json: Option<PathBuf>,
    },
    /// Upload files to the ingestion endpoint
    Upload {
        /// Files to upload
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// List indexed documents
    Documents,
    /// Check backend health
    Health,
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        request_timeout: Duration::from(args.timeout),
        user_agent: format!("kbase-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    match args.command.clone() {
        Some(Command::Ask {
            question,
            top_k,
            json,
            export_html,
            export_json,
        }) => {
            run_ask(
                &args,
                &question,
                top_k,
                json,
                export_html.as_deref(),
                export_json.as_deref(),
            )
            .await
        }
        Some(Command::Upload { files }) => run_upload(&args, &files).await,
        Some(Command::Documents) => run_documents(&args).await,
        Some(Command::Health) => run_health(&args).await,
        None => run_tui(args).await,
    }
}

#[cfg(feature = "tui")]
async fn run_tui(args: Cli) -> Result<()> {
    crate::tui::run(args).await
}

#[cfg(not(feature = "tui"))]
async fn run_tui(_args: Cli) -> Result<()> {
    anyhow::bail!("built without the TUI; use a subcommand (ask, upload, documents, health)")
}

async fn run_ask(
    args: &Cli,
    question: &str,
    top_k: u32,
    json: bool,
    export_html: Option<&std::path::Path>,
    export_json: Option<&std::path::Path>,
) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("please enter a question");
    }

    let client = KbClient::new(&build_config(args))?;
    if !json {
        eprintln!("Thinking…");
    }
    let raw = client.query(question, top_k).await?;
    let result: AnswerResult = serde_json::from_value(raw.clone()).unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
    } else {
        for line in summary::build_answer_summary(&result).lines {
            println!("{line}");
        }
    }

    if let Some(path) = export_html {
        export::export_html(path, &result)?;
        eprintln!("Exported HTML: {}", path.display());
    }
    if let Some(path) = export_json {
        export::export_json(path, &raw)?;
        eprintln!("Exported JSON: {}", path.display());
    }

    Ok(())
}

async fn run_upload(args: &Cli, files: &[PathBuf]) -> Result<()> {
    let client = KbClient::new(&build_config(args))?;
    eprintln!("Uploading {} file(s)…", files.len());
    let raw = client.upload_documents(files).await?;
    // The upload response is opaque; print it verbatim.
    println!("{}", serde_json::to_string_pretty(&raw)?);
    Ok(())
}

async fn run_documents(args: &Cli) -> Result<()> {
    let client = KbClient::new(&build_config(args))?;
    let docs = client.list_documents().await?;
    if docs.is_empty() {
        println!("No documents indexed yet.");
        return Ok(());
    }
    for d in docs {
        println!(
            "{:>6}  {}  {} ({})",
            d.document_id, d.created_at, d.filename, d.source_type
        );
    }
    Ok(())
}

async fn run_health(args: &Cli) -> Result<()> {
    let client = KbClient::new(&build_config(args))?;
    let status = client.health().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_defaults_top_k_to_six() {
        let cli = Cli::try_parse_from(["kbase", "ask", "What is the refund policy?"]).unwrap();
        match cli.command {
            Some(Command::Ask { question, top_k, json, .. }) => {
                assert_eq!(question, "What is the refund policy?");
                assert_eq!(top_k, 6);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn top_k_zero_is_rejected_at_parse_time() {
        assert!(Cli::try_parse_from(["kbase", "ask", "q", "--top-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["kbase", "ask", "q", "--top-k", "abc"]).is_err());
    }

    #[test]
    fn upload_requires_at_least_one_file() {
        assert!(Cli::try_parse_from(["kbase", "upload"]).is_err());
        let cli = Cli::try_parse_from(["kbase", "upload", "a.pdf", "b.txt"]).unwrap();
        match cli.command {
            Some(Command::Upload { files }) => assert_eq!(files.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn base_url_defaults_to_local_backend() {
        let cli = Cli::try_parse_from(["kbase", "health"]).unwrap();
        assert_eq!(cli.base_url, "http://127.0.0.1:8000");
        assert_eq!(Duration::from(cli.timeout), Duration::from_secs(120));
    }
}

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docqa::answerer::{AnswerOptions, AnswerPipeline, ScoredChunk};
use docqa::config::{self, EnvSource, ValueSource};
use docqa::provider::{Embedder, Provider};
use docqa::store::{Database, VectorStore};
use docqa::{ConfigError, IngestError, ingest_document};

/// docqa - grounded question answering over a private document corpus
#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions answered strictly from your own documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Interactive question-and-answer loop
    Chat(ChatCommand),
    /// Answer a single question and exit
    Ask(AskCommand),
    /// Ingest a document into the vector store
    Ingest(IngestCommand),
}

/// Interactive chat over the corpus
#[derive(Parser)]
struct ChatCommand {
    /// Top-k results fetched from the vector store
    #[arg(long, default_value_t = 10)]
    k: usize,

    /// Character budget for the concatenated CONTEXT
    #[arg(long, default_value_t = 12_000)]
    max_context_chars: usize,

    /// Print retrieval metadata (page/score/source) per hit
    #[arg(long)]
    debug: bool,
}

/// One-shot question mode
#[derive(Parser)]
struct AskCommand {
    /// The question to answer
    #[arg(long, value_name = "QUESTION")]
    question: String,

    /// Top-k results fetched from the vector store
    #[arg(long, default_value_t = 10)]
    k: usize,

    /// Character budget for the concatenated CONTEXT
    #[arg(long, default_value_t = 12_000)]
    max_context_chars: usize,

    /// Print retrieval metadata (page/score/source) per hit
    #[arg(long)]
    debug: bool,
}

/// Document ingestion
#[derive(Parser)]
struct IngestCommand {
    /// Path to the document. Falls back to PDF_PATH when omitted.
    #[arg(long, value_name = "PATH")]
    pdf: Option<PathBuf>,

    /// Clear the collection before inserting (development mode)
    #[arg(long)]
    reset: bool,
}

const HELP_TEXT: &str = "\
Commands:
- :help  Show this help
- :exit  Leave the chat
- :quit  Leave the chat
";

fn main() {
    config::load_env();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Chat(cmd) => handle_chat(cmd),
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Ingest(cmd) => handle_ingest(cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors cover bad configuration and missing input documents;
/// internal errors cover store and backend failures.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause.downcast_ref::<ConfigError>().is_some()
            || matches!(
                cause.downcast_ref::<IngestError>(),
                Some(IngestError::NotFound(_))
            )
    })
}

/// Handles the interactive chat loop.
fn handle_chat(cmd: &ChatCommand) -> Result<()> {
    let source = EnvSource::new();
    let pipeline = build_pipeline(&source)?;
    let options = AnswerOptions {
        k: cmd.k,
        max_context_chars: cmd.max_context_chars,
    };

    println!("Ask your question:");

    let stdin = io::stdin();
    loop {
        print!("\nQUESTION: ");
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes_read = stdin.lock().read_line(&mut line)?;
        if bytes_read == 0 {
            println!("\nExiting.");
            return Ok(());
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == ":exit" || question == ":quit" {
            println!("Exiting.");
            return Ok(());
        }
        if question == ":help" {
            println!("{HELP_TEXT}");
            continue;
        }

        let answer = pipeline.answer(question, &options)?;
        println!("ANSWER: {}", answer.text);

        if cmd.debug {
            print_hits(&answer.hits);
        }
    }
}

/// Handles the non-interactive single-question mode.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    let source = EnvSource::new();
    let pipeline = build_pipeline(&source)?;
    let options = AnswerOptions {
        k: cmd.k,
        max_context_chars: cmd.max_context_chars,
    };

    let answer = pipeline.answer(&cmd.question, &options)?;
    println!("ANSWER: {}", answer.text);

    if cmd.debug {
        print_hits(&answer.hits);
    }

    Ok(())
}

/// Handles document ingestion.
fn handle_ingest(cmd: &IngestCommand) -> Result<()> {
    let source = EnvSource::new();

    let document = match &cmd.pdf {
        Some(path) => path.clone(),
        None => PathBuf::from(config::require(&source, "PDF_PATH", "PDF_PATH", None, false)?),
    };

    let provider = Provider::resolve(&source)?;
    let (embedder, _model) = provider.connect(&source)?;
    let mut store = open_store(&source, embedder.clone())?;

    let report = ingest_document(&mut store, embedder.as_ref(), &document, cmd.reset)?;

    println!(
        "Ingest complete. pages={} chunks={} collection={} reset={}",
        report.pages, report.chunks, report.collection, cmd.reset
    );

    Ok(())
}

/// Resolves the provider and wires retrieval and generation together.
fn build_pipeline(source: &EnvSource) -> Result<AnswerPipeline> {
    let provider = Provider::resolve(source)?;
    let (embedder, model) = provider.connect(source)?;
    let store = open_store(source, embedder)?;
    Ok(AnswerPipeline::new(Arc::new(store), model))
}

/// Opens the vector store named by the environment.
///
/// `DOCQA_DB_PATH` overrides the database location; the default lives
/// under the platform data directory. `DOCQA_COLLECTION` defaults to
/// `documents`.
fn open_store(source: &dyn ValueSource, embedder: Arc<dyn Embedder>) -> Result<VectorStore> {
    let db_path = match source.lookup("DOCQA_DB_PATH") {
        Some(path) => PathBuf::from(path),
        None => default_database_path()?,
    };
    ensure_database_directory(&db_path)?;

    let collection = source
        .lookup("DOCQA_COLLECTION")
        .unwrap_or_else(|| "documents".to_string());

    let db = Database::open(&db_path).context("Failed to open database")?;
    Ok(VectorStore::new(db, embedder, collection))
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/docqa/docqa.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
fn default_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("docqa").join("docqa.db"))
}

/// Ensures the parent directory of the database file exists.
fn ensure_database_directory(db_path: &std::path::Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

/// Prints retrieval metadata for each hit, best first.
fn print_hits(hits: &[ScoredChunk]) {
    for hit in hits {
        let page = hit
            .page
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let source = hit.source.as_deref().unwrap_or("-");
        println!("- page={page} score={} source={source}", hit.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa::LlmError;

    #[test]
    fn config_errors_are_user_errors() {
        let err = anyhow::Error::new(ConfigError::UnknownProvider("ollama".to_string()));
        assert!(is_user_error(&err));

        let err = anyhow::Error::new(ConfigError::MissingValue {
            var: "OPENAI_API_KEY".to_string(),
        });
        assert!(is_user_error(&err));
    }

    #[test]
    fn missing_document_is_a_user_error() {
        let err = anyhow::Error::new(IngestError::NotFound(PathBuf::from("/tmp/missing.pdf")));
        assert!(is_user_error(&err));
    }

    #[test]
    fn backend_failures_are_internal_errors() {
        let err = anyhow::Error::new(LlmError::Http { status: 503 });
        assert!(!is_user_error(&err));

        let err = anyhow::Error::new(IngestError::Load("garbled pdf".to_string()));
        assert!(!is_user_error(&err));
    }
}

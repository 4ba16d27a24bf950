//! docent - document assistant CLI

mod commands;
mod config;
mod render;
mod tools;
mod utils;

use clap::Parser;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use docent_agent::{Assistant, ToolRegistry, Workflow, WorkflowEvent};
use docent_ai::providers::{EngineModel, OpenAIEngine};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::tools::DocumentStore;

/// docent - ask questions about invoices, contracts and claims
#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// JSON file of documents (default: bundled sample corpus)
    #[arg(short, long)]
    documents: Option<String>,

    /// Run in non-interactive mode with a single message
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// User id for the session
    #[arg(short, long)]
    user: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("docent=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let model_id = args.model.clone().unwrap_or_else(|| cfg.model_or_default());
    let base_url = args.base_url.clone().or(cfg.base_url.clone());
    let user_id = args
        .user
        .clone()
        .or(cfg.user.clone())
        .unwrap_or_else(|| "local".to_string());

    let store = match args.documents.as_deref().or(cfg.documents.as_deref()) {
        Some(path) => DocumentStore::load(&utils::expand_home(path))?,
        None => DocumentStore::sample()?,
    };
    if store.is_empty() {
        eprintln!("Warning: the document collection is empty");
    }
    let store = Arc::new(store);

    let mut engine_model = EngineModel::new(&model_id);
    if let Some(url) = base_url {
        engine_model = engine_model.with_base_url(url);
    }
    let engine = match cfg.get_api_key() {
        Some(key) => OpenAIEngine::new(key, engine_model),
        None if engine_model.base_url != docent_ai::providers::openai::DEFAULT_BASE_URL => {
            // Local OpenAI-compatible servers often need no key
            OpenAIEngine::without_key(engine_model)
        }
        None => {
            eprintln!("Error: No API key found");
            eprintln!();
            eprintln!("Set your API key with: export OPENAI_API_KEY=your-key");
            eprintln!("Or add it to config file: docent --init-config");
            std::process::exit(1);
        }
    };

    let registry = ToolRegistry::new(tools::document_tools(store.clone()));
    let workflow = Workflow::standard(Arc::new(engine), Arc::new(registry), cfg.assistant_config())?;
    let assistant = Assistant::new(Arc::new(workflow));

    if let Some(ref command) = args.command {
        return run_command(&assistant, &user_id, command).await;
    }

    run_interactive(&assistant, &store, &user_id, &model_id).await
}

/// Print progress lines for workflow events until the turn ends.
/// Failures are reported by the caller from the returned error.
fn spawn_event_printer(mut receiver: broadcast::Receiver<WorkflowEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            if event.is_terminal() {
                break;
            }
            if let Some(line) = render::progress_line(&event) {
                print!("{}", line);
                io::stdout().flush().ok();
            }
        }
    })
}

/// Let the printer drain up to the terminal event. A turn rejected before
/// the workflow ran publishes none, so give up after a moment.
async fn finish_printer(mut handle: JoinHandle<()>) {
    if tokio::time::timeout(Duration::from_millis(100), &mut handle)
        .await
        .is_err()
    {
        handle.abort();
    }
}

async fn run_command(assistant: &Assistant, user_id: &str, command: &str) -> anyhow::Result<()> {
    println!("docent> {}", command);
    println!();

    let session_id = assistant.start_session(user_id);
    let handle = spawn_event_printer(assistant.subscribe());
    let outcome = assistant.process_message(&session_id, command).await;
    finish_printer(handle).await;

    let outcome = outcome?;
    println!();
    print!("{}", render::render_response(&outcome.response));
    println!("{}", render::render_footer(&outcome));
    Ok(())
}

async fn run_interactive(
    assistant: &Assistant,
    store: &DocumentStore,
    user_id: &str,
    model: &str,
) -> anyhow::Result<()> {
    let mut session_id = assistant.start_session(user_id);

    // Show minimal startup info (only if TTY)
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("docent ({}) {} documents, session {}", model, store.len(), &session_id[..8]);
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        let ctx = commands::CommandContext {
            assistant,
            session_id: &session_id,
            store,
            model,
        };
        if let Some(result) = commands::execute_command(input, &ctx) {
            match result {
                commands::CommandResult::NewSession => {
                    assistant.end_session(&session_id)?;
                    session_id = assistant.start_session(user_id);
                    println!("Started session {}.", &session_id[..8]);
                }
                commands::CommandResult::Exit => break,
                commands::CommandResult::Message(msg) => println!("{}", msg),
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        let handle = spawn_event_printer(assistant.subscribe());
        let outcome = assistant.process_message(&session_id, input).await;
        finish_printer(handle).await;

        match outcome {
            Ok(outcome) => {
                println!();
                print!("{}", render::render_response(&outcome.response));
                println!("{}", render::render_footer(&outcome));
            }
            Err(e) => eprintln!("The message was not processed: {}", e),
        }
        println!();
    }

    assistant.end_session(&session_id)?;
    Ok(())
}

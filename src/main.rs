//! Zero - interactive console
//!
//! Reads utterances from stdin, runs them through the assistant pipeline and
//! prints the response. Finished timers are announced as they fire.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use zero_nlu::context::TaskEvent;
use zero_nlu::core::error::Result;
use zero_nlu::core::types::SessionId;
use zero_nlu::core::AssistantConfig;
use zero_nlu::llm::LlmClient;
use zero_nlu::nlu::IntentClassifier;
use zero_nlu::{Assistant, PipelineResult};

/// Zero assistant console
#[derive(Parser, Debug)]
#[command(name = "zero")]
#[command(about = "Talk to the Zero assistant from the terminal")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable the remote language-model fallback (needs an API key)
    #[arg(long)]
    remote: bool,

    /// Show classification details for every utterance
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zero_nlu=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AssistantConfig::load(path)?,
        None => AssistantConfig::default(),
    };
    if args.remote {
        config.remote_fallback_enabled = true;
    }

    let mut assistant = Assistant::new(config.clone())?;
    if config.remote_fallback_enabled {
        match LlmClient::from_settings(&config.llm) {
            Ok(client) => {
                tracing::info!("Remote fallback enabled ({})", client.model());
                assistant = assistant.with_remote(Arc::new(client));
            }
            Err(e) => tracing::warn!("{} - running without remote fallback", e),
        }
    }
    assistant.register_default_skills().await?;

    let session = SessionId::new();
    let mut events = assistant.tasks().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("\n=== ZERO ===");
    println!("Type a request, or one of:");
    println!("  skills    - List registered skills");
    println!("  intents   - List known intents");
    println!("  context   - Show conversation state");
    println!("  reset     - Forget the conversation");
    println!("  quit / q  - Exit");
    println!();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                match input {
                    "" => continue,
                    "quit" | "q" => break,
                    "skills" => print!("{}", assistant.router().help()),
                    "intents" => {
                        for intent in IntentClassifier::list_intents() {
                            println!("  {:<20} {}", intent.name, intent.description);
                        }
                    }
                    "context" => {
                        let handle = assistant.sessions().get_or_create(session);
                        let mut context = handle.lock().await;
                        print!("{}", context.get_context_summary());
                        let status = context.status();
                        println!("Expires in {}s", status.expires_in.as_secs());
                    }
                    "reset" => {
                        let handle = assistant.sessions().get_or_create(session);
                        handle.lock().await.reset();
                        println!("Conversation cleared.");
                    }
                    _ => {
                        let result = assistant.process(session, input).await;
                        display_result(&result, args.verbose);
                        if !result.response.should_continue {
                            break;
                        }
                    }
                }
            }
            event = events.recv() => match event {
                Ok(TaskEvent::Completed { message: Some(message), .. }) => {
                    println!("\n* {}", message)
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => tracing::warn!("Missed {} task events", missed),
                Err(RecvError::Closed) => break,
            },
        }
    }

    assistant.shutdown().await;
    println!("Goodbye!");
    Ok(())
}

fn display_result(result: &PipelineResult, verbose: bool) {
    if verbose {
        println!(
            "  [{} {:.2} via {} in {:?}]",
            result.intent.intent(),
            result.intent.confidence(),
            result.intent.method(),
            result.latency
        );
        for entity in &result.entities {
            let tag = if entity.is_inferred() { " (inferred)" } else { "" };
            println!("  {} = {}{}", entity.entity_type, entity.value, tag);
        }
    }
    println!("{}", result.response.message);
}

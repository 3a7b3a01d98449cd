use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use product_assistant_core::{
    ChatSession, CompletionClient, CompletionConfig, QueryPipeline, SqliteCatalog,
    SubmissionOutcome, EMPTY_QUERY_NOTICE,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "product-assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the query server over the catalog and the completion backend.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0:5000")]
        bind: String,

        /// Path of the SQLite product catalog.
        #[arg(long, env = "ASSISTANT_DATABASE", default_value = "ajazz_products.sqlite3")]
        database: String,

        /// Chat-completion endpoint URL.
        #[arg(
            long,
            env = "ASSISTANT_COMPLETIONS_URL",
            default_value = "http://localhost:1234/v1/chat/completions"
        )]
        completions_url: String,

        /// Model identifier sent to the completion backend.
        #[arg(long, env = "ASSISTANT_MODEL", default_value = "falcon-h1-7b-instruct")]
        model: String,

        /// Sampling temperature for completions.
        #[arg(long, default_value = "0.5")]
        temperature: f32,
    },
    /// Start the interactive chat client against a running server.
    Chat {
        /// Query endpoint of the assistant server.
        #[arg(
            long,
            env = "ASSISTANT_SERVER_URL",
            default_value = "http://localhost:5000/query"
        )]
        server_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "product-assistant boot"
    );

    match cli.command {
        Command::Serve {
            bind,
            database,
            completions_url,
            model,
            temperature,
        } => {
            let gateway = CompletionClient::new(CompletionConfig {
                endpoint: completions_url,
                model,
                temperature,
            });
            let catalog = SqliteCatalog::new(&database);
            let pipeline = Arc::new(QueryPipeline::new(gateway, catalog));

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!(address = %bind, database = %database, "query server listening");

            product_assistant_core::serve(listener, pipeline).await?;
        }
        Command::Chat { server_url } => {
            run_chat(&server_url).await?;
        }
    }

    Ok(())
}

async fn run_chat(server_url: &str) -> anyhow::Result<()> {
    let mut session = ChatSession::connect(server_url)
        .with_context(|| format!("invalid server endpoint {server_url}"))?;

    println!("Ask any Ajazz product-related question. Type 'exit' or 'quit' to close.");

    let stdin = io::stdin();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "exit" | "quit" => break,
            "retry" => match session.retry().await {
                Some(outcome) => report_outcome(&outcome),
                None => println!("Nothing to retry yet."),
            },
            _ => match session.submit(input).await {
                Some(outcome) => report_outcome(&outcome),
                None => println!("{EMPTY_QUERY_NOTICE}"),
            },
        }
    }

    Ok(())
}

fn report_outcome(outcome: &SubmissionOutcome) {
    println!("AI: {}", outcome.message());
    if outcome.is_failure() {
        println!("Type 'retry' to resend the last question.");
    }
}

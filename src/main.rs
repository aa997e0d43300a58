//! # GenNet: knowledge-enhanced chat gateway
//!
//! Usage:
//!   gennet                               # Start the HTTP gateway (same as `gennet serve`)
//!   gennet serve --port 9000             # Custom port
//!   gennet search "zero trust"           # Query the knowledge base
//!   gennet ask "How does BGP work?"      # One chat turn through the provider chain
//!   gennet providers                     # Show provider credentials status

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gennet_core::config::GenNetConfig;
use gennet_gateway::{AppState, AskRequest};
use gennet_knowledge::{KnowledgeStore, Retriever};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gennet",
    version,
    about = "🧠 GenNet: knowledge-enhanced chat with multi-provider fallback"
)]
struct Cli {
    /// Config file (default: $GENNET_CONFIG or ~/.gennet/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Search the knowledge base
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one message through the provider chain
    Ask {
        message: String,
        /// Preferred provider key, e.g. `deepseek`
        #[arg(short, long)]
        provider: Option<String>,
        /// Skip knowledge context
        #[arg(long)]
        no_context: bool,
    },
    /// List providers and whether a credential was found
    Providers,
}

fn load_config(path: Option<&str>) -> Result<GenNetConfig> {
    let config = match path {
        Some(p) => {
            let mut config = GenNetConfig::load_from(&PathBuf::from(shellexpand::tilde(p).as_ref()))?;
            config.apply_env_overrides();
            config
        }
        None => GenNetConfig::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "gennet=debug,gennet_gateway=debug,gennet_providers=debug,gennet_knowledge=debug,tower_http=debug"
    } else {
        "gennet=info,gennet_gateway=info,gennet_providers=info,gennet_knowledge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            println!("🧠 GenNet v{}", env!("CARGO_PKG_VERSION"));
            println!("   🌐 API: http://{}:{}/ask", config.gateway.host, config.gateway.port);
            println!();
            gennet_gateway::start(config).await?;
        }
        Command::Search {
            query,
            category,
            top_k,
            json,
        } => {
            let store = Arc::new(KnowledgeStore::from_config(&config.knowledge));
            let retriever = Retriever::from_config(store, &config.knowledge.embedding).await;
            let top_k = top_k.unwrap_or(config.knowledge.top_k);
            let results = retriever.search(&query, top_k, category.as_deref()).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No matches for \"{query}\"");
            } else {
                for (i, hit) in results.iter().enumerate() {
                    println!(
                        "{:>2}. [{:>5.1}] {} ({})",
                        i + 1,
                        hit.score,
                        hit.record.title,
                        hit.record.category
                    );
                }
            }
        }
        Command::Ask {
            message,
            provider,
            no_context,
        } => {
            let state = AppState::from_config(config).await;
            let mut request = AskRequest::new(message);
            request.provider = provider;
            request.use_expert_context = !no_context;

            let reply = state.assistant.ask(request).await;
            println!("{}", reply.outcome.text());
            println!();
            println!(
                "-- provider: {}, context snippets: {}, {}ms",
                reply.outcome.provider_key(),
                reply.sources.len(),
                reply.elapsed_ms
            );
            if !reply.outcome.is_answered() {
                std::process::exit(1);
            }
        }
        Command::Providers => {
            let dispatcher = gennet_providers::create_dispatcher(&config.providers);
            for info in dispatcher.infos() {
                println!(
                    "{} {:<12} {:<40} {}",
                    if info.configured { "✅" } else { "❌" },
                    info.key,
                    info.model,
                    info.specialty
                );
            }
            println!();
            println!(
                "{}/{} providers configured",
                dispatcher.configured_count(),
                dispatcher.providers().len()
            );
        }
    }

    Ok(())
}

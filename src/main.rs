use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planstream::config::{Config, LlmProvider};
use planstream::planning::{LlmOracle, PlannerLoop, RevealEncoder};
use planstream::server::{self, AppState, StreamTransport};

#[derive(Parser)]
#[command(name = "planstream")]
#[command(about = "Turn a project idea into a live-streamed list of task cards", long_about = None)]
struct Cli {
    /// Path to a config file (default: <config dir>/planstream/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP streaming server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate a plan locally and print the wire frames to stdout
    Plan {
        /// The project idea
        prompt: String,
        /// Skip the typing delay between frames
        #[arg(long)]
        no_delay: bool,
    },
    /// Show or update the configuration file
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Set provider (gemini, openai, anthropic)
        #[arg(long)]
        provider: Option<LlmProvider>,
        /// Set API key
        #[arg(long)]
        api_key: Option<String>,
        /// Set model
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `plan` output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planstream=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::load_from(&config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let state = AppState::from_config(config)?;
            server::start_server(state).await?;
        }
        Commands::Plan { prompt, no_delay } => {
            let config = Config::load_from(&config_path)?;
            run_plan(config, prompt, no_delay).await?;
        }
        Commands::Config {
            show,
            provider,
            api_key,
            model,
        } => {
            handle_config(&config_path, show, provider, api_key, model)?;
        }
    }

    Ok(())
}

async fn run_plan(config: Config, prompt: String, no_delay: bool) -> Result<()> {
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        anyhow::bail!("Prompt must not be empty");
    }

    let client = planstream::llm::create_client(&config.llm)?;
    let planner = PlannerLoop::new(Arc::new(LlmOracle::new(client)), prompt, &config.planner);

    let mut encoder = RevealEncoder::from_config(&config.reveal);
    if no_delay {
        encoder = encoder.without_delay();
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping plan");
            ctrl_c.cancel();
        }
    });

    let events = StreamTransport::new(encoder, cancel).events(planner);
    let mut stdout = tokio::io::stdout();
    let written = server::write_sse(events, &mut stdout)
        .await
        .context("Failed to write plan frames")?;

    tracing::debug!("Wrote {} frames", written);
    Ok(())
}

fn handle_config(
    path: &std::path::Path,
    show: bool,
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let mut config = Config::load_from(path)?;

    if show {
        println!("Current configuration ({}):", path.display());
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut changed = false;

    if let Some(p) = provider {
        config.llm.provider = p;
        if model.is_none() {
            config.llm.model = p.default_model().to_string();
        }
        changed = true;
        println!("Provider updated");
    }

    if let Some(key) = api_key {
        config.llm.api_key = Some(key);
        changed = true;
        println!("API key updated");
    }

    if let Some(m) = model {
        config.llm.model = m;
        changed = true;
        println!("Model updated");
    }

    if changed {
        config.save_to(path)?;
        println!("Configuration saved to: {}", path.display());
    } else {
        println!("No changes made. Use --show to view current configuration.");
    }

    Ok(())
}

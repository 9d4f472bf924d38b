use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;

use weather_agent::cli::{self, Cli, Commands};
use weather_agent::config::AppConfig;
use weather_agent::error::Error;
use weather_agent::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values already in the environment win over .env
    dotenvy::dotenv().ok();

    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Logs go to stderr so they don't interleave with prompts and answers
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    let pipeline = config.build_pipeline().context("Failed to build pipeline")?;

    match cli.command {
        Commands::Ask(args) => {
            let mut stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = tokio::io::stdout();
            finish_run(cli::ask(&pipeline, args, &mut stdin, &mut stdout).await)?;
        }
        Commands::Demo(args) => {
            let mut stdout = tokio::io::stdout();
            finish_run(cli::demo(&pipeline, args, &mut stdout).await)?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = config.server.socket_addr()?;

            eprintln!("🌦️ Weather Agent v{}", env!("CARGO_PKG_VERSION"));
            eprintln!("   Model: {}", config.llm.model);
            eprintln!("   API: http://{addr}");
            eprintln!("   Email: {}", enabled(config.email.is_some()));
            eprintln!("   WhatsApp: {}", enabled(config.twilio.is_some()));

            server::serve(Arc::new(pipeline), addr).await?;
        }
    }

    Ok(())
}

/// A failed run was already reported on stdout; exit non-zero without
/// printing its cause again.
fn finish_run<T>(outcome: Result<T, Error>) -> anyhow::Result<()> {
    match outcome {
        Ok(_) => Ok(()),
        Err(Error::RunFailed) => std::process::exit(1),
        Err(e) => Err(e.into()),
    }
}

fn enabled(on: bool) -> &'static str {
    if on { "enabled" } else { "disabled" }
}

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deep_reasoner::{
    cli::{execute_command, Cli},
    config::{Config, LogFormat},
    ThinkingEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if cli.seed.is_some() {
        config.engine.seed = cli.seed;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = ?config.engine.seed,
        "Deep reasoner starting..."
    );

    let engine = match ThinkingEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "Failed to start thinking engine");
            return Err(e.into());
        }
    };

    let result = execute_command(&engine, cli.command).await;

    let cancelled = engine.cancel_all_monitors().await;
    if cancelled > 0 {
        info!(monitors = cancelled, "Cancelled running monitors");
    }
    if let Err(e) = engine.shutdown().await {
        error!(error = %e, "Engine shutdown failed");
    }

    if result.exit_code != 0 {
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }
    println!("{}", result.message);
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

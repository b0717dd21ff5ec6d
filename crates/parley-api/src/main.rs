//! Parley CLI and HTTP API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, loads configuration, wires the chat service, then
//! dispatches to the requested command or starts the HTTP server.

mod cli;
mod http;
mod state;

use std::path::Path;

use clap::Parser;

use cli::{Cli, Commands};
use parley_infra::config::load_config_with_env;
use parley_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_with_env(&cli.config).await;

    init_tracing(
        verbosity_filter(cli.verbose, cli.quiet),
        config.logging.format,
        config.logging.otel,
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    if let Commands::Serve { port, host } = &cli.command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(host) = host {
            config.server.host = host.clone();
        }
    }

    let state = AppState::init(&config).await?;

    let result = match cli.command {
        Commands::Serve { .. } => serve(state, &config.server).await,
        Commands::Conversations { user_id } => {
            cli::conversation::list_conversations(&state, &user_id, cli.json).await
        }
        Commands::History {
            user_id,
            session_id,
        } => cli::conversation::show_history(&state, &user_id, &session_id, cli.json).await,
        Commands::Delete {
            user_id,
            session_id,
        } => cli::conversation::delete_conversation(&state, &user_id, &session_id, cli.json).await,
    };

    shutdown_tracing();
    result
}

async fn serve(state: AppState, server: &parley_types::config::ServerConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Parley listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state, Some(Path::new(&server.static_dir)));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use anyhow::{Context, Result};
use bit_messenger::api::{create_api_server, AppState};
use bit_messenger::config::ServerConfig;
use bit_messenger::eventlog::{EventLog, LogContext};
use bit_messenger::metrics::install_metrics;
use clap::Parser;
use serde_json::json;

#[derive(Parser)]
#[command(name = "bit-messenger-server")]
#[command(about = "Rendezvous and relay server for Bit Messenger", long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    cli.server.validate()?;
    let addr = cli.server.bind_addr()?;

    if cli.server.no_metrics {
        tracing::info!("metrics disabled");
    } else {
        install_metrics().context("failed to install metrics recorder")?;
    }

    let log = EventLog::new(cli.server.log_capacity);
    let state = AppState::new(log.clone());
    let app = create_api_server(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    log.info(LogContext::new("server-start").detail(json!({ "port": addr.port() })));

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📍 Bit Messenger server: http://localhost:{}", addr.port());
    println!("🔌 Relay WebSocket:      ws://localhost:{}/ws", addr.port());
    println!("📜 Event log:            http://localhost:{}/admin/logs", addr.port());
    println!("📡 Live event log:       http://localhost:{}/admin/logs/stream", addr.port());
    println!("🏥 Health check:         http://localhost:{}/health", addr.port());
    println!("📊 Metrics:              http://localhost:{}/metrics", addr.port());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

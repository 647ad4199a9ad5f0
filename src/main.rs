//! Local demonstration: two endpoints in one process meet in a relay room,
//! exchange a text message over simulated lossy links and print what they
//! observe.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use bit_messenger::api::{connect_local, AppState};
use bit_messenger::client::{ClientEvent, RelayClient, SpawnedClient};
use bit_messenger::config::TransferConfig;
use bit_messenger::coordinator::{connect_framed_pair, EndpointEvent};
use bit_messenger::eventlog::EventLog;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bit-messenger")]
#[command(about = "Send a text message between two simulated endpoints", long_about = None)]
struct Cli {
    /// Message to send
    #[arg(long, default_value = "Hello from Bit Messenger!")]
    text: String,

    /// Room both endpoints join on the relay
    #[arg(long, default_value = "demo")]
    room: String,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[command(flatten)]
    transfer: TransferConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let sender_config = cli.transfer.endpoint()?;

    println!("📦 chunk size {} bytes", sender_config.chunk_size);
    println!(
        "🚚 delay {} ms (+ up to 50% jitter), loss {:.0}%",
        sender_config.simulator.delay_ms_base,
        sender_config.simulator.loss_probability * 100.0
    );

    let state = AppState::new(EventLog::default());
    let (a, b) = connect_framed_pair(sender_config, sender_config)?;
    let mut sender = RelayClient::spawn(a, connect_local(state.clone()));
    let mut receiver = RelayClient::spawn(b, connect_local(state.clone()));
    enter_room(&mut sender, &cli.room).await?;
    enter_room(&mut receiver, &cli.room).await?;
    println!("🚪 both endpoints joined room {}", cli.room);

    let ticket = sender
        .handle
        .send_text(&cli.text)
        .await
        .context("failed to start transfer")?;
    println!(
        "✉️  sending {} bytes in {} chunks (id {})\n",
        cli.text.len(),
        ticket.total,
        ticket.correlation_id
    );

    let deadline = tokio::time::sleep(Duration::from_secs(cli.timeout_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                let stats = sender.handle.endpoint().stats();
                println!("\n{stats}");
                bail!(
                    "message not delivered within {}s; every retransmission can be lost too",
                    cli.timeout_secs
                );
            }
            event = receiver.events.recv() => {
                let event = match event {
                    Some(ClientEvent::Endpoint(event)) => event,
                    Some(_) => continue,
                    None => bail!("receiver stopped"),
                };
                match event {
                    EndpointEvent::ChunkArrived { sequence, intact, duplicate, .. } => {
                        let mark = if !intact {
                            "⚠️  bad"
                        } else if duplicate {
                            "♻️  duplicate"
                        } else {
                            "✅ ok"
                        };
                        println!("  #{sequence}/{} {mark}", ticket.total);
                    }
                    EndpointEvent::NackSent { seqs, .. } => {
                        println!("  🔁 asking again for {seqs:?}");
                    }
                    EndpointEvent::Completed { payload, .. } => {
                        let text = String::from_utf8_lossy(&payload);
                        println!("\n📨 received: {text}");
                        println!("{}", sender.handle.endpoint().stats());
                        let nacks = state
                            .log
                            .snapshot()
                            .iter()
                            .filter(|e| e.event == "relay:nack")
                            .count();
                        println!("📝 {nacks} NACKs mirrored to the relay log");
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn enter_room(client: &mut SpawnedClient, room: &str) -> Result<()> {
    client.handle.join(room)?;
    while let Some(event) = client.events.recv().await {
        match event {
            ClientEvent::Joined { .. } => return Ok(()),
            ClientEvent::RoomFull => bail!("room {room} is full"),
            _ => {}
        }
    }
    bail!("relay client stopped before joining {room}")
}

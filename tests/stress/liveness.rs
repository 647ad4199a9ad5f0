//! Behavior when nothing gets through
//!
//! Retransmission has no cap and no backoff: under total loss a transfer never
//! completes and every recomputation asks for the full missing set again.

use bit_messenger::chunk::split;
use bit_messenger::coordinator::{EndpointConfig, EndpointEvent, TransferEndpoint};
use bit_messenger::network::SimulatorConfig;
use bit_messenger::protocol::{DataMessage, NackFrame, PacketFrame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::simulation::{spawn_linked, wait_for_completion, TamperConfig};

fn total_loss() -> EndpointConfig {
    EndpointConfig {
        chunk_size: 12,
        simulator: SimulatorConfig::new(100, 1.0).unwrap(),
        pacing: Duration::from_millis(120),
    }
}

#[tokio::test(start_paused = true)]
async fn test_total_loss_never_completes() {
    let mut pair = spawn_linked(total_loss(), EndpointConfig::default(), TamperConfig::clean()).unwrap();
    let ticket = pair.a.handle.send_text("nothing will arrive, ever").await.unwrap();

    assert!(wait_for_completion(&mut pair.b.events, Duration::from_secs(600))
        .await
        .is_none());

    let stats = pair.a.handle.stats();
    assert_eq!(stats.submitted(), ticket.total as u64);
    assert_eq!(stats.lost(), ticket.total as u64);
    assert_eq!(stats.delivered(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_every_nack_retransmits_and_loses_again() {
    let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let mut sender = TransferEndpoint::spawn(total_loss(), Arc::new(peer_tx), inbound_rx).unwrap();

    let ticket = sender.handle.send_text("thirty bytes of text go here!!").await.unwrap();
    assert_eq!(ticket.total, 3);

    for round in 1..=10u64 {
        inbound_tx
            .send(DataMessage::Nack(NackFrame {
                seqs: vec![1, 2, 3],
                correlation_id: Some(ticket.correlation_id.clone()),
                generation: Some(ticket.generation),
            }))
            .unwrap();

        loop {
            match sender.events.recv().await.unwrap() {
                EndpointEvent::Retransmitting { seqs, .. } => {
                    assert_eq!(seqs, vec![1, 2, 3], "round {round}");
                    break;
                }
                _ => continue,
            }
        }
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    let stats = sender.handle.stats();
    assert_eq!(stats.submitted(), 3 + 30);
    assert_eq!(stats.lost(), 33);
    assert!(peer_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_receiver_keeps_nacking_full_missing_set() {
    let (peer_tx, mut peer_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let _receiver =
        TransferEndpoint::spawn(EndpointConfig::default(), Arc::new(peer_tx), inbound_rx).unwrap();

    let data = [9u8; 48];
    let chunks = split(&data, 12, "stuck").unwrap();

    // Only the first chunk ever gets through, over and over
    for _ in 0..5 {
        inbound_tx
            .send(DataMessage::Packet(PacketFrame::from_chunk(&chunks[0], 1)))
            .unwrap();
    }

    let mut nacks = 0;
    let mut reports = 0;
    while nacks < 5 || reports < 5 {
        match peer_rx.recv().await.unwrap() {
            DataMessage::Nack(frame) => {
                assert_eq!(frame.seqs, vec![2, 3, 4]);
                nacks += 1;
            }
            DataMessage::Progress(frame) => {
                assert_eq!(frame.status.ok, vec![1]);
                assert_eq!(frame.status.missing, vec![2, 3, 4]);
                reports += 1;
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::chunk;
use crate::coordinator::error::{CoordinatorError, CoordinatorResult};
use crate::coordinator::types::{EndpointCommand, EndpointConfig, EndpointEvent, TransferTicket};
use crate::metrics::{self, TransferMetrics};
use crate::network::{
    spawn_decoder, DataChannel, DeliverySimulator, SimulatorConfig, SimulatorStats, TextChannel,
};
use crate::protocol::{DataMessage, NackFrame, PacketFrame, ProgressFrame};
use crate::session::{ProgressReport, ReceiveOutcome, ReceiveTracker, SenderSession};

/// Endpoint actor. Created and driven by [`TransferEndpoint::spawn`].
pub struct TransferEndpoint {
    config: EndpointConfig,
    simulator: DeliverySimulator,
    peer: Arc<dyn DataChannel>,
    tracker: ReceiveTracker,
    sender: Option<SenderSession>,
    sender_metrics: Option<TransferMetrics>,
    /// Generation of the newest outgoing transfer, shared with its pacing task
    current_generation: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<EndpointEvent>,
}

/// A running endpoint: the handle to drive it and the stream of what it observed
pub struct SpawnedEndpoint {
    pub handle: EndpointHandle,
    pub events: mpsc::UnboundedReceiver<EndpointEvent>,
}

impl TransferEndpoint {
    /// Start an endpoint task.
    ///
    /// `peer` is the counterpart's data channel; `inbound` carries the data
    /// messages the counterpart sends to this endpoint. The task ends once
    /// every handle is dropped and `inbound` is closed.
    pub fn spawn(
        config: EndpointConfig,
        peer: Arc<dyn DataChannel>,
        inbound: mpsc::UnboundedReceiver<DataMessage>,
    ) -> CoordinatorResult<SpawnedEndpoint> {
        config.validate()?;
        let simulator = DeliverySimulator::new(config.simulator)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let endpoint = Self {
            config,
            simulator: simulator.clone(),
            peer,
            tracker: ReceiveTracker::new(),
            sender: None,
            sender_metrics: None,
            current_generation: Arc::new(AtomicU64::new(0)),
            events: event_tx,
        };
        tokio::spawn(endpoint.run(command_rx, inbound));

        Ok(SpawnedEndpoint {
            handle: EndpointHandle {
                commands: command_tx,
                simulator,
            },
            events: event_rx,
        })
    }

    /// Start an endpoint that speaks JSON text frames: outgoing data messages
    /// are written to `outgoing`, frames read from `incoming` are decoded and
    /// malformed ones dropped.
    pub fn spawn_framed(
        config: EndpointConfig,
        outgoing: mpsc::UnboundedSender<String>,
        incoming: mpsc::UnboundedReceiver<String>,
    ) -> CoordinatorResult<SpawnedEndpoint> {
        Self::spawn(config, Arc::new(TextChannel::new(outgoing)), spawn_decoder(incoming))
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<EndpointCommand>,
        mut inbound: mpsc::UnboundedReceiver<DataMessage>,
    ) {
        loop {
            tokio::select! {
                Some(command) = commands.recv() => self.handle_command(command),
                Some(message) = inbound.recv() => self.handle_data(message),
                else => break,
            }
        }
        tracing::debug!("transfer endpoint stopped");
    }

    fn handle_command(&mut self, command: EndpointCommand) {
        match command {
            EndpointCommand::Send { payload, reply } => {
                let result = self.start_transfer(payload);
                let _ = reply.send(result);
            }
            EndpointCommand::Reset { reply } => {
                self.reset();
                let _ = reply.send(());
            }
        }
    }

    /// Drop both sessions. Deliveries already scheduled are not recalled;
    /// the generation check discards them on the other side.
    fn reset(&mut self) {
        self.tracker.reset();
        self.sender = None;
        self.sender_metrics = None;
        // Stop any pacing still running for the dropped transfer
        self.current_generation.fetch_add(1, Ordering::SeqCst);
    }

    fn start_transfer(&mut self, payload: Bytes) -> CoordinatorResult<TransferTicket> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let chunks = chunk::split(&payload, self.config.chunk_size, &correlation_id)?;
        let generation = self.current_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let ticket = TransferTicket {
            correlation_id: correlation_id.clone(),
            generation,
            total: chunks.len() as u32,
        };
        tracing::info!(
            correlation_id = %correlation_id,
            generation,
            bytes = payload.len(),
            chunks = ticket.total,
            "starting transfer"
        );

        self.sender_metrics = Some(TransferMetrics::start(&correlation_id, payload.len() as u64));
        self.sender = Some(SenderSession::new(correlation_id, generation, chunks.clone()));
        self.spawn_pacer(chunks, generation);
        self.emit(EndpointEvent::TransferStarted(ticket.clone()));

        Ok(ticket)
    }

    /// First transmission: one chunk per pacing interval, abandoned as soon
    /// as a newer transfer or a reset bumps the generation.
    fn spawn_pacer(&self, chunks: Vec<chunk::Chunk>, generation: u64) {
        let simulator = self.simulator.clone();
        let peer = self.peer.clone();
        let current = self.current_generation.clone();
        let pacing = self.config.pacing;

        tokio::spawn(async move {
            for (i, chunk) in chunks.iter().enumerate() {
                if current.load(Ordering::SeqCst) != generation {
                    tracing::debug!(generation, "pacing abandoned");
                    return;
                }
                if i > 0 && !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                    if current.load(Ordering::SeqCst) != generation {
                        return;
                    }
                }
                simulator.send(chunk, generation, peer.clone());
            }
        });
    }

    fn handle_data(&mut self, message: DataMessage) {
        match message {
            DataMessage::Packet(frame) => self.on_packet(frame),
            DataMessage::Nack(frame) => self.on_nack(frame),
            DataMessage::Progress(frame) => self.on_progress(frame),
        }
    }

    fn on_packet(&mut self, frame: PacketFrame) {
        let generation = frame.generation;
        let chunk = match frame.into_chunk() {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::trace!(error = %e, "dropping malformed packet");
                self.emit(EndpointEvent::MalformedDropped {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let correlation_id = chunk.correlation_id.clone();
        let sequence = chunk.sequence;
        let intact = chunk.is_intact();
        let arrival = self.tracker.accept(chunk, generation);

        if arrival.outcome == ReceiveOutcome::Stale {
            tracing::debug!(correlation_id = %correlation_id, generation, "stale chunk discarded");
            self.emit(EndpointEvent::StaleDiscarded {
                correlation_id,
                generation,
            });
            return;
        }

        metrics::record_chunk_received(&correlation_id, intact, arrival.duplicate);
        self.emit(EndpointEvent::ChunkArrived {
            correlation_id: correlation_id.clone(),
            sequence,
            intact,
            duplicate: arrival.duplicate,
        });

        match arrival.outcome {
            ReceiveOutcome::Completed { payload, report } => {
                tracing::info!(
                    correlation_id = %correlation_id,
                    bytes = payload.len(),
                    "transfer reassembled"
                );
                self.send_progress(&report, generation);
                self.emit(EndpointEvent::Completed {
                    correlation_id,
                    payload,
                });
            }
            ReceiveOutcome::Pending { nack, report } => {
                self.send_nack(&correlation_id, generation, nack);
                self.send_progress(&report, generation);
            }
            ReceiveOutcome::AlreadyComplete { report } => {
                self.send_progress(&report, generation);
            }
            ReceiveOutcome::Stale => {}
        }
    }

    fn send_nack(&self, correlation_id: &str, generation: u64, seqs: Vec<u32>) {
        if seqs.is_empty() {
            return;
        }
        tracing::debug!(correlation_id = %correlation_id, seqs = ?seqs, "requesting retransmission");
        metrics::record_nack_sent(correlation_id);
        self.peer.send(DataMessage::Nack(NackFrame {
            seqs: seqs.clone(),
            correlation_id: Some(correlation_id.to_string()),
            generation: Some(generation),
        }));
        self.emit(EndpointEvent::NackSent {
            correlation_id: correlation_id.to_string(),
            seqs,
        });
    }

    fn send_progress(&self, report: &ProgressReport, generation: u64) {
        self.peer
            .send(DataMessage::Progress(ProgressFrame::from_report(report, generation)));
    }

    fn on_nack(&mut self, frame: NackFrame) {
        let Some(sender) = self.sender.as_mut() else {
            tracing::trace!("nack without an outgoing transfer ignored");
            return;
        };
        if !sender.owns(frame.correlation_id.as_deref(), frame.generation) {
            tracing::trace!(correlation_id = ?frame.correlation_id, "nack for another transfer ignored");
            return;
        }

        let chunks = sender.select(&frame.seqs);
        if chunks.is_empty() {
            return;
        }

        let correlation_id = sender.correlation_id().to_string();
        let generation = sender.generation();
        let seqs: Vec<u32> = chunks.iter().map(|c| c.sequence).collect();

        tracing::debug!(correlation_id = %correlation_id, seqs = ?seqs, "retransmitting");
        metrics::record_retransmission(&correlation_id, chunks.len());
        for chunk in &chunks {
            self.simulator.send(chunk, generation, self.peer.clone());
        }
        self.emit(EndpointEvent::Retransmitting {
            correlation_id,
            seqs,
        });
    }

    fn on_progress(&mut self, frame: ProgressFrame) {
        let Some(sender) = self.sender.as_mut() else {
            return;
        };
        if !sender.owns(Some(&frame.correlation_id), frame.generation) {
            return;
        }

        let report = frame.into_report();
        let delivered = sender.observe(report.clone());
        let retransmitted = sender.retransmitted();
        let correlation_id = sender.correlation_id().to_string();
        self.emit(EndpointEvent::ProgressObserved(report));

        if delivered {
            // Only the first completion report finishes the timer
            if let Some(timer) = self.sender_metrics.take() {
                let elapsed = timer.complete();
                self.emit(EndpointEvent::Delivered {
                    correlation_id,
                    elapsed,
                    retransmitted,
                });
            }
        }
    }

    fn emit(&self, event: EndpointEvent) {
        let _ = self.events.send(event);
    }
}

/// Cloneable handle for commanding a running endpoint
#[derive(Clone)]
pub struct EndpointHandle {
    commands: mpsc::UnboundedSender<EndpointCommand>,
    simulator: DeliverySimulator,
}

impl EndpointHandle {
    /// Split `payload` into a new transfer, superseding any previous one
    pub async fn send_payload(&self, payload: impl Into<Bytes>) -> CoordinatorResult<TransferTicket> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(EndpointCommand::Send {
                payload: payload.into(),
                reply,
            })
            .map_err(|_| CoordinatorError::EndpointClosed)?;
        rx.await.map_err(|_| CoordinatorError::EndpointClosed)?
    }

    pub async fn send_text(&self, text: &str) -> CoordinatorResult<TransferTicket> {
        self.send_payload(Bytes::copy_from_slice(text.as_bytes())).await
    }

    /// Forget both the incoming and the outgoing session
    pub async fn reset(&self) -> CoordinatorResult<()> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(EndpointCommand::Reset { reply })
            .map_err(|_| CoordinatorError::EndpointClosed)?;
        rx.await.map_err(|_| CoordinatorError::EndpointClosed)
    }

    /// Change delay and loss for chunks submitted from now on
    pub fn update_conditions(&self, config: SimulatorConfig) -> CoordinatorResult<()> {
        Ok(self.simulator.update(config)?)
    }

    pub fn conditions(&self) -> SimulatorConfig {
        self.simulator.config()
    }

    pub fn stats(&self) -> Arc<SimulatorStats> {
        self.simulator.stats()
    }
}

/// Two endpoints whose data channels are wired to each other
pub fn connect_pair(
    a: EndpointConfig,
    b: EndpointConfig,
) -> CoordinatorResult<(SpawnedEndpoint, SpawnedEndpoint)> {
    let (to_a, from_b) = mpsc::unbounded_channel::<DataMessage>();
    let (to_b, from_a) = mpsc::unbounded_channel::<DataMessage>();

    let first = TransferEndpoint::spawn(a, Arc::new(to_b), from_b)?;
    let second = TransferEndpoint::spawn(b, Arc::new(to_a), from_a)?;
    Ok((first, second))
}

/// Like [`connect_pair`], but every data message crosses as a text frame
pub fn connect_framed_pair(
    a: EndpointConfig,
    b: EndpointConfig,
) -> CoordinatorResult<(SpawnedEndpoint, SpawnedEndpoint)> {
    let (to_a, from_b) = mpsc::unbounded_channel::<String>();
    let (to_b, from_a) = mpsc::unbounded_channel::<String>();

    let first = TransferEndpoint::spawn_framed(a, to_b, from_b)?;
    let second = TransferEndpoint::spawn_framed(b, to_a, from_a)?;
    Ok((first, second))
}

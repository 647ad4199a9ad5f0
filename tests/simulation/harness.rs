//! Wiring and waiting helpers

#![allow(dead_code)]

use bit_messenger::api::{connect_local, AppState};
use bit_messenger::client::{ClientEvent, RelayClient, SpawnedClient};
use bit_messenger::coordinator::{
    CoordinatorResult, EndpointConfig, EndpointEvent, SpawnedEndpoint, TransferEndpoint,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::tampering_channel::{TamperConfig, TamperStats, TamperingChannel};

/// Sender `a` and receiver `b`; packets from `a` pass through a tampering link
pub struct LinkedPair {
    pub a: SpawnedEndpoint,
    pub b: SpawnedEndpoint,
    pub tamper: Arc<TamperStats>,
}

pub fn spawn_linked(
    a: EndpointConfig,
    b: EndpointConfig,
    tamper: TamperConfig,
) -> CoordinatorResult<LinkedPair> {
    let (to_a, from_b) = mpsc::unbounded_channel();
    let (to_b, from_a) = mpsc::unbounded_channel();

    let link = TamperingChannel::new(Arc::new(to_b), tamper);
    let stats = link.stats();

    let a = TransferEndpoint::spawn(a, Arc::new(link), from_b)?;
    let b = TransferEndpoint::spawn(b, Arc::new(to_a), from_a)?;
    Ok(LinkedPair {
        a,
        b,
        tamper: stats,
    })
}

/// Next reassembled payload, or `None` if `within` passes first
pub async fn wait_for_completion(
    events: &mut mpsc::UnboundedReceiver<EndpointEvent>,
    within: Duration,
) -> Option<(String, Bytes)> {
    let wait = async {
        while let Some(event) = events.recv().await {
            if let EndpointEvent::Completed {
                correlation_id,
                payload,
            } = event
            {
                return Some((correlation_id, payload));
            }
        }
        None
    };
    tokio::time::timeout(within, wait).await.ok().flatten()
}

/// Send `payload` from `a` to `b`, starting over when a round stalls.
/// Returns the delivered payload and the number of attempts used.
pub async fn deliver_with_retries(
    pair: &mut LinkedPair,
    payload: &[u8],
    attempts: usize,
    per_attempt: Duration,
) -> Option<(Bytes, usize)> {
    for attempt in 1..=attempts {
        pair.a
            .handle
            .send_payload(Bytes::copy_from_slice(payload))
            .await
            .ok()?;
        if let Some((_, delivered)) = wait_for_completion(&mut pair.b.events, per_attempt).await {
            return Some((delivered, attempt));
        }
    }
    None
}

/// Framed endpoint driven by a relay client connected to `state`'s rooms.
/// Data frames go out on `outgoing` and come in on `incoming`.
pub fn spawn_member(
    state: &AppState,
    config: EndpointConfig,
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<String>,
) -> CoordinatorResult<SpawnedClient> {
    let endpoint = TransferEndpoint::spawn_framed(config, outgoing, incoming)?;
    Ok(RelayClient::spawn(endpoint, connect_local(state.clone())))
}

/// Re-routable data link: frames written to [`Switchboard::input`] go to
/// whichever peer was connected last
pub struct Switchboard {
    input: mpsc::UnboundedSender<String>,
    target: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
}

impl Switchboard {
    pub fn spawn() -> Self {
        let (input, mut frames) = mpsc::unbounded_channel::<String>();
        let target: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>> = Arc::default();

        let current = target.clone();
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                if let Some(to) = current.lock().as_ref() {
                    let _ = to.send(frame);
                }
            }
        });

        Self { input, target }
    }

    pub fn input(&self) -> mpsc::UnboundedSender<String> {
        self.input.clone()
    }

    pub fn connect(&self, to: mpsc::UnboundedSender<String>) {
        *self.target.lock() = Some(to);
    }
}

/// First client event matching `pred`, or `None` if `within` passes first
pub async fn wait_for_client_event<F>(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    within: Duration,
    mut pred: F,
) -> Option<ClientEvent>
where
    F: FnMut(&ClientEvent) -> bool,
{
    let wait = async {
        while let Some(event) = events.recv().await {
            if pred(&event) {
                return Some(event);
            }
        }
        None
    };
    tokio::time::timeout(within, wait).await.ok().flatten()
}

/// Next payload the client's endpoint reassembled
pub async fn wait_for_delivery(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    within: Duration,
) -> Option<(String, Bytes)> {
    match wait_for_client_event(events, within, |e| {
        matches!(e, ClientEvent::Endpoint(EndpointEvent::Completed { .. }))
    })
    .await
    {
        Some(ClientEvent::Endpoint(EndpointEvent::Completed {
            correlation_id,
            payload,
        })) => Some((correlation_id, payload)),
        _ => None,
    }
}

//! Live event log over server-sent events

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::api::AppState;
use crate::eventlog::{LogEntry, Subscription};

/// Replays the buffered entries, then pushes each new one as it is recorded
pub async fn stream_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let Subscription { backlog, live } = state.log.subscribe();

    let follow = stream::unfold(live, |mut live| async move {
        loop {
            match live.recv().await {
                Ok(entry) => return Some((entry, live)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "log stream subscriber fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let events = stream::iter(backlog)
        .chain(follow)
        .map(|entry| Ok(to_event(&entry)));

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn to_event(entry: &LogEntry) -> Event {
    Event::default()
        .json_data(entry)
        .unwrap_or_else(|e| Event::default().comment(format!("unencodable entry: {e}")))
}

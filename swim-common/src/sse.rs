//! Server-Sent Events (SSE) utilities

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::events::SwimEvent;

/// Heartbeat interval for idle connections
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Stream bus events matching `filter` to one SSE client
///
/// Sends a `ConnectionStatus` event first, then one SSE event per matching
/// bus event (event name = `SwimEvent::event_type`, data = JSON). A lagging
/// client skips the events it missed and keeps streaming.
pub fn event_sse_stream<F>(
    service_name: &'static str,
    mut rx: broadcast::Receiver<SwimEvent>,
    filter: F,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: Fn(&SwimEvent) -> bool + Send + 'static,
{
    info!("New SSE client connected to {} events", service_name);

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !filter(&event) {
                        continue;
                    }
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            debug!("SSE: Sending {}", event.event_type());
                            yield Ok(Event::default().event(event.event_type()).data(json));
                        }
                        Err(e) => warn!("SSE: Failed to serialize {}: {}", event.event_type(), e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, skipped {} events", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

//! Server-Sent Events for the signed-in user

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Extension,
};
use futures::stream::Stream;
use std::convert::Infallible;

use super::auth::Actor;
use crate::AppState;

/// GET /api/events
///
/// Streams the bus events that concern the caller: their chat messages,
/// notifications and submission updates.
pub async fn event_stream(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = actor.user_id;
    swim_common::sse::event_sse_stream("swim-coach", state.event_bus.subscribe(), move |event| {
        event.concerns(user_id)
    })
}

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, future};
use tracing::{error, info};

use crate::state::QueueState;

/// Live notification ids for `user_id`. The listener lives exactly as long
/// as the response stream.
pub async fn stream(
    State(state): State<QueueState>,
    Path(user_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.broker.subscribe(&user_id);
    info!(%user_id, "SSE client connected");

    let events = subscription.filter_map(move |payload| {
        let event = if payload.for_user_id == user_id {
            match Event::default().json_data(&payload.id) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    error!(notification_id = %payload.id, "Failed to encode SSE event: {}", e);
                    None
                }
            }
        } else {
            None
        };
        future::ready(event)
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(state.settings.queue.sse_keep_alive_secs))
            .text("keep-alive"),
    )
}

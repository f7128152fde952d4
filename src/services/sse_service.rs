use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{dto::events::ShowEvent, state::SharedState};

/// Subscribe to show events.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ShowEvent> {
    state.bus().subscribe()
}

/// Build the SSE frame of `event`: the event name is its type, the data its JSON form.
pub fn to_sse_event(event: &ShowEvent) -> Result<Event, serde_json::Error> {
    let data = serde_json::to_string(event)?;
    Ok(Event::default().event(event.kind()).data(data))
}

/// Convert a bus receiver into an SSE response, forwarding events until the
/// client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ShowEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(show_event) => {
                            let event = match to_sse_event(&show_event) {
                                Ok(event) => event,
                                Err(err) => {
                                    warn!(error = %err, event = show_event.kind(), "failed to encode SSE event");
                                    continue;
                                }
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "SSE viewer lagged; skipping events");
                            continue;
                        }
                    }
                }
            }
        }

        info!("public SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

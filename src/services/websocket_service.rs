use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc::{self, error::TrySendError},
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{dto::events::ShowEvent, state::SharedState};

/// Why the event forwarder of a viewer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForwardEnd {
    /// The bus or the writer went away.
    Closed,
    /// The viewer stopped draining its queue.
    Stalled,
}

/// Serve a read-only viewer: every show event is pushed as a JSON text frame.
/// Inbound frames other than ping and close are ignored.
///
/// Each viewer gets a queue bounded by the broadcast capacity. A viewer whose
/// queue fills up is disconnected.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) =
        mpsc::channel::<Message>(state.config().broadcast_capacity);

    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let events = state.bus().subscribe();
    let mut forward_task =
        tokio::spawn(forward_events(events, outbound_tx.clone(), connection_id));
    info!(%connection_id, viewers = state.bus().viewer_count(), "websocket viewer connected");

    let mut stalled = false;
    loop {
        tokio::select! {
            ended = &mut forward_task => {
                stalled = matches!(ended, Ok(ForwardEnd::Stalled));
                break;
            }
            message = receiver.next() => match message {
                Some(Ok(Message::Ping(payload))) => {
                    let _ = outbound_tx.try_send(Message::Pong(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    let _ = outbound_tx.try_send(Message::Close(frame));
                    break;
                }
                Some(Ok(Message::Text(text))) => {
                    debug!(%connection_id, payload = %text.as_str(), "ignoring inbound viewer message");
                }
                Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Err(err)) => {
                    warn!(%connection_id, error = %err, "websocket error");
                    break;
                }
                None => break,
            },
        }
    }

    forward_task.abort();
    info!(%connection_id, stalled, "websocket viewer disconnected");
    finalize(writer_task, outbound_tx, stalled).await;
}

async fn forward_events(
    mut events: broadcast::Receiver<ShowEvent>,
    outbound_tx: mpsc::Sender<Message>,
    connection_id: Uuid,
) -> ForwardEnd {
    loop {
        match events.recv().await {
            Ok(event) => match send_event(&outbound_tx, &event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(%connection_id, event = event.kind(), "websocket viewer stalled; dropping it");
                    return ForwardEnd::Stalled;
                }
                Err(TrySendError::Closed(_)) => return ForwardEnd::Closed,
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(%connection_id, skipped, "websocket viewer lagged; skipping events");
            }
            Err(RecvError::Closed) => return ForwardEnd::Closed,
        }
    }
}

/// Queue `event` for the writer without waiting. Events that fail to
/// serialize are skipped.
fn send_event(
    tx: &mpsc::Sender<Message>,
    event: &ShowEvent,
) -> Result<(), TrySendError<Message>> {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, event = event.kind(), "failed to serialize show event");
            return Ok(());
        }
    };
    tx.try_send(Message::Text(payload.into()))
}

/// Let the writer flush and wind down. A stalled writer may never finish its
/// pending send, so it is aborted instead.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::Sender<Message>, stalled: bool) {
    drop(outbound_tx);
    if stalled {
        writer_task.abort();
    }
    let _ = writer_task.await;
}

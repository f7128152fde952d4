//! Dispatch of elapsed timers back into the session.

use std::sync::Weak;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    services::events,
    state::{AppState, SharedState, timers::TimerFired},
};

/// Spawn the loop consuming timer fires. It stops once the state is dropped.
pub fn spawn_dispatcher(
    state: Weak<AppState>,
    mut fired_rx: mpsc::Receiver<TimerFired>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(fired) = fired_rx.recv().await {
            let Some(state) = state.upgrade() else {
                break;
            };
            handle_fired(&state, fired).await;
        }
        debug!("timer dispatcher stopped");
    })
}

/// Apply one fire under the session lock. Fires that were cancelled or
/// superseded after they elapsed are dropped.
pub async fn handle_fired(state: &SharedState, fired: TimerFired) {
    let cues = {
        let mut session = state.session().lock().await;
        if !state.timers().take_if_current(fired) {
            debug!(timer = fired.name.as_str(), generation = fired.generation, "superseded timer fire dropped");
            return;
        }

        match session.timer_elapsed(fired.name) {
            Ok(effects) => {
                debug!(timer = fired.name.as_str(), phase = session.phase().as_str(), "timer applied");
                events::apply_effects(state, effects)
            }
            Err(err) => {
                warn!(timer = fired.name.as_str(), error = %err, "timer could not be applied");
                return;
            }
        }
    };

    events::dispatch_npc_cues(state, cues);
}

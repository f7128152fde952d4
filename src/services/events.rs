//! Application of session effects: event publication, timer changes and NPC cues.

use futures::future::join_all;
use tracing::debug;

use crate::state::{
    AppState, SharedState,
    game::{Effects, NpcCue, TimerCommand},
};

/// Publish events and apply timer changes. Call while holding the session lock
/// so effects of concurrent commands never interleave.
///
/// Returns the NPC cues, to be handed to [`dispatch_npc_cues`] after the lock is released.
pub fn apply_effects(state: &AppState, effects: Effects) -> Vec<NpcCue> {
    let Effects {
        events,
        timers,
        npc_cues,
    } = effects;

    for event in events {
        state.bus().publish(event);
    }

    for command in timers {
        match command {
            TimerCommand::Arm(name) => {
                let duration = state.config().timer_duration(name);
                state.timers().arm(name, duration);
            }
            TimerCommand::Cancel(name) => {
                state.timers().cancel(name);
            }
            TimerCommand::CancelAll => state.timers().cancel_all(),
        }
    }

    npc_cues
}

/// Hand NPC cues to the configured hook on a background task.
pub fn dispatch_npc_cues(state: &SharedState, cues: Vec<NpcCue>) {
    if cues.is_empty() {
        return;
    }
    debug!(count = cues.len(), "dispatching NPC cues");

    let hook = state.npc_hook();
    let futures: Vec<_> = cues
        .into_iter()
        .map(|cue| hook.on_cue(state.clone(), cue))
        .collect();
    tokio::spawn(async move {
        join_all(futures).await;
    });
}

//! Extension point where NPC behavior plugs into the show.

use futures::future::BoxFuture;
use tracing::info;

use crate::state::{SharedState, game::NpcCue};

/// Reacts when an NPC has to act. Implementations drive the NPC through the
/// regular command functions of [`game_service`](crate::services::game_service).
pub trait NpcHook: Send + Sync {
    /// Called once per cue, after the session lock is released.
    fn on_cue(&self, state: SharedState, cue: NpcCue) -> BoxFuture<'static, ()>;
}

/// Default hook: NPC moves are left to clients acting under the NPC's id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleNpcHook;

impl NpcHook for IdleNpcHook {
    fn on_cue(&self, _state: SharedState, cue: NpcCue) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match cue {
                NpcCue::PickQuestion(player_id) => {
                    info!(player_id, "NPC holds the turn; waiting for a manual pick")
                }
                NpcCue::Answer(player_id) => {
                    info!(player_id, "NPC won the buzz; waiting for a manual answer")
                }
            }
        })
    }
}

/// Fan-out of show events.
pub mod bus;
/// Buzz queue and winner draws.
pub mod buzzer;
/// The live session.
pub mod game;
/// Question catalog.
pub mod package;
/// Phase graph.
pub mod state_machine;
/// Named session timers.
pub mod timers;

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::{
    config::AppConfig,
    dao::{characters::NpcRoster, judge::AnswerJudge, package_store::PackageStore},
    services::{npc::NpcHook, timer_service},
    state::{
        bus::BroadcastBus,
        game::{GameSession, SessionSettings},
        timers::TimerScheduler,
    },
};

pub use self::state_machine::Snapshot;

/// State shared by every handler and background task.
pub type SharedState = Arc<AppState>;

/// Pending fires between timer tasks and the dispatcher.
const TIMER_CHANNEL_CAPACITY: usize = 32;

/// External collaborators the session talks to.
pub struct Collaborators {
    /// Rules on submitted answers.
    pub judge: Arc<dyn AnswerJudge>,
    /// Turns uploads into package documents.
    pub packages: Arc<dyn PackageStore>,
    /// Characters offered to NPC joins.
    pub roster: NpcRoster,
    /// Receives NPC cues.
    pub npc_hook: Arc<dyn NpcHook>,
}

/// Central application state: the live session and everything it drives.
pub struct AppState {
    config: Arc<AppConfig>,
    session: Mutex<GameSession>,
    timers: TimerScheduler,
    bus: BroadcastBus,
    judge: Arc<dyn AnswerJudge>,
    packages: Arc<dyn PackageStore>,
    roster: NpcRoster,
    npc_hook: Arc<dyn NpcHook>,
}

impl AppState {
    /// Build the state around a fresh session and start the timer dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: AppConfig, collaborators: Collaborators) -> SharedState {
        let session = GameSession::new(SessionSettings {
            can_answer_delay: config.can_answer_delay,
        });
        Self::with_session(config, collaborators, session)
    }

    /// Same as [`AppState::new`] with a caller-provided session, e.g. one with a seeded rng.
    pub fn with_session(
        config: AppConfig,
        collaborators: Collaborators,
        session: GameSession,
    ) -> SharedState {
        let (fired_tx, fired_rx) = mpsc::channel(TIMER_CHANNEL_CAPACITY);
        let Collaborators {
            judge,
            packages,
            roster,
            npc_hook,
        } = collaborators;

        let state = Arc::new(Self {
            bus: BroadcastBus::new(config.broadcast_capacity),
            config: Arc::new(config),
            session: Mutex::new(session),
            timers: TimerScheduler::new(fired_tx),
            judge,
            packages,
            roster,
            npc_hook,
        });

        timer_service::spawn_dispatcher(Arc::downgrade(&state), fired_rx);
        state
    }

    /// Immutable configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// The live session. Hold the guard only for synchronous work.
    pub fn session(&self) -> &Mutex<GameSession> {
        &self.session
    }

    /// Named timers of the session.
    pub fn timers(&self) -> &TimerScheduler {
        &self.timers
    }

    /// Fan-out to viewers.
    pub fn bus(&self) -> &BroadcastBus {
        &self.bus
    }

    /// Answer judge.
    pub fn judge(&self) -> Arc<dyn AnswerJudge> {
        self.judge.clone()
    }

    /// Package extractor.
    pub fn packages(&self) -> Arc<dyn PackageStore> {
        self.packages.clone()
    }

    /// Characters available to NPC joins.
    pub fn roster(&self) -> &NpcRoster {
        &self.roster
    }

    /// Hook driving NPC moves.
    pub fn npc_hook(&self) -> Arc<dyn NpcHook> {
        self.npc_hook.clone()
    }

    /// Phase and transition counter of the session.
    pub async fn snapshot(&self) -> Snapshot {
        self.session.lock().await.snapshot()
    }
}

//! Named, cancellable one-shot timers that force the session forward.
//!
//! Each armed timer is a tokio task that sleeps and then reports a [`TimerFired`]
//! on the dispatcher channel. Fires carry the generation they were armed with;
//! the dispatcher consumes a fire only while that generation is still the
//! armed one, so a fire racing a cancel or re-arm is dropped.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use dashmap::DashMap;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, trace};

use super::state_machine::GamePhase;

/// The timers a session can arm. At most one instance per name is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerName {
    /// Humans never all acknowledged the start.
    StartAckForced,
    /// Not every human confirmed the question was rendered.
    QuestionShownForced,
    /// Buzz window after the first buzz of a round of buzzing.
    BuzzWindow,
    /// Delay while the correct answer is on screen.
    ShowAnswerAdvance,
}

impl TimerName {
    /// Phase the session must still be in for a fire to take effect.
    pub fn required_phase(self) -> GamePhase {
        match self {
            TimerName::StartAckForced => GamePhase::WaitStartAck,
            TimerName::QuestionShownForced | TimerName::BuzzWindow => GamePhase::Question,
            TimerName::ShowAnswerAdvance => GamePhase::ShowAnswer,
        }
    }

    /// Stable name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            TimerName::StartAckForced => "start-ack-forced",
            TimerName::QuestionShownForced => "question-shown-forced",
            TimerName::BuzzWindow => "buzz-window",
            TimerName::ShowAnswerAdvance => "show-answer-advance",
        }
    }
}

/// Notification sent when an armed timer elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Which timer elapsed.
    pub name: TimerName,
    /// Generation the timer was armed with.
    pub generation: u64,
}

struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Registry of armed timers.
pub struct TimerScheduler {
    timers: DashMap<TimerName, ArmedTimer>,
    next_generation: AtomicU64,
    fired_tx: mpsc::Sender<TimerFired>,
}

impl TimerScheduler {
    /// Create a scheduler reporting fires on `fired_tx`.
    pub fn new(fired_tx: mpsc::Sender<TimerFired>) -> Self {
        Self {
            timers: DashMap::new(),
            next_generation: AtomicU64::new(1),
            fired_tx,
        }
    }

    /// Arm `name` to fire after `duration`, replacing any instance already armed.
    pub fn arm(&self, name: TimerName, duration: Duration) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let fired_tx = self.fired_tx.clone();

        let handle = tokio::spawn(async move {
            trace!(timer = name.as_str(), ?duration, "timer task sleeping");
            tokio::time::sleep(duration).await;
            trace!(timer = name.as_str(), generation, "timer elapsed");
            let _ = fired_tx.send(TimerFired { name, generation }).await;
        });

        if let Some(previous) = self
            .timers
            .insert(name, ArmedTimer { generation, handle })
        {
            previous.handle.abort();
            debug!(timer = name.as_str(), "timer re-armed");
        }
        debug!(timer = name.as_str(), ?duration, generation, "timer armed");
        generation
    }

    /// Cancel `name`. Returns whether an instance was armed.
    pub fn cancel(&self, name: TimerName) -> bool {
        match self.timers.remove(&name) {
            Some((_, armed)) => {
                armed.handle.abort();
                debug!(timer = name.as_str(), "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every armed timer.
    pub fn cancel_all(&self) {
        let names: Vec<TimerName> = self.timers.iter().map(|entry| *entry.key()).collect();
        for name in names {
            if let Some((_, armed)) = self.timers.remove(&name) {
                armed.handle.abort();
                trace!(timer = name.as_str(), "timer cancelled (cancel all)");
            }
        }
    }

    /// Consume a fire if it belongs to the currently armed instance.
    ///
    /// Returns `false` for fires of cancelled or replaced instances.
    pub fn take_if_current(&self, fired: TimerFired) -> bool {
        self.timers
            .remove_if(&fired.name, |_, armed| armed.generation == fired.generation)
            .is_some()
    }

    /// Whether `name` is armed and has not been consumed yet.
    pub fn is_armed(&self, name: TimerName) -> bool {
        self.timers.contains_key(&name)
    }

    /// Number of armed timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

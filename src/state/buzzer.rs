//! Buzz queue for the question currently on the floor.

use rand::Rng;

use super::game::PlayerId;

/// Result of registering a buzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// First buzz since the window was last closed; the caller must arm the window timer.
    WindowOpened,
    /// Buzz appended to an already open window.
    Queued,
    /// The player is already waiting in the queue.
    AlreadyQueued,
}

/// Collects distinct buzzers and draws winners one at a time.
#[derive(Debug, Clone, Default)]
pub struct BuzzerArbiter {
    queue: Vec<PlayerId>,
    window_open: bool,
}

impl BuzzerArbiter {
    /// Create an empty arbiter with no open window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buzz from `player_id`.
    pub fn buzz(&mut self, player_id: PlayerId) -> BuzzOutcome {
        if self.queue.contains(&player_id) {
            return BuzzOutcome::AlreadyQueued;
        }
        self.queue.push(player_id);
        if self.window_open {
            BuzzOutcome::Queued
        } else {
            self.window_open = true;
            BuzzOutcome::WindowOpened
        }
    }

    /// Close the current window. The next buzz opens a new one.
    pub fn close_window(&mut self) {
        self.window_open = false;
    }

    /// Whether a buzz window is currently running.
    pub fn is_window_open(&self) -> bool {
        self.window_open
    }

    /// Remove and return one queued buzzer chosen uniformly at random.
    pub fn pick_winner<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PlayerId> {
        if self.queue.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.queue.len());
        Some(self.queue.remove(index))
    }

    /// Whether no buzzer is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued buzzers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Queued buzzers in arrival order.
    pub fn queued(&self) -> &[PlayerId] {
        &self.queue
    }

    /// Remove `player_id` from the queue. Returns whether they were queued.
    pub fn withdraw(&mut self, player_id: PlayerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|id| *id != player_id);
        self.queue.len() != before
    }

    /// Drop every queued buzz and close the window.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.window_open = false;
    }
}

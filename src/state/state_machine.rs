use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// High-level phases a quiz session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    /// Package loaded (or not yet), players may join.
    Joining,
    /// The game was started; waiting for every human to acknowledge.
    WaitStartAck,
    /// The current player picks a question from the table.
    SelectQuestion,
    /// A question is on screen and players may buzz.
    Question,
    /// A buzz winner was chosen and their answer is awaited.
    WaitAnswer,
    /// The correct answer is displayed before returning to the table.
    ShowAnswer,
    /// Every round is exhausted. Terminal until the next reset or upload.
    Unknown,
}

impl GamePhase {
    /// Wire name of the phase, as reported by the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Joining => "joining",
            GamePhase::WaitStartAck => "wait-start-ack",
            GamePhase::SelectQuestion => "select-question",
            GamePhase::Question => "question",
            GamePhase::WaitAnswer => "wait-answer",
            GamePhase::ShowAnswer => "show-answer",
            GamePhase::Unknown => "unknown",
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Host starts the game from the lobby.
    Start,
    /// Every human acknowledged the start, or the acknowledgement timer expired.
    StartAcknowledged,
    /// The current player picked a question.
    QuestionSelected,
    /// The buzz window closed and a winner was drawn.
    BuzzerResolved,
    /// The answering player was wrong and the question goes back to the floor.
    AnswerRejected,
    /// The question is over (answered correctly or nobody left to try).
    RevealAnswer,
    /// Show-answer delay elapsed and at least one question remains.
    NextTurn,
    /// Show-answer delay elapsed and no round has questions left.
    Finish,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// Phase graph of a quiz session.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Joining,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine waiting for players.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Monotonic transition counter, used to detect interleaved changes.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Validate and apply `event`, returning the new phase.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Return to the lobby from any phase. Used by reset and upload.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Joining;
        self.version += 1;
    }

    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Joining, GameEvent::Start) => GamePhase::WaitStartAck,
            (GamePhase::WaitStartAck, GameEvent::StartAcknowledged) => GamePhase::SelectQuestion,
            (GamePhase::SelectQuestion, GameEvent::QuestionSelected) => GamePhase::Question,
            (GamePhase::Question, GameEvent::BuzzerResolved) => GamePhase::WaitAnswer,
            (GamePhase::WaitAnswer, GameEvent::AnswerRejected) => GamePhase::Question,
            (GamePhase::Question | GamePhase::WaitAnswer, GameEvent::RevealAnswer) => {
                GamePhase::ShowAnswer
            }
            (GamePhase::ShowAnswer, GameEvent::NextTurn) => GamePhase::SelectQuestion,
            (GamePhase::ShowAnswer, GameEvent::Finish) => GamePhase::Unknown,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

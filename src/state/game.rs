//! Session data and the rules that move a show from the lobby to the final scoreboard.
//!
//! [`GameSession`] never touches timers or viewers directly: every command
//! returns [`Effects`] describing the events to publish and the timers to arm
//! or cancel, and the service layer applies them while it still holds the
//! session lock.

use std::{collections::HashSet, time::Duration};

use indexmap::IndexMap;
use rand::{Rng, SeedableRng, rngs::StdRng};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::judge::{JudgeRequest, Verdict},
    dto::{events::ShowEvent, public::ScoreEntry},
    error::ServiceError,
    state::{
        buzzer::{BuzzOutcome, BuzzerArbiter},
        package::{Package, PackageDocument, QuestionKey, QuestionsTable},
        state_machine::{GameEvent, GamePhase, GameStateMachine, Snapshot},
        timers::TimerName,
    },
};

/// Player identifier as used on the wire.
pub type PlayerId = i64;
/// First id handed out to NPC contestants.
pub const NPC_ID_BASE: PlayerId = 100;
/// Fixed id of the host persona.
pub const HOST_PLAYER_ID: PlayerId = 1000;

const DEFAULT_HOST_NAME: &str = "Host";

/// Character data attached to NPC participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcPersona {
    /// Display name.
    pub name: String,
    /// Prompt used when the character hosts the show.
    pub host_prompt: String,
    /// Prompt used when the character plays.
    pub player_prompt: String,
}

/// Role of a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerKind {
    /// Person connected through a client.
    Human,
    /// NPC contestant.
    Npc(NpcPersona),
    /// NPC occupying the host slot.
    Host(NpcPersona),
}

/// A participant of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Wire id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Running score. Wrong answers can push it below zero.
    pub score: i64,
    /// Optional photo reference.
    pub photo: Option<String>,
    /// Role of the participant.
    pub kind: PlayerKind,
}

impl Player {
    /// Whether the participant is a person.
    pub fn is_human(&self) -> bool {
        matches!(self.kind, PlayerKind::Human)
    }

    /// Whether the participant occupies the host slot.
    pub fn is_host(&self) -> bool {
        matches!(self.kind, PlayerKind::Host(_))
    }
}

/// Timer change requested by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Arm (or re-arm) the named timer with its configured duration.
    Arm(TimerName),
    /// Cancel the named timer if it is armed.
    Cancel(TimerName),
    /// Cancel every armed timer.
    CancelAll,
}

/// Points where an NPC would have to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcCue {
    /// The NPC holds the turn and must pick a question.
    PickQuestion(PlayerId),
    /// The NPC won the buzz and must answer.
    Answer(PlayerId),
}

/// Side effects of a command, applied by the caller under the session lock.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Effects {
    /// Events to publish, in order.
    pub events: Vec<ShowEvent>,
    /// Timer changes, in order.
    pub timers: Vec<TimerCommand>,
    /// NPC hooks to run once the lock is released.
    pub npc_cues: Vec<NpcCue>,
}

impl Effects {
    /// Whether the command produced nothing observable.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.timers.is_empty() && self.npc_cues.is_empty()
    }

    fn publish(&mut self, event: ShowEvent) {
        self.events.push(event);
    }

    fn arm(&mut self, name: TimerName) {
        self.timers.push(TimerCommand::Arm(name));
    }

    fn cancel(&mut self, name: TimerName) {
        self.timers.push(TimerCommand::Cancel(name));
    }
}

/// Marks an answer that is with the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeTicket {
    id: Uuid,
    version: usize,
    player_id: PlayerId,
    key: QuestionKey,
}

impl JudgeTicket {
    /// Unique id of the judging round.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Player whose answer is being judged.
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Question being answered.
    pub fn key(&self) -> QuestionKey {
        self.key
    }
}

/// Answer accepted for judging, to be resolved with [`GameSession::finish_answer`].
#[derive(Debug, Clone)]
pub struct PendingAnswer {
    /// Ticket validated when the verdict comes back.
    pub ticket: JudgeTicket,
    /// Everything the judge needs.
    pub request: JudgeRequest,
}

/// Tunables the session itself needs.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Offset of the can-answer timestamp from the moment it is sent.
    pub can_answer_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            can_answer_delay: Duration::from_millis(500),
        }
    }
}

/// The single live show.
pub struct GameSession {
    machine: GameStateMachine,
    settings: SessionSettings,
    rng: StdRng,
    document: Option<PackageDocument>,
    players: IndexMap<PlayerId, Player>,
    current_player: Option<PlayerId>,
    round_num: usize,
    answered: HashSet<QuestionKey>,
    selected: Option<QuestionKey>,
    start_acks: HashSet<PlayerId>,
    question_shown: HashSet<PlayerId>,
    can_answer_sent: bool,
    players_answered: HashSet<PlayerId>,
    arbiter: BuzzerArbiter,
    answering: Option<PlayerId>,
    judging: Option<JudgeTicket>,
}

impl GameSession {
    /// Create an empty session seeded from the operating system.
    pub fn new(settings: SessionSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Create an empty session drawing random choices from `rng`.
    pub fn with_rng(settings: SessionSettings, rng: StdRng) -> Self {
        Self {
            machine: GameStateMachine::new(),
            settings,
            rng,
            document: None,
            players: IndexMap::new(),
            current_player: None,
            round_num: 0,
            answered: HashSet::new(),
            selected: None,
            start_acks: HashSet::new(),
            question_shown: HashSet::new(),
            can_answer_sent: false,
            players_answered: HashSet::new(),
            arbiter: BuzzerArbiter::new(),
            answering: None,
            judging: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.machine.phase()
    }

    /// Transition counter of the phase graph.
    pub fn version(&self) -> usize {
        self.machine.version()
    }

    /// Phase and transition counter together.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Participants in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Look up a participant.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Player holding the turn, once the game has started.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.current_player
    }

    /// Active round, 1-based. Zero before start.
    pub fn round_num(&self) -> usize {
        self.round_num
    }

    /// Questions resolved since the last upload or reset.
    pub fn answered(&self) -> &HashSet<QuestionKey> {
        &self.answered
    }

    /// Question currently being played.
    pub fn selected_question(&self) -> Option<QuestionKey> {
        self.selected
    }

    /// Buzz winner expected to answer.
    pub fn answering_player(&self) -> Option<PlayerId> {
        self.answering
    }

    /// Players who buzzed and are still waiting for their turn.
    pub fn buzz_queue(&self) -> &[PlayerId] {
        self.arbiter.queued()
    }

    /// Players who used up their attempt at the current question.
    pub fn players_answered(&self) -> &HashSet<PlayerId> {
        &self.players_answered
    }

    /// Whether an answer is with the judge.
    pub fn is_judging(&self) -> bool {
        self.judging.is_some()
    }

    /// Loaded package, if any.
    pub fn document(&self) -> Option<&PackageDocument> {
        self.document.as_ref()
    }

    /// Scoreboard in join order.
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        self.players.values().map(ScoreEntry::from).collect()
    }

    /// Table of the active round.
    pub fn current_table(&self) -> Option<QuestionsTable> {
        self.document
            .as_ref()
            .map(|doc| doc.package.questions_table(self.round_num, &self.answered))
    }

    /// Install a freshly extracted package and return to the lobby.
    pub fn load_package(&mut self, document: PackageDocument) -> Effects {
        self.wipe();
        self.document = Some(document);
        Effects {
            timers: vec![TimerCommand::CancelAll],
            ..Effects::default()
        }
    }

    /// Wipe everything, package included, and return to the lobby.
    pub fn reset(&mut self) -> Effects {
        self.wipe();
        self.document = None;
        Effects {
            events: vec![ShowEvent::Reset],
            timers: vec![TimerCommand::CancelAll],
            npc_cues: Vec::new(),
        }
    }

    /// Add a human player, or rename them when they join again.
    pub fn join(
        &mut self,
        id: PlayerId,
        name: String,
        photo: Option<String>,
    ) -> Result<(), ServiceError> {
        self.ensure_phase(GamePhase::Joining, "join")?;
        if id == HOST_PLAYER_ID {
            return Err(ServiceError::InvalidInput(format!(
                "id {HOST_PLAYER_ID} is reserved for the host"
            )));
        }

        if let Some(existing) = self.players.get_mut(&id) {
            if !existing.is_human() {
                return Err(ServiceError::InvalidState(format!(
                    "id {id} is taken by an NPC"
                )));
            }
            existing.name = name;
            existing.photo = photo;
            return Ok(());
        }

        self.players.insert(
            id,
            Player {
                id,
                name,
                score: 0,
                photo,
                kind: PlayerKind::Human,
            },
        );
        Ok(())
    }

    /// Add an NPC contestant on the next free NPC id.
    pub fn join_npc(
        &mut self,
        persona: NpcPersona,
        photo: Option<String>,
    ) -> Result<PlayerId, ServiceError> {
        self.ensure_phase(GamePhase::Joining, "join")?;
        let id = (NPC_ID_BASE..HOST_PLAYER_ID)
            .find(|id| !self.players.contains_key(id))
            .ok_or_else(|| ServiceError::InvalidState("no free NPC slot left".into()))?;

        self.players.insert(
            id,
            Player {
                id,
                name: persona.name.clone(),
                score: 0,
                photo,
                kind: PlayerKind::Npc(persona),
            },
        );
        Ok(id)
    }

    /// Put `persona` in the host slot, replacing any previous host.
    pub fn join_host(
        &mut self,
        persona: NpcPersona,
        photo: Option<String>,
    ) -> Result<(), ServiceError> {
        self.ensure_phase(GamePhase::Joining, "join")?;
        self.players.insert(
            HOST_PLAYER_ID,
            Player {
                id: HOST_PLAYER_ID,
                name: persona.name.clone(),
                score: 0,
                photo,
                kind: PlayerKind::Host(persona),
            },
        );
        Ok(())
    }

    /// Leave the lobby: draw the first player and wait for start acknowledgements.
    pub fn start(&mut self) -> Result<Effects, ServiceError> {
        self.ensure_phase(GamePhase::Joining, "start")?;
        let first_round = {
            let package = self.package()?;
            (0..package.round_count())
                .find(|round| package.round_has_questions(*round))
                .ok_or_else(|| ServiceError::InvalidState("package has no questions".into()))?
        };
        let eligible: Vec<PlayerId> = self
            .players
            .values()
            .filter(|player| !player.is_host())
            .map(|player| player.id)
            .collect();
        if eligible.is_empty() {
            return Err(ServiceError::InvalidState("no eligible players".into()));
        }

        self.machine.apply(GameEvent::Start)?;
        let current = eligible[self.rng.random_range(0..eligible.len())];
        self.current_player = Some(current);
        self.round_num = first_round + 1;
        self.start_acks.clear();
        info!(current_player = current, round = self.round_num, "game started");

        let mut fx = Effects::default();
        fx.publish(ShowEvent::Start);
        fx.arm(TimerName::StartAckForced);
        if self.all_humans_in(&self.start_acks) {
            self.enter_table_after_start(&mut fx)?;
        }
        Ok(fx)
    }

    /// Record that a human saw the start screen.
    pub fn start_acknowledge(&mut self, player_id: PlayerId) -> Result<Effects, ServiceError> {
        let player = self.require_player(player_id)?;
        let is_human = player.is_human();
        let mut fx = Effects::default();

        match self.phase() {
            GamePhase::Joining => Err(ServiceError::InvalidState(
                "game has not been started".into(),
            )),
            GamePhase::WaitStartAck => {
                if !is_human {
                    return Err(ServiceError::InvalidInput(
                        "NPC players don't acknowledge".into(),
                    ));
                }
                self.start_acks.insert(player_id);
                if self.all_humans_in(&self.start_acks) {
                    self.enter_table_after_start(&mut fx)?;
                }
                Ok(fx)
            }
            _ => Ok(fx),
        }
    }

    /// Pick a question from the active round.
    pub fn select_question(
        &mut self,
        key: QuestionKey,
        player_id: PlayerId,
    ) -> Result<Effects, ServiceError> {
        self.ensure_phase(GamePhase::SelectQuestion, "select a question")?;
        if self.answered.contains(&key) {
            return Err(ServiceError::InvalidState(format!(
                "question {key} was already answered"
            )));
        }
        self.require_player(player_id)?;
        if self.current_player != Some(player_id) {
            return Err(ServiceError::InvalidState(format!(
                "player {player_id} is not the current player"
            )));
        }
        if key.round != self.round_num {
            return Err(ServiceError::InvalidInput(format!(
                "question {key} is not in the active round {}",
                self.round_num
            )));
        }
        if self.package()?.question(key).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "question {key} does not exist"
            )));
        }

        self.machine.apply(GameEvent::QuestionSelected)?;
        self.selected = Some(key);
        self.reset_question_state();
        debug!(question = %key, player_id, "question selected");

        let mut fx = Effects::default();
        fx.publish(ShowEvent::QuestionSelected {
            id: key.to_string(),
            isspecial: false,
        });
        fx.arm(TimerName::QuestionShownForced);
        Ok(fx)
    }

    /// Record that a client rendered the current question.
    pub fn question_shown(&mut self, player_id: PlayerId) -> Result<Effects, ServiceError> {
        let is_human = self.require_player(player_id)?.is_human();
        let mut fx = Effects::default();
        if self.phase() != GamePhase::Question || self.can_answer_sent || !is_human {
            return Ok(fx);
        }

        self.question_shown.insert(player_id);
        if self.all_humans_in(&self.question_shown) {
            self.emit_can_answer(&mut fx);
        }
        Ok(fx)
    }

    /// Register a buzz for the current question.
    pub fn request_answer(&mut self, player_id: PlayerId) -> Result<Effects, ServiceError> {
        self.ensure_phase(GamePhase::Question, "buzz")?;
        if self.require_player(player_id)?.is_host() {
            return Err(ServiceError::InvalidInput("the host cannot buzz".into()));
        }
        if self.players_answered.contains(&player_id) {
            return Err(ServiceError::InvalidState(format!(
                "player {player_id} already attempted this question"
            )));
        }

        let mut fx = Effects::default();
        if self.arbiter.buzz(player_id) == BuzzOutcome::WindowOpened {
            fx.arm(TimerName::BuzzWindow);
        }
        fx.publish(ShowEvent::StopTimer);
        Ok(fx)
    }

    /// Accept an answer for judging. The session stays in `WaitAnswer` until
    /// [`finish_answer`](Self::finish_answer) or [`abort_answer`](Self::abort_answer).
    pub fn begin_answer(
        &mut self,
        key: QuestionKey,
        player_id: PlayerId,
        text: &str,
    ) -> Result<PendingAnswer, ServiceError> {
        self.ensure_phase(GamePhase::WaitAnswer, "answer")?;
        if self.judging.is_some() {
            return Err(ServiceError::InvalidState(
                "an answer is already being judged".into(),
            ));
        }
        self.require_player(player_id)?;
        let selected = self
            .selected
            .ok_or_else(|| ServiceError::InvalidState("no question selected".into()))?;
        if key != selected {
            return Err(ServiceError::InvalidInput(format!(
                "question {key} is not the selected question {selected}"
            )));
        }
        if self.answering != Some(player_id) {
            return Err(ServiceError::InvalidState(format!(
                "player {player_id} is not the answering player"
            )));
        }

        let question = self
            .package()?
            .question(key)
            .ok_or_else(|| ServiceError::InvalidState(format!("question {key} vanished")))?;
        let (host_name, host_prompt) = self.host_persona();
        let request = JudgeRequest {
            host_name,
            host_prompt,
            question: question.text.clone(),
            given_answer: text.to_string(),
            expected_answer: question.expected_answer(),
        };

        let ticket = JudgeTicket {
            id: Uuid::new_v4(),
            version: self.machine.version(),
            player_id,
            key,
        };
        self.judging = Some(ticket.clone());
        Ok(PendingAnswer { ticket, request })
    }

    /// Apply the judge's verdict for `ticket`.
    pub fn finish_answer(
        &mut self,
        ticket: &JudgeTicket,
        text: String,
        verdict: Verdict,
    ) -> Result<Effects, ServiceError> {
        if self.judging.as_ref() != Some(ticket) {
            return Err(ServiceError::InvalidState(
                "the session changed while the answer was being judged".into(),
            ));
        }
        self.judging = None;
        if self.machine.version() != ticket.version || self.phase() != GamePhase::WaitAnswer {
            return Err(ServiceError::InvalidState(
                "the session changed while the answer was being judged".into(),
            ));
        }

        let player_id = ticket.player_id;
        let key = ticket.key;
        let price = self.package()?.price(key);

        let mut fx = Effects::default();
        fx.publish(ShowEvent::StopTimer);
        fx.publish(ShowEvent::Validated {
            id_quest: key.to_string(),
            player_id,
            result: verdict.correct,
            unfreeze: self.arbiter.is_empty(),
        });
        fx.publish(ShowEvent::PlayerTalk { player_id, text });
        fx.publish(ShowEvent::HostTalk {
            text: verdict.commentary,
        });

        if let Some(player) = self.players.get_mut(&player_id) {
            if verdict.correct {
                player.score += price;
            } else {
                player.score -= price;
            }
        }

        if verdict.correct {
            self.current_player = Some(player_id);
            self.reveal(&mut fx)?;
        } else {
            self.after_failed_attempt(&mut fx)?;
        }
        Ok(fx)
    }

    /// Drop the judging mark without touching anything else.
    pub fn abort_answer(&mut self, ticket: &JudgeTicket) {
        if self.judging.as_ref() == Some(ticket) {
            self.judging = None;
        }
    }

    /// A client's countdown for the current question ran out.
    pub fn timer_done(&mut self, player_id: PlayerId) -> Result<Effects, ServiceError> {
        let is_human = self.require_player(player_id)?.is_human();
        let mut fx = Effects::default();
        let phase = self.phase();
        if !is_human || !matches!(phase, GamePhase::Question | GamePhase::WaitAnswer) {
            return Ok(fx);
        }

        self.players_answered.insert(player_id);
        // An exhausted player must not be drawn from the queue later.
        if self.arbiter.withdraw(player_id) {
            debug!(player_id, "buzz withdrawn after timer done");
        }
        if self.judging.is_some() {
            return Ok(fx);
        }

        match phase {
            GamePhase::Question if self.all_humans_in(&self.players_answered) => {
                self.reveal(&mut fx)?;
            }
            GamePhase::WaitAnswer if self.answering == Some(player_id) => {
                self.after_failed_attempt(&mut fx)?;
            }
            _ => {}
        }
        Ok(fx)
    }

    /// React to an elapsed timer. Fires outside the timer's phase do nothing.
    pub fn timer_elapsed(&mut self, name: TimerName) -> Result<Effects, ServiceError> {
        let mut fx = Effects::default();
        if self.phase() != name.required_phase() {
            debug!(timer = name.as_str(), phase = self.phase().as_str(), "stale timer ignored");
            return Ok(fx);
        }

        match name {
            TimerName::StartAckForced => self.enter_table_after_start(&mut fx)?,
            TimerName::QuestionShownForced => {
                if !self.can_answer_sent {
                    self.emit_can_answer(&mut fx);
                }
            }
            TimerName::BuzzWindow => {
                self.arbiter.close_window();
                self.resolve_buzzers(&mut fx)?;
            }
            TimerName::ShowAnswerAdvance => self.advance_after_reveal(&mut fx)?,
        }
        Ok(fx)
    }

    fn enter_table_after_start(&mut self, fx: &mut Effects) -> Result<(), ServiceError> {
        self.machine.apply(GameEvent::StartAcknowledged)?;
        fx.cancel(TimerName::StartAckForced);
        fx.publish(self.table_event());
        self.cue_current_player(fx);
        Ok(())
    }

    fn emit_can_answer(&mut self, fx: &mut Effects) {
        self.can_answer_sent = true;
        fx.cancel(TimerName::QuestionShownForced);
        let at = OffsetDateTime::now_utc() + self.settings.can_answer_delay;
        fx.publish(ShowEvent::CanAnswer {
            timestamp: (at.unix_timestamp_nanos() / 1_000_000) as i64,
        });
    }

    fn resolve_buzzers(&mut self, fx: &mut Effects) -> Result<bool, ServiceError> {
        if self.arbiter.is_empty() {
            debug!("buzz window closed without buzzers");
            return Ok(false);
        }
        self.machine.apply(GameEvent::BuzzerResolved)?;
        let Some(winner) = self.arbiter.pick_winner(&mut self.rng) else {
            return Ok(false);
        };

        self.players_answered.insert(winner);
        self.answering = Some(winner);
        debug!(player_id = winner, remaining = self.arbiter.len(), "buzz winner drawn");
        fx.publish(ShowEvent::WaitAnswer { player_id: winner });
        if self.player(winner).is_some_and(|player| !player.is_human()) {
            fx.npc_cues.push(NpcCue::Answer(winner));
        }
        Ok(true)
    }

    fn after_failed_attempt(&mut self, fx: &mut Effects) -> Result<(), ServiceError> {
        self.answering = None;
        if !self.arbiter.is_empty() {
            self.machine.apply(GameEvent::AnswerRejected)?;
            self.resolve_buzzers(fx)?;
        } else if !self.all_humans_in(&self.players_answered) {
            self.machine.apply(GameEvent::AnswerRejected)?;
        } else {
            self.reveal(fx)?;
        }
        Ok(())
    }

    fn reveal(&mut self, fx: &mut Effects) -> Result<(), ServiceError> {
        let key = self
            .selected
            .ok_or_else(|| ServiceError::InvalidState("no question selected".into()))?;
        self.machine.apply(GameEvent::RevealAnswer)?;
        self.answered.insert(key);
        self.answering = None;
        self.arbiter.clear();

        fx.cancel(TimerName::BuzzWindow);
        fx.cancel(TimerName::QuestionShownForced);
        fx.publish(ShowEvent::ShowAnswer {
            id_quest: key.to_string(),
        });
        fx.arm(TimerName::ShowAnswerAdvance);
        Ok(())
    }

    fn advance_after_reveal(&mut self, fx: &mut Effects) -> Result<(), ServiceError> {
        self.selected = None;
        let table_empty = self.current_table().is_none_or(|table| table.is_empty);
        if table_empty {
            match self.next_playable_round()? {
                Some(round) => {
                    info!(round, "advancing to next round");
                    self.round_num = round;
                }
                None => {
                    self.machine.apply(GameEvent::Finish)?;
                    info!("every round is exhausted; game over");
                    fx.publish(ShowEvent::GameOver {
                        scores: self.scoreboard(),
                    });
                    return Ok(());
                }
            }
        }

        self.machine.apply(GameEvent::NextTurn)?;
        fx.publish(self.table_event());
        self.cue_current_player(fx);
        Ok(())
    }

    /// 1-based number of the next round after the active one that still has questions.
    fn next_playable_round(&self) -> Result<Option<usize>, ServiceError> {
        let package = self.package()?;
        if !package.has_next_round(self.round_num) {
            return Ok(None);
        }
        Ok((self.round_num..package.round_count())
            .find(|index| package.round_has_questions(*index))
            .map(|index| index + 1))
    }

    fn table_event(&self) -> ShowEvent {
        ShowEvent::QuestionsTable {
            table: self
                .current_table()
                .map(|table| table.rendered)
                .unwrap_or_default(),
        }
    }

    fn cue_current_player(&self, fx: &mut Effects) {
        let Some(id) = self.current_player else {
            return;
        };
        if self.player(id).is_some_and(|player| !player.is_human()) {
            fx.npc_cues.push(NpcCue::PickQuestion(id));
        }
    }

    fn host_persona(&self) -> (String, String) {
        match self.players.get(&HOST_PLAYER_ID).map(|player| &player.kind) {
            Some(PlayerKind::Host(persona)) => (persona.name.clone(), persona.host_prompt.clone()),
            _ => (DEFAULT_HOST_NAME.to_string(), String::new()),
        }
    }

    fn all_humans_in(&self, set: &HashSet<PlayerId>) -> bool {
        self.players
            .values()
            .filter(|player| player.is_human())
            .all(|player| set.contains(&player.id))
    }

    fn reset_question_state(&mut self) {
        self.question_shown.clear();
        self.can_answer_sent = false;
        self.players_answered.clear();
        self.arbiter.clear();
        self.answering = None;
        self.judging = None;
    }

    fn wipe(&mut self) {
        self.machine.reset();
        self.players.clear();
        self.current_player = None;
        self.round_num = 0;
        self.answered.clear();
        self.selected = None;
        self.start_acks.clear();
        self.reset_question_state();
    }

    fn package(&self) -> Result<&Package, ServiceError> {
        self.document
            .as_ref()
            .map(|doc| &doc.package)
            .ok_or_else(|| ServiceError::InvalidState("no package loaded".into()))
    }

    fn require_player(&self, id: PlayerId) -> Result<&Player, ServiceError> {
        self.players
            .get(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` not found")))
    }

    fn ensure_phase(&self, expected: GamePhase, action: &str) -> Result<(), ServiceError> {
        let phase = self.phase();
        if phase == expected {
            Ok(())
        } else {
            Err(ServiceError::InvalidState(format!(
                "cannot {action} while in {}",
                phase.as_str()
            )))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::package::{Round, tests::theme};

    pub(crate) fn document(rounds: Vec<Vec<(&str, &[&str])>>) -> PackageDocument {
        let package = Package {
            name: "test".into(),
            rounds: rounds
                .into_iter()
                .enumerate()
                .map(|(i, themes)| Round {
                    name: format!("round {}", i + 1),
                    themes: themes
                        .into_iter()
                        .map(|(name, prices)| theme(name, prices))
                        .collect(),
                })
                .collect(),
        };
        PackageDocument {
            raw: Arc::new(serde_json::json!({ "package": "test" })),
            package,
        }
    }

    fn persona(name: &str) -> NpcPersona {
        NpcPersona {
            name: name.into(),
            host_prompt: format!("{name} hosts"),
            player_prompt: format!("{name} plays"),
        }
    }

    fn key(round: usize, theme: usize, question: usize) -> QuestionKey {
        QuestionKey::new(round, theme, question).unwrap()
    }

    fn verdict(correct: bool) -> Verdict {
        Verdict {
            correct,
            commentary: "noted".into(),
        }
    }

    fn session(document: PackageDocument, humans: &[PlayerId]) -> GameSession {
        let mut session = GameSession::with_rng(SessionSettings::default(), StdRng::seed_from_u64(3));
        let _ = session.load_package(document);
        for id in humans {
            session.join(*id, format!("player {id}"), None).unwrap();
        }
        session
    }

    /// Session sitting in `SelectQuestion` with every human acknowledged.
    fn started(document: PackageDocument, humans: &[PlayerId]) -> GameSession {
        let mut session = session(document, humans);
        let _ = session.start().unwrap();
        for id in humans {
            let _ = session.start_acknowledge(*id).unwrap();
        }
        assert_eq!(session.phase(), GamePhase::SelectQuestion);
        session
    }

    /// Session in `Question` on `1_1_1`, selected by the current player.
    fn on_question(document: PackageDocument, humans: &[PlayerId]) -> GameSession {
        let mut session = started(document, humans);
        let current = session.current_player().unwrap();
        let _ = session.select_question(key(1, 1, 1), current).unwrap();
        session
    }

    fn close_window(session: &mut GameSession) -> Effects {
        session.timer_elapsed(TimerName::BuzzWindow).unwrap()
    }

    #[test]
    fn start_requires_package_and_players() {
        let mut empty = GameSession::new(SessionSettings::default());
        assert!(matches!(empty.start(), Err(ServiceError::InvalidState(_))));

        let mut no_players = session(document(vec![vec![("A", &["100"])]]), &[]);
        no_players.join_host(persona("Max"), None).unwrap();
        assert!(matches!(no_players.start(), Err(ServiceError::InvalidState(_))));
        assert_eq!(no_players.phase(), GamePhase::Joining);
    }

    #[test]
    fn start_picks_a_non_host_player_and_arms_the_ack_timer() {
        let mut session = session(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        session.join_host(persona("Max"), None).unwrap();

        let fx = session.start().unwrap();

        assert_eq!(session.phase(), GamePhase::WaitStartAck);
        assert_eq!(session.round_num(), 1);
        let current = session.current_player().unwrap();
        assert!([1, 2].contains(&current));
        assert_eq!(fx.events, vec![ShowEvent::Start]);
        assert_eq!(fx.timers, vec![TimerCommand::Arm(TimerName::StartAckForced)]);
    }

    #[test]
    fn last_acknowledgement_publishes_the_table() {
        let mut session = session(document(vec![vec![("A", &["100", "200"])]]), &[1, 2]);
        let _ = session.start().unwrap();

        let first = session.start_acknowledge(1).unwrap();
        assert!(first.is_empty());
        let last = session.start_acknowledge(2).unwrap();

        assert_eq!(session.phase(), GamePhase::SelectQuestion);
        assert_eq!(
            last.timers,
            vec![TimerCommand::Cancel(TimerName::StartAckForced)]
        );
        assert_eq!(
            last.events,
            vec![ShowEvent::QuestionsTable {
                table: "A|100|200||||||||".into()
            }]
        );
    }

    #[test]
    fn acknowledging_after_the_table_is_a_silent_success() {
        let mut session = started(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let fx = session.start_acknowledge(1).unwrap();
        assert!(fx.is_empty());
        assert_eq!(session.phase(), GamePhase::SelectQuestion);
    }

    #[test]
    fn acknowledgement_is_validated() {
        let mut session = session(document(vec![vec![("A", &["100"])]]), &[1]);
        assert!(matches!(
            session.start_acknowledge(1),
            Err(ServiceError::InvalidState(_))
        ));
        let npc = session.join_npc(persona("Bot"), None).unwrap();
        let _ = session.start().unwrap();

        assert!(matches!(
            session.start_acknowledge(42),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            session.start_acknowledge(npc),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn forced_start_advances_without_acknowledgements() {
        let mut session = session(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let _ = session.start().unwrap();

        let fx = session.timer_elapsed(TimerName::StartAckForced).unwrap();

        assert_eq!(session.phase(), GamePhase::SelectQuestion);
        assert!(matches!(fx.events[0], ShowEvent::QuestionsTable { .. }));
    }

    #[test]
    fn only_npcs_skip_the_acknowledgement_wait() {
        let mut session = session(document(vec![vec![("A", &["100"])]]), &[]);
        let npc = session.join_npc(persona("Bot"), None).unwrap();

        let fx = session.start().unwrap();

        assert_eq!(session.phase(), GamePhase::SelectQuestion);
        assert_eq!(session.current_player(), Some(npc));
        assert_eq!(fx.npc_cues, vec![NpcCue::PickQuestion(npc)]);
    }

    #[test]
    fn select_question_checks_turn_and_answered_keys() {
        let mut session = started(document(vec![vec![("A", &["100", "200"])]]), &[1, 2]);
        let current = session.current_player().unwrap();
        let other = if current == 1 { 2 } else { 1 };

        assert!(matches!(
            session.select_question(key(1, 1, 1), other),
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            session.select_question(key(1, 1, 9), current),
            Err(ServiceError::InvalidInput(_))
        ));

        let fx = session.select_question(key(1, 1, 1), current).unwrap();
        assert_eq!(session.phase(), GamePhase::Question);
        assert_eq!(
            fx.events,
            vec![ShowEvent::QuestionSelected {
                id: "1_1_1".into(),
                isspecial: false
            }]
        );
        assert_eq!(
            fx.timers,
            vec![TimerCommand::Arm(TimerName::QuestionShownForced)]
        );
    }

    #[test]
    fn answered_question_cannot_be_selected_again() {
        let mut session = on_question(document(vec![vec![("A", &["100", "200"])]]), &[1]);
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);
        let pending = session.begin_answer(key(1, 1, 1), 1, "answer").unwrap();
        let _ = session
            .finish_answer(&pending.ticket, "answer".into(), verdict(true))
            .unwrap();
        let _ = session.timer_elapsed(TimerName::ShowAnswerAdvance).unwrap();
        assert_eq!(session.phase(), GamePhase::SelectQuestion);

        for caller in [1, 77] {
            assert!(matches!(
                session.select_question(key(1, 1, 1), caller),
                Err(ServiceError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn can_answer_is_sent_once_every_human_saw_the_question() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2]);

        assert!(session.question_shown(1).unwrap().is_empty());
        let fx = session.question_shown(2).unwrap();

        assert_eq!(
            fx.timers,
            vec![TimerCommand::Cancel(TimerName::QuestionShownForced)]
        );
        assert!(matches!(fx.events[..], [ShowEvent::CanAnswer { .. }]));
        assert!(session.question_shown(2).unwrap().is_empty());
        assert!(session
            .timer_elapsed(TimerName::QuestionShownForced)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn can_answer_timestamp_is_in_the_near_future() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1]);
        let before = OffsetDateTime::now_utc().unix_timestamp() * 1000;

        let fx = session.question_shown(1).unwrap();

        let ShowEvent::CanAnswer { timestamp } = fx.events[0] else {
            panic!("expected can-answer, got {:?}", fx.events);
        };
        assert!(timestamp >= before + 400);
        assert!(timestamp <= before + 2_000);
    }

    #[test]
    fn first_buzz_arms_the_window_and_every_buzz_stops_timers() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2, 3]);

        let first = session.request_answer(1).unwrap();
        assert_eq!(first.timers, vec![TimerCommand::Arm(TimerName::BuzzWindow)]);
        assert_eq!(first.events, vec![ShowEvent::StopTimer]);

        let second = session.request_answer(2).unwrap();
        assert!(second.timers.is_empty());
        assert_eq!(second.events, vec![ShowEvent::StopTimer]);

        let repeat = session.request_answer(1).unwrap();
        assert!(repeat.timers.is_empty());
        assert_eq!(session.buzz_queue(), &[1, 2]);
    }

    #[test]
    fn buzz_outside_question_or_from_host_is_rejected() {
        let mut session = started(document(vec![vec![("A", &["100"])]]), &[1]);
        assert!(matches!(
            session.request_answer(1),
            Err(ServiceError::InvalidState(_))
        ));

        let mut with_host = session_with_host();
        assert!(matches!(
            with_host.request_answer(HOST_PLAYER_ID),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    fn session_with_host() -> GameSession {
        let mut session = session(document(vec![vec![("A", &["100"])]]), &[1]);
        session.join_host(persona("Max"), None).unwrap();
        let _ = session.start().unwrap();
        let _ = session.start_acknowledge(1).unwrap();
        let _ = session.select_question(key(1, 1, 1), 1).unwrap();
        session
    }

    #[test]
    fn three_buzzers_yield_one_winner_and_two_queued() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2, 3]);
        for id in [1, 2, 3] {
            let _ = session.request_answer(id).unwrap();
        }

        let fx = close_window(&mut session);

        assert_eq!(session.phase(), GamePhase::WaitAnswer);
        let winner = session.answering_player().unwrap();
        assert_eq!(fx.events, vec![ShowEvent::WaitAnswer { player_id: winner }]);
        assert_eq!(session.buzz_queue().len(), 2);
        assert!(!session.buzz_queue().contains(&winner));
        assert!(session.players_answered().contains(&winner));
    }

    #[test]
    fn empty_window_keeps_the_question_open() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1]);
        let fx = close_window(&mut session);
        assert!(fx.is_empty());
        assert_eq!(session.phase(), GamePhase::Question);
    }

    #[test]
    fn answer_outside_wait_answer_is_rejected_without_effects() {
        let mut session = started(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let current = session.current_player().unwrap();
        let version = session.version();

        let result = session.begin_answer(key(1, 1, 1), current, "anything");

        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
        assert_eq!(session.version(), version);
        assert!(!session.is_judging());
        assert!(session.players().all(|player| player.score == 0));
    }

    #[test]
    fn answer_must_come_from_the_buzz_winner_for_the_selected_question() {
        let mut session = on_question(document(vec![vec![("A", &["100", "200"])]]), &[1, 2]);
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);

        assert!(matches!(
            session.begin_answer(key(1, 1, 2), 1, "x"),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            session.begin_answer(key(1, 1, 1), 2, "x"),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn judge_request_carries_host_persona_and_answers() {
        let mut session = session_with_host();
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);

        let pending = session.begin_answer(key(1, 1, 1), 1, "Volga").unwrap();

        assert_eq!(pending.request.host_name, "Max");
        assert_eq!(pending.request.host_prompt, "Max hosts");
        assert_eq!(pending.request.question, "A question 1");
        assert_eq!(pending.request.given_answer, "Volga");
        assert_eq!(pending.request.expected_answer, "answer");
        assert!(session.is_judging());
        assert!(matches!(
            session.begin_answer(key(1, 1, 1), 1, "again"),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn aborted_judging_leaves_the_session_untouched() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1]);
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);
        let version = session.version();

        let pending = session.begin_answer(key(1, 1, 1), 1, "x").unwrap();
        session.abort_answer(&pending.ticket);

        assert!(!session.is_judging());
        assert_eq!(session.version(), version);
        assert_eq!(session.phase(), GamePhase::WaitAnswer);
        assert!(session.begin_answer(key(1, 1, 1), 1, "retry").is_ok());
    }

    #[test]
    fn correct_answer_scores_and_reveals() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let _ = session.request_answer(2).unwrap();
        let _ = close_window(&mut session);

        let pending = session.begin_answer(key(1, 1, 1), 2, "answer").unwrap();
        let fx = session
            .finish_answer(&pending.ticket, "answer".into(), verdict(true))
            .unwrap();

        assert_eq!(session.phase(), GamePhase::ShowAnswer);
        assert_eq!(session.player(2).unwrap().score, 100);
        assert_eq!(session.current_player(), Some(2));
        assert!(session.answered().contains(&key(1, 1, 1)));
        let kinds: Vec<_> = fx.events.iter().map(ShowEvent::kind).collect();
        assert_eq!(
            kinds,
            vec!["stoptimer", "validated", "playertalk", "hosttalk", "showanswer"]
        );
        assert!(fx.timers.contains(&TimerCommand::Arm(TimerName::ShowAnswerAdvance)));
        assert!(fx.timers.contains(&TimerCommand::Cancel(TimerName::BuzzWindow)));
    }

    #[test]
    fn wrong_answer_hands_the_turn_to_a_remaining_buzzer() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2, 3]);
        for id in [1, 2, 3] {
            let _ = session.request_answer(id).unwrap();
        }
        let _ = close_window(&mut session);
        let first = session.answering_player().unwrap();

        let pending = session.begin_answer(key(1, 1, 1), first, "nope").unwrap();
        let fx = session
            .finish_answer(&pending.ticket, "nope".into(), verdict(false))
            .unwrap();

        assert_eq!(session.player(first).unwrap().score, -100);
        assert_eq!(session.phase(), GamePhase::WaitAnswer);
        let second = session.answering_player().unwrap();
        assert_ne!(second, first);
        assert_eq!(session.buzz_queue().len(), 1);
        assert_eq!(fx.events.last(), Some(&ShowEvent::WaitAnswer { player_id: second }));
        assert!(matches!(
            fx.events[1],
            ShowEvent::Validated {
                result: false,
                unfreeze: false,
                ..
            }
        ));
    }

    #[test]
    fn wrong_answer_reopens_the_floor_while_humans_remain() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let current = session.current_player();
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);

        let pending = session.begin_answer(key(1, 1, 1), 1, "nope").unwrap();
        let _ = session
            .finish_answer(&pending.ticket, "nope".into(), verdict(false))
            .unwrap();

        assert_eq!(session.phase(), GamePhase::Question);
        assert_eq!(session.current_player(), current);
        assert!(matches!(
            session.request_answer(1),
            Err(ServiceError::InvalidState(_))
        ));
        assert!(session.request_answer(2).is_ok());
    }

    #[test]
    fn last_wrong_answer_reveals_without_moving_the_turn() {
        let mut session = on_question(document(vec![vec![("A", &["100", "200"])]]), &[1]);
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);

        let pending = session.begin_answer(key(1, 1, 1), 1, "nope").unwrap();
        let fx = session
            .finish_answer(&pending.ticket, "nope".into(), verdict(false))
            .unwrap();

        assert_eq!(session.phase(), GamePhase::ShowAnswer);
        assert_eq!(session.current_player(), Some(1));
        assert!(session.answered().contains(&key(1, 1, 1)));
        assert!(matches!(fx.events.last(), Some(ShowEvent::ShowAnswer { .. })));
    }

    #[test]
    fn reset_during_judging_invalidates_the_ticket() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1]);
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);
        let pending = session.begin_answer(key(1, 1, 1), 1, "x").unwrap();

        let fx = session.reset();
        assert_eq!(fx.events, vec![ShowEvent::Reset]);
        assert_eq!(fx.timers, vec![TimerCommand::CancelAll]);

        assert!(matches!(
            session.finish_answer(&pending.ticket, "x".into(), verdict(true)),
            Err(ServiceError::InvalidState(_))
        ));
        assert_eq!(session.phase(), GamePhase::Joining);
        assert_eq!(session.players().count(), 0);
        assert!(session.document().is_none());
    }

    #[test]
    fn timer_done_from_every_human_reveals() {
        let mut session = on_question(document(vec![vec![("A", &["100", "200"])]]), &[1, 2]);

        assert!(session.timer_done(1).unwrap().is_empty());
        let fx = session.timer_done(2).unwrap();

        assert_eq!(session.phase(), GamePhase::ShowAnswer);
        assert!(matches!(fx.events[..], [ShowEvent::ShowAnswer { .. }]));
    }

    #[test]
    fn timer_done_while_judging_only_records_the_attempt() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let _ = session.request_answer(1).unwrap();
        let _ = close_window(&mut session);
        let pending = session.begin_answer(key(1, 1, 1), 1, "x").unwrap();

        assert!(session.timer_done(2).unwrap().is_empty());
        assert_eq!(session.phase(), GamePhase::WaitAnswer);

        let fx = session
            .finish_answer(&pending.ticket, "x".into(), verdict(false))
            .unwrap();
        assert_eq!(session.phase(), GamePhase::ShowAnswer);
        assert!(matches!(fx.events.last(), Some(ShowEvent::ShowAnswer { .. })));
    }

    #[test]
    fn answering_player_running_out_of_time_passes_the_turn() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1, 2]);
        let _ = session.request_answer(1).unwrap();
        let _ = session.request_answer(2).unwrap();
        let _ = close_window(&mut session);
        let first = session.answering_player().unwrap();

        let fx = session.timer_done(first).unwrap();

        let second = session.answering_player().unwrap();
        assert_ne!(first, second);
        assert_eq!(session.player(first).unwrap().score, 0);
        assert_eq!(fx.events, vec![ShowEvent::WaitAnswer { player_id: second }]);
    }

    #[test]
    fn timer_done_outside_a_question_is_accepted() {
        let mut session = started(document(vec![vec![("A", &["100"])]]), &[1]);
        assert!(session.timer_done(1).unwrap().is_empty());
        assert!(matches!(
            session.timer_done(9),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn advancing_skips_empty_rounds_and_ends_the_game() {
        let mut session = on_question(
            document(vec![
                vec![("A", &["100"])],
                vec![("Empty", &[])],
                vec![("C", &["300"])],
            ]),
            &[1],
        );
        let _ = session.timer_done(1).unwrap();
        let fx = session.timer_elapsed(TimerName::ShowAnswerAdvance).unwrap();

        assert_eq!(session.phase(), GamePhase::SelectQuestion);
        assert_eq!(session.round_num(), 3);
        assert_eq!(
            fx.events,
            vec![ShowEvent::QuestionsTable {
                table: "C|300|||||||||".into()
            }]
        );

        let _ = session.select_question(key(3, 1, 1), 1).unwrap();
        let _ = session.timer_done(1).unwrap();
        let fx = session.timer_elapsed(TimerName::ShowAnswerAdvance).unwrap();

        assert_eq!(session.phase(), GamePhase::Unknown);
        assert_eq!(
            fx.events,
            vec![ShowEvent::GameOver {
                scores: session.scoreboard()
            }]
        );
    }

    #[test]
    fn stale_timers_do_nothing() {
        let mut session = started(document(vec![vec![("A", &["100"])]]), &[1]);
        let version = session.version();
        for name in [
            TimerName::StartAckForced,
            TimerName::QuestionShownForced,
            TimerName::BuzzWindow,
            TimerName::ShowAnswerAdvance,
        ] {
            assert!(session.timer_elapsed(name).unwrap().is_empty());
        }
        assert_eq!(session.version(), version);
    }

    #[test]
    fn join_rules() {
        let mut session = session(document(vec![vec![("A", &["100"])]]), &[1]);
        session.join(1, "Renamed".into(), None).unwrap();
        assert_eq!(session.player(1).unwrap().name, "Renamed");

        assert!(matches!(
            session.join(HOST_PLAYER_ID, "Nope".into(), None),
            Err(ServiceError::InvalidInput(_))
        ));

        let first = session.join_npc(persona("Bot"), None).unwrap();
        let second = session.join_npc(persona("Bot"), None).unwrap();
        assert_eq!((first, second), (NPC_ID_BASE, NPC_ID_BASE + 1));
        assert!(matches!(
            session.join(first, "Human".into(), None),
            Err(ServiceError::InvalidState(_))
        ));

        session.join_host(persona("Max"), None).unwrap();
        session.join_host(persona("Ann"), None).unwrap();
        let hosts: Vec<_> = session.players().filter(|p| p.is_host()).collect();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "Ann");

        let _ = session.start().unwrap();
        assert!(matches!(
            session.join(2, "Late".into(), None),
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[test]
    fn player_who_ran_out_of_time_is_not_drawn_from_the_queue() {
        for seed in 0..32 {
            let mut session =
                GameSession::with_rng(SessionSettings::default(), StdRng::seed_from_u64(seed));
            let _ = session.load_package(document(vec![vec![("A", &["100"])]]));
            for id in [1, 2, 3] {
                session.join(id, format!("player {id}"), None).unwrap();
            }
            let _ = session.start().unwrap();
            for id in [1, 2, 3] {
                let _ = session.start_acknowledge(id).unwrap();
            }
            let current = session.current_player().unwrap();
            let _ = session.select_question(key(1, 1, 1), current).unwrap();

            let _ = session.request_answer(1).unwrap();
            let _ = session.request_answer(2).unwrap();
            let _ = session.timer_done(2).unwrap();
            assert_eq!(session.buzz_queue(), &[1]);

            let fx = close_window(&mut session);
            assert_eq!(session.answering_player(), Some(1), "seed {seed}");
            assert!(fx.events.contains(&ShowEvent::WaitAnswer { player_id: 1 }));
        }
    }

    #[test]
    fn upload_wipes_players_and_progress() {
        let mut session = on_question(document(vec![vec![("A", &["100"])]]), &[1]);
        let fx = session.load_package(document(vec![vec![("B", &["500"])]]));

        assert_eq!(fx.timers, vec![TimerCommand::CancelAll]);
        assert!(fx.events.is_empty());
        assert_eq!(session.phase(), GamePhase::Joining);
        assert_eq!(session.players().count(), 0);
        assert!(session.answered().is_empty());
        assert_eq!(session.current_player(), None);
        assert!(session.document().is_some());
    }
}

//! The owned session context every handler routes its events through.

use tracing::{debug, info};

use crate::{
    error::ServiceError,
    state::{
        board::{Board, BoardCatalog},
        policy::{Action, Identity, authorize},
        registry::{Player, PlayerRegistry, PlayerUpdate},
        round::{ActiveQuestion, Round},
        scoring::{Responder, ScoringPolicy, points_value, score_delta},
        state_machine::RoundPhase,
    },
};

/// How an answer is adjudicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// An admin states the outcome.
    Declared(bool),
    /// The raw response, compared against the expected answer.
    Response(String),
}

/// Result of scoring one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreChange {
    /// Player whose score changed.
    pub username: String,
    /// Relation of the player to the buzz race.
    pub responder: Responder,
    /// Outcome used for scoring.
    pub correct: bool,
    /// Signed delta applied.
    pub delta: i64,
    /// Score after the delta.
    pub score: i64,
}

/// Read-only view of the round used for resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Current phase.
    pub phase: RoundPhase,
    /// Selected question, if any.
    pub question: Option<ActiveQuestion>,
    /// Seconds left on the countdown.
    pub remaining_seconds: u32,
    /// Player who won the buzz race, while awaiting their answer.
    pub buzz_winner: Option<String>,
    /// Whether buzz signals are currently ignored.
    pub buzz_locked: bool,
    /// Transition counter of the round.
    pub version: usize,
}

/// Authoritative game state: boards, players, and the single round.
#[derive(Debug)]
pub struct GameSession {
    catalog: BoardCatalog,
    registry: PlayerRegistry,
    round: Round,
    scoring: ScoringPolicy,
    default_timer_seconds: u32,
}

impl GameSession {
    /// Build a session around seeded boards and players.
    pub fn new(
        catalog: BoardCatalog,
        registry: PlayerRegistry,
        scoring: ScoringPolicy,
        default_timer_seconds: u32,
    ) -> Self {
        Self {
            catalog,
            registry,
            round: Round::default(),
            scoring,
            default_timer_seconds: default_timer_seconds.max(1),
        }
    }

    /// Boards known to the session.
    pub fn catalog(&self) -> &BoardCatalog {
        &self.catalog
    }

    /// Registered players.
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Current round.
    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Mutable access for the countdown driver.
    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    /// Scoring rules in force.
    pub fn scoring(&self) -> &ScoringPolicy {
        &self.scoring
    }

    /// Snapshot of the round for clients that (re)connect mid-question.
    pub fn round_snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            phase: self.round.phase().clone(),
            question: self.round.active_question().cloned(),
            remaining_seconds: self.round.remaining_seconds(),
            buzz_winner: self.round.buzz_winner().map(str::to_string),
            buzz_locked: self.round.buzz_locked(),
            version: self.round.version(),
        }
    }

    /// Select the question at the given coordinates of the active board.
    pub fn select_question(
        &mut self,
        actor: &Identity,
        category_index: usize,
        question_index: usize,
    ) -> Result<&ActiveQuestion, ServiceError> {
        authorize(actor, Action::SelectQuestion)?;

        let board = self
            .catalog
            .active_board()
            .ok_or_else(|| ServiceError::InvalidSelection("no active board".into()))?;
        let (category, question) = board
            .question(category_index, question_index)
            .ok_or_else(|| {
                ServiceError::InvalidSelection(format!(
                    "no question at category {category_index}, question {question_index}"
                ))
            })?;

        let timer_seconds = question
            .timer
            .filter(|seconds| *seconds > 0)
            .unwrap_or(self.default_timer_seconds);
        let snapshot = ActiveQuestion {
            category: category.name.clone(),
            question: question.question.clone(),
            answer: question.answer.clone(),
            value: question.value,
            multiplier: board.multiplier,
            timer_seconds,
            category_index,
            question_index,
        };

        info!(
            admin = %actor.username,
            category_index,
            question_index,
            timer_seconds,
            "question selected"
        );
        Ok(self.round.select(snapshot))
    }

    /// Open buzzing and reserve a countdown generation. Returns the generation
    /// and the seconds the countdown starts from.
    pub fn start_timer(&mut self, actor: &Identity) -> Result<(u64, u32), ServiceError> {
        authorize(actor, Action::StartTimer)?;
        let generation = self.round.start_timer()?;
        Ok((generation, self.round.remaining_seconds()))
    }

    /// Open buzzing without the countdown.
    pub fn unlock_buzzers(&mut self, actor: &Identity) -> Result<(), ServiceError> {
        authorize(actor, Action::UnlockBuzzers)?;
        self.round.unlock_buzzers()?;
        Ok(())
    }

    /// Dismiss the current question.
    pub fn close_question(&mut self, actor: &Identity) -> Result<(), ServiceError> {
        authorize(actor, Action::CloseQuestion)?;
        self.round.close()?;
        Ok(())
    }

    /// Register a buzz. Returns the winner only for the signal that won.
    pub fn buzz(&mut self, actor: &Identity) -> Option<String> {
        authorize(actor, Action::Buzz).ok()?;
        let winner = self.round.buzz(&actor.username)?.to_string();
        info!(username = %winner, "buzz winner locked in");
        Some(winner)
    }

    /// Adjudicate `responder`'s answer and apply the score delta.
    pub fn submit_answer(
        &mut self,
        actor: &Identity,
        responder: &str,
        verdict: Verdict,
    ) -> Result<ScoreChange, ServiceError> {
        authorize(actor, Action::Answer { responder })?;
        if matches!(verdict, Verdict::Declared(_)) {
            authorize(actor, Action::DeclareVerdict)?;
        }
        if !self.registry.contains(responder) {
            return Err(ServiceError::NotFound(format!("user `{responder}`")));
        }

        let expected = self
            .round
            .active_question()
            .map(|question| question.answer.as_str())
            .ok_or_else(|| ServiceError::InvalidSelection("no active question".into()))?;
        let correct = match verdict {
            Verdict::Declared(correct) => correct,
            Verdict::Response(response) => responses_match(expected, &response),
        };

        let allow_non_winners = self.scoring.allow_non_winner_answers;
        let accepted = self.round.assess_answer(responder, allow_non_winners)?;
        let points = points_value(accepted.value, accepted.multiplier);
        let delta = score_delta(&self.scoring, points, accepted.responder, correct);
        self.registry.score_after(responder, delta)?;

        self.round.answer(responder, allow_non_winners)?;
        let score = self.registry.apply_delta(responder, delta)?;

        info!(
            username = %responder,
            responder = ?accepted.responder,
            correct,
            delta,
            score,
            "answer scored"
        );
        Ok(ScoreChange {
            username: responder.to_string(),
            responder: accepted.responder,
            correct,
            delta,
            score,
        })
    }

    /// Register a new user.
    pub fn add_player(&mut self, actor: &Identity, player: Player) -> Result<&Player, ServiceError> {
        authorize(actor, Action::ManageUsers)?;
        Ok(self.registry.add(player)?)
    }

    /// Change the credential or role of an existing user.
    pub fn update_player(
        &mut self,
        actor: &Identity,
        username: &str,
        update: PlayerUpdate,
    ) -> Result<&Player, ServiceError> {
        authorize(actor, Action::ManageUsers)?;
        Ok(self.registry.update(username, update)?)
    }

    /// Delete a user. Only allowed between questions.
    pub fn remove_player(&mut self, actor: &Identity, username: &str) -> Result<Player, ServiceError> {
        authorize(actor, Action::ManageUsers)?;
        if *self.round.phase() != RoundPhase::Idle {
            return Err(ServiceError::InvalidState(
                "users cannot be deleted while a question is open".into(),
            ));
        }
        Ok(self.registry.remove(username)?)
    }

    /// Create or replace a named board.
    pub fn save_board(&mut self, actor: &Identity, name: &str, board: Board) -> Result<(), ServiceError> {
        authorize(actor, Action::EditBoards)?;
        debug!(board = %name, questions = board.question_count(), "board saved");
        self.catalog.upsert(name.to_string(), board);
        Ok(())
    }

    /// Delete a named board. The live board cannot be deleted.
    pub fn delete_board(&mut self, actor: &Identity, name: &str) -> Result<Board, ServiceError> {
        authorize(actor, Action::EditBoards)?;
        if self.catalog.active_name() == Some(name) {
            return Err(ServiceError::InvalidState(format!(
                "board `{name}` is active; activate another board first"
            )));
        }
        self.catalog
            .remove(name)
            .ok_or_else(|| ServiceError::NotFound(format!("board `{name}`")))
    }

    /// Make a board live, resetting the round.
    pub fn activate_board(&mut self, actor: &Identity, name: &str) -> Result<&Board, ServiceError> {
        authorize(actor, Action::ActivateBoard)?;
        if !self.catalog.activate(name) {
            return Err(ServiceError::NotFound(format!("board `{name}`")));
        }
        self.round.reset();
        info!(board = %name, "board activated; round reset");
        self.catalog
            .active_board()
            .ok_or_else(|| ServiceError::NotFound(format!("board `{name}`")))
    }
}

/// Trimmed, case-insensitive comparison of a response with the expected answer.
fn responses_match(expected: &str, response: &str) -> bool {
    let expected = expected.trim();
    !expected.is_empty() && expected.to_lowercase() == response.trim().to_lowercase()
}

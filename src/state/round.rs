//! The single mutable round of a session: active question snapshot, countdown,
//! and the buzz race.

use std::collections::HashSet;

use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::state::{
    scoring::Responder,
    state_machine::{InvalidTransition, RoundEvent, RoundPhase, RoundStateMachine},
};

/// Value copy of the selected question, detached from the board it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuestion {
    /// Category heading.
    pub category: String,
    /// Prompt text.
    pub question: String,
    /// Expected answer text.
    pub answer: String,
    /// Base point value.
    pub value: i64,
    /// Board multiplier at selection time.
    pub multiplier: i64,
    /// Countdown length in seconds.
    pub timer_seconds: u32,
    /// Category index on the board it was selected from.
    pub category_index: usize,
    /// Question index within the category.
    pub question_index: usize,
}

/// Failures raised by round operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// No question is currently selected.
    #[error("no active question")]
    NoActiveQuestion,
    /// The requested transition is not valid from the current phase.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// The player has no standing to answer in the current phase.
    #[error("`{username}` cannot be scored for the current question")]
    NotAnswerable {
        /// Player who attempted to answer.
        username: String,
    },
    /// The player was already scored for the current question.
    #[error("`{username}` already answered the current question")]
    AlreadyAnswered {
        /// Player who attempted to answer again.
        username: String,
    },
}

/// Handle to a running countdown task. Dropping it cancels the task, so
/// replacing the round's slot can never leave two tick streams alive.
#[derive(Debug)]
pub struct CountdownHandle {
    generation: u64,
    task: Option<AbortHandle>,
}

impl CountdownHandle {
    /// Wrap the abort handle of a spawned countdown task.
    pub fn new(generation: u64, task: AbortHandle) -> Self {
        Self {
            generation,
            task: Some(task),
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(generation: u64) -> Self {
        Self {
            generation,
            task: None,
        }
    }

    /// Generation this countdown was started for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forget the task without aborting it; used by the task itself when it
    /// finishes on expiry.
    fn release(mut self) {
        self.task.take();
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a cancelled or superseded countdown.
    Stale,
    /// Seconds left after the decrement.
    Remaining(u32),
    /// The countdown reached zero and buzzing is now locked.
    Expired,
}

/// Outcome of an accepted answer, before the score is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedAnswer {
    /// How the responder relates to the buzz race.
    pub responder: Responder,
    /// Base value of the active question.
    pub value: i64,
    /// Board multiplier captured with the question.
    pub multiplier: i64,
}

/// Mutable round state, owned exclusively by the session.
#[derive(Debug, Default)]
pub struct Round {
    machine: RoundStateMachine,
    active_question: Option<ActiveQuestion>,
    remaining_seconds: u32,
    buzz_locked: bool,
    responders: HashSet<String>,
    countdown: Option<CountdownHandle>,
    generation: u64,
}

impl Round {
    /// Current phase.
    pub fn phase(&self) -> &RoundPhase {
        self.machine.phase()
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.machine.snapshot().version
    }

    /// Snapshot of the selected question, if any.
    pub fn active_question(&self) -> Option<&ActiveQuestion> {
        self.active_question.as_ref()
    }

    /// Seconds left on the countdown (held while frozen).
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Whether further buzz signals are ignored.
    pub fn buzz_locked(&self) -> bool {
        self.buzz_locked
    }

    /// Player who won the buzz race, present only while awaiting their answer.
    pub fn buzz_winner(&self) -> Option<&str> {
        match self.machine.phase() {
            RoundPhase::AwaitingAnswer { winner } => Some(winner.as_str()),
            _ => None,
        }
    }

    /// Whether a countdown task is currently bound to the round.
    pub fn countdown_running(&self) -> bool {
        self.countdown.is_some()
    }

    /// Install a new question, resetting the buzz race and the countdown
    /// regardless of how the previous question ended.
    pub fn select(&mut self, question: ActiveQuestion) -> &ActiveQuestion {
        self.cancel_countdown();
        self.remaining_seconds = question.timer_seconds;
        self.buzz_locked = false;
        self.responders.clear();
        if let Err(err) = self.machine.apply(RoundEvent::QuestionSelected) {
            warn!(error = %err, "question selection rejected by round machine");
        }
        self.active_question.insert(question)
    }

    /// Open buzzing and reserve a new countdown generation. The caller spawns
    /// the ticking task and hands its handle to [`Round::install_countdown`].
    pub fn start_timer(&mut self) -> Result<u64, RoundError> {
        self.ensure_question()?;
        self.machine.apply(RoundEvent::TimerStarted)?;
        self.cancel_countdown();
        self.buzz_locked = false;
        self.generation += 1;
        Ok(self.generation)
    }

    /// Bind a spawned countdown to the round. A handle for a superseded
    /// generation is dropped, which cancels its task.
    pub fn install_countdown(&mut self, handle: CountdownHandle) {
        if handle.generation() == self.generation && *self.phase() == RoundPhase::BuzzOpen {
            self.countdown = Some(handle);
        }
    }

    /// Open buzzing without touching the countdown.
    pub fn unlock_buzzers(&mut self) -> Result<(), RoundError> {
        self.ensure_question()?;
        self.machine.apply(RoundEvent::BuzzersUnlocked)?;
        self.buzz_locked = false;
        Ok(())
    }

    /// Arbitrate a buzz signal. The first signal observed while buzzing is
    /// open wins; every other signal is dropped without error, as are signals
    /// from players already scored for this question.
    pub fn buzz(&mut self, username: &str) -> Option<&str> {
        if self.buzz_locked || *self.phase() != RoundPhase::BuzzOpen {
            debug!(%username, phase = ?self.phase(), "buzz dropped");
            return None;
        }
        if self.responders.contains(username) {
            debug!(%username, "buzz dropped; already answered this question");
            return None;
        }

        self.machine
            .apply(RoundEvent::Buzzed {
                username: username.to_string(),
            })
            .ok()?;
        self.buzz_locked = true;
        self.cancel_countdown();
        self.buzz_winner()
    }

    /// Advance the countdown by one second if `generation` is still current.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        let current = self
            .countdown
            .as_ref()
            .is_some_and(|handle| handle.generation() == generation);
        if !current || *self.phase() != RoundPhase::BuzzOpen {
            return TickOutcome::Stale;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Remaining(self.remaining_seconds);
        }

        if let Some(handle) = self.countdown.take() {
            handle.release();
        }
        self.buzz_locked = true;
        match self.machine.apply(RoundEvent::TimerExpired) {
            Ok(_) => TickOutcome::Expired,
            Err(_) => TickOutcome::Stale,
        }
    }

    /// Check whether `username` may be scored now, without changing anything.
    /// The buzz winner always may; other players only when
    /// `allow_non_winners` is set and the question has not expired.
    pub fn assess_answer(
        &self,
        username: &str,
        allow_non_winners: bool,
    ) -> Result<AcceptedAnswer, RoundError> {
        let question = self
            .active_question
            .as_ref()
            .ok_or(RoundError::NoActiveQuestion)?;
        let (value, multiplier) = (question.value, question.multiplier);

        if self.responders.contains(username) {
            return Err(RoundError::AlreadyAnswered {
                username: username.to_string(),
            });
        }

        let responder = match self.machine.phase() {
            RoundPhase::AwaitingAnswer { winner } if winner == username => Responder::BuzzWinner,
            RoundPhase::QuestionShown | RoundPhase::BuzzOpen | RoundPhase::AwaitingAnswer { .. }
                if allow_non_winners =>
            {
                Responder::NonWinner
            }
            _ => {
                return Err(RoundError::NotAnswerable {
                    username: username.to_string(),
                });
            }
        };

        Ok(AcceptedAnswer {
            responder,
            value,
            multiplier,
        })
    }

    /// Accept an answer for scoring. The buzz winner's answer hands the round
    /// back to the admin.
    pub fn answer(
        &mut self,
        username: &str,
        allow_non_winners: bool,
    ) -> Result<AcceptedAnswer, RoundError> {
        let accepted = self.assess_answer(username, allow_non_winners)?;
        if accepted.responder == Responder::BuzzWinner {
            self.machine.apply(RoundEvent::WinnerAnswered)?;
        }
        self.responders.insert(username.to_string());
        Ok(accepted)
    }

    /// Dismiss the active question and return to idle.
    pub fn close(&mut self) -> Result<(), RoundError> {
        self.ensure_question()?;
        self.machine.apply(RoundEvent::QuestionClosed)?;
        self.clear();
        Ok(())
    }

    /// Drop everything tied to the previous board.
    pub fn reset(&mut self) {
        if let Err(err) = self.machine.apply(RoundEvent::BoardReset) {
            warn!(error = %err, "board reset rejected by round machine");
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.cancel_countdown();
        self.active_question = None;
        self.remaining_seconds = 0;
        self.buzz_locked = false;
        self.responders.clear();
    }

    fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            debug!(generation = handle.generation(), "countdown cancelled");
        }
    }

    fn ensure_question(&self) -> Result<(), RoundError> {
        if self.active_question.is_some() {
            Ok(())
        } else {
            Err(RoundError::NoActiveQuestion)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(value: i64, timer_seconds: u32) -> ActiveQuestion {
        ActiveQuestion {
            category: "Rivers".into(),
            question: "Longest river in Africa?".into(),
            answer: "Nile".into(),
            value,
            multiplier: 1,
            timer_seconds,
            category_index: 0,
            question_index: 0,
        }
    }

    fn open_round(timer_seconds: u32) -> Round {
        let mut round = Round::default();
        round.select(question(200, timer_seconds));
        let generation = round.start_timer().unwrap();
        round.install_countdown(CountdownHandle::detached(generation));
        round
    }

    #[test]
    fn first_buzz_wins_and_later_ones_are_dropped() {
        let mut round = open_round(30);

        assert_eq!(round.buzz("ada"), Some("ada"));
        assert!(round.buzz_locked());
        assert!(!round.countdown_running());
        let version = round.version();

        assert_eq!(round.buzz("bob"), None);
        assert_eq!(round.buzz("ada"), None);
        assert_eq!(round.buzz_winner(), Some("ada"));
        assert_eq!(round.version(), version);
    }

    #[test]
    fn buzz_before_opening_is_a_no_op() {
        let mut round = Round::default();
        assert_eq!(round.buzz("ada"), None);

        round.select(question(200, 30));
        assert_eq!(round.buzz("ada"), None);
        assert_eq!(round.buzz_winner(), None);
        assert_eq!(*round.phase(), RoundPhase::QuestionShown);
    }

    #[test]
    fn countdown_expires_and_locks_buzzing() {
        let mut round = open_round(3);
        let generation = round.generation;

        assert_eq!(round.tick(generation), TickOutcome::Remaining(2));
        assert_eq!(round.tick(generation), TickOutcome::Remaining(1));
        assert_eq!(round.tick(generation), TickOutcome::Expired);
        assert_eq!(*round.phase(), RoundPhase::Expired);
        assert!(round.buzz_locked());
        assert_eq!(round.tick(generation), TickOutcome::Stale);
        assert_eq!(round.buzz("ada"), None);
    }

    #[test]
    fn buzz_freezes_remaining_seconds() {
        let mut round = open_round(10);
        let generation = round.generation;
        round.tick(generation);
        round.tick(generation);
        round.buzz("ada");

        assert_eq!(round.tick(generation), TickOutcome::Stale);
        assert_eq!(round.remaining_seconds(), 8);
    }

    #[test]
    fn restarting_timer_supersedes_previous_generation() {
        let mut round = open_round(30);
        let first = round.generation;
        let second = round.start_timer().unwrap();
        round.install_countdown(CountdownHandle::detached(second));

        assert_ne!(first, second);
        assert_eq!(round.tick(first), TickOutcome::Stale);
        assert_eq!(round.tick(second), TickOutcome::Remaining(29));
    }

    #[test]
    fn stale_handle_is_not_installed() {
        let mut round = open_round(30);
        let old = round.generation;
        round.start_timer().unwrap();
        round.install_countdown(CountdownHandle::detached(old));
        assert!(!round.countdown_running());
    }

    #[test]
    fn selecting_resets_any_previous_round() {
        let mut round = open_round(5);
        round.buzz("ada");
        round.answer("ada", true).unwrap();

        round.select(question(400, 20));
        assert_eq!(round.buzz_winner(), None);
        assert!(!round.buzz_locked());
        assert_eq!(round.remaining_seconds(), 20);
        assert!(!round.countdown_running());
        assert_eq!(*round.phase(), RoundPhase::QuestionShown);
    }

    #[test]
    fn winner_answer_returns_control_to_admin() {
        let mut round = open_round(30);
        round.buzz("ada");

        let accepted = round.answer("ada", false).unwrap();
        assert_eq!(accepted.responder, Responder::BuzzWinner);
        assert_eq!(accepted.value, 200);
        assert_eq!(*round.phase(), RoundPhase::QuestionShown);
        assert!(round.active_question().is_some());
        assert!(round.buzz_locked());

        assert_eq!(
            round.answer("ada", true),
            Err(RoundError::AlreadyAnswered {
                username: "ada".into()
            })
        );
    }

    #[test]
    fn rebound_goes_to_a_player_not_yet_scored() {
        let mut round = open_round(30);
        round.buzz("ada");
        round.answer("ada", false).unwrap();

        round.unlock_buzzers().unwrap();
        assert_eq!(round.buzz("ada"), None);
        assert_eq!(*round.phase(), RoundPhase::BuzzOpen);
        assert!(!round.buzz_locked());

        assert_eq!(round.buzz("bob"), Some("bob"));
        let accepted = round.answer("bob", false).unwrap();
        assert_eq!(accepted.responder, Responder::BuzzWinner);
        assert_eq!(*round.phase(), RoundPhase::QuestionShown);
    }

    #[test]
    fn assessing_an_answer_changes_nothing() {
        let mut round = open_round(30);
        round.buzz("ada");

        let accepted = round.assess_answer("ada", false).unwrap();
        assert_eq!(accepted.responder, Responder::BuzzWinner);
        assert_eq!(round.buzz_winner(), Some("ada"));
        assert!(round.answer("ada", false).is_ok());
    }

    #[test]
    fn non_winner_answers_follow_policy() {
        let mut round = open_round(30);
        round.buzz("ada");

        assert!(matches!(
            round.answer("bob", false),
            Err(RoundError::NotAnswerable { .. })
        ));
        let accepted = round.answer("bob", true).unwrap();
        assert_eq!(accepted.responder, Responder::NonWinner);
        assert_eq!(round.buzz_winner(), Some("ada"));
    }

    #[test]
    fn answers_after_expiry_are_rejected() {
        let mut round = open_round(1);
        assert_eq!(round.tick(round.generation), TickOutcome::Expired);
        assert!(matches!(
            round.answer("ada", true),
            Err(RoundError::NotAnswerable { .. })
        ));
    }

    #[test]
    fn answers_without_question_are_rejected() {
        let mut round = Round::default();
        assert_eq!(round.answer("ada", true), Err(RoundError::NoActiveQuestion));
        assert_eq!(round.start_timer(), Err(RoundError::NoActiveQuestion));
        assert_eq!(round.close(), Err(RoundError::NoActiveQuestion));
    }

    #[test]
    fn closing_clears_the_round() {
        let mut round = open_round(30);
        round.close().unwrap();
        assert_eq!(*round.phase(), RoundPhase::Idle);
        assert!(round.active_question().is_none());
        assert!(!round.countdown_running());
    }
}

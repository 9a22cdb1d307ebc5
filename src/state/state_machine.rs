use thiserror::Error;

/// Phases of the question round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundPhase {
    /// No question is shown.
    Idle,
    /// A question is broadcast; buzzing is not enabled.
    QuestionShown,
    /// Buzzing is enabled; the countdown may be running.
    BuzzOpen,
    /// The countdown reached zero without a buzz; buzzing is locked until the
    /// admin moves on.
    Expired,
    /// A buzz winner is locked in and the countdown is frozen.
    AwaitingAnswer {
        /// Player who won the buzz race.
        winner: String,
    },
}

/// Events that can be applied to the round state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// Admin picked a question.
    QuestionSelected,
    /// Admin started (or restarted) the countdown.
    TimerStarted,
    /// Admin enabled buzzing without the countdown.
    BuzzersUnlocked,
    /// The first accepted buzz of the question.
    Buzzed {
        /// Player whose signal was received first.
        username: String,
    },
    /// The countdown reached zero.
    TimerExpired,
    /// The buzz winner's answer has been scored.
    WinnerAnswered,
    /// Admin dismissed the question.
    QuestionClosed,
    /// The active board was replaced.
    BoardReset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: RoundPhase,
    /// The event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: RoundPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine enforcing which round actions are legal in which phase.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    version: usize,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self {
            phase: RoundPhase::Idle,
            version: 0,
        }
    }
}

impl RoundStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase.clone(),
            version: self.version,
        }
    }

    /// Check whether `event` would be accepted without applying it.
    pub fn can_apply(&self, event: &RoundEvent) -> Result<(), InvalidTransition> {
        self.compute_transition(event.clone()).map(|_| ())
    }

    /// Validate and apply `event`, returning the new phase.
    pub fn apply(&mut self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(self.phase.clone())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = match (&self.phase, event) {
            (_, RoundEvent::QuestionSelected) => RoundPhase::QuestionShown,
            (_, RoundEvent::BoardReset) => RoundPhase::Idle,
            (
                RoundPhase::QuestionShown | RoundPhase::BuzzOpen,
                RoundEvent::TimerStarted | RoundEvent::BuzzersUnlocked,
            ) => RoundPhase::BuzzOpen,
            (RoundPhase::BuzzOpen, RoundEvent::Buzzed { username }) => {
                RoundPhase::AwaitingAnswer { winner: username }
            }
            (RoundPhase::BuzzOpen, RoundEvent::TimerExpired) => RoundPhase::Expired,
            (RoundPhase::AwaitingAnswer { .. }, RoundEvent::WinnerAnswered) => {
                RoundPhase::QuestionShown
            }
            (
                RoundPhase::QuestionShown
                | RoundPhase::BuzzOpen
                | RoundPhase::Expired
                | RoundPhase::AwaitingAnswer { .. },
                RoundEvent::QuestionClosed,
            ) => RoundPhase::Idle,
            (from, event) => {
                return Err(InvalidTransition {
                    from: from.clone(),
                    event,
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut RoundStateMachine, event: RoundEvent) -> RoundPhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = RoundStateMachine::new();
        assert_eq!(sm.phase(), &RoundPhase::Idle);
        assert_eq!(sm.snapshot().version, 0);
    }

    #[test]
    fn full_question_cycle() {
        let mut sm = RoundStateMachine::new();

        assert_eq!(
            apply(&mut sm, RoundEvent::QuestionSelected),
            RoundPhase::QuestionShown
        );
        assert_eq!(apply(&mut sm, RoundEvent::TimerStarted), RoundPhase::BuzzOpen);
        assert_eq!(
            apply(
                &mut sm,
                RoundEvent::Buzzed {
                    username: "ada".into()
                }
            ),
            RoundPhase::AwaitingAnswer {
                winner: "ada".into()
            }
        );
        assert_eq!(
            apply(&mut sm, RoundEvent::WinnerAnswered),
            RoundPhase::QuestionShown
        );
        assert_eq!(apply(&mut sm, RoundEvent::QuestionClosed), RoundPhase::Idle);
        assert_eq!(sm.snapshot().version, 5);
    }

    #[test]
    fn restarting_timer_keeps_buzz_open() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::QuestionSelected);
        apply(&mut sm, RoundEvent::BuzzersUnlocked);
        assert_eq!(apply(&mut sm, RoundEvent::TimerStarted), RoundPhase::BuzzOpen);
    }

    #[test]
    fn expiry_requires_a_new_question() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::QuestionSelected);
        apply(&mut sm, RoundEvent::TimerStarted);
        assert_eq!(apply(&mut sm, RoundEvent::TimerExpired), RoundPhase::Expired);

        for event in [
            RoundEvent::TimerStarted,
            RoundEvent::BuzzersUnlocked,
            RoundEvent::Buzzed {
                username: "ada".into(),
            },
        ] {
            let err = sm.apply(event.clone()).unwrap_err();
            assert_eq!(err.from, RoundPhase::Expired);
            assert_eq!(err.event, event);
        }

        assert_eq!(
            apply(&mut sm, RoundEvent::QuestionSelected),
            RoundPhase::QuestionShown
        );
    }

    #[test]
    fn buzz_is_rejected_before_buzzing_opens() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::QuestionSelected);
        let err = sm
            .apply(RoundEvent::Buzzed {
                username: "ada".into(),
            })
            .unwrap_err();
        assert_eq!(err.from, RoundPhase::QuestionShown);
    }

    #[test]
    fn timer_cannot_start_while_awaiting_answer() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::QuestionSelected);
        apply(&mut sm, RoundEvent::BuzzersUnlocked);
        apply(
            &mut sm,
            RoundEvent::Buzzed {
                username: "ada".into(),
            },
        );
        assert!(sm.can_apply(&RoundEvent::TimerStarted).is_err());
        assert_eq!(sm.snapshot().version, 3);
    }

    #[test]
    fn closing_requires_an_active_question() {
        let mut sm = RoundStateMachine::new();
        let err = sm.apply(RoundEvent::QuestionClosed).unwrap_err();
        assert_eq!(err.from, RoundPhase::Idle);
        assert_eq!(apply(&mut sm, RoundEvent::BoardReset), RoundPhase::Idle);
    }
}

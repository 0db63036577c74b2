//! Round-driven encounter state machines
//!
//! Every encounter is a plain serializable state value plus a pure step
//! function. `advance` never touches its input: it returns the successor
//! state together with the consequences the host has to apply. Terminal
//! states absorb nothing further; advancing one is a caller bug.

pub mod interrogation;
pub mod jury_rig;
pub mod negotiation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::ConsequenceEvent;

/// Shape shared by all encounter states.
pub trait EncounterState: Clone {
    type Terminal: Copy + fmt::Debug;

    /// Terminal outcome, once one is reached.
    fn terminal(&self) -> Option<Self::Terminal>;

    /// Rounds processed so far.
    fn round(&self) -> u32;

    fn is_terminal(&self) -> bool {
        self.terminal().is_some()
    }
}

/// Transition rules for one encounter type.
pub trait EncounterMachine {
    type State: EncounterState;
    type Action;

    /// One round. Only ever called on a non-terminal state.
    fn step(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Advance<Self::State>, DomainError>;
}

/// Successor state plus the consequences of the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance<S> {
    pub state: S,
    pub events: Vec<ConsequenceEvent>,
}

impl<S: EncounterState> Advance<S> {
    pub fn new(state: S, events: Vec<ConsequenceEvent>) -> Self {
        Self { state, events }
    }

    pub fn terminal(&self) -> Option<S::Terminal> {
        self.state.terminal()
    }
}

/// Advance an encounter by one round.
pub fn advance<M: EncounterMachine>(
    machine: &M,
    state: &M::State,
    action: &M::Action,
) -> Result<Advance<M::State>, DomainError> {
    if let Some(terminal) = state.terminal() {
        return Err(DomainError::invalid_state_transition(format!(
            "encounter already ended ({terminal:?}) after round {}",
            state.round()
        )));
    }
    machine.step(state, action)
}

/// What the host must roll before submitting an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSpec {
    pub pool: u32,
    pub difficulty_class: i32,
    pub success_face: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Countdown {
        left: u32,
        round: u32,
    }

    impl EncounterState for Countdown {
        type Terminal = ();

        fn terminal(&self) -> Option<()> {
            (self.left == 0).then_some(())
        }

        fn round(&self) -> u32 {
            self.round
        }
    }

    struct Tick;

    impl EncounterMachine for Tick {
        type State = Countdown;
        type Action = ();

        fn step(&self, state: &Countdown, _: &()) -> Result<Advance<Countdown>, DomainError> {
            Ok(Advance::new(
                Countdown {
                    left: state.left - 1,
                    round: state.round + 1,
                },
                Vec::new(),
            ))
        }
    }

    #[test]
    fn test_advance_returns_new_state() {
        let start = Countdown { left: 2, round: 0 };
        let next = advance(&Tick, &start, &()).unwrap();
        assert_eq!(start, Countdown { left: 2, round: 0 });
        assert_eq!(next.state, Countdown { left: 1, round: 1 });
        assert!(next.terminal().is_none());
    }

    #[test]
    fn test_terminal_state_absorbs() {
        let start = Countdown { left: 1, round: 4 };
        let done = advance(&Tick, &start, &()).unwrap();
        assert_eq!(done.terminal(), Some(()));

        let err = advance(&Tick, &done.state, &()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }
}

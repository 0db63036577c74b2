//! Shared plumbing for the encounter use cases.

use runeforge_domain::{advance, ConsequenceEvent, EncounterMachine, EncounterState};
use serde::{Deserialize, Serialize};

use super::check::CheckReport;
use crate::infrastructure::error::EngineError;

/// One played round: the roll (if the round needed one), the successor
/// state and the consequences for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterTurn<S> {
    pub check: Option<CheckReport>,
    pub state: S,
    pub events: Vec<ConsequenceEvent>,
}

impl<S: EncounterState> EncounterTurn<S> {
    pub fn terminal(&self) -> Option<S::Terminal> {
        self.state.terminal()
    }
}

/// Advance an encounter, logging rejections and terminal outcomes.
pub(crate) fn advance_logged<M: EncounterMachine>(
    machine: &M,
    encounter: &'static str,
    state: &M::State,
    action: &M::Action,
    check: Option<CheckReport>,
) -> Result<EncounterTurn<M::State>, EngineError> {
    let advanced = advance(machine, state, action).map_err(|e| {
        tracing::warn!(encounter, round = state.round(), error = %e, "Encounter action rejected");
        EngineError::from(e)
    })?;

    if let Some(terminal) = advanced.terminal() {
        tracing::info!(
            encounter,
            round = advanced.state.round(),
            terminal = ?terminal,
            events = advanced.events.len(),
            "Encounter ended"
        );
    } else {
        tracing::debug!(
            encounter,
            round = advanced.state.round(),
            events = advanced.events.len(),
            "Encounter advanced"
        );
    }

    Ok(EncounterTurn {
        check,
        state: advanced.state,
        events: advanced.events,
    })
}

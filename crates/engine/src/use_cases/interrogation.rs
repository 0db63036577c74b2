//! Interrogation use cases.

use std::sync::Arc;

use runeforge_domain::{
    EncounterId, InterrogationAction, InterrogationMethod, InterrogationRules, InterrogationState,
};
use tracing::instrument;

use super::check::RollCheck;
use super::encounter::{advance_logged, EncounterTurn};
use crate::infrastructure::error::EngineError;

pub struct RunInterrogation {
    rules: InterrogationRules,
    check: Arc<RollCheck>,
}

impl RunInterrogation {
    pub fn new(rules: InterrogationRules, check: Arc<RollCheck>) -> Self {
        Self { rules, check }
    }

    pub fn open(&self, subject_will: u32, modifiers: i32) -> InterrogationState {
        let state = self.rules.open(EncounterId::new(), subject_will, modifiers);
        tracing::info!(
            encounter_id = %state.id,
            level = ?state.resistance_level,
            resistance = state.resistance,
            max_rounds = state.max_rounds,
            "Interrogation opened"
        );
        state
    }

    /// Question the subject once with `method`.
    #[instrument(skip(self, state), fields(encounter_id = %state.id))]
    pub fn question(
        &self,
        state: &InterrogationState,
        method: InterrogationMethod,
        base_pool: u32,
    ) -> Result<EncounterTurn<InterrogationState>, EngineError> {
        let spec = self
            .rules
            .check_for(state, method, base_pool)
            .inspect_err(|e| tracing::warn!(error = %e, "Method unavailable"))?;
        let report = self.check.execute_spec(&spec)?;
        let action = InterrogationAction::Question {
            method,
            outcome: report.outcome,
        };
        let turn = advance_logged(&self.rules, "interrogation", state, &action, Some(report))?;

        if let Some(reliability) = self.rules.information_reliability(&turn.state) {
            tracing::debug!(
                resistance = turn.state.resistance,
                reliability,
                "Interrogation round played"
            );
        }
        Ok(turn)
    }

    pub fn abandon(
        &self,
        state: &InterrogationState,
    ) -> Result<EncounterTurn<InterrogationState>, EngineError> {
        advance_logged(
            &self.rules,
            "interrogation",
            state,
            &InterrogationAction::Abandon,
            None,
        )
    }
}

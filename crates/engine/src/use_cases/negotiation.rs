//! Negotiation use cases.
//!
//! A round is: ask the rules what to roll, roll it, then advance with the
//! classified outcome. Concessions skip the roll.

use std::sync::Arc;

use runeforge_domain::{
    ConcessionKind, EncounterId, NegotiationAction, NegotiationRules, NegotiationState,
    NegotiationTactic, RequestComplexity,
};
use tracing::instrument;

use super::check::RollCheck;
use super::encounter::{advance_logged, EncounterTurn};
use crate::infrastructure::error::EngineError;

/// A player's move before any dice are rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationMove {
    Persuade,
    Deceive,
    Pressure,
    Concede(ConcessionKind),
}

impl NegotiationMove {
    pub fn tactic(&self) -> NegotiationTactic {
        match self {
            Self::Persuade => NegotiationTactic::Persuade,
            Self::Deceive => NegotiationTactic::Deceive,
            Self::Pressure => NegotiationTactic::Pressure,
            Self::Concede(_) => NegotiationTactic::Concede,
        }
    }
}

pub struct PlayNegotiation {
    rules: NegotiationRules,
    check: Arc<RollCheck>,
}

impl PlayNegotiation {
    pub fn new(rules: NegotiationRules, check: Arc<RollCheck>) -> Self {
        Self { rules, check }
    }

    pub fn open(&self, complexity: RequestComplexity) -> NegotiationState {
        let state = self.rules.open(EncounterId::new(), complexity);
        tracing::info!(
            encounter_id = %state.id,
            complexity = ?complexity,
            player = state.player_position,
            counterpart = state.counterpart_position,
            "Negotiation opened"
        );
        state
    }

    /// Play one round with the player's base pool for the tactic.
    #[instrument(skip(self, state), fields(encounter_id = %state.id))]
    pub fn execute(
        &self,
        state: &NegotiationState,
        player_move: NegotiationMove,
        base_pool: u32,
    ) -> Result<EncounterTurn<NegotiationState>, EngineError> {
        let spec = self
            .rules
            .check_for(state, player_move.tactic(), base_pool)
            .inspect_err(|e| tracing::warn!(error = %e, "Tactic unavailable"))?;

        let (action, check) = match (player_move, spec) {
            (NegotiationMove::Concede(concession), _) => {
                (NegotiationAction::Concede { concession }, None)
            }
            (_, None) => {
                return Err(runeforge_domain::DomainError::invalid_state_transition(
                    "checked tactic produced no check",
                )
                .into())
            }
            (tactic, Some(spec)) => {
                let report = self.check.execute_spec(&spec)?;
                let outcome = report.outcome;
                let action = match tactic {
                    NegotiationMove::Deceive => NegotiationAction::Deceive { outcome },
                    NegotiationMove::Pressure => NegotiationAction::Pressure { outcome },
                    _ => NegotiationAction::Persuade { outcome },
                };
                (action, Some(report))
            }
        };

        advance_logged(&self.rules, "negotiation", state, &action, check)
    }
}

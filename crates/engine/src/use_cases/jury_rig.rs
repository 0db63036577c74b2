//! Jury-rig use cases.
//!
//! The complication die comes from its own port so hosts can script or
//! audit it apart from skill rolls.

use std::sync::Arc;

use runeforge_domain::{
    EncounterId, EncounterState, JuryRigAction, JuryRigRules, JuryRigState, JuryRigStep,
    MechanismKind,
};
use tracing::instrument;

use super::check::RollCheck;
use super::encounter::{advance_logged, EncounterTurn};
use crate::infrastructure::error::EngineError;
use crate::infrastructure::ports::RandomPort;

const COMPLICATION_DIE: i32 = 10;

pub struct RunJuryRig {
    rules: JuryRigRules,
    check: Arc<RollCheck>,
    complications: Arc<dyn RandomPort>,
}

impl RunJuryRig {
    pub fn new(
        rules: JuryRigRules,
        check: Arc<RollCheck>,
        complications: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            rules,
            check,
            complications,
        }
    }

    pub fn open(
        &self,
        mechanism: MechanismKind,
        base_dc: i32,
        glitched: bool,
        hints: Vec<String>,
    ) -> Result<JuryRigState, EngineError> {
        let state = self
            .rules
            .open(EncounterId::new(), mechanism, base_dc, glitched, hints)?;
        tracing::info!(encounter_id = %state.id, ?mechanism, base_dc, "Jury-rig started");
        Ok(state)
    }

    /// Roll the optional Observe or Pattern check for the current step.
    #[instrument(skip(self, state), fields(encounter_id = %state.id, step = ?state.step))]
    pub fn study(
        &self,
        state: &JuryRigState,
        base_pool: u32,
    ) -> Result<EncounterTurn<JuryRigState>, EngineError> {
        let spec = self.rules.check_for(state, base_pool)?;
        let (spec, observe) = match (spec, state.step) {
            (Some(spec), JuryRigStep::Observe) => (spec, true),
            (Some(spec), JuryRigStep::Pattern) => (spec, false),
            _ => {
                return Err(runeforge_domain::DomainError::invalid_state_transition(format!(
                    "nothing to study at the {:?} step",
                    state.step
                ))
                .into())
            }
        };
        let report = self.check.execute_spec(&spec)?;
        let outcome = report.outcome;
        let action = if observe {
            JuryRigAction::Observe { outcome }
        } else {
            JuryRigAction::RecognizePattern { outcome }
        };
        advance_logged(&self.rules, "jury-rig", state, &action, Some(report))
    }

    /// Submit a step that needs no roll: Probe, Skip, SelectMethod,
    /// Iterate or Abandon.
    pub fn act(
        &self,
        state: &JuryRigState,
        action: JuryRigAction,
    ) -> Result<EncounterTurn<JuryRigState>, EngineError> {
        if matches!(
            action,
            JuryRigAction::Observe { .. }
                | JuryRigAction::RecognizePattern { .. }
                | JuryRigAction::Experiment { .. }
        ) {
            return Err(runeforge_domain::DomainError::validation(
                "checked steps are rolled by study or experiment",
            )
            .into());
        }
        advance_logged(&self.rules, "jury-rig", state, &action, None)
    }

    /// Try the selected method. A failure that is not a fumble draws the
    /// complication die.
    #[instrument(skip(self, state), fields(encounter_id = %state.id))]
    pub fn experiment(
        &self,
        state: &JuryRigState,
        base_pool: u32,
    ) -> Result<EncounterTurn<JuryRigState>, EngineError> {
        let spec = self
            .rules
            .check_for(state, base_pool)?
            .filter(|_| state.step == JuryRigStep::Experiment);
        let Some(spec) = spec else {
            return Err(runeforge_domain::DomainError::invalid_state_transition(
                "no method selected for an experiment",
            )
            .into());
        };

        let report = self.check.execute_spec(&spec)?;
        let outcome = report.outcome;
        let complication_roll = if !outcome.is_fumble && !outcome.is_success() {
            let roll = self.complications.gen_range(1, COMPLICATION_DIE);
            tracing::debug!(roll, "Complication rolled");
            u8::try_from(roll).ok()
        } else {
            None
        };

        let turn = advance_logged(
            &self.rules,
            "jury-rig",
            state,
            &JuryRigAction::Experiment {
                outcome,
                complication_roll,
            },
            Some(report),
        )?;
        if !turn.state.is_terminal() {
            tracing::debug!(
                method = ?state.selected_method,
                dc_reduction = turn.state.dc_reduction,
                "Experiment failed, iterating"
            );
        }
        Ok(turn)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use runeforge_domain::{
        BypassMethod, ConsequenceEvent, DiceConfig, JuryRigStatus, JuryRigTerminal,
    };

    use super::*;
    use crate::infrastructure::clock::{FixedClock, FixedRandom, ScriptedRandom};
    use crate::infrastructure::ports::MockRandomPort;

    fn run(
        skill: impl RandomPort + 'static,
        complications: impl RandomPort + 'static,
    ) -> RunJuryRig {
        let check = RollCheck::new(
            DiceConfig::default(),
            Arc::new(skill),
            Arc::new(FixedClock(Utc::now())),
        );
        RunJuryRig::new(
            JuryRigRules::default(),
            Arc::new(check),
            Arc::new(complications),
        )
    }

    fn ready(jury_rig: &RunJuryRig, glitched: bool) -> JuryRigState {
        let state = jury_rig
            .open(MechanismKind::Terminal, 3, glitched, Vec::new())
            .unwrap();
        let state = jury_rig.act(&state, JuryRigAction::Skip).unwrap().state;
        let state = jury_rig.act(&state, JuryRigAction::Probe).unwrap().state;
        jury_rig.act(&state, JuryRigAction::Skip).unwrap().state
    }

    #[test]
    fn test_success_rolls_no_complication() {
        let mut complications = MockRandomPort::new();
        complications.expect_gen_range().never();
        let jury_rig = run(FixedRandom(9), complications);

        let state = ready(&jury_rig, false);
        let state = jury_rig
            .act(
                &state,
                JuryRigAction::SelectMethod {
                    method: BypassMethod::WireManipulation,
                },
            )
            .unwrap()
            .state;
        let turn = jury_rig.experiment(&state, 7).unwrap();
        assert_eq!(turn.terminal(), Some(JuryRigTerminal::Bypassed));
        assert_eq!(
            turn.events,
            vec![ConsequenceEvent::GrantSalvage {
                components: vec![
                    "circuit-board".to_string(),
                    "display-unit".to_string(),
                    "processing-chip".to_string(),
                ],
            }]
        );
    }

    #[test]
    fn test_failure_draws_complication_die() {
        let mut complications = MockRandomPort::new();
        complications
            .expect_gen_range()
            .withf(|min, max| *min == 1 && *max == 10)
            .times(1)
            .return_const(2);
        let jury_rig = run(FixedRandom(4), complications);

        let state = ready(&jury_rig, false);
        let state = jury_rig
            .act(
                &state,
                JuryRigAction::SelectMethod {
                    method: BypassMethod::PercussiveMaintenance,
                },
            )
            .unwrap()
            .state;
        let turn = jury_rig.experiment(&state, 2).unwrap();
        assert!(turn.terminal().is_none());
        assert_eq!(turn.state.step, JuryRigStep::Iterate);
        assert_eq!(turn.events, vec![ConsequenceEvent::AlarmTriggered]);

        let turn = jury_rig.act(&turn.state, JuryRigAction::Iterate).unwrap();
        assert_eq!(turn.state.dc_reduction, 1);
    }

    #[test]
    fn test_glitch_in_favor_bypasses_after_failure() {
        let jury_rig = run(FixedRandom(3), FixedRandom(10));
        let state = ready(&jury_rig, true);
        let state = jury_rig
            .act(
                &state,
                JuryRigAction::SelectMethod {
                    method: BypassMethod::GlitchExploitation,
                },
            )
            .unwrap()
            .state;
        let turn = jury_rig.experiment(&state, 2).unwrap();
        assert_eq!(turn.state.status(), JuryRigStatus::Bypassed);
    }

    #[test]
    fn test_observe_study_reveals_hints() {
        let jury_rig = run(FixedRandom(8), FixedRandom(6));
        let state = jury_rig
            .open(MechanismKind::Elevator, 3, false, vec!["loose panel".to_string()])
            .unwrap();
        let turn = jury_rig.study(&state, 2).unwrap();
        assert!(turn.state.hints_revealed);
        assert_eq!(turn.state.step, JuryRigStep::Probe);
        assert!(jury_rig.study(&turn.state, 2).is_err());
    }

    #[test]
    fn test_fumble_destroys_mechanism() {
        let jury_rig = run(ScriptedRandom::new([1, 1, 4]), FixedRandom(10));
        let state = ready(&jury_rig, false);
        let state = jury_rig
            .act(
                &state,
                JuryRigAction::SelectMethod {
                    method: BypassMethod::PowerCycling,
                },
            )
            .unwrap()
            .state;
        let turn = jury_rig.experiment(&state, 3).unwrap();
        assert_eq!(turn.terminal(), Some(JuryRigTerminal::MechanismDestroyed));
    }

    #[test]
    fn test_experiment_requires_selection() {
        let jury_rig = run(FixedRandom(9), FixedRandom(5));
        let state = ready(&jury_rig, false);
        assert!(jury_rig.experiment(&state, 3).is_err());
        assert!(jury_rig
            .act(
                &state,
                JuryRigAction::Experiment {
                    outcome: runeforge_domain::CheckOutcome::from_counts(3, 0, 1).unwrap(),
                    complication_roll: None,
                }
            )
            .is_err());
    }
}

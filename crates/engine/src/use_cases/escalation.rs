//! Stress and corruption use cases.
//!
//! Trackers are owned by the caller's character record; these use cases roll
//! whatever checks a change needs and apply the result in place.

use std::sync::Arc;

use runeforge_domain::{
    cps_stage, resisted_stress, roll_panic, CorruptionScale, CorruptionStage, DomainError,
    EscalationReport, EscalationState, PanicEffect, RestKind, RollMode, SecondaryCheck,
    SkillContext, StressScale, StressThreshold,
};
use tracing::instrument;

use super::check::{CheckReport, CheckRequest, RollCheck};
use crate::infrastructure::error::EngineError;
use crate::infrastructure::ports::RandomPort;

/// A tracker change together with any check rolled for it.
#[derive(Debug, Clone)]
pub struct EscalationOutcome<S> {
    pub check: Option<CheckReport>,
    pub report: EscalationReport<S>,
}

pub struct TrackEscalation {
    stress: StressScale,
    corruption: CorruptionScale,
    check: Arc<RollCheck>,
    random: Arc<dyn RandomPort>,
}

impl TrackEscalation {
    pub fn new(
        stress: StressScale,
        corruption: CorruptionScale,
        check: Arc<RollCheck>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            stress,
            corruption,
            check,
            random,
        }
    }

    /// Add stress, optionally letting the character resist with a Resolve
    /// pool first. Resisting at high stress is rolled with disadvantage.
    #[instrument(skip(self, state), fields(stress = state.value()))]
    pub fn apply_stress(
        &self,
        state: &mut EscalationState,
        raw: u32,
        resolve_pool: Option<u32>,
        source: &str,
    ) -> Result<EscalationOutcome<StressThreshold>, EngineError> {
        ensure_open(state)?;
        let (amount, check) = match resolve_pool {
            Some(pool) => {
                let mode = if self.stress.has_skill_disadvantage(state.value()) {
                    RollMode::Disadvantage
                } else {
                    RollMode::Normal
                };
                let report = self
                    .check
                    .execute(&CheckRequest::new(pool, 0).with_mode(mode))?;
                let amount = resisted_stress(raw, report.outcome.net_successes());
                tracing::debug!(raw, resisted = raw - amount, "Stress resisted");
                (amount, Some(report))
            }
            None => (raw, None),
        };

        let delta = i32::try_from(amount)
            .map_err(|_| DomainError::validation(format!("stress amount too large: {amount}")))?;
        let report = state.apply(&self.stress, delta, source)?;
        log_report(state, &report);
        Ok(EscalationOutcome { check, report })
    }

    /// Add (or purge, with a negative delta) corruption.
    pub fn apply_corruption(
        &self,
        state: &mut EscalationState,
        delta: i32,
        source: &str,
    ) -> Result<EscalationReport<CorruptionStage>, EngineError> {
        let report = state
            .apply(&self.corruption, delta, source)
            .inspect_err(|e| tracing::warn!(error = %e, "Corruption change refused"))?;
        log_report(state, &report);
        Ok(report)
    }

    /// Roll the pending Trauma check.
    pub fn resolve_trauma_check(
        &self,
        state: &mut EscalationState,
        base_pool: u32,
        difficulty_class: i32,
    ) -> Result<EscalationOutcome<StressThreshold>, EngineError> {
        ensure_pending(state, SecondaryCheck::Trauma)?;
        let report = self
            .check
            .execute(&CheckRequest::new(base_pool, difficulty_class))?;
        let passed = report.outcome.is_success();
        let resolution = state.resolve_secondary_check(&self.stress, passed)?;
        tracing::info!(passed, stress = resolution.value, "Trauma check resolved");
        Ok(EscalationOutcome {
            check: Some(report),
            report: resolution,
        })
    }

    /// Roll the pending survival check. Corruption already costs dice on
    /// Resolve, so the pool shrinks with the tracker value.
    pub fn resolve_mutation_check(
        &self,
        state: &mut EscalationState,
        base_pool: u32,
        difficulty_class: i32,
    ) -> Result<EscalationOutcome<CorruptionStage>, EngineError> {
        ensure_pending(state, SecondaryCheck::Mutation)?;
        let penalty = self.corruption.resolve_dice_penalty(state.value());
        let context = SkillContext::new(-i32::try_from(penalty).unwrap_or(i32::MAX), 0);
        let report = self
            .check
            .execute(&CheckRequest::new(base_pool, difficulty_class).with_context(context))?;
        let passed = report.outcome.is_success();
        let resolution = state.resolve_secondary_check(&self.corruption, passed)?;
        if state.is_lost() {
            tracing::info!("Survival check failed, character consumed");
        } else {
            tracing::info!(corruption = resolution.value, "Survival check passed");
        }
        Ok(EscalationOutcome {
            check: Some(report),
            report: resolution,
        })
    }

    /// Remove stress for a rest.
    pub fn recover(
        &self,
        state: &mut EscalationState,
        rest: RestKind,
        will: u32,
    ) -> Result<EscalationReport<StressThreshold>, EngineError> {
        let amount = self.stress.recovery_amount(rest, will, state.value());
        let delta = -i32::try_from(amount).unwrap_or(i32::MAX);
        let report = state.apply(&self.stress, delta, format!("{rest:?} rest"))?;
        tracing::debug!(
            rest = ?rest,
            recovered = amount,
            stress = report.value,
            "Stress recovered"
        );
        Ok(report)
    }

    /// Roll on the panic table if the current CPS stage allows it.
    pub fn panic_check(&self, state: &EscalationState) -> Option<PanicEffect> {
        let stage = cps_stage(state, &self.stress);
        let effect = roll_panic(stage, |min, max| self.random.gen_range(min, max));
        if let Some(effect) = effect {
            tracing::info!(stage = %stage, effect = ?effect, "Panic");
        }
        effect
    }

    pub fn defense_penalty(&self, state: &EscalationState) -> u32 {
        self.stress.defense_penalty(state.value())
    }
}

fn ensure_open(state: &EscalationState) -> Result<(), DomainError> {
    match state.pending_check() {
        Some(check) => Err(DomainError::secondary_check_pending(state.kind(), check)),
        None => Ok(()),
    }
}

fn ensure_pending(state: &EscalationState, expected: SecondaryCheck) -> Result<(), DomainError> {
    match state.pending_check() {
        Some(check) if check == expected => Ok(()),
        _ => Err(DomainError::invalid_state_transition(format!(
            "no pending {expected} check on the {} tracker",
            state.kind()
        ))),
    }
}

fn log_report<S>(state: &EscalationState, report: &EscalationReport<S>)
where
    S: std::fmt::Display,
{
    if report.previous != report.value {
        tracing::debug!(
            tracker = %state.kind(),
            previous = report.previous,
            value = report.value,
            stage = %report.stage,
            "Tracker changed"
        );
    }
    if let Some(check) = state.pending_check() {
        tracing::info!(tracker = %state.kind(), check = %check, "Secondary check required");
    }
}

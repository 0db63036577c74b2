//! Check use cases.
//!
//! Rolls a pool through the random port and classifies it. Encounter use
//! cases go through here for every die they need.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use runeforge_domain::{
    classify, contest, CheckOutcome, CheckSpec, ContestResult, DiceConfig, RollMode, RollResult,
    SkillContext,
};
use serde::{Deserialize, Serialize};

use crate::infrastructure::error::EngineError;
use crate::infrastructure::ports::{ClockPort, RandomPort};

/// What to roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckRequest {
    pub pool: u32,
    pub difficulty_class: i32,
    pub context: SkillContext,
    pub mode: RollMode,
    pub exploding: bool,
    /// Overrides the configured success face
    pub success_face: Option<u8>,
}

impl CheckRequest {
    pub fn new(pool: u32, difficulty_class: i32) -> Self {
        Self {
            pool,
            difficulty_class,
            ..Self::default()
        }
    }

    pub fn from_spec(spec: &CheckSpec) -> Self {
        Self {
            success_face: Some(spec.success_face),
            ..Self::new(spec.pool, spec.difficulty_class)
        }
    }

    pub fn with_context(mut self, context: SkillContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_mode(mut self, mode: RollMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn exploding(mut self) -> Self {
        self.exploding = true;
        self
    }
}

/// A rolled and classified check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub roll: RollResult,
    /// The other pool under advantage or disadvantage
    pub discarded: Option<RollResult>,
    pub outcome: CheckOutcome,
    pub rolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestReport {
    pub initiator: CheckReport,
    pub defender: CheckReport,
    pub result: ContestResult,
}

/// Roll-and-classify use case.
pub struct RollCheck {
    dice: DiceConfig,
    random: Arc<dyn RandomPort>,
    clock: Arc<dyn ClockPort>,
}

impl RollCheck {
    pub fn new(dice: DiceConfig, random: Arc<dyn RandomPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            dice,
            random,
            clock,
        }
    }

    pub fn execute(&self, request: &CheckRequest) -> Result<CheckReport, EngineError> {
        if request.exploding && request.mode != RollMode::Normal {
            return Err(runeforge_domain::DomainError::validation(
                "exploding dice cannot be combined with advantage or disadvantage",
            )
            .into());
        }

        let (size, difficulty_class) = request
            .context
            .apply(request.pool, request.difficulty_class);
        let mut pool = self.dice.pool(size)?;
        if let Some(face) = request.success_face {
            pool = pool.with_success_face(face)?;
        }

        let roll_die = |min, max| self.random.gen_range(min, max);
        let (roll, discarded) = if request.exploding {
            (pool.roll_exploding(self.dice.max_explosions, roll_die), None)
        } else {
            let rolled = pool.roll_with_mode(request.mode, roll_die);
            (rolled.kept, rolled.discarded)
        };
        let outcome = classify(&roll, difficulty_class)?;

        tracing::debug!(
            pool = size,
            difficulty_class,
            mode = ?request.mode,
            successes = outcome.successes,
            botches = outcome.botches,
            tier = %outcome.tier,
            "Rolled {}",
            roll.breakdown()
        );

        Ok(CheckReport {
            roll,
            discarded,
            outcome,
            rolled_at: self.clock.now(),
        })
    }

    /// Roll what an encounter asked for.
    pub fn execute_spec(&self, spec: &CheckSpec) -> Result<CheckReport, EngineError> {
        self.execute(&CheckRequest::from_spec(spec))
    }

    /// Opposed check; the initiator wins ties.
    pub fn contest(
        &self,
        initiator: &CheckRequest,
        defender: &CheckRequest,
    ) -> Result<ContestReport, EngineError> {
        let initiator = self.execute(initiator)?;
        let defender = self.execute(defender)?;
        let result = contest(&initiator.outcome, &defender.outcome);
        tracing::debug!(result = ?result, "Contest resolved");
        Ok(ContestReport {
            initiator,
            defender,
            result,
        })
    }
}

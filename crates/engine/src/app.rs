//! Application composition.

use std::sync::Arc;

use runeforge_domain::RulesConfig;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    error::EngineError,
    ports::{ClockPort, RandomPort},
    settings::rules_config_from_env,
};
use crate::use_cases::{PlayNegotiation, RollCheck, RunInterrogation, RunJuryRig, TrackEscalation};

/// Main application state.
///
/// Holds the validated rules tables and every use case built from them.
pub struct App {
    pub rules: RulesConfig,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub check: Arc<RollCheck>,
    pub negotiation: PlayNegotiation,
    pub interrogation: RunInterrogation,
    pub jury_rig: RunJuryRig,
    pub escalation: TrackEscalation,
}

impl App {
    /// Wire the use cases. `complications` feeds the jury-rig complication
    /// die and the panic table; `random` feeds every skill pool.
    pub fn new(
        rules: RulesConfig,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        complications: Arc<dyn RandomPort>,
    ) -> Result<Self, EngineError> {
        rules.validate()?;

        let check = Arc::new(RollCheck::new(rules.dice.clone(), random, clock));
        let use_cases = UseCases {
            negotiation: PlayNegotiation::new(rules.negotiation_rules(), check.clone()),
            interrogation: RunInterrogation::new(rules.interrogation_rules(), check.clone()),
            jury_rig: RunJuryRig::new(rules.jury_rig_rules(), check.clone(), complications.clone()),
            escalation: TrackEscalation::new(
                rules.stress.clone(),
                rules.corruption.clone(),
                check.clone(),
                complications,
            ),
            check,
        };

        tracing::info!("Rules engine ready");
        Ok(Self { rules, use_cases })
    }

    /// Rules from the environment, real time and real dice.
    pub fn from_env() -> Result<Self, EngineError> {
        let rules = rules_config_from_env()?;
        Self::new(
            rules,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
            Arc::new(SystemRandom::new()),
        )
    }
}

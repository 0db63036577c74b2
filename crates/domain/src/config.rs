//! Rules tables
//!
//! Every controller takes its table at construction. `RulesConfig` bundles
//! them so a host can load, validate and hand them out in one go.

use serde::{Deserialize, Serialize};

use crate::encounters::interrogation::{InterrogationConfig, InterrogationRules};
use crate::encounters::jury_rig::{JuryRigConfig, JuryRigRules};
use crate::encounters::negotiation::{NegotiationConfig, NegotiationRules};
use crate::error::DomainError;
use crate::escalation::{CorruptionScale, StressScale};
use crate::value_objects::DiceConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesConfig {
    pub dice: DiceConfig,
    pub negotiation: NegotiationConfig,
    pub interrogation: InterrogationConfig,
    pub jury_rig: JuryRigConfig,
    pub stress: StressScale,
    pub corruption: CorruptionScale,
}

impl RulesConfig {
    /// Reject tables that contradict themselves or each other.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.dice.validate()?;
        self.negotiation.validate()?;
        self.interrogation.validate()?;
        self.jury_rig.validate()?;
        self.stress.validate()?;
        self.corruption.validate()?;

        for (name, face) in [
            ("interrogation", self.interrogation.success_face),
            ("jury-rig", self.jury_rig.success_face),
        ] {
            if face <= self.dice.botch_face || face > self.dice.faces {
                return Err(DomainError::validation(format!(
                    "{name} success face {face} does not fit a d{} with botches on {}",
                    self.dice.faces, self.dice.botch_face
                )));
            }
        }
        Ok(())
    }

    pub fn negotiation_rules(&self) -> NegotiationRules {
        NegotiationRules::new(self.negotiation.clone())
    }

    pub fn interrogation_rules(&self) -> InterrogationRules {
        InterrogationRules::new(self.interrogation.clone())
    }

    pub fn jury_rig_rules(&self) -> JuryRigRules {
        JuryRigRules::new(self.jury_rig.clone())
    }
}

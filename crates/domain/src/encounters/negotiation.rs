//! Negotiation encounter
//!
//! Two positions sit on a 0-8 track: the player's and the counterpart's.
//! Successful arguments pull the counterpart toward the player; failures
//! drag the player toward the counterpart. Positions only ever move toward
//! each other and never cross. Equal positions close the deal; either side
//! reaching 8 walks away.
//!
//! Phase is evaluated on the gap *after* the round's movement.

use serde::{Deserialize, Serialize};

use super::{Advance, CheckSpec, EncounterMachine, EncounterState};
use crate::error::DomainError;
use crate::events::ConsequenceEvent;
use crate::ids::EncounterId;
use crate::value_objects::{CheckOutcome, OutcomeTier, DEFAULT_SUCCESS_FACE};

/// Top of the position track ("walk away").
pub const MAX_POSITION: u8 = 8;

/// Display name for a position on the track.
pub fn position_name(position: u8) -> &'static str {
    match position {
        0 => "Maximum Demand",
        1 => "Strong+",
        2 => "Strong",
        3 => "Favorable+",
        4 => "Favorable",
        5 => "Compromise",
        6 => "Unfavorable",
        7 => "Unfavorable+",
        _ => "Walk Away",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NegotiationPhase {
    Opening,
    Bargaining,
    CrisisManagement,
    Finalization,
    DealReached,
    Collapsed,
}

impl NegotiationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DealReached | Self::Collapsed)
    }
}

/// Why a negotiation fell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollapseReason {
    WalkedAway,
    OutOfRounds,
    FumbleInCrisis,
    FumbleAtWideGap,
    HostileChallenge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "reason")]
pub enum NegotiationTerminal {
    DealReached,
    Collapsed(CollapseReason),
}

/// How much the player is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestComplexity {
    FairTrade,
    SlightAdvantage,
    NoticeableAdvantage,
    MajorAdvantage,
    OneSidedDeal,
}

impl RequestComplexity {
    fn index(self) -> usize {
        match self {
            Self::FairTrade => 0,
            Self::SlightAdvantage => 1,
            Self::NoticeableAdvantage => 2,
            Self::MajorAdvantage => 3,
            Self::OneSidedDeal => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NegotiationTactic {
    Persuade,
    Deceive,
    Pressure,
    Concede,
}

/// Closed set of fumble consequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NegotiationFumble {
    /// Later checks get harder
    TrustShattered,
    /// Deception is no longer an option
    LieExposed,
    /// The counterpart answers pressure with open hostility; Pressure is barred
    ChallengeAccepted,
}

impl NegotiationTactic {
    pub fn fumble(&self) -> Option<NegotiationFumble> {
        match self {
            Self::Persuade => Some(NegotiationFumble::TrustShattered),
            Self::Deceive => Some(NegotiationFumble::LieExposed),
            Self::Pressure => Some(NegotiationFumble::ChallengeAccepted),
            Self::Concede => None,
        }
    }
}

/// What the player gives up when conceding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConcessionKind {
    OfferItem,
    PromiseFavor,
    TradeInformation,
    TakeRisk,
    StakeReputation,
}

impl ConcessionKind {
    fn index(self) -> usize {
        match self {
            Self::OfferItem => 0,
            Self::PromiseFavor => 1,
            Self::TradeInformation => 2,
            Self::TakeRisk => 3,
            Self::StakeReputation => 4,
        }
    }
}

/// One round's move. Checked tactics carry their classified outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "tactic")]
pub enum NegotiationAction {
    Persuade { outcome: CheckOutcome },
    Deceive { outcome: CheckOutcome },
    Pressure { outcome: CheckOutcome },
    Concede { concession: ConcessionKind },
}

impl NegotiationAction {
    pub fn tactic(&self) -> NegotiationTactic {
        match self {
            Self::Persuade { .. } => NegotiationTactic::Persuade,
            Self::Deceive { .. } => NegotiationTactic::Deceive,
            Self::Pressure { .. } => NegotiationTactic::Pressure,
            Self::Concede { .. } => NegotiationTactic::Concede,
        }
    }

    pub fn outcome(&self) -> Option<&CheckOutcome> {
        match self {
            Self::Persuade { outcome } | Self::Deceive { outcome } | Self::Pressure { outcome } => {
                Some(outcome)
            }
            Self::Concede { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRound {
    pub round: u32,
    pub tactic: NegotiationTactic,
    pub tier: Option<OutcomeTier>,
    pub player_position: u8,
    pub counterpart_position: u8,
    pub phase: NegotiationPhase,
}

/// Persisted negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "NegotiationStateRecord")]
pub struct NegotiationState {
    pub id: EncounterId,
    pub complexity: RequestComplexity,
    pub phase: NegotiationPhase,
    pub player_position: u8,
    pub counterpart_position: u8,
    pub round: u32,
    pub rounds_remaining: u32,
    pub consecutive_failures: u32,
    /// Bonus waiting for the next checked tactic
    pub active_concession: Option<ConcessionKind>,
    /// Lasting fumble penalties
    pub penalties: Vec<NegotiationFumble>,
    pub terminal: Option<NegotiationTerminal>,
    pub history: Vec<NegotiationRound>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NegotiationStateRecord {
    id: EncounterId,
    complexity: RequestComplexity,
    phase: NegotiationPhase,
    player_position: u8,
    counterpart_position: u8,
    round: u32,
    rounds_remaining: u32,
    consecutive_failures: u32,
    active_concession: Option<ConcessionKind>,
    penalties: Vec<NegotiationFumble>,
    terminal: Option<NegotiationTerminal>,
    history: Vec<NegotiationRound>,
}

impl TryFrom<NegotiationStateRecord> for NegotiationState {
    type Error = DomainError;

    fn try_from(record: NegotiationStateRecord) -> Result<Self, Self::Error> {
        let (player, counterpart) = (record.player_position, record.counterpart_position);
        if player > MAX_POSITION || counterpart > MAX_POSITION {
            return Err(DomainError::validation(format!(
                "positions must be 0-{MAX_POSITION}, got {player}/{counterpart}"
            )));
        }
        let settled = matches!(
            (record.phase, record.terminal),
            (NegotiationPhase::DealReached, Some(NegotiationTerminal::DealReached))
                | (NegotiationPhase::Collapsed, Some(NegotiationTerminal::Collapsed(_)))
        );
        if settled != record.phase.is_terminal() || (!settled && record.terminal.is_some()) {
            return Err(DomainError::validation(format!(
                "phase {:?} does not match terminal {:?}",
                record.phase, record.terminal
            )));
        }
        if record.history.len() != record.round as usize {
            return Err(DomainError::validation(format!(
                "round {} with {} rounds of history",
                record.round,
                record.history.len()
            )));
        }
        Ok(Self {
            id: record.id,
            complexity: record.complexity,
            phase: record.phase,
            player_position: player,
            counterpart_position: counterpart,
            round: record.round,
            rounds_remaining: record.rounds_remaining,
            consecutive_failures: record.consecutive_failures,
            active_concession: record.active_concession,
            penalties: record.penalties,
            terminal: record.terminal,
            history: record.history,
        })
    }
}

impl NegotiationState {
    pub fn gap(&self) -> u8 {
        self.player_position.abs_diff(self.counterpart_position)
    }

    pub fn has_penalty(&self, penalty: NegotiationFumble) -> bool {
        self.penalties.contains(&penalty)
    }
}

impl EncounterState for NegotiationState {
    type Terminal = NegotiationTerminal;

    fn terminal(&self) -> Option<NegotiationTerminal> {
        self.terminal
    }

    fn round(&self) -> u32 {
        self.round
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityProfile {
    pub base_dc: i32,
    pub initial_gap: u8,
    pub rounds: u32,
}

/// Negotiation tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NegotiationConfig {
    pub counterpart_start: u8,
    /// FairTrade through OneSidedDeal
    pub profiles: [ComplexityProfile; 5],
    pub persuade_dc_modifier: i32,
    pub deceive_dc_modifier: i32,
    pub pressure_dc_modifier: i32,
    pub concession_bonus_dice: u32,
    /// OfferItem through StakeReputation
    pub concession_dc_reduction: [i32; 5],
    pub trust_shattered_dc_penalty: i32,
    pub deceive_stress_success: u32,
    pub deceive_stress_failure: u32,
    pub deceive_stress_fumble: u32,
    pub pressure_reputation_critical: i32,
    pub pressure_reputation_success: i32,
    pub pressure_reputation_failure: i32,
    pub pressure_disposition: i32,
    pub crisis_gap: u8,
    pub crisis_failures: u32,
    /// Pre-round gap at which a Deceive/Pressure fumble ends talks
    pub fumble_collapse_gap: u8,
    pub strong_deal_position: u8,
    pub strong_deal_disposition: i32,
    pub deal_disposition: i32,
    pub collapse_disposition: i32,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        let profile = |base_dc, initial_gap, rounds| ComplexityProfile {
            base_dc,
            initial_gap,
            rounds,
        };
        Self {
            counterpart_start: 6,
            profiles: [
                profile(1, 2, 3),
                profile(2, 3, 4),
                profile(3, 4, 5),
                profile(4, 5, 6),
                profile(5, 6, 7),
            ],
            persuade_dc_modifier: 0,
            deceive_dc_modifier: 1,
            pressure_dc_modifier: 1,
            concession_bonus_dice: 2,
            concession_dc_reduction: [1, 1, 2, 2, 3],
            trust_shattered_dc_penalty: 1,
            deceive_stress_success: 3,
            deceive_stress_failure: 6,
            deceive_stress_fumble: 8,
            pressure_reputation_critical: -3,
            pressure_reputation_success: -5,
            pressure_reputation_failure: -10,
            pressure_disposition: -5,
            crisis_gap: 5,
            crisis_failures: 2,
            fumble_collapse_gap: 4,
            strong_deal_position: 4,
            strong_deal_disposition: 5,
            deal_disposition: 2,
            collapse_disposition: -10,
        }
    }
}

impl NegotiationConfig {
    pub fn profile(&self, complexity: RequestComplexity) -> ComplexityProfile {
        self.profiles[complexity.index()]
    }

    pub fn concession_reduction(&self, concession: ConcessionKind) -> i32 {
        self.concession_dc_reduction[concession.index()]
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.counterpart_start > MAX_POSITION {
            return Err(DomainError::validation(format!(
                "counterpart start {} is off the 0-{MAX_POSITION} track",
                self.counterpart_start
            )));
        }
        if self.profiles.iter().any(|p| p.rounds == 0 || p.base_dc < 0) {
            return Err(DomainError::validation(
                "negotiation profiles need rounds and a non-negative DC",
            ));
        }
        Ok(())
    }
}

/// Negotiation transition rules.
#[derive(Debug, Clone, Default)]
pub struct NegotiationRules {
    config: NegotiationConfig,
}

impl NegotiationRules {
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Open talks at the standard positions for a request.
    pub fn open(&self, id: EncounterId, complexity: RequestComplexity) -> NegotiationState {
        let profile = self.config.profile(complexity);
        let counterpart = self.config.counterpart_start.min(MAX_POSITION);
        let player = counterpart.saturating_sub(profile.initial_gap);
        Self::fresh(id, complexity, player, counterpart, profile.rounds)
    }

    /// Open talks at explicit positions (scripted scenes, resumed deals).
    pub fn open_at(
        &self,
        id: EncounterId,
        complexity: RequestComplexity,
        player_position: u8,
        counterpart_position: u8,
        rounds: u32,
    ) -> Result<NegotiationState, DomainError> {
        if player_position > MAX_POSITION || counterpart_position > MAX_POSITION {
            return Err(DomainError::validation(format!(
                "positions must be 0-{MAX_POSITION}, got {player_position}/{counterpart_position}"
            )));
        }
        if rounds == 0 {
            return Err(DomainError::validation("a negotiation needs at least one round"));
        }
        Ok(Self::fresh(
            id,
            complexity,
            player_position,
            counterpart_position,
            rounds,
        ))
    }

    fn fresh(
        id: EncounterId,
        complexity: RequestComplexity,
        player_position: u8,
        counterpart_position: u8,
        rounds: u32,
    ) -> NegotiationState {
        NegotiationState {
            id,
            complexity,
            phase: NegotiationPhase::Opening,
            player_position,
            counterpart_position,
            round: 0,
            rounds_remaining: rounds,
            consecutive_failures: 0,
            active_concession: None,
            penalties: Vec::new(),
            terminal: None,
            history: Vec::new(),
        }
    }

    /// Pool and difficulty for a tactic, or `None` for Concede.
    pub fn check_for(
        &self,
        state: &NegotiationState,
        tactic: NegotiationTactic,
        base_pool: u32,
    ) -> Result<Option<CheckSpec>, DomainError> {
        if state.is_terminal() {
            return Err(DomainError::invalid_state_transition(
                "negotiation already ended",
            ));
        }
        self.ensure_allowed(state, tactic)?;

        let tactic_modifier = match tactic {
            NegotiationTactic::Persuade => self.config.persuade_dc_modifier,
            NegotiationTactic::Deceive => self.config.deceive_dc_modifier,
            NegotiationTactic::Pressure => self.config.pressure_dc_modifier,
            NegotiationTactic::Concede => return Ok(None),
        };

        let mut dc = self.config.profile(state.complexity).base_dc + tactic_modifier;
        let mut pool = base_pool;
        if state.has_penalty(NegotiationFumble::TrustShattered) {
            dc += self.config.trust_shattered_dc_penalty;
        }
        if let Some(concession) = state.active_concession {
            dc -= self.config.concession_reduction(concession);
            pool = pool.saturating_add(self.config.concession_bonus_dice);
        }

        Ok(Some(CheckSpec {
            pool,
            difficulty_class: dc.max(0),
            success_face: DEFAULT_SUCCESS_FACE,
        }))
    }

    fn ensure_allowed(
        &self,
        state: &NegotiationState,
        tactic: NegotiationTactic,
    ) -> Result<(), DomainError> {
        if tactic == NegotiationTactic::Deceive && state.has_penalty(NegotiationFumble::LieExposed)
        {
            return Err(DomainError::constraint(
                "deception was exposed; Deceive is no longer available",
            ));
        }
        if tactic == NegotiationTactic::Pressure
            && state.has_penalty(NegotiationFumble::ChallengeAccepted)
        {
            return Err(DomainError::constraint(
                "the counterpart met pressure with hostility; Pressure is no longer available",
            ));
        }
        Ok(())
    }

    fn tactic_costs(
        &self,
        tactic: NegotiationTactic,
        outcome: &CheckOutcome,
    ) -> Vec<ConsequenceEvent> {
        let cfg = &self.config;
        match tactic {
            NegotiationTactic::Deceive => {
                let amount = if outcome.is_fumble {
                    cfg.deceive_stress_fumble
                } else if outcome.is_success() {
                    cfg.deceive_stress_success
                } else {
                    cfg.deceive_stress_failure
                };
                vec![ConsequenceEvent::ApplyStress { amount }]
            }
            NegotiationTactic::Pressure => {
                let reputation = match outcome.tier {
                    OutcomeTier::CriticalSuccess => cfg.pressure_reputation_critical,
                    tier if tier.is_success() => cfg.pressure_reputation_success,
                    _ => cfg.pressure_reputation_failure,
                };
                vec![
                    ConsequenceEvent::ReputationChange { amount: reputation },
                    ConsequenceEvent::DispositionChange {
                        amount: cfg.pressure_disposition,
                    },
                ]
            }
            NegotiationTactic::Persuade | NegotiationTactic::Concede => Vec::new(),
        }
    }

    /// Phase after movement, in priority order.
    fn evaluate(
        &self,
        state: &NegotiationState,
    ) -> (NegotiationPhase, Option<NegotiationTerminal>) {
        let gap = state.gap();
        if state.player_position >= MAX_POSITION || state.counterpart_position >= MAX_POSITION {
            return collapsed(CollapseReason::WalkedAway);
        }
        if gap == 0 {
            return (
                NegotiationPhase::DealReached,
                Some(NegotiationTerminal::DealReached),
            );
        }
        if state.rounds_remaining == 0 {
            return collapsed(CollapseReason::OutOfRounds);
        }
        if gap <= 1 {
            return (NegotiationPhase::Finalization, None);
        }
        if gap >= self.config.crisis_gap
            || state.consecutive_failures >= self.config.crisis_failures
        {
            return (NegotiationPhase::CrisisManagement, None);
        }
        (NegotiationPhase::Bargaining, None)
    }
}

fn collapsed(reason: CollapseReason) -> (NegotiationPhase, Option<NegotiationTerminal>) {
    (
        NegotiationPhase::Collapsed,
        Some(NegotiationTerminal::Collapsed(reason)),
    )
}

/// Move `from` up to `steps` toward `to` without passing it.
fn step_toward(from: u8, to: u8, steps: u8) -> u8 {
    if from < to {
        from.saturating_add(steps).min(to)
    } else {
        from.saturating_sub(steps).max(to)
    }
}

impl EncounterMachine for NegotiationRules {
    type State = NegotiationState;
    type Action = NegotiationAction;

    fn step(
        &self,
        state: &NegotiationState,
        action: &NegotiationAction,
    ) -> Result<Advance<NegotiationState>, DomainError> {
        let tactic = action.tactic();
        self.ensure_allowed(state, tactic)?;

        let mut next = state.clone();
        let mut events = Vec::new();
        let mut forced: Option<CollapseReason> = None;
        let mut challenged = false;
        let gap_before = state.gap();

        next.round += 1;
        next.rounds_remaining = next.rounds_remaining.saturating_sub(1);

        match action {
            NegotiationAction::Concede { concession } => {
                next.player_position =
                    step_toward(next.player_position, next.counterpart_position, 1);
                next.active_concession = Some(*concession);
                next.consecutive_failures = 0;
            }
            NegotiationAction::Persuade { outcome }
            | NegotiationAction::Deceive { outcome }
            | NegotiationAction::Pressure { outcome } => {
                next.active_concession = None;

                if outcome.is_success() {
                    let steps = if outcome.tier.is_strong_success() { 2 } else { 1 };
                    next.counterpart_position =
                        step_toward(next.counterpart_position, next.player_position, steps);
                    next.consecutive_failures = 0;
                } else {
                    let steps = if outcome.is_fumble { 2 } else { 1 };
                    next.player_position =
                        step_toward(next.player_position, next.counterpart_position, steps);
                    next.consecutive_failures += 1;
                }

                events.extend(self.tactic_costs(tactic, outcome));

                if let Some(fumble) = tactic.fumble().filter(|_| outcome.is_fumble) {
                    let risky = matches!(
                        tactic,
                        NegotiationTactic::Deceive | NegotiationTactic::Pressure
                    );
                    challenged = fumble == NegotiationFumble::ChallengeAccepted;
                    if state.phase == NegotiationPhase::CrisisManagement {
                        forced = Some(CollapseReason::FumbleInCrisis);
                    } else if risky && gap_before >= self.config.fumble_collapse_gap {
                        forced = Some(if challenged {
                            CollapseReason::HostileChallenge
                        } else {
                            CollapseReason::FumbleAtWideGap
                        });
                    } else if !next.penalties.contains(&fumble) {
                        next.penalties.push(fumble);
                    }
                }
            }
        }

        // Equal positions close the deal even on a fumbled round.
        let (phase, terminal) = match forced {
            Some(reason) if next.gap() > 0 => collapsed(reason),
            _ => self.evaluate(&next),
        };
        next.phase = phase;
        next.terminal = terminal;

        if challenged && terminal != Some(NegotiationTerminal::DealReached) {
            events.push(ConsequenceEvent::HostileChallenge);
        }

        match terminal {
            Some(NegotiationTerminal::DealReached) => {
                let amount = if next.player_position >= self.config.strong_deal_position {
                    self.config.strong_deal_disposition
                } else {
                    self.config.deal_disposition
                };
                events.push(ConsequenceEvent::DispositionChange { amount });
            }
            Some(NegotiationTerminal::Collapsed(_)) => {
                events.push(ConsequenceEvent::DispositionChange {
                    amount: self.config.collapse_disposition,
                });
            }
            None => {}
        }

        next.history.push(NegotiationRound {
            round: next.round,
            tactic,
            tier: action.outcome().map(|o| o.tier),
            player_position: next.player_position,
            counterpart_position: next.counterpart_position,
            phase: next.phase,
        });

        Ok(Advance::new(next, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounters::advance;

    fn rules() -> NegotiationRules {
        NegotiationRules::default()
    }

    fn outcome(successes: u32, botches: u32, dc: i32) -> CheckOutcome {
        CheckOutcome::from_counts(successes, botches, dc).unwrap()
    }

    fn full() -> CheckOutcome {
        outcome(3, 0, 2)
    }

    fn critical() -> CheckOutcome {
        outcome(7, 0, 2)
    }

    fn failure() -> CheckOutcome {
        outcome(1, 0, 2)
    }

    fn fumble() -> CheckOutcome {
        outcome(0, 1, 2)
    }

    fn at(player: u8, counterpart: u8) -> NegotiationState {
        rules()
            .open_at(
                EncounterId::new(),
                RequestComplexity::NoticeableAdvantage,
                player,
                counterpart,
                6,
            )
            .unwrap()
    }

    #[test]
    fn test_open_uses_complexity_profile() {
        let state = rules().open(EncounterId::new(), RequestComplexity::MajorAdvantage);
        assert_eq!(state.counterpart_position, 6);
        assert_eq!(state.player_position, 1);
        assert_eq!(state.gap(), 5);
        assert_eq!(state.rounds_remaining, 6);
        assert_eq!(state.phase, NegotiationPhase::Opening);
    }

    #[test]
    fn test_open_at_rejects_off_track_positions() {
        let err = rules()
            .open_at(EncounterId::new(), RequestComplexity::FairTrade, 9, 2, 3)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_persuade_success_moves_counterpart_toward_player() {
        let state = at(6, 2);
        let next = advance(&rules(), &state, &NegotiationAction::Persuade { outcome: full() })
            .unwrap()
            .state;
        assert_eq!(next.counterpart_position, 3);
        assert_eq!(next.player_position, 6);
        assert_eq!(next.gap(), 3);
        assert_eq!(next.phase, NegotiationPhase::Bargaining);
    }

    #[test]
    fn test_crisis_uses_post_move_gap() {
        // gap 6 before, 5 after: crisis
        let state = at(7, 1);
        let marginal = outcome(2, 0, 2);
        let next = advance(&rules(), &state, &NegotiationAction::Persuade { outcome: marginal })
            .unwrap()
            .state;
        assert_eq!(next.gap(), 5);
        assert_eq!(next.phase, NegotiationPhase::CrisisManagement);

        // gap 5 before, 3 after: no crisis
        let state = at(6, 1);
        let next = advance(&rules(), &state, &NegotiationAction::Persuade { outcome: critical() })
            .unwrap()
            .state;
        assert_eq!(next.gap(), 3);
        assert_eq!(next.phase, NegotiationPhase::Bargaining);
    }

    #[test]
    fn test_deal_reached_is_absorbing() {
        let state = at(4, 6);
        let action = NegotiationAction::Persuade {
            outcome: critical(),
        };
        let result = advance(&rules(), &state, &action).unwrap();
        assert_eq!(result.state.phase, NegotiationPhase::DealReached);
        assert_eq!(result.terminal(), Some(NegotiationTerminal::DealReached));
        assert!(result
            .events
            .contains(&ConsequenceEvent::DispositionChange { amount: 5 }));

        let err = advance(
            &rules(),
            &result.state,
            &NegotiationAction::Persuade { outcome: full() },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn test_positions_never_cross() {
        let state = at(3, 4);
        let next = advance(&rules(), &state, &NegotiationAction::Persuade { outcome: critical() })
            .unwrap()
            .state;
        assert_eq!(next.counterpart_position, 3);
        assert_eq!(next.phase, NegotiationPhase::DealReached);
    }

    #[test]
    fn test_failure_moves_player_and_counts_failures() {
        let state = at(1, 6);
        let rules = rules();
        let first = advance(&rules, &state, &NegotiationAction::Persuade { outcome: failure() })
            .unwrap()
            .state;
        assert_eq!(first.player_position, 2);
        assert_eq!(first.phase, NegotiationPhase::Bargaining);

        let second = advance(&rules, &first, &NegotiationAction::Persuade { outcome: failure() })
            .unwrap()
            .state;
        assert_eq!(second.consecutive_failures, 2);
        assert_eq!(second.phase, NegotiationPhase::CrisisManagement);

        let recovered =
            advance(&rules, &second, &NegotiationAction::Persuade { outcome: full() })
                .unwrap()
                .state;
        assert_eq!(recovered.consecutive_failures, 0);
        assert_eq!(recovered.phase, NegotiationPhase::Bargaining);
    }

    #[test]
    fn test_finalization_when_gap_is_one() {
        let state = at(4, 6);
        let next = advance(&rules(), &state, &NegotiationAction::Persuade { outcome: full() })
            .unwrap()
            .state;
        assert_eq!(next.gap(), 1);
        assert_eq!(next.phase, NegotiationPhase::Finalization);
    }

    #[test]
    fn test_concede_moves_player_and_boosts_next_check() {
        let rules = rules();
        let state = at(2, 6);
        let base = rules
            .check_for(&state, NegotiationTactic::Persuade, 4)
            .unwrap()
            .unwrap();
        assert_eq!(base.difficulty_class, 3);
        assert!(rules
            .check_for(&state, NegotiationTactic::Concede, 4)
            .unwrap()
            .is_none());

        let conceded = advance(
            &rules,
            &state,
            &NegotiationAction::Concede {
                concession: ConcessionKind::TradeInformation,
            },
        )
        .unwrap()
        .state;
        assert_eq!(conceded.player_position, 3);

        let boosted = rules
            .check_for(&conceded, NegotiationTactic::Persuade, 4)
            .unwrap()
            .unwrap();
        assert_eq!(boosted.pool, 6);
        assert_eq!(boosted.difficulty_class, 1);

        let after = advance(&rules, &conceded, &NegotiationAction::Persuade { outcome: full() })
            .unwrap()
            .state;
        assert!(after.active_concession.is_none());
    }

    #[test]
    fn test_deceive_costs_stress() {
        let state = at(2, 6);
        let result =
            advance(&rules(), &state, &NegotiationAction::Deceive { outcome: failure() }).unwrap();
        assert!(result
            .events
            .contains(&ConsequenceEvent::ApplyStress { amount: 6 }));
    }

    #[test]
    fn test_pressure_costs_reputation_and_disposition() {
        let state = at(2, 6);
        let action = NegotiationAction::Pressure {
            outcome: critical(),
        };
        let result = advance(&rules(), &state, &action).unwrap();
        assert!(result
            .events
            .contains(&ConsequenceEvent::ReputationChange { amount: -3 }));
        assert!(result
            .events
            .contains(&ConsequenceEvent::DispositionChange { amount: -5 }));
    }

    #[test]
    fn test_persuade_fumble_sets_trust_penalty() {
        let rules = rules();
        let state = at(3, 6);
        let next = advance(&rules, &state, &NegotiationAction::Persuade { outcome: fumble() })
            .unwrap()
            .state;
        assert!(next.has_penalty(NegotiationFumble::TrustShattered));
        assert_eq!(next.player_position, 5);
        assert!(next.terminal.is_none());

        let spec = rules
            .check_for(&next, NegotiationTactic::Persuade, 3)
            .unwrap()
            .unwrap();
        assert_eq!(spec.difficulty_class, 4);
    }

    #[test]
    fn test_deceive_fumble_bars_deception() {
        let rules = rules();
        let state = at(3, 6);
        let next = advance(&rules, &state, &NegotiationAction::Deceive { outcome: fumble() })
            .unwrap()
            .state;
        assert!(next.has_penalty(NegotiationFumble::LieExposed));
        assert!(matches!(
            rules.check_for(&next, NegotiationTactic::Deceive, 3),
            Err(DomainError::Constraint(_))
        ));
        assert!(advance(&rules, &next, &NegotiationAction::Deceive { outcome: full() }).is_err());
    }

    #[test]
    fn test_deceive_fumble_at_wide_gap_collapses() {
        let state = at(1, 6);
        let result =
            advance(&rules(), &state, &NegotiationAction::Deceive { outcome: fumble() }).unwrap();
        assert_eq!(
            result.terminal(),
            Some(NegotiationTerminal::Collapsed(CollapseReason::FumbleAtWideGap))
        );
        assert!(result
            .events
            .contains(&ConsequenceEvent::DispositionChange { amount: -10 }));
    }

    #[test]
    fn test_fumble_that_closes_the_gap_is_a_deal() {
        let state = at(4, 6);
        let result =
            advance(&rules(), &state, &NegotiationAction::Pressure { outcome: fumble() }).unwrap();
        assert_eq!(result.state.player_position, 6);
        assert_eq!(result.state.counterpart_position, 6);
        assert_eq!(result.terminal(), Some(NegotiationTerminal::DealReached));
        assert_eq!(result.state.phase, NegotiationPhase::DealReached);
        assert!(!result.events.contains(&ConsequenceEvent::HostileChallenge));
    }

    #[test]
    fn test_crisis_fumble_that_closes_the_gap_is_a_deal() {
        let mut state = at(5, 6);
        state.phase = NegotiationPhase::CrisisManagement;
        let result =
            advance(&rules(), &state, &NegotiationAction::Persuade { outcome: fumble() }).unwrap();
        assert_eq!(result.terminal(), Some(NegotiationTerminal::DealReached));
    }

    #[test]
    fn test_pressure_fumble_at_narrow_gap_bars_pressure() {
        let rules = rules();
        let state = at(2, 5);
        let result =
            advance(&rules, &state, &NegotiationAction::Pressure { outcome: fumble() }).unwrap();
        assert!(result.terminal().is_none());
        assert_eq!(result.state.phase, NegotiationPhase::Finalization);
        assert!(result.events.contains(&ConsequenceEvent::HostileChallenge));
        assert!(result.state.has_penalty(NegotiationFumble::ChallengeAccepted));
        assert!(matches!(
            rules.check_for(&result.state, NegotiationTactic::Pressure, 3),
            Err(DomainError::Constraint(_))
        ));
    }

    #[test]
    fn test_pressure_fumble_at_wide_gap_is_hostile_challenge() {
        let state = at(1, 6);
        let result =
            advance(&rules(), &state, &NegotiationAction::Pressure { outcome: fumble() }).unwrap();
        assert_eq!(
            result.terminal(),
            Some(NegotiationTerminal::Collapsed(CollapseReason::HostileChallenge))
        );
        assert!(result.events.contains(&ConsequenceEvent::HostileChallenge));
    }

    #[test]
    fn test_fumble_in_crisis_collapses() {
        let mut state = at(1, 6);
        state.phase = NegotiationPhase::CrisisManagement;
        let result =
            advance(&rules(), &state, &NegotiationAction::Persuade { outcome: fumble() }).unwrap();
        assert_eq!(
            result.terminal(),
            Some(NegotiationTerminal::Collapsed(CollapseReason::FumbleInCrisis))
        );
    }

    #[test]
    fn test_running_out_of_rounds_collapses() {
        let rules = rules();
        let state = rules
            .open_at(EncounterId::new(), RequestComplexity::FairTrade, 2, 6, 1)
            .unwrap();
        let result = advance(&rules, &state, &NegotiationAction::Persuade { outcome: full() })
            .unwrap();
        assert_eq!(
            result.terminal(),
            Some(NegotiationTerminal::Collapsed(CollapseReason::OutOfRounds))
        );
    }

    #[test]
    fn test_walk_away_collapses() {
        let state = at(7, 8);
        let result =
            advance(&rules(), &state, &NegotiationAction::Persuade { outcome: failure() }).unwrap();
        assert_eq!(
            result.terminal(),
            Some(NegotiationTerminal::Collapsed(CollapseReason::WalkedAway))
        );
    }

    #[test]
    fn test_state_resumes_after_serde() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), RequestComplexity::SlightAdvantage);
        let state = advance(&rules, &state, &NegotiationAction::Persuade { outcome: full() })
            .unwrap()
            .state;

        let json = serde_json::to_string(&state).unwrap();
        let restored: NegotiationState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);

        let a = advance(&rules, &state, &NegotiationAction::Persuade { outcome: full() }).unwrap();
        let b = advance(&rules, &restored, &NegotiationAction::Persuade { outcome: full() })
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_state() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), RequestComplexity::SlightAdvantage);
        let state = advance(&rules, &state, &NegotiationAction::Persuade { outcome: full() })
            .unwrap()
            .state;
        let json = serde_json::to_value(&state).unwrap();

        let mut off_track = json.clone();
        off_track["counterpartPosition"] = serde_json::json!(12);
        assert!(serde_json::from_value::<NegotiationState>(off_track).is_err());

        let mut unsettled = json.clone();
        unsettled["phase"] = serde_json::json!("dealReached");
        assert!(serde_json::from_value::<NegotiationState>(unsettled).is_err());

        let mut lost_history = json;
        lost_history["history"] = serde_json::json!([]);
        assert!(serde_json::from_value::<NegotiationState>(lost_history).is_err());
    }

    #[test]
    fn test_position_names() {
        assert_eq!(position_name(0), "Maximum Demand");
        assert_eq!(position_name(5), "Compromise");
        assert_eq!(position_name(8), "Walk Away");
    }
}

//! Success-counting dice pools
//!
//! A pool rolls N dice of a fixed face count. Each face counts as a success
//! (at or above the success face), a botch (at or below the botch face) or
//! neutral. Randomness is injected as a closure `FnMut(min, max) -> value`
//! returning an inclusive value, so every roll replays deterministically
//! under a fixed source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default face count for the resolution pool (d10)
pub const DEFAULT_FACES: u8 = 10;
/// Faces at or above this count as successes
pub const DEFAULT_SUCCESS_FACE: u8 = 7;
/// Faces at or below this count as botches
pub const DEFAULT_BOTCH_FACE: u8 = 1;

/// How a single face is read by a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FaceKind {
    Success,
    Botch,
    Neutral,
}

/// A pool of identical dice with success and botch thresholds.
///
/// `botch_face < success_face <= faces` always holds, so no face can be both
/// a success and a botch. A botch face of 0 disables botches entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "DicePoolRecord")]
pub struct DicePool {
    size: u32,
    faces: u8,
    success_face: u8,
    botch_face: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DicePoolRecord {
    size: u32,
    faces: u8,
    success_face: u8,
    botch_face: u8,
}

impl TryFrom<DicePoolRecord> for DicePool {
    type Error = DomainError;

    fn try_from(record: DicePoolRecord) -> Result<Self, Self::Error> {
        validate_thresholds(record.faces, record.success_face, record.botch_face)?;
        Ok(Self {
            size: record.size,
            faces: record.faces,
            success_face: record.success_face,
            botch_face: record.botch_face,
        })
    }
}

impl DicePool {
    /// Create a validated pool.
    ///
    /// A negative size is a caller bug and is rejected rather than clamped.
    pub fn new(
        size: i32,
        faces: u8,
        success_face: u8,
        botch_face: u8,
    ) -> Result<Self, DomainError> {
        let size = u32::try_from(size)
            .map_err(|_| DomainError::validation(format!("pool size cannot be negative: {size}")))?;
        validate_thresholds(faces, success_face, botch_face)?;
        Ok(Self {
            size,
            faces,
            success_face,
            botch_face,
        })
    }

    /// The standard d10 pool: 7+ succeeds, 1 botches.
    pub fn standard(size: u32) -> Self {
        Self {
            size,
            faces: DEFAULT_FACES,
            success_face: DEFAULT_SUCCESS_FACE,
            botch_face: DEFAULT_BOTCH_FACE,
        }
    }

    /// Same thresholds, different number of dice.
    pub fn with_size(self, size: u32) -> Self {
        Self { size, ..self }
    }

    /// Add (or remove) dice, never dropping below zero.
    pub fn with_bonus_dice(self, bonus: i32) -> Self {
        let size = (i64::from(self.size) + i64::from(bonus)).clamp(0, i64::from(u32::MAX));
        Self {
            size: u32::try_from(size).unwrap_or(0),
            ..self
        }
    }

    /// Same pool with a different success threshold.
    pub fn with_success_face(self, success_face: u8) -> Result<Self, DomainError> {
        validate_thresholds(self.faces, success_face, self.botch_face)?;
        Ok(Self {
            success_face,
            ..self
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn faces(&self) -> u8 {
        self.faces
    }

    pub fn success_face(&self) -> u8 {
        self.success_face
    }

    pub fn botch_face(&self) -> u8 {
        self.botch_face
    }

    /// Classify one face value against this pool's thresholds.
    pub fn classify_face(&self, face: u8) -> FaceKind {
        if face >= self.success_face {
            FaceKind::Success
        } else if face <= self.botch_face {
            FaceKind::Botch
        } else {
            FaceKind::Neutral
        }
    }

    /// Roll every die in the pool once.
    ///
    /// A pool of size 0 rolls nothing and yields zero successes.
    pub fn roll(&self, mut roll_die: impl FnMut(i32, i32) -> i32) -> RollResult {
        let faces = (0..self.size)
            .map(|_| self.draw(&mut roll_die))
            .collect();
        RollResult::tally(*self, faces, 0)
    }

    /// Roll with exploding dice: every maximum face adds one more die,
    /// up to `max_explosions` extra dice in total.
    pub fn roll_exploding(
        &self,
        max_explosions: u32,
        mut roll_die: impl FnMut(i32, i32) -> i32,
    ) -> RollResult {
        let mut faces: Vec<u8> = Vec::with_capacity(self.size as usize);
        let mut pending = self.size;
        let mut exploded = 0;

        while pending > 0 {
            pending -= 1;
            let face = self.draw(&mut roll_die);
            faces.push(face);
            if face == self.faces && exploded < max_explosions {
                exploded += 1;
                pending += 1;
            }
        }

        RollResult::tally(*self, faces, exploded)
    }

    /// Roll twice under advantage/disadvantage and keep the better/worse
    /// pool by net successes. Normal mode rolls once.
    pub fn roll_with_mode(
        &self,
        mode: RollMode,
        mut roll_die: impl FnMut(i32, i32) -> i32,
    ) -> ModeRoll {
        let first = self.roll(&mut roll_die);
        let (kept, discarded) = match mode {
            RollMode::Normal => (first, None),
            RollMode::Advantage | RollMode::Disadvantage => {
                let second = self.roll(&mut roll_die);
                let second_is_better = second.net_successes() > first.net_successes();
                let keep_second = match mode {
                    RollMode::Advantage => second_is_better,
                    _ => second.net_successes() < first.net_successes(),
                };
                if keep_second {
                    (second, Some(first))
                } else {
                    (first, Some(second))
                }
            }
        };
        ModeRoll {
            mode,
            kept,
            discarded,
        }
    }

    fn draw(&self, roll_die: &mut impl FnMut(i32, i32) -> i32) -> u8 {
        let value = roll_die(1, i32::from(self.faces)).clamp(1, i32::from(self.faces));
        u8::try_from(value).unwrap_or(1)
    }
}

fn validate_thresholds(faces: u8, success_face: u8, botch_face: u8) -> Result<(), DomainError> {
    if faces < 2 {
        return Err(DomainError::validation(format!(
            "dice need at least 2 faces, got {faces}"
        )));
    }
    if success_face == 0 || success_face > faces {
        return Err(DomainError::validation(format!(
            "success face {success_face} must be within 1..={faces}"
        )));
    }
    if botch_face >= success_face {
        return Err(DomainError::validation(format!(
            "botch face {botch_face} overlaps success face {success_face}"
        )));
    }
    Ok(())
}

/// Roll a standard-faced pool; the bare contract used by callers that only
/// know the size and thresholds.
pub fn roll(
    pool_size: i32,
    success_face: u8,
    botch_face: u8,
    roll_die: impl FnMut(i32, i32) -> i32,
) -> Result<RollResult, DomainError> {
    let pool = DicePool::new(pool_size, DEFAULT_FACES, success_face, botch_face)?;
    Ok(pool.roll(roll_die))
}

/// Advantage state for a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollMode {
    #[default]
    Normal,
    /// Roll twice, keep the higher net successes
    Advantage,
    /// Roll twice, keep the lower net successes
    Disadvantage,
}

/// Outcome of a roll under a [`RollMode`]; both pools stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRoll {
    pub mode: RollMode,
    pub kept: RollResult,
    pub discarded: Option<RollResult>,
}

/// Raw data from a rolled pool. Faces keep the order they were rolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RollResultRecord")]
pub struct RollResult {
    pool: DicePool,
    faces: Vec<u8>,
    success_count: u32,
    botch_count: u32,
    exploded: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RollResultRecord {
    pool: DicePool,
    faces: Vec<u8>,
    success_count: u32,
    botch_count: u32,
    #[serde(default)]
    exploded: u32,
}

/// Stored counts must agree with a fresh tally of the stored faces.
impl TryFrom<RollResultRecord> for RollResult {
    type Error = DomainError;

    fn try_from(record: RollResultRecord) -> Result<Self, Self::Error> {
        let pool = record.pool;
        let maxed = record.faces.iter().filter(|&&f| f == pool.faces).count();
        if record.exploded as usize > maxed {
            return Err(DomainError::validation(format!(
                "{} explosions but only {maxed} maximum faces",
                record.exploded
            )));
        }
        let expected = pool.size as usize + record.exploded as usize;
        let result = Self::checked(pool, record.faces, expected, record.exploded)?;
        let tallied = (result.success_count, result.botch_count);
        if tallied != (record.success_count, record.botch_count) {
            return Err(DomainError::validation(format!(
                "recorded {} successes and {} botches, faces give {} and {}",
                record.success_count, record.botch_count, tallied.0, tallied.1
            )));
        }
        Ok(result)
    }
}

impl RollResult {
    /// Rebuild a result from known faces (manual rolls, replays).
    pub fn from_faces(pool: DicePool, faces: Vec<u8>) -> Result<Self, DomainError> {
        Self::checked(pool, faces, pool.size as usize, 0)
    }

    fn checked(
        pool: DicePool,
        faces: Vec<u8>,
        expected: usize,
        exploded: u32,
    ) -> Result<Self, DomainError> {
        if faces.len() != expected {
            return Err(DomainError::validation(format!(
                "expected {expected} faces, got {}",
                faces.len()
            )));
        }
        if let Some(bad) = faces.iter().find(|&&f| f == 0 || f > pool.faces) {
            return Err(DomainError::validation(format!(
                "face {bad} is not on a d{}",
                pool.faces
            )));
        }
        Ok(Self::tally(pool, faces, exploded))
    }

    fn tally(pool: DicePool, faces: Vec<u8>, exploded: u32) -> Self {
        let mut success_count = 0;
        let mut botch_count = 0;
        for &face in &faces {
            match pool.classify_face(face) {
                FaceKind::Success => success_count += 1,
                FaceKind::Botch => botch_count += 1,
                FaceKind::Neutral => {}
            }
        }
        Self {
            pool,
            faces,
            success_count,
            botch_count,
            exploded,
        }
    }

    pub fn pool(&self) -> &DicePool {
        &self.pool
    }

    pub fn faces(&self) -> &[u8] {
        &self.faces
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn botch_count(&self) -> u32 {
        self.botch_count
    }

    /// Extra dice added by explosions
    pub fn exploded(&self) -> u32 {
        self.exploded
    }

    /// Dice actually rolled, including explosions
    pub fn dice_rolled(&self) -> usize {
        self.faces.len()
    }

    /// Successes minus botches; used to compare pools, not to classify checks.
    pub fn net_successes(&self) -> i32 {
        self.success_count as i32 - self.botch_count as i32
    }

    /// Human-readable breakdown, e.g. "5d10[1, 2, 3, 4, 9] (7+): 1 success, 1 botch"
    pub fn breakdown(&self) -> String {
        let faces: Vec<String> = self.faces.iter().map(|f| f.to_string()).collect();
        let mut text = format!(
            "{}d{}[{}] ({}+): {} success{}, {} botch{}",
            self.pool.size,
            self.pool.faces,
            faces.join(", "),
            self.pool.success_face,
            self.success_count,
            if self.success_count == 1 { "" } else { "es" },
            self.botch_count,
            if self.botch_count == 1 { "" } else { "es" },
        );
        if self.exploded > 0 {
            text.push_str(&format!(", {} exploded", self.exploded));
        }
        text
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.breakdown())
    }
}

/// Pool thresholds shared across the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiceConfig {
    pub faces: u8,
    pub success_face: u8,
    pub botch_face: u8,
    pub max_explosions: u32,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            faces: DEFAULT_FACES,
            success_face: DEFAULT_SUCCESS_FACE,
            botch_face: DEFAULT_BOTCH_FACE,
            max_explosions: 3,
        }
    }
}

impl DiceConfig {
    /// A pool of `size` dice using these thresholds.
    pub fn pool(&self, size: u32) -> Result<DicePool, DomainError> {
        let size = i32::try_from(size)
            .map_err(|_| DomainError::validation(format!("pool size too large: {size}")))?;
        DicePool::new(size, self.faces, self.success_face, self.botch_face)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_thresholds(self.faces, self.success_face, self.botch_face)
    }
}

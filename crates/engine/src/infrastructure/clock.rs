//! Clock and random implementations.

#[cfg(test)]
use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::infrastructure::ports::{ClockPort, RandomPort};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Seeded random - the same seed replays the same rolls.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic mid-roll leaves the generator itself intact
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl RandomPort for SeededRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.with_rng(|rng| rng.gen_range(min..=max))
    }

    fn gen_uuid(&self) -> Uuid {
        let bytes = self.with_rng(|rng| rng.gen::<[u8; 16]>());
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom(pub i32);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, _min: i32, _max: i32) -> i32 {
        self.0
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}

/// Replays a script of faces, then falls back to `min`.
#[cfg(test)]
pub struct ScriptedRandom {
    faces: Mutex<VecDeque<i32>>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(faces: impl IntoIterator<Item = i32>) -> Self {
        Self {
            faces: Mutex::new(faces.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.faces.lock().map(|f| f.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl RandomPort for ScriptedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        let next = self.faces.lock().ok().and_then(|mut f| f.pop_front());
        next.unwrap_or(min).clamp(min, max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_replays() {
        let a = SeededRandom::new(42);
        let b = SeededRandom::new(42);
        let first: Vec<i32> = (0..20).map(|_| a.gen_range(1, 10)).collect();
        let second: Vec<i32> = (0..20).map(|_| b.gen_range(1, 10)).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|face| (1..=10).contains(face)));
        assert_eq!(a.gen_uuid(), b.gen_uuid());
    }

    #[test]
    fn test_system_random_stays_in_range() {
        let random = SystemRandom::new();
        for _ in 0..200 {
            let face = random.gen_range(1, 10);
            assert!((1..=10).contains(&face));
        }
    }

    #[test]
    fn test_scripted_random_replays_then_floors() {
        let random = ScriptedRandom::new([9, 12, 3]);
        assert_eq!(random.gen_range(1, 10), 9);
        assert_eq!(random.gen_range(1, 10), 10);
        assert_eq!(random.remaining(), 1);
        assert_eq!(random.gen_range(1, 10), 3);
        assert_eq!(random.gen_range(1, 10), 1);
    }
}

//! Runeforge engine library.
//!
//! Host-facing orchestration over `runeforge-domain`.
//!
//! ## Structure
//!
//! - `use_cases/` - Roll checks and drive encounters and trackers
//! - `infrastructure/` - Ports, adapters, settings and telemetry
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;

pub use infrastructure::clock::{SeededRandom, SystemClock, SystemRandom};
pub use infrastructure::error::EngineError;
pub use infrastructure::ports::{ClockPort, RandomPort};
pub use infrastructure::settings::{load_rules_config, rules_config_from_env, RULES_PATH_ENV};
pub use infrastructure::telemetry::init_tracing;

//! Rules table loading.
//!
//! Tables live in a JSON file whose path comes from `RUNEFORGE_RULES_PATH`
//! (a `.env` file is honored). Missing keys fall back to the built-in
//! defaults, and every loaded table is validated before use.

use std::path::Path;

use runeforge_domain::RulesConfig;

use super::error::EngineError;

/// Environment variable naming the rules file.
pub const RULES_PATH_ENV: &str = "RUNEFORGE_RULES_PATH";

/// Load and validate a rules file.
pub fn load_rules_config(path: impl AsRef<Path>) -> Result<RulesConfig, EngineError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let config: RulesConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    tracing::info!(path = %path.display(), "Loaded rules tables");
    Ok(config)
}

/// Rules from `RUNEFORGE_RULES_PATH`, or the defaults when it is unset.
pub fn rules_config_from_env() -> Result<RulesConfig, EngineError> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }
    match std::env::var(RULES_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => load_rules_config(path.trim()),
        _ => {
            tracing::debug!("{} unset, using default rules tables", RULES_PATH_ENV);
            Ok(RulesConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stress": {{"resetOnPass": 70}}}}"#).unwrap();

        let config = load_rules_config(file.path()).unwrap();
        assert_eq!(config.stress.reset_on_pass, 70);
        assert_eq!(config.dice, RulesConfig::default().dice);
    }

    #[test]
    fn test_invalid_tables_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dice": {{"successFace": 1, "botchFace": 1}}}}"#).unwrap();

        let err = load_rules_config(file.path()).unwrap_err();
        assert!(err.is_rule_violation());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            load_rules_config(file.path()),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn test_env_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"juryRig": {{"maxDcReduction": 2}}}}"#).unwrap();

        std::env::set_var(RULES_PATH_ENV, file.path());
        let config = rules_config_from_env();
        std::env::remove_var(RULES_PATH_ENV);

        assert_eq!(config.unwrap().jury_rig.max_dc_reduction, 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_rules_config(dir.path().join("absent.json")),
            Err(EngineError::Io(_))
        ));
    }
}

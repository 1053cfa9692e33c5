//! Environment-driven configuration.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Default number of ticks to simulate.
pub const DEFAULT_TICKS: i64 = 6_000;

/// Default cap on signals delivered per dispatch pass.
pub const DEFAULT_SIGNAL_BUDGET: usize = 10_000;

/// Settings for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Ticks to simulate (`QUESTLINE_TICKS`).
    pub ticks: i64,
    /// RNG seed (`QUESTLINE_SEED`).
    pub seed: u64,
    /// Save file to resume from and write back to (`QUESTLINE_SAVE_PATH`).
    pub save_path: Option<PathBuf>,
    /// Max signals drained per dispatch pass (`QUESTLINE_SIGNAL_BUDGET`).
    pub signal_budget: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_TICKS,
            seed: 0,
            save_path: None,
            signal_budget: DEFAULT_SIGNAL_BUDGET,
        }
    }
}

impl SimConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();
        let ticks = parse_or(&lookup, "QUESTLINE_TICKS", defaults.ticks)?;
        if ticks < 0 {
            return Err(AppError::Config(format!(
                "QUESTLINE_TICKS must not be negative, got {ticks}"
            )));
        }
        let signal_budget = parse_or(&lookup, "QUESTLINE_SIGNAL_BUDGET", defaults.signal_budget)?;
        if signal_budget == 0 {
            return Err(AppError::Config(
                "QUESTLINE_SIGNAL_BUDGET must be at least 1".to_owned(),
            ));
        }
        Ok(Self {
            ticks,
            seed: parse_or(&lookup, "QUESTLINE_SEED", defaults.seed)?,
            save_path: lookup("QUESTLINE_SAVE_PATH")
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            signal_budget,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name} must be a valid number: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        // Act
        let config = SimConfig::from_lookup(lookup_from(&[])).unwrap();

        // Assert
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.ticks, 6_000);
        assert_eq!(config.signal_budget, 10_000);
    }

    #[test]
    fn test_reads_every_variable() {
        // Arrange
        let lookup = lookup_from(&[
            ("QUESTLINE_TICKS", "120"),
            ("QUESTLINE_SEED", " 99 "),
            ("QUESTLINE_SAVE_PATH", "/tmp/save.json"),
            ("QUESTLINE_SIGNAL_BUDGET", "5"),
        ]);

        // Act
        let config = SimConfig::from_lookup(lookup).unwrap();

        // Assert
        assert_eq!(config.ticks, 120);
        assert_eq!(config.seed, 99);
        assert_eq!(config.save_path, Some(PathBuf::from("/tmp/save.json")));
        assert_eq!(config.signal_budget, 5);
    }

    #[test]
    fn test_invalid_number_is_a_config_error() {
        // Act
        let result = SimConfig::from_lookup(lookup_from(&[("QUESTLINE_SEED", "lots")]));

        // Assert
        match result {
            Err(AppError::Config(message)) => assert!(message.contains("QUESTLINE_SEED")),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_budget_and_negative_ticks_are_rejected() {
        let zero_budget = SimConfig::from_lookup(lookup_from(&[("QUESTLINE_SIGNAL_BUDGET", "0")]));
        let negative_ticks = SimConfig::from_lookup(lookup_from(&[("QUESTLINE_TICKS", "-1")]));

        assert!(matches!(zero_budget, Err(AppError::Config(_))));
        assert!(matches!(negative_ticks, Err(AppError::Config(_))));
    }

    #[test]
    fn test_blank_save_path_means_no_save() {
        // Act
        let config =
            SimConfig::from_lookup(lookup_from(&[("QUESTLINE_SAVE_PATH", "  ")])).unwrap();

        // Assert
        assert!(config.save_path.is_none());
    }
}

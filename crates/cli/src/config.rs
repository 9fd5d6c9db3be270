//! CLI runtime configuration.
//!
//! Resolved once at startup, after `.env` has been loaded, and then passed down. The encoder
//! crates never read environment variables themselves.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use lab_hl7::{Clock, Dialect, FixedClock, SystemClock};
use std::sync::Arc;

/// Freezes "now" for reproducible output (`yyyy-MM-dd HH:mm:ss`).
pub const FIXED_NOW_VAR: &str = "LABGEN_FIXED_NOW";

/// Dialect used when neither `--dialect` nor the document's `lab_name` selects one.
pub const DEFAULT_DIALECT_VAR: &str = "LABGEN_DEFAULT_DIALECT";

const FIXED_NOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliConfig {
    fixed_now: Option<NaiveDateTime>,
    default_dialect: Option<Dialect>,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fixed_now = read(FIXED_NOW_VAR)
            .map(|raw| {
                NaiveDateTime::parse_from_str(raw.trim(), FIXED_NOW_FORMAT)
                    .with_context(|| {
                        format!("{FIXED_NOW_VAR} must be yyyy-MM-dd HH:mm:ss, got {raw:?}")
                    })
            })
            .transpose()?;

        let default_dialect = read(DEFAULT_DIALECT_VAR)
            .map(|raw| {
                Dialect::parse(&raw)
                    .with_context(|| format!("invalid {DEFAULT_DIALECT_VAR}"))
            })
            .transpose()?;

        Ok(Self {
            fixed_now,
            default_dialect,
        })
    }

    pub fn default_dialect(&self) -> Option<Dialect> {
        self.default_dialect
    }

    /// A [`FixedClock`] when `LABGEN_FIXED_NOW` is set, otherwise the system clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.fixed_now {
            Some(now) => Arc::new(FixedClock::at(now)),
            None => Arc::new(SystemClock),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<CliConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = resolve(&[]).expect("config");
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.default_dialect(), None);
    }

    #[test]
    fn fixed_now_selects_a_frozen_clock() {
        let config = resolve(&[(FIXED_NOW_VAR, "2023-06-09 23:12:52")])
            .expect("config");
        let clock = config.clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(
            clock.now().naive_local().format("%Y%m%d%H%M%S").to_string(),
            "20230609231252"
        );
    }

    #[test]
    fn rejects_malformed_fixed_now() {
        let err = resolve(&[(FIXED_NOW_VAR, "09/06/2023")])
            .expect_err("should reject");
        assert!(err.to_string().contains(FIXED_NOW_VAR));
    }

    #[test]
    fn parses_default_dialect() {
        let config = resolve(&[(DEFAULT_DIALECT_VAR, "gdml")]).expect("config");
        assert_eq!(config.default_dialect(), Some(Dialect::Gdml));

        let err = resolve(&[(DEFAULT_DIALECT_VAR, "hl7")])
            .expect_err("should reject");
        assert!(err.to_string().contains(DEFAULT_DIALECT_VAR));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = resolve(&[(FIXED_NOW_VAR, " "), (DEFAULT_DIALECT_VAR, "")])
            .expect("config");
        assert_eq!(config, CliConfig::default());
    }
}

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::suite;

/// Acceptance thresholds for the four tests. Defaults are the named
/// constants in [`crate::suite`], calibrated for 2500-byte keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub monobit_min: u64,
    pub monobit_max: u64,
    pub series_max: u32,
    pub poker_min: f64,
    pub poker_max: f64,
    /// Inclusive windows per run length (1, 2, ..., >=k). TOML:
    /// `run_buckets = [[2267, 2733], [1079, 1421], ...]`
    pub run_buckets: Vec<(u32, u32)>,
    /// Also check/classify the trailing (unclosed) run. Off by default to
    /// match the reference behavior.
    pub check_final_run: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            monobit_min: suite::MONOBIT_MIN,
            monobit_max: suite::MONOBIT_MAX,
            series_max: suite::MAX_SERIES_LENGTH,
            poker_min: suite::POKER4_MIN,
            poker_max: suite::POKER4_MAX,
            run_buckets: suite::RUN_LENGTH_BUCKETS.to_vec(),
            check_final_run: false,
        }
    }
}

impl Thresholds {
    /// Rejects configurations the tests cannot run with. Checked up front
    /// so a bad table never fails mid-scan.
    pub fn validate(&self) -> Result<(), Error> {
        if self.run_buckets.is_empty() {
            return Err(Error::InvalidArgs(
                "run-length bucket table must not be empty".into(),
            ));
        }
        if !self.poker_min.is_finite() || !self.poker_max.is_finite() {
            return Err(Error::InvalidArgs(format!(
                "poker bounds must be finite, got ({}, {})",
                self.poker_min, self.poker_max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub thresholds: Thresholds,
}

/// Load configuration from a TOML file.
///
/// - If `explicit_path` is `Some` and the file is missing, returns an error.
/// - If `explicit_path` is `None`, tries `/etc/keyrand.toml`; if missing,
///   returns defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit_path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::InvalidArgs(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new("/etc/keyrand.toml");
            if !default.exists() {
                return Ok(Config::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgs(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| {
        Error::InvalidArgs(format!("failed to parse config {}: {}", path.display(), e))
    })?;

    Ok(config)
}

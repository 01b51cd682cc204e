use crate::{
    calendar::SyntheticCalendar,
    error::{PipelineError, PipelineResult},
    risk::OutOfRangePolicy,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "anomalies_detected.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "powerbi_data";
pub const DEFAULT_SEED: u64 = 42;

/// Everything a preparation run needs. Every field has a default, so a
/// JSON config file may set any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path:   PathBuf,
    pub output_dir:   PathBuf,
    /// Master seed for every synthetic column.
    pub seed:         u64,
    /// Date stamped on the first row.
    pub epoch:        NaiveDate,
    pub delimiter:    char,
    pub out_of_range: OutOfRangePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path:   PathBuf::from(DEFAULT_INPUT),
            output_dir:   PathBuf::from(DEFAULT_OUTPUT_DIR),
            seed:         DEFAULT_SEED,
            epoch:        SyntheticCalendar::default().epoch,
            delimiter:    ',',
            out_of_range: OutOfRangePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with fixed paths and seed for use in tests.
    pub fn default_test() -> Self {
        Self {
            input_path: PathBuf::from("test_input.csv"),
            output_dir: PathBuf::from("test_output"),
            seed:       0xDEAD_BEEF,
            ..Self::default()
        }
    }

    pub fn calendar(&self) -> SyntheticCalendar {
        SyntheticCalendar::new(self.epoch)
    }

    /// The delimiter as the single byte the CSV codec needs.
    pub fn delimiter_byte(&self) -> PipelineResult<u8> {
        if self.delimiter.is_ascii() && !matches!(self.delimiter, '"' | '\n' | '\r') {
            Ok(self.delimiter as u8)
        } else {
            Err(PipelineError::InvalidConfig {
                reason: format!("delimiter {:?} must be a single ASCII character", self.delimiter),
            })
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        self.delimiter_byte()?;
        Ok(())
    }
}

//! Risk scoring and risk-level bucketing.
//!
//! risk_score = |anomaly_score| * 100, bucketed on half-open intervals
//! with the upper bound inclusive:
//!
//!   (0, 1]   Low
//!   (1, 2]   Medium
//!   (2, 5]   High
//!   (5, 100] Critical
//!
//! Scores at or below 0, or above 100, fall outside every bucket. What
//! happens to them is decided by OutOfRangePolicy.

use crate::{
    error::{PipelineError, PipelineResult},
    types::RowNumber,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Upper-inclusive bucket edges, lowest first.
const BUCKETS: [(f64, f64, RiskLevel); 4] = [
    (0.0, 1.0,   RiskLevel::Low),
    (1.0, 2.0,   RiskLevel::Medium),
    (2.0, 5.0,   RiskLevel::High),
    (5.0, 100.0, RiskLevel::Critical),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low      => "Low",
            Self::Medium   => "Medium",
            Self::High     => "High",
            Self::Critical => "Critical",
        }
    }

    /// The bucket containing `risk_score`, if any.
    pub fn from_score(risk_score: f64) -> Option<Self> {
        BUCKETS
            .iter()
            .find(|(low, high, _)| risk_score > *low && risk_score <= *high)
            .map(|(_, _, level)| *level)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do with a score that no bucket contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRangePolicy {
    /// Leave the level empty and count the row as unbucketed.
    #[default]
    Count,
    /// Pin scores at or below 0 to Low and scores above 100 to Critical.
    Clamp,
    /// Abort the run.
    Reject,
}

impl FromStr for OutOfRangePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count"  => Ok(Self::Count),
            "clamp"  => Ok(Self::Clamp),
            "reject" => Ok(Self::Reject),
            other => Err(PipelineError::InvalidConfig {
                reason: format!("unknown out-of-range policy '{other}' (expected count, clamp or reject)"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub risk_score: f64,
    /// None only under OutOfRangePolicy::Count.
    pub risk_level: Option<RiskLevel>,
}

impl RiskAssessment {
    pub fn is_unbucketed(&self) -> bool {
        self.risk_level.is_none()
    }
}

pub fn risk_score(anomaly_score: f64) -> f64 {
    anomaly_score.abs() * 100.0
}

/// Score and bucket one row's anomaly score.
pub fn assess(
    anomaly_score: f64,
    policy: OutOfRangePolicy,
    row: RowNumber,
) -> PipelineResult<RiskAssessment> {
    let risk_score = risk_score(anomaly_score);
    let risk_level = match (RiskLevel::from_score(risk_score), policy) {
        (Some(level), _) => Some(level),
        (None, OutOfRangePolicy::Count) => None,
        (None, OutOfRangePolicy::Clamp) if risk_score <= 0.0 => Some(RiskLevel::Low),
        (None, OutOfRangePolicy::Clamp) => Some(RiskLevel::Critical),
        (None, OutOfRangePolicy::Reject) => {
            return Err(PipelineError::Bucketing { row, risk_score });
        }
    };
    Ok(RiskAssessment { risk_score, risk_level })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_lower_bucket() {
        assert_eq!(RiskLevel::from_score(1.0), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_score(2.0), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_score(5.0), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_score(100.0), Some(RiskLevel::Critical));
    }

    #[test]
    fn just_above_boundaries_moves_up() {
        assert_eq!(RiskLevel::from_score(1.000_001), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_score(2.000_001), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_score(5.000_001), Some(RiskLevel::Critical));
    }

    #[test]
    fn zero_and_above_hundred_are_unbucketed() {
        assert_eq!(RiskLevel::from_score(0.0), None);
        assert_eq!(RiskLevel::from_score(100.5), None);
    }

    #[test]
    fn clamp_pins_both_ends() {
        let low = assess(0.0, OutOfRangePolicy::Clamp, 1).unwrap();
        assert_eq!(low.risk_level, Some(RiskLevel::Low));
        assert_eq!(low.risk_score, 0.0);

        let high = assess(-1.5, OutOfRangePolicy::Clamp, 2).unwrap();
        assert_eq!(high.risk_level, Some(RiskLevel::Critical));
        assert_eq!(high.risk_score, 150.0);
    }

    #[test]
    fn reject_names_the_row() {
        let err = assess(2.0, OutOfRangePolicy::Reject, 17).unwrap_err();
        match err {
            PipelineError::Bucketing { row, risk_score } => {
                assert_eq!(row, 17);
                assert_eq!(risk_score, 200.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn policy_parses_from_flag_text() {
        assert_eq!("clamp".parse::<OutOfRangePolicy>().unwrap(), OutOfRangePolicy::Clamp);
        assert!("drop".parse::<OutOfRangePolicy>().is_err());
    }
}

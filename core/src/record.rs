//! Input and derived row types.

use crate::{
    calendar::CalendarFields,
    risk::{RiskAssessment, RiskLevel},
    tables::TableRow,
    types::EntityKey,
};
use serde::{Deserialize, Serialize};

/// The `is_anomaly` value that marks a flagged transaction.
pub const ANOMALY_LABEL: &str = "Anomaly";

/// Columns the input file must carry. Any others are ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "amount",
    "anomaly_score",
    "is_anomaly",
    "agency",
    "recipient_type",
    "month",
    "day_of_week",
];

/// One row of anomaly-detection output, as read from the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount:         f64,
    pub anomaly_score:  f64,
    pub is_anomaly:     String,
    pub agency:         String,
    pub recipient_type: String,
    pub month:          u32,
    pub day_of_week:    u32,
}

impl TransactionRecord {
    pub fn is_flagged(&self) -> bool {
        self.is_anomaly == ANOMALY_LABEL
    }
}

/// Filtered input is written back out under the input's own names.
impl TableRow for TransactionRecord {
    const HEADERS: &'static [&'static str] = &REQUIRED_COLUMNS;
}

/// Placeholder calendar stamp for a row: synthetic date fields plus a
/// random hour of day. Neither reflects when the payment happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarStamp {
    pub fields: CalendarFields,
    pub hour:   u32,
}

/// An input row with every derived column attached.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub source:      TransactionRecord,
    pub stamp:       CalendarStamp,
    pub risk:        RiskAssessment,
    pub entity_name: EntityKey,
}

impl DerivedRecord {
    pub fn is_flagged(&self) -> bool {
        self.source.is_flagged()
    }

    pub fn risk_score(&self) -> f64 {
        self.risk.risk_score
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk.risk_level
    }
}

//! Output table row types and their column contracts.
//!
//! Column names are fixed: downstream renderers read them by name.
//! Serde renames and `TableRow::HEADERS` must agree; the header test at
//! the bottom of this file checks that they do.

use crate::risk::RiskLevel;
use chrono::NaiveDate;
use serde::Serialize;

/// A row type that can be written as a delimited table.
/// HEADERS is written even when the table has no rows.
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

/// The seven prepared tables, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    AnomalyDetails,
    ExecutiveMetrics,
    TimeSeries,
    EntitySummary,
    HeatmapData,
    FeatureImportance,
    RiskDistribution,
}

impl TableName {
    pub const ALL: [TableName; 7] = [
        Self::AnomalyDetails,
        Self::ExecutiveMetrics,
        Self::TimeSeries,
        Self::EntitySummary,
        Self::HeatmapData,
        Self::FeatureImportance,
        Self::RiskDistribution,
    ];

    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::AnomalyDetails    => "anomaly_details",
            Self::ExecutiveMetrics  => "executive_metrics",
            Self::TimeSeries        => "time_series",
            Self::EntitySummary     => "entity_summary",
            Self::HeatmapData       => "heatmap_data",
            Self::FeatureImportance => "feature_importance",
            Self::RiskDistribution  => "risk_distribution",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.file_stem())
    }
}

// ── anomaly_details ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyDetailRow {
    #[serde(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Transaction_Amount")]
    pub transaction_amount: f64,
    #[serde(rename = "Risk_Score")]
    pub risk_score: f64,
    #[serde(rename = "Risk_Level")]
    pub risk_level: Option<RiskLevel>,
    #[serde(rename = "Agency")]
    pub agency: String,
    #[serde(rename = "Recipient_Type")]
    pub recipient_type: String,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Day_of_Week")]
    pub day_of_week: u32,
    #[serde(rename = "Quarter")]
    pub quarter: u32,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Month_Name")]
    pub month_name: &'static str,
    #[serde(rename = "Week_of_Year")]
    pub week_of_year: u32,
    #[serde(rename = "Hour")]
    pub hour: u32,
    #[serde(rename = "Is_Anomaly")]
    pub is_anomaly: String,
}

impl TableRow for AnomalyDetailRow {
    const HEADERS: &'static [&'static str] = &[
        "Entity", "Date", "Transaction_Amount", "Risk_Score", "Risk_Level",
        "Agency", "Recipient_Type", "Month", "Day_of_Week", "Quarter",
        "Year", "Month_Name", "Week_of_Year", "Hour", "Is_Anomaly",
    ];
}

// ── executive_metrics ───────────────────────────────────────────────

/// Single-row KPI summary.
///
/// NOTE the count labels do not line up with the bucket names:
/// High_Risk_Count is the Critical bucket, Medium_Risk_Count is the
/// High bucket and Low_Risk_Count is Low + Medium. Dashboards already
/// read these names, so they stay as they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveMetrics {
    #[serde(rename = "Total_Transactions")]
    pub total_transactions: u64,
    #[serde(rename = "Anomalies_Detected")]
    pub anomalies_detected: u64,
    #[serde(rename = "Detection_Rate")]
    pub detection_rate: f64,
    #[serde(rename = "Average_Risk_Score")]
    pub average_risk_score: f64,
    #[serde(rename = "Total_Amount_Flagged")]
    pub total_amount_flagged: f64,
    #[serde(rename = "High_Risk_Count")]
    pub high_risk_count: u64,
    #[serde(rename = "Medium_Risk_Count")]
    pub medium_risk_count: u64,
    #[serde(rename = "Low_Risk_Count")]
    pub low_risk_count: u64,
    /// Rows whose score fell outside every risk level.
    #[serde(rename = "Unbucketed_Count")]
    pub unbucketed_count: u64,
}

impl TableRow for ExecutiveMetrics {
    const HEADERS: &'static [&'static str] = &[
        "Total_Transactions", "Anomalies_Detected", "Detection_Rate",
        "Average_Risk_Score", "Total_Amount_Flagged", "High_Risk_Count",
        "Medium_Risk_Count", "Low_Risk_Count", "Unbucketed_Count",
    ];
}

// ── time_series ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRow {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Quarter")]
    pub quarter: u32,
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Total_Amount")]
    pub total_amount: f64,
    #[serde(rename = "Avg_Risk_Score")]
    pub avg_risk_score: f64,
    #[serde(rename = "Anomaly_Count")]
    pub anomaly_count: u64,
}

impl TableRow for TimeSeriesRow {
    const HEADERS: &'static [&'static str] = &[
        "Year", "Quarter", "Month", "Total_Amount", "Avg_Risk_Score", "Anomaly_Count",
    ];
}

// ── entity_summary ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummaryRow {
    #[serde(rename = "Entity")]
    pub entity: String,
    #[serde(rename = "Total_Amount")]
    pub total_amount: f64,
    #[serde(rename = "Avg_Amount")]
    pub avg_amount: f64,
    #[serde(rename = "Anomaly_Count")]
    pub anomaly_count: u64,
    #[serde(rename = "Avg_Risk_Score")]
    pub avg_risk_score: f64,
}

impl TableRow for EntitySummaryRow {
    const HEADERS: &'static [&'static str] = &[
        "Entity", "Total_Amount", "Avg_Amount", "Anomaly_Count", "Avg_Risk_Score",
    ];
}

// ── heatmap_data ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub day_of_week: u32,
    pub hour: u32,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Day_Name")]
    pub day_name: &'static str,
}

impl TableRow for HeatmapRow {
    const HEADERS: &'static [&'static str] = &["day_of_week", "hour", "Count", "Day_Name"];
}

// ── feature_importance ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpactDirection {
    Positive,
    Negative,
}

/// SIMULATED. Random weights over a fixed factor list; carries no
/// information about the data or any model. Illustrative only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedFeatureImportance {
    #[serde(rename = "Feature")]
    pub feature: &'static str,
    #[serde(rename = "Importance")]
    pub importance: f64,
    #[serde(rename = "Impact_Direction")]
    pub impact_direction: ImpactDirection,
    #[serde(rename = "Importance_Percentage")]
    pub importance_percentage: f64,
}

impl TableRow for SimulatedFeatureImportance {
    const HEADERS: &'static [&'static str] = &[
        "Feature", "Importance", "Impact_Direction", "Importance_Percentage",
    ];
}

// ── risk_distribution ───────────────────────────────────────────────

/// Label used in risk_distribution for rows outside every bucket.
pub const UNBUCKETED_LABEL: &str = "Unbucketed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskDistributionRow {
    #[serde(rename = "Risk_Level")]
    pub risk_level: &'static str,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Percentage")]
    pub percentage: f64,
}

impl TableRow for RiskDistributionRow {
    const HEADERS: &'static [&'static str] = &["Risk_Level", "Count", "Percentage"];
}

// ── full set ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardTables {
    pub anomaly_details:    Vec<AnomalyDetailRow>,
    pub executive:          ExecutiveMetrics,
    pub time_series:        Vec<TimeSeriesRow>,
    pub entity_summary:     Vec<EntitySummaryRow>,
    pub heatmap:            Vec<HeatmapRow>,
    pub feature_importance: Vec<SimulatedFeatureImportance>,
    pub risk_distribution:  Vec<RiskDistributionRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serde_headers<T: TableRow>(row: &T) -> Vec<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(row).unwrap();
        let bytes = wtr.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap().to_string();
        header.split(',').map(str::to_string).collect()
    }

    fn assert_headers_match<T: TableRow>(row: &T) {
        let expected: Vec<String> = T::HEADERS.iter().map(|h| h.to_string()).collect();
        assert_eq!(serde_headers(row), expected);
    }

    #[test]
    fn serde_names_match_declared_headers() {
        assert_headers_match(&AnomalyDetailRow {
            entity: "EPA_Nonprofit".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            transaction_amount: 1.0,
            risk_score: 1.0,
            risk_level: Some(RiskLevel::Low),
            agency: "EPA".into(),
            recipient_type: "Nonprofit".into(),
            month: 1,
            day_of_week: 0,
            quarter: 1,
            year: 2024,
            month_name: "January",
            week_of_year: 1,
            hour: 0,
            is_anomaly: "Anomaly".into(),
        });
        assert_headers_match(&ExecutiveMetrics {
            total_transactions: 1,
            anomalies_detected: 0,
            detection_rate: 0.0,
            average_risk_score: 0.0,
            total_amount_flagged: 0.0,
            high_risk_count: 0,
            medium_risk_count: 0,
            low_risk_count: 0,
            unbucketed_count: 0,
        });
        assert_headers_match(&TimeSeriesRow {
            year: 2024, quarter: 1, month: 1, total_amount: 0.0, avg_risk_score: 0.0, anomaly_count: 0,
        });
        assert_headers_match(&EntitySummaryRow {
            entity: "A_B".into(), total_amount: 0.0, avg_amount: 0.0, anomaly_count: 0, avg_risk_score: 0.0,
        });
        assert_headers_match(&HeatmapRow { day_of_week: 0, hour: 0, count: 0, day_name: "Monday" });
        assert_headers_match(&SimulatedFeatureImportance {
            feature: "Time of Day",
            importance: 0.5,
            impact_direction: ImpactDirection::Positive,
            importance_percentage: 12.5,
        });
        assert_headers_match(&RiskDistributionRow { risk_level: "Low", count: 0, percentage: 0.0 });
    }

    #[test]
    fn file_names_are_stable() {
        let names: Vec<String> = TableName::ALL.iter().map(TableName::file_name).collect();
        assert_eq!(names[0], "anomaly_details.csv");
        assert_eq!(names[6], "risk_distribution.csv");
        assert_eq!(names.len(), 7);
    }
}

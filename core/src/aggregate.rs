//! Aggregation: derived rows in, seven dashboard tables out.
//!
//! Only filtering, hash grouping and sum/mean/count reductions. Grouped
//! tables are sorted after grouping so output order never depends on
//! hash iteration order.
//!
//! Anomalous-only tables (time_series, entity_summary, heatmap_data)
//! consider rows whose is_anomaly equals "Anomaly". Executive metrics
//! and risk_distribution consider every row.

use crate::{
    calendar,
    error::{PipelineError, PipelineResult},
    feature_importance::simulate_feature_importance,
    record::DerivedRecord,
    risk::RiskLevel,
    rng::StageRng,
    tables::{
        AnomalyDetailRow, DashboardTables, EntitySummaryRow, ExecutiveMetrics, HeatmapRow,
        RiskDistributionRow, TimeSeriesRow, UNBUCKETED_LABEL,
    },
};
use std::collections::HashMap;

/// Running sums for one group.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    amount:     f64,
    risk_score: f64,
    count:      u64,
}

impl Tally {
    fn add(&mut self, record: &DerivedRecord) {
        self.amount += record.source.amount;
        self.risk_score += record.risk_score();
        self.count += 1;
    }

    fn mean_amount(&self) -> f64 {
        self.amount / self.count as f64
    }

    fn mean_risk_score(&self) -> f64 {
        self.risk_score / self.count as f64
    }
}

/// Produce every dashboard table. `rng` feeds only the simulated
/// feature-importance table.
pub fn aggregate(records: &[DerivedRecord], rng: &mut StageRng) -> PipelineResult<DashboardTables> {
    if records.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let flagged: Vec<&DerivedRecord> = records.iter().filter(|r| r.is_flagged()).collect();

    Ok(DashboardTables {
        anomaly_details:    anomaly_details(records),
        executive:          executive_metrics(records, &flagged),
        time_series:        time_series(&flagged),
        entity_summary:     entity_summary(&flagged),
        heatmap:            heatmap(&flagged),
        feature_importance: simulate_feature_importance(rng),
        risk_distribution:  risk_distribution(records),
    })
}

pub fn anomaly_details(records: &[DerivedRecord]) -> Vec<AnomalyDetailRow> {
    records
        .iter()
        .map(|r| AnomalyDetailRow {
            entity:             r.entity_name.clone(),
            date:               r.stamp.fields.date,
            transaction_amount: r.source.amount,
            risk_score:         r.risk_score(),
            risk_level:         r.risk_level(),
            agency:             r.source.agency.clone(),
            recipient_type:     r.source.recipient_type.clone(),
            month:              r.source.month,
            day_of_week:        r.source.day_of_week,
            quarter:            r.stamp.fields.quarter,
            year:               r.stamp.fields.year,
            month_name:         r.stamp.fields.month_name,
            week_of_year:       r.stamp.fields.week_of_year,
            hour:               r.stamp.hour,
            is_anomaly:         r.source.is_anomaly.clone(),
        })
        .collect()
}

pub fn executive_metrics(records: &[DerivedRecord], flagged: &[&DerivedRecord]) -> ExecutiveMetrics {
    let total = records.len() as u64;
    let anomalies = flagged.len() as u64;
    let levels = level_counts(records);
    let level = |l: RiskLevel| levels.get(&Some(l)).copied().unwrap_or(0);

    let risk_sum: f64 = records.iter().map(DerivedRecord::risk_score).sum();

    ExecutiveMetrics {
        total_transactions:   total,
        anomalies_detected:   anomalies,
        detection_rate:       100.0 * anomalies as f64 / total as f64,
        average_risk_score:   risk_sum / total as f64,
        total_amount_flagged: flagged.iter().map(|r| r.source.amount).sum(),
        high_risk_count:      level(RiskLevel::Critical),
        medium_risk_count:    level(RiskLevel::High),
        low_risk_count:       level(RiskLevel::Low) + level(RiskLevel::Medium),
        unbucketed_count:     levels.get(&None).copied().unwrap_or(0),
    }
}

/// Grouped by (synthetic year, synthetic quarter, input month).
pub fn time_series(flagged: &[&DerivedRecord]) -> Vec<TimeSeriesRow> {
    let mut groups: HashMap<(i32, u32, u32), Tally> = HashMap::new();
    for r in flagged {
        let key = (r.stamp.fields.year, r.stamp.fields.quarter, r.source.month);
        groups.entry(key).or_default().add(r);
    }

    let mut rows: Vec<TimeSeriesRow> = groups
        .into_iter()
        .map(|((year, quarter, month), t)| TimeSeriesRow {
            year,
            quarter,
            month,
            total_amount:   t.amount,
            avg_risk_score: t.mean_risk_score(),
            anomaly_count:  t.count,
        })
        .collect();
    rows.sort_by_key(|r| (r.year, r.quarter, r.month));
    rows
}

/// Busiest entities first; ties broken by entity name.
pub fn entity_summary(flagged: &[&DerivedRecord]) -> Vec<EntitySummaryRow> {
    let mut groups: HashMap<&str, Tally> = HashMap::new();
    for r in flagged {
        groups.entry(r.entity_name.as_str()).or_default().add(r);
    }

    let mut rows: Vec<EntitySummaryRow> = groups
        .into_iter()
        .map(|(entity, t)| EntitySummaryRow {
            entity:         entity.to_string(),
            total_amount:   t.amount,
            avg_amount:     t.mean_amount(),
            anomaly_count:  t.count,
            avg_risk_score: t.mean_risk_score(),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.anomaly_count
            .cmp(&a.anomaly_count)
            .then_with(|| a.entity.cmp(&b.entity))
    });
    rows
}

pub fn heatmap(flagged: &[&DerivedRecord]) -> Vec<HeatmapRow> {
    let mut cells: HashMap<(u32, u32), u64> = HashMap::new();
    for r in flagged {
        *cells.entry((r.source.day_of_week, r.stamp.hour)).or_insert(0) += 1;
    }

    let mut rows: Vec<HeatmapRow> = cells
        .into_iter()
        .map(|((day_of_week, hour), count)| HeatmapRow {
            day_of_week,
            hour,
            count,
            // day_of_week is validated to 0..=6 on ingest.
            day_name: calendar::day_name(day_of_week).unwrap_or(""),
        })
        .collect();
    rows.sort_by_key(|r| (r.day_of_week, r.hour));
    rows
}

/// Every level is listed, zero counts included. An Unbucketed row is
/// appended only when some score fell outside every level, so the
/// counts always add up to the row total.
pub fn risk_distribution(records: &[DerivedRecord]) -> Vec<RiskDistributionRow> {
    let total = records.len() as f64;
    let counts = level_counts(records);

    let mut entries: Vec<(usize, &'static str, u64)> = RiskLevel::ALL
        .iter()
        .enumerate()
        .map(|(rank, l)| (rank, l.label(), counts.get(&Some(*l)).copied().unwrap_or(0)))
        .collect();
    if let Some(&unbucketed) = counts.get(&None) {
        entries.push((RiskLevel::ALL.len(), UNBUCKETED_LABEL, unbucketed));
    }

    entries.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .map(|(_, risk_level, count)| RiskDistributionRow {
            risk_level,
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect()
}

fn level_counts(records: &[DerivedRecord]) -> HashMap<Option<RiskLevel>, u64> {
    let mut counts = HashMap::new();
    for r in records {
        *counts.entry(r.risk_level()).or_insert(0) += 1;
    }
    counts
}

//! Risk score and risk level derivation, end to end through prepare().

use spendrisk_core::{
    config::PipelineConfig,
    error::PipelineError,
    pipeline::PreparationPipeline,
    record::TransactionRecord,
    risk::{OutOfRangePolicy, RiskLevel},
};

fn txn(anomaly_score: f64) -> TransactionRecord {
    TransactionRecord {
        amount: 250.0,
        anomaly_score,
        is_anomaly: "Normal".into(),
        agency: "EPA".into(),
        recipient_type: "Nonprofit".into(),
        month: 3,
        day_of_week: 2,
    }
}

fn pipeline(policy: OutOfRangePolicy) -> PreparationPipeline {
    let config = PipelineConfig { out_of_range: policy, ..PipelineConfig::default_test() };
    PreparationPipeline::with_run_id("risk-test".into(), config)
}

#[test]
fn risk_score_is_scaled_absolute_anomaly_score() {
    let scores = [-0.9, -0.123, 0.0, 0.004, 0.75];
    let rows: Vec<_> = scores.iter().map(|s| txn(*s)).collect();
    let tables = pipeline(OutOfRangePolicy::Count).prepare(&rows).unwrap();

    for (detail, score) in tables.anomaly_details.iter().zip(scores) {
        assert_eq!(detail.risk_score, score.abs() * 100.0);
        assert!(detail.risk_score >= 0.0);
    }
}

#[test]
fn each_boundary_belongs_to_the_lower_level() {
    // 0.01, 0.02, 0.05 scale to exactly 1, 2 and 5.
    let rows = vec![txn(0.01), txn(-0.02), txn(0.05), txn(1.0)];
    let tables = pipeline(OutOfRangePolicy::Count).prepare(&rows).unwrap();
    let levels: Vec<_> = tables.anomaly_details.iter().map(|d| d.risk_level).collect();
    assert_eq!(
        levels,
        vec![
            Some(RiskLevel::Low),
            Some(RiskLevel::Medium),
            Some(RiskLevel::High),
            Some(RiskLevel::Critical),
        ]
    );
}

#[test]
fn interior_scores_land_in_their_level() {
    let rows = vec![txn(0.005), txn(0.015), txn(0.03), txn(0.5)];
    let tables = pipeline(OutOfRangePolicy::Count).prepare(&rows).unwrap();
    let levels: Vec<_> = tables.anomaly_details.iter().filter_map(|d| d.risk_level).collect();
    assert_eq!(levels, RiskLevel::ALL.to_vec());
}

#[test]
fn out_of_range_rows_are_counted_not_dropped() {
    let rows = vec![txn(0.0), txn(1.5), txn(0.5)];
    let tables = pipeline(OutOfRangePolicy::Count).prepare(&rows).unwrap();

    assert_eq!(tables.anomaly_details.len(), 3);
    assert_eq!(tables.anomaly_details[0].risk_level, None);
    assert_eq!(tables.anomaly_details[1].risk_level, None);
    assert_eq!(tables.executive.unbucketed_count, 2);

    let unbucketed = tables
        .risk_distribution
        .iter()
        .find(|r| r.risk_level == "Unbucketed")
        .expect("unbucketed row present");
    assert_eq!(unbucketed.count, 2);
}

#[test]
fn clamp_policy_leaves_nothing_unbucketed() {
    let rows = vec![txn(0.0), txn(1.5)];
    let tables = pipeline(OutOfRangePolicy::Clamp).prepare(&rows).unwrap();
    assert_eq!(tables.executive.unbucketed_count, 0);
    assert_eq!(tables.anomaly_details[0].risk_level, Some(RiskLevel::Low));
    assert_eq!(tables.anomaly_details[1].risk_level, Some(RiskLevel::Critical));
    assert!(tables.risk_distribution.iter().all(|r| r.risk_level != "Unbucketed"));
}

#[test]
fn reject_policy_aborts_with_bucketing_error() {
    let rows = vec![txn(0.5), txn(0.5), txn(-2.0)];
    match pipeline(OutOfRangePolicy::Reject).prepare(&rows) {
        Err(PipelineError::Bucketing { row, .. }) => assert_eq!(row, 3),
        other => panic!("expected Bucketing error, got {other:?}"),
    }
}

#[test]
fn entity_key_joins_agency_and_recipient_type() {
    let tables = pipeline(OutOfRangePolicy::Count).prepare(&[txn(0.5)]).unwrap();
    assert_eq!(tables.anomaly_details[0].entity, "EPA_Nonprofit");
}

#[test]
fn missing_agency_fails_before_anything_is_built() {
    let mut row = txn(0.5);
    row.agency.clear();
    match pipeline(OutOfRangePolicy::Count).prepare(&[txn(0.5), row]) {
        Err(PipelineError::MissingField { field, row }) => {
            assert_eq!(field, "agency");
            assert_eq!(row, Some(2));
        }
        other => panic!("expected MissingField error, got {other:?}"),
    }
}

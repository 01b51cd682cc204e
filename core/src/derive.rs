//! Per-row derivations: calendar stamp, risk, entity key.
//!
//! Each derivation takes the raw rows and returns one value per row, in
//! input order. `derive_records` zips them into DerivedRecords.

use crate::{
    calendar::SyntheticCalendar,
    error::{PipelineError, PipelineResult},
    record::{CalendarStamp, DerivedRecord, TransactionRecord},
    risk::{self, OutOfRangePolicy, RiskAssessment},
    rng::StageRng,
    types::EntityKey,
};

const HOURS_PER_DAY: u64 = 24;

/// Stamp each row with its synthetic date and a random hour.
/// Deterministic for a given epoch and RNG stream.
pub fn derive_calendar_fields(
    rows: &[TransactionRecord],
    calendar: &SyntheticCalendar,
    rng: &mut StageRng,
) -> PipelineResult<Vec<CalendarStamp>> {
    (1..=rows.len())
        .map(|row| {
            Ok(CalendarStamp {
                fields: calendar.fields_for(row)?,
                hour:   rng.next_u64_below(HOURS_PER_DAY) as u32,
            })
        })
        .collect()
}

/// Risk score and level for each row. Depends only on `anomaly_score`.
pub fn compute_risk(
    rows: &[TransactionRecord],
    policy: OutOfRangePolicy,
) -> PipelineResult<Vec<RiskAssessment>> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| risk::assess(r.anomaly_score, policy, i + 1))
        .collect()
}

/// `{agency}_{recipient_type}` for each row.
/// An empty agency or recipient type is a MissingField error.
pub fn build_entity_key(rows: &[TransactionRecord]) -> PipelineResult<Vec<EntityKey>> {
    rows.iter()
        .enumerate()
        .map(|(i, r)| entity_key(&r.agency, &r.recipient_type, i + 1))
        .collect()
}

fn entity_key(agency: &str, recipient_type: &str, row: usize) -> PipelineResult<EntityKey> {
    if agency.is_empty() {
        return Err(PipelineError::MissingField { field: "agency".into(), row: Some(row) });
    }
    if recipient_type.is_empty() {
        return Err(PipelineError::MissingField { field: "recipient_type".into(), row: Some(row) });
    }
    Ok(format!("{agency}_{recipient_type}"))
}

/// Run every derivation and assemble the derived rows.
pub fn derive_records(
    rows: &[TransactionRecord],
    calendar: &SyntheticCalendar,
    policy: OutOfRangePolicy,
    rng: &mut StageRng,
) -> PipelineResult<Vec<DerivedRecord>> {
    let entities = build_entity_key(rows)?;
    let risks = compute_risk(rows, policy)?;
    let stamps = derive_calendar_fields(rows, calendar, rng)?;

    Ok(rows
        .iter()
        .zip(stamps)
        .zip(risks)
        .zip(entities)
        .map(|(((source, stamp), risk), entity_name)| DerivedRecord {
            source: source.clone(),
            stamp,
            risk,
            entity_name,
        })
        .collect())
}

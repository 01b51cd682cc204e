//! Exploration filters over the raw input.
//!
//! Works on TransactionRecords as read, never on the prepared tables:
//! narrow by agency subset and inclusive amount range, then summarise
//! the amount distribution overall (histogram) and per agency (spread).

use crate::{
    error::{PipelineError, PipelineResult},
    export::{ensure_dir, write_table},
    record::TransactionRecord,
    tables::TableRow,
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

pub const FILTERED_TABLE: &str = "filtered_transactions";
pub const HISTOGRAM_TABLE: &str = "amount_histogram";
pub const SPREAD_TABLE: &str = "agency_spread";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorationFilter {
    /// None keeps every agency.
    pub agencies:   Option<BTreeSet<String>>,
    /// Inclusive bounds; None means unbounded on that side, which is the
    /// same as the observed minimum or maximum.
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl ExplorationFilter {
    pub fn validate(&self) -> PipelineResult<()> {
        if let (Some(lo), Some(hi)) = (self.min_amount, self.max_amount) {
            if lo > hi {
                return Err(PipelineError::InvalidConfig {
                    reason: format!("amount range is inverted: min {lo} > max {hi}"),
                });
            }
        }
        Ok(())
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        let agency_ok = self
            .agencies
            .as_ref()
            .is_none_or(|set| set.contains(&record.agency));
        let min_ok = self.min_amount.is_none_or(|lo| record.amount >= lo);
        let max_ok = self.max_amount.is_none_or(|hi| record.amount <= hi);
        agency_ok && min_ok && max_ok
    }

    pub fn apply(&self, records: &[TransactionRecord]) -> PipelineResult<Vec<TransactionRecord>> {
        self.validate()?;
        Ok(records.iter().filter(|r| self.matches(r)).cloned().collect())
    }
}

/// Observed (min, max) amount, or None for no rows.
pub fn amount_bounds(records: &[TransactionRecord]) -> Option<(f64, f64)> {
    records.iter().map(|r| r.amount).fold(None, |acc, a| match acc {
        None => Some((a, a)),
        Some((lo, hi)) => Some((lo.min(a), hi.max(a))),
    })
}

/// Every distinct agency, sorted.
pub fn agencies(records: &[TransactionRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.agency.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    #[serde(rename = "Bin_Start")]
    pub bin_start: f64,
    #[serde(rename = "Bin_End")]
    pub bin_end: f64,
    #[serde(rename = "Count")]
    pub count: u64,
}

impl TableRow for HistogramBin {
    const HEADERS: &'static [&'static str] = &["Bin_Start", "Bin_End", "Count"];
}

/// Equal-width bins over the observed amount range. The maximum lands in
/// the last bin. A single distinct amount gets a unit-wide range
/// centred on it.
pub fn amount_histogram(records: &[TransactionRecord], bins: usize) -> Vec<HistogramBin> {
    let Some((lo, hi)) = amount_bounds(records) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0u64; bins];
    for r in records {
        let idx = ((r.amount - lo) / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            bin_start: lo + width * i as f64,
            bin_end:   if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Box-plot statistics for one agency's amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencySpread {
    #[serde(rename = "Agency")]
    pub agency: String,
    #[serde(rename = "Count")]
    pub count: u64,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Q1")]
    pub q1: f64,
    #[serde(rename = "Median")]
    pub median: f64,
    #[serde(rename = "Q3")]
    pub q3: f64,
    #[serde(rename = "Max")]
    pub max: f64,
}

impl TableRow for AgencySpread {
    const HEADERS: &'static [&'static str] = &["Agency", "Count", "Min", "Q1", "Median", "Q3", "Max"];
}

pub fn agency_spread(records: &[TransactionRecord]) -> Vec<AgencySpread> {
    let mut by_agency: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        by_agency.entry(r.agency.as_str()).or_default().push(r.amount);
    }

    by_agency
        .into_iter()
        .map(|(agency, mut amounts)| {
            amounts.sort_by(f64::total_cmp);
            AgencySpread {
                agency: agency.to_string(),
                count:  amounts.len() as u64,
                min:    amounts[0],
                q1:     quantile(&amounts, 0.25),
                median: quantile(&amounts, 0.5),
                q3:     quantile(&amounts, 0.75),
                max:    amounts[amounts.len() - 1],
            }
        })
        .collect()
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationOutcome {
    pub rows:      Vec<TransactionRecord>,
    pub histogram: Vec<HistogramBin>,
    pub spread:    Vec<AgencySpread>,
}

/// Filter, then summarise what is left.
pub fn explore(records: &[TransactionRecord], filter: &ExplorationFilter) -> PipelineResult<ExplorationOutcome> {
    let rows = filter.apply(records)?;
    log::info!("exploration filter kept {} of {} rows", rows.len(), records.len());
    Ok(ExplorationOutcome {
        histogram: amount_histogram(&rows, DEFAULT_HISTOGRAM_BINS),
        spread:    agency_spread(&rows),
        rows,
    })
}

/// Write the three exploration tables into `dir`.
pub fn export_exploration(outcome: &ExplorationOutcome, dir: &Path, delimiter: u8) -> PipelineResult<()> {
    ensure_dir(dir)?;
    let path = |stem: &str| dir.join(format!("{stem}.csv"));
    write_table(&path(FILTERED_TABLE), &outcome.rows, delimiter)?;
    write_table(&path(HISTOGRAM_TABLE), &outcome.histogram, delimiter)?;
    write_table(&path(SPREAD_TABLE), &outcome.spread, delimiter)?;
    log::info!("exported exploration tables to {}", dir.display());
    Ok(())
}

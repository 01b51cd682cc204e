//! The preparation pipeline.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Read input           (ingest.rs)
//!   2. Reject empty input
//!   3. Entity keys          (fail loudly on missing agency/recipient)
//!   4. Risk score and level (out-of-range policy applied)
//!   5. Calendar stamp       (Calendar RNG stream)
//!   6. Aggregate            (FeatureImportance RNG stream)
//!   7. Export               (export.rs)
//!
//! RULES:
//!   - Steps 1-6 touch no output file. Any validation failure leaves
//!     the output directory exactly as it was.
//!   - All randomness flows through the RngBank built from the seed.
//!   - The run id goes to logs and the run summary, never into a table,
//!     so reruns with the same seed write byte-identical files.

use crate::{
    aggregate::aggregate,
    config::PipelineConfig,
    derive::derive_records,
    error::{PipelineError, PipelineResult},
    export::{export, ExportReport},
    ingest::read_transactions,
    record::TransactionRecord,
    rng::{RngBank, StageSlot},
    tables::DashboardTables,
    types::RunId,
};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

pub struct PreparationPipeline {
    pub run_id:   RunId,
    pub config:   PipelineConfig,
    pub rng_bank: RngBank,
}

/// End-of-run figures, printed by the runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id:              RunId,
    pub seed:                u64,
    pub total_transactions:  u64,
    pub anomalies_detected:  u64,
    pub detection_rate:      f64,
    pub unbucketed_count:    u64,
    pub files_created:       usize,
    pub output_dir:          PathBuf,
}

impl PreparationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_run_id(format!("prep-{}", Uuid::new_v4()), config)
    }

    pub fn with_run_id(run_id: RunId, config: PipelineConfig) -> Self {
        Self {
            rng_bank: RngBank::new(config.seed),
            run_id,
            config,
        }
    }

    /// Steps 2-6: derive and aggregate, no file access.
    pub fn prepare(&self, records: &[TransactionRecord]) -> PipelineResult<DashboardTables> {
        if records.is_empty() {
            log::error!("run {}: input has no rows, nothing written", self.run_id);
            return Err(PipelineError::EmptyInput);
        }

        let mut calendar_rng = self.rng_bank.for_stage(StageSlot::Calendar);
        let derived = derive_records(
            records,
            &self.config.calendar(),
            self.config.out_of_range,
            &mut calendar_rng,
        )?;
        log::info!("run {}: derived {} rows", self.run_id, derived.len());

        let mut feature_rng = self.rng_bank.for_stage(StageSlot::FeatureImportance);
        let tables = aggregate(&derived, &mut feature_rng)?;
        log::info!(
            "run {}: feature_importance is simulated from seed {} and carries no signal",
            self.run_id,
            self.rng_bank.master_seed()
        );

        let unbucketed = tables.executive.unbucketed_count;
        if unbucketed > 0 {
            log::warn!(
                "run {}: {unbucketed} rows have a risk score outside every risk level",
                self.run_id
            );
        }
        Ok(tables)
    }

    /// Prepare and export already-loaded records.
    pub fn run_records(&self, records: &[TransactionRecord]) -> PipelineResult<RunSummary> {
        let delimiter = self.config.delimiter_byte()?;
        let tables = self.prepare(records)?;
        let report = export(&tables, &self.config.output_dir, delimiter)?;
        Ok(self.summarize(&tables, &report))
    }

    /// Full run: read the configured input, prepare, export.
    pub fn run(&self) -> PipelineResult<RunSummary> {
        self.config.validate()?;
        log::info!(
            "run {}: seed={} input={} out={}",
            self.run_id,
            self.config.seed,
            self.config.input_path.display(),
            self.config.output_dir.display()
        );
        let records = read_transactions(&self.config.input_path, self.config.delimiter_byte()?)?;
        self.run_records(&records)
    }

    fn summarize(&self, tables: &DashboardTables, report: &ExportReport) -> RunSummary {
        let exec = &tables.executive;
        RunSummary {
            run_id:             self.run_id.clone(),
            seed:               self.config.seed,
            total_transactions: exec.total_transactions,
            anomalies_detected: exec.anomalies_detected,
            detection_rate:     exec.detection_rate,
            unbucketed_count:   exec.unbucketed_count,
            files_created:      report.files_created(),
            output_dir:         report.directory.clone(),
        }
    }
}

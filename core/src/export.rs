//! Flat-file writer for prepared tables.
//!
//! RULE: Only export.rs writes output files.
//! Files are overwritten unconditionally. There is no append or merge.

use crate::{
    error::{PipelineError, PipelineResult},
    tables::{DashboardTables, TableName, TableRow},
};
use csv::WriterBuilder;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What a successful export put on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub written:   Vec<TableName>,
}

impl ExportReport {
    pub fn files_created(&self) -> usize {
        self.written.len()
    }

    pub fn path_of(&self, table: TableName) -> PathBuf {
        self.directory.join(table.file_name())
    }
}

/// Write all seven tables into `dir`, creating it if needed.
///
/// Tables are written in `TableName::ALL` order. If one fails, the
/// error lists the tables already written; later tables are skipped.
pub fn export(tables: &DashboardTables, dir: &Path, delimiter: u8) -> PipelineResult<ExportReport> {
    ensure_dir(dir)?;

    let mut written = Vec::with_capacity(TableName::ALL.len());
    for table in TableName::ALL {
        let path = dir.join(table.file_name());
        let result = match table {
            TableName::AnomalyDetails    => write_table(&path, &tables.anomaly_details, delimiter),
            TableName::ExecutiveMetrics  => write_table(&path, std::slice::from_ref(&tables.executive), delimiter),
            TableName::TimeSeries        => write_table(&path, &tables.time_series, delimiter),
            TableName::EntitySummary     => write_table(&path, &tables.entity_summary, delimiter),
            TableName::HeatmapData       => write_table(&path, &tables.heatmap, delimiter),
            TableName::FeatureImportance => write_table(&path, &tables.feature_importance, delimiter),
            TableName::RiskDistribution  => write_table(&path, &tables.risk_distribution, delimiter),
        };
        if let Err(source) = result {
            log::error!(
                "writing {} failed after {} tables: {source}",
                path.display(),
                written.len()
            );
            return Err(PipelineError::Export { table, written, source });
        }
        log::debug!("wrote {}", path.display());
        written.push(table);
    }

    log::info!("exported {} tables to {}", written.len(), dir.display());
    Ok(ExportReport {
        directory: dir.to_path_buf(),
        written,
    })
}

pub(crate) fn ensure_dir(dir: &Path) -> PipelineResult<()> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Header row, then one line per row. The header is written even for an
/// empty table so consumers can always read the column contract.
pub(crate) fn write_table<T: TableRow>(path: &Path, rows: &[T], delimiter: u8) -> Result<(), csv::Error> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(T::HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

//! Input reader.
//!
//! RULE: Only ingest.rs reads input files and only export.rs writes
//! output files. Everything between them is pure.
//!
//! The header is checked for every required column before any row is
//! parsed, so a misconfigured input fails before any work is done.

use crate::{
    error::{PipelineError, PipelineResult},
    record::{TransactionRecord, REQUIRED_COLUMNS},
    types::RowNumber,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{fs::File, io::Read, path::Path, str::FromStr};

/// Position of each required column in the input header.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    amount:         usize,
    anomaly_score:  usize,
    is_anomaly:     usize,
    agency:         usize,
    recipient_type: usize,
    month:          usize,
    day_of_week:    usize,
}

impl ColumnMap {
    fn from_header(header: &StringRecord) -> PipelineResult<Self> {
        let find = |name: &str| header.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| find(*c).is_none())
            .collect();
        if !missing.is_empty() {
            log::error!("input header is missing required columns: {missing:?}");
            return Err(PipelineError::MissingField { field: missing.join(", "), row: None });
        }

        let at = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            amount:         at("amount"),
            anomaly_score:  at("anomaly_score"),
            is_anomaly:     at("is_anomaly"),
            agency:         at("agency"),
            recipient_type: at("recipient_type"),
            month:          at("month"),
            day_of_week:    at("day_of_week"),
        })
    }
}

/// Read transactions from a delimited file.
pub fn read_transactions(path: &Path, delimiter: u8) -> PipelineResult<Vec<TransactionRecord>> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_transactions_from(file, delimiter)?;
    log::info!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read transactions from any reader. An input with a header but no
/// data rows yields an empty vec; emptiness is the caller's concern.
pub fn read_transactions_from<R: Read>(reader: R, delimiter: u8) -> PipelineResult<Vec<TransactionRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::from_header(rdr.headers()?)?;

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        rows.push(parse_row(&record, &columns, i + 1)?);
    }
    Ok(rows)
}

fn parse_row(record: &StringRecord, cols: &ColumnMap, row: RowNumber) -> PipelineResult<TransactionRecord> {
    let text = |idx: usize| record.get(idx).unwrap_or("");

    let amount = parse_finite(text(cols.amount), "amount", row)?;
    if amount < 0.0 {
        return Err(malformed(row, "amount", text(cols.amount)));
    }

    let day_of_week: u32 = parse_field(text(cols.day_of_week), "day_of_week", row)?;
    if day_of_week > 6 {
        return Err(malformed(row, "day_of_week", text(cols.day_of_week)));
    }

    Ok(TransactionRecord {
        amount,
        anomaly_score:  parse_finite(text(cols.anomaly_score), "anomaly_score", row)?,
        is_anomaly:     text(cols.is_anomaly).to_string(),
        agency:         text(cols.agency).to_string(),
        recipient_type: text(cols.recipient_type).to_string(),
        month:          parse_field(text(cols.month), "month", row)?,
        day_of_week,
    })
}

fn parse_field<T: FromStr>(raw: &str, field: &str, row: RowNumber) -> PipelineResult<T> {
    raw.parse().map_err(|_| malformed(row, field, raw))
}

fn parse_finite(raw: &str, field: &str, row: RowNumber) -> PipelineResult<f64> {
    let value: f64 = parse_field(raw, field, row)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(malformed(row, field, raw))
    }
}

fn malformed(row: RowNumber, field: &str, value: &str) -> PipelineError {
    PipelineError::Malformed {
        row,
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "amount,anomaly_score,is_anomaly,agency,recipient_type,month,day_of_week";

    #[test]
    fn reads_required_columns_in_any_order_and_ignores_extras() {
        let input = "department,day_of_week,month,recipient_type,agency,is_anomaly,anomaly_score,amount\n\
                     IT,3,7,Nonprofit,EPA,Anomaly,-0.04,1500.5\n";
        let rows = read_transactions_from(input.as_bytes(), b',').unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.amount, 1500.5);
        assert_eq!(r.anomaly_score, -0.04);
        assert!(r.is_flagged());
        assert_eq!(r.agency, "EPA");
        assert_eq!(r.month, 7);
        assert_eq!(r.day_of_week, 3);
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let input = "amount,anomaly_score,is_anomaly,agency\n1,0.1,Normal,EPA\n";
        match read_transactions_from(input.as_bytes(), b',').unwrap_err() {
            PipelineError::MissingField { field, row } => {
                assert_eq!(field, "recipient_type, month, day_of_week");
                assert_eq!(row, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_only_input_is_empty_not_an_error() {
        let input = format!("{HEADER}\n");
        assert!(read_transactions_from(input.as_bytes(), b',').unwrap().is_empty());
    }

    #[test]
    fn bad_number_names_row_and_field() {
        let input = format!("{HEADER}\n10,0.1,Normal,EPA,Gov,1,0\n10,abc,Normal,EPA,Gov,1,0\n");
        match read_transactions_from(input.as_bytes(), b',').unwrap_err() {
            PipelineError::Malformed { row, field, value } => {
                assert_eq!(row, 2);
                assert_eq!(field, "anomaly_score");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn day_of_week_outside_week_is_malformed() {
        let input = format!("{HEADER}\n10,0.1,Normal,EPA,Gov,1,7\n");
        assert!(matches!(
            read_transactions_from(input.as_bytes(), b','),
            Err(PipelineError::Malformed { .. })
        ));
    }

    #[test]
    fn negative_amount_and_nan_score_are_malformed() {
        let neg = format!("{HEADER}\n-5,0.1,Normal,EPA,Gov,1,0\n");
        assert!(read_transactions_from(neg.as_bytes(), b',').is_err());
        let nan = format!("{HEADER}\n5,NaN,Normal,EPA,Gov,1,0\n");
        assert!(read_transactions_from(nan.as_bytes(), b',').is_err());
    }

    #[test]
    fn honours_custom_delimiter() {
        let input = "amount;anomaly_score;is_anomaly;agency;recipient_type;month;day_of_week\n\
                     2;0.5;Normal;DOD;Contractor;12;6\n";
        let rows = read_transactions_from(input.as_bytes(), b';').unwrap();
        assert_eq!(rows[0].recipient_type, "Contractor");
    }
}

//! CSV loaders for the optional data joins: model-portfolio records and
//! fundamental series. Empty fields parse as absent, matching the optional
//! fields on the domain records.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::error::SignallocError;
use crate::domain::fundamentals::{AnalystEstimate, DcfValuation, EarningsSurprise};
use crate::domain::snapshot::ModelAllocation;

fn read_records(path: &Path) -> Result<Vec<csv::StringRecord>, SignallocError> {
    let content = fs::read_to_string(path).map_err(|e| SignallocError::Data {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    rdr.records()
        .map(|r| {
            r.map_err(|e| SignallocError::Data {
                reason: format!("CSV parse error in {}: {e}", path.display()),
            })
        })
        .collect()
}

fn parse_date(record: &csv::StringRecord, index: usize) -> Result<NaiveDate, SignallocError> {
    let raw = record.get(index).ok_or_else(|| SignallocError::Data {
        reason: "missing date column".into(),
    })?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| SignallocError::Data {
        reason: format!("invalid date format: {e}"),
    })
}

/// Empty or missing fields are `None`; anything else must parse.
fn parse_optional(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<Option<f64>, SignallocError> {
    match record.get(index) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| SignallocError::Data {
                reason: format!("invalid {name} value: {e}"),
            }),
    }
}

/// Load `date,symbol,weight` rows into chronological model-allocation
/// records, one per date.
pub fn load_model_allocations(path: &Path) -> Result<Vec<ModelAllocation>, SignallocError> {
    let mut by_date: HashMap<NaiveDate, HashMap<String, f64>> = HashMap::new();

    for record in read_records(path)? {
        let date = parse_date(&record, 0)?;
        let symbol = record
            .get(1)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SignallocError::Data {
                reason: "missing symbol column".into(),
            })?
            .to_uppercase();
        let weight: f64 = record
            .get(2)
            .ok_or_else(|| SignallocError::Data {
                reason: "missing weight column".into(),
            })?
            .parse()
            .map_err(|e| SignallocError::Data {
                reason: format!("invalid weight value: {e}"),
            })?;
        by_date.entry(date).or_default().insert(symbol, weight);
    }

    let mut records: Vec<ModelAllocation> = by_date
        .into_iter()
        .map(|(date, weights)| ModelAllocation { date, weights })
        .collect();
    records.sort_by_key(|r| r.date);
    Ok(records)
}

/// Load `date,eps_estimated,eps_actual` rows, oldest first.
pub fn load_earnings(path: &Path) -> Result<Vec<EarningsSurprise>, SignallocError> {
    let mut records = Vec::new();
    for record in read_records(path)? {
        records.push(EarningsSurprise {
            date: parse_date(&record, 0)?,
            eps_estimated: parse_optional(&record, 1, "eps_estimated")?,
            eps_actual: parse_optional(&record, 2, "eps_actual")?,
        });
    }
    records.sort_by_key(|r| r.date);
    Ok(records)
}

/// Load `date,ebitda_estimated,ebitda_actual` rows, oldest first.
pub fn load_estimates(path: &Path) -> Result<Vec<AnalystEstimate>, SignallocError> {
    let mut records = Vec::new();
    for record in read_records(path)? {
        records.push(AnalystEstimate {
            date: parse_date(&record, 0)?,
            ebitda_estimated: parse_optional(&record, 1, "ebitda_estimated")?,
            ebitda_actual: parse_optional(&record, 2, "ebitda_actual")?,
        });
    }
    records.sort_by_key(|r| r.date);
    Ok(records)
}

/// Load `date,model_price` rows, oldest first.
pub fn load_valuations(path: &Path) -> Result<Vec<DcfValuation>, SignallocError> {
    let mut records = Vec::new();
    for record in read_records(path)? {
        records.push(DcfValuation {
            date: parse_date(&record, 0)?,
            model_price: parse_optional(&record, 1, "model_price")?,
        });
    }
    records.sort_by_key(|r| r.date);
    Ok(records)
}

use std::cmp::Ordering;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{CellValue, ObservationColumn, ObservationRecord, ObservationTable, RawTable};
use super::source::RecordSource;

/// Report columns never shown. Matched after lower-casing, trimming and
/// replacing `_` with a space.
const DROPPED_COLUMNS: [&str; 9] = [
    "activity name",
    "activity tag list",
    "input",
    "job id",
    "activity id",
    "activity tag",
    "property",
    "season",
    "crop stage",
];

/// Source header → presented header.
const RENAMES: [(&str, &str); 1] = [("Paddock", "Field")];

#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("column '{column}' holds a value that is not a date: {value:?}")]
    UnparseableDate { column: String, value: String },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Fetch the report from `source` and shape it for display.
pub fn load(source: &dyn RecordSource) -> Result<ObservationTable> {
    let raw = source.fetch()?;
    if raw.is_empty() {
        log::warn!("{} returned no rows", source.describe());
    }
    log::info!(
        "Fetched {} rows with columns {:?} from {}",
        raw.len(),
        raw.columns,
        source.describe()
    );
    let table = shape(raw)?;
    log::info!("Shaped {} observations into {:?}", table.len(), table.columns);
    Ok(table)
}

/// Turn raw report rows into the presented table:
///
/// 1. coerce every column with "date" in its name to datetimes (best effort)
/// 2. drop the irrelevant report columns
/// 3. rename `Paddock` to `Field`
/// 4. truncate `Date Created` to a calendar date
/// 5. sort by `Field` ascending, nulls last
/// 6. keep only the presented columns, in their fixed order
pub fn shape(mut raw: RawTable) -> Result<ObservationTable, ShapeError> {
    coerce_date_columns(&mut raw);
    drop_irrelevant_columns(&mut raw);
    rename_columns(&mut raw);
    truncate_date_created(&mut raw)?;
    sort_by_field(&mut raw);
    Ok(project(&raw))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn coerce_date_columns(raw: &mut RawTable) {
    for idx in 0..raw.columns.len() {
        if !raw.columns[idx].to_lowercase().contains("date") {
            continue;
        }
        let converted: Option<Vec<CellValue>> =
            raw.rows.iter().map(|row| coerce_datetime(&row[idx])).collect();
        match converted {
            Some(cells) => {
                for (row, cell) in raw.rows.iter_mut().zip(cells) {
                    row[idx] = cell;
                }
            }
            None => log::warn!(
                "Column '{}' has non-date values, leaving it as-is",
                raw.columns[idx]
            ),
        }
    }
}

/// `None` when the cell cannot be read as a date or datetime.
fn coerce_datetime(cell: &CellValue) -> Option<CellValue> {
    match cell {
        CellValue::Null => Some(CellValue::Null),
        CellValue::DateTime(dt) => Some(CellValue::DateTime(*dt)),
        CellValue::Date(d) => d.and_hms_opt(0, 0, 0).map(CellValue::DateTime),
        CellValue::String(s) => parse_datetime(s.trim()).map(CellValue::DateTime),
        _ => None,
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%B %d, %Y", "%d %B %Y", "%m/%d/%Y"];

/// Text with an offset keeps its own wall-clock time, so the calendar day is
/// the one the observation was recorded on.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn normalize_name(name: &str) -> String {
    name.to_lowercase().trim().replace('_', " ")
}

fn drop_irrelevant_columns(raw: &mut RawTable) {
    let keep: Vec<usize> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !DROPPED_COLUMNS.contains(&normalize_name(name).as_str()))
        .map(|(i, _)| i)
        .collect();
    if keep.len() == raw.columns.len() {
        return;
    }

    raw.columns = keep.iter().map(|&i| raw.columns[i].clone()).collect();
    for row in &mut raw.rows {
        *row = keep.iter().map(|&i| row[i].clone()).collect();
    }
}

fn rename_columns(raw: &mut RawTable) {
    for name in &mut raw.columns {
        if let Some((_, to)) = RENAMES.iter().find(|(from, _)| *from == name.as_str()) {
            *name = to.to_string();
        }
    }
}

fn truncate_date_created(raw: &mut RawTable) -> Result<(), ShapeError> {
    let label = ObservationColumn::DateCreated.label();
    let Some(idx) = raw.column_index(label) else {
        return Ok(());
    };
    for row in &mut raw.rows {
        row[idx] = match &row[idx] {
            CellValue::Null => CellValue::Null,
            CellValue::Date(d) => CellValue::Date(*d),
            CellValue::DateTime(dt) => CellValue::Date(dt.date()),
            other => {
                return Err(ShapeError::UnparseableDate {
                    column: label.to_string(),
                    value: other.to_string(),
                })
            }
        };
    }
    Ok(())
}

fn sort_by_field(raw: &mut RawTable) {
    let Some(idx) = raw.column_index(ObservationColumn::Field.label()) else {
        return;
    };
    raw.rows.sort_by(|a, b| nulls_last(&a[idx], &b[idx]));
}

fn nulls_last(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

fn project(raw: &RawTable) -> ObservationTable {
    let present: Vec<(ObservationColumn, usize)> = ObservationColumn::ORDER
        .into_iter()
        .filter_map(|col| raw.column_index(col.label()).map(|idx| (col, idx)))
        .collect();

    let records = raw
        .rows
        .iter()
        .map(|row| {
            let mut record = ObservationRecord::default();
            for &(col, idx) in &present {
                match col {
                    ObservationColumn::DateCreated => {
                        record.date_created = match &row[idx] {
                            CellValue::Date(d) => Some(*d),
                            _ => None,
                        }
                    }
                    other => record.set_text(other, row[idx].to_text()),
                }
            }
            record
        })
        .collect();

    ObservationTable {
        columns: present.into_iter().map(|(col, _)| col).collect(),
        records,
    }
}

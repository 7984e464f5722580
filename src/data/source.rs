use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use super::model::{CellValue, RawTable};
use crate::config::{Config, DatabaseConfig};

// ---------------------------------------------------------------------------
// RecordSource – where raw report rows come from
// ---------------------------------------------------------------------------

pub trait RecordSource {
    /// Human-readable origin, shown in the status bar and logs.
    fn describe(&self) -> String;

    /// Fetch every row of the report, untouched.
    fn fetch(&self) -> Result<RawTable>;
}

/// Pick the source named by the config: a CSV snapshot when one is set,
/// the Postgres report table otherwise.
pub fn source_from_config(config: &Config) -> Box<dyn RecordSource> {
    match &config.source.snapshot {
        Some(path) => Box::new(CsvSource::new(path.clone())),
        None => Box::new(PostgresSource::new(config.database.clone())),
    }
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

pub struct PostgresSource {
    config: DatabaseConfig,
}

impl PostgresSource {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    fn query(&self) -> Result<String> {
        if !is_plain_identifier(&self.config.table) {
            bail!("Refusing to query table name {:?}", self.config.table);
        }
        Ok(format!("SELECT * FROM {}", self.config.table))
    }

    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.name)
            .username(&self.config.user);
        match &self.config.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

impl RecordSource for PostgresSource {
    fn describe(&self) -> String {
        format!(
            "postgres://{}@{}:{}/{} ({})",
            self.config.user, self.config.host, self.config.port, self.config.name, self.config.table
        )
    }

    fn fetch(&self) -> Result<RawTable> {
        let sql = self.query()?;
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let options = self.connect_options();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("starting tokio runtime")?;

        runtime.block_on(async move {
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(timeout)
                .connect_with(options)
                .await
                .context("connecting to Postgres")?;

            log::debug!("Running {sql}");
            let rows: Vec<PgRow> = sqlx::query(&sql)
                .fetch_all(&pool)
                .await
                .with_context(|| format!("running `{sql}`"))?;
            pool.close().await;

            rows_to_table(&rows)
        })
    }
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// How a Postgres column is decoded into a [`CellValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PgKind {
    Text,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Bool,
    Date,
    Timestamp,
    TimestampTz,
    Unsupported,
}

fn pg_kind(type_name: &str) -> PgKind {
    // Extension types such as citext report lower-case names.
    match type_name.to_ascii_uppercase().as_str() {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => PgKind::Text,
        "INT2" => PgKind::Int2,
        "INT4" => PgKind::Int4,
        "INT8" => PgKind::Int8,
        "FLOAT4" => PgKind::Float4,
        "FLOAT8" => PgKind::Float8,
        "BOOL" => PgKind::Bool,
        "DATE" => PgKind::Date,
        "TIMESTAMP" => PgKind::Timestamp,
        "TIMESTAMPTZ" => PgKind::TimestampTz,
        _ => PgKind::Unsupported,
    }
}

fn rows_to_table(rows: &[PgRow]) -> Result<RawTable> {
    let Some(first) = rows.first() else {
        return Ok(RawTable::default());
    };

    let columns: Vec<(String, String)> = first
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.type_info().name().to_string()))
        .collect();
    let kinds: Vec<PgKind> = columns.iter().map(|(_, ty)| pg_kind(ty)).collect();

    let mut out = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.iter().enumerate() {
        let cells = kinds
            .iter()
            .enumerate()
            .map(|(idx, kind)| {
                decode_cell(row, idx, *kind, &columns[idx].1).with_context(|| {
                    format!("Row {row_no}: failed to decode '{}'", columns[idx].0)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        out.push(cells);
    }

    Ok(RawTable::new(
        columns.into_iter().map(|(name, _)| name).collect(),
        out,
    ))
}

fn decode_cell(row: &PgRow, idx: usize, kind: PgKind, type_name: &str) -> Result<CellValue> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(CellValue::Null);
    }
    let value = match kind {
        PgKind::Text => CellValue::String(row.try_get::<String, _>(idx)?),
        PgKind::Int2 => CellValue::Integer(row.try_get::<i16, _>(idx)? as i64),
        PgKind::Int4 => CellValue::Integer(row.try_get::<i32, _>(idx)? as i64),
        PgKind::Int8 => CellValue::Integer(row.try_get::<i64, _>(idx)?),
        PgKind::Float4 => CellValue::Float(row.try_get::<f32, _>(idx)? as f64),
        PgKind::Float8 => CellValue::Float(row.try_get::<f64, _>(idx)?),
        PgKind::Bool => CellValue::Bool(row.try_get::<bool, _>(idx)?),
        PgKind::Date => CellValue::Date(row.try_get::<NaiveDate, _>(idx)?),
        PgKind::Timestamp => CellValue::DateTime(row.try_get::<NaiveDateTime, _>(idx)?),
        PgKind::TimestampTz => {
            CellValue::DateTime(row.try_get::<DateTime<Utc>, _>(idx)?.naive_utc())
        }
        PgKind::Unsupported => CellValue::String(format!("<{type_name}>")),
    };
    Ok(value)
}

// ---------------------------------------------------------------------------
// CSV snapshot
// ---------------------------------------------------------------------------

/// An exported custom report. The header row names the columns. Cells stay
/// text exactly as written (empty cells are null); the loader coerces dates.
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RecordSource for CsvSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening CSV {}", self.path.display()))?;
        let columns: Vec<String> = reader
            .headers()
            .context("reading CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_no, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            let mut cells: Vec<CellValue> = record.iter().map(text_cell).collect();
            // Ragged rows are padded or cut to the header width.
            cells.resize(columns.len(), CellValue::Null);
            rows.push(cells);
        }

        Ok(RawTable::new(columns, rows))
    }
}

fn text_cell(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_snapshot_keeps_headers_and_raw_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date Created,Paddock,Crop,Job ID").unwrap();
        writeln!(file, "2025-03-04,North 1,Wheat,17").unwrap();
        writeln!(file, "2025-03-05,,Barley,").unwrap();

        let table = CsvSource::new(file.path().to_path_buf()).fetch().unwrap();
        assert_eq!(table.columns, ["Date Created", "Paddock", "Crop", "Job ID"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], CellValue::String("2025-03-04".into()));
        assert_eq!(table.rows[0][3], CellValue::String("17".into()));
        assert_eq!(table.rows[1][1], CellValue::Null);
        assert_eq!(table.rows[1][3], CellValue::Null);
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::new(dir.path().join("nope.csv"));
        let err = source.fetch().unwrap_err();
        assert!(format!("{err:#}").contains("nope.csv"));
    }

    #[test]
    fn numeric_looking_text_survives_shaping() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Paddock,Variety,Activity Comment").unwrap();
        writeln!(file, "North,0042,1e3").unwrap();
        writeln!(file, "10,+5,NaN").unwrap();
        writeln!(file, "9,x,inf").unwrap();
        writeln!(file, "007,y,ok").unwrap();

        let raw = CsvSource::new(file.path().to_path_buf()).fetch().unwrap();
        let table = crate::data::loader::shape(raw).unwrap();

        let fields: Vec<&str> = table
            .records
            .iter()
            .map(|r| r.field.as_deref().unwrap())
            .collect();
        // Lexicographic, as the same text column from Postgres would sort.
        assert_eq!(fields, ["007", "10", "9", "North"]);
        let varieties: Vec<&str> = table
            .records
            .iter()
            .map(|r| r.variety.as_deref().unwrap())
            .collect();
        assert_eq!(varieties, ["y", "+5", "x", "0042"]);
        let comments: Vec<&str> = table
            .records
            .iter()
            .map(|r| r.activity_comment.as_deref().unwrap())
            .collect();
        assert_eq!(comments, ["ok", "NaN", "inf", "1e3"]);
    }

    #[test]
    fn maps_postgres_type_names() {
        assert_eq!(pg_kind("VARCHAR"), PgKind::Text);
        assert_eq!(pg_kind("INT8"), PgKind::Int8);
        assert_eq!(pg_kind("TIMESTAMPTZ"), PgKind::TimestampTz);
        assert_eq!(pg_kind("DATE"), PgKind::Date);
        assert_eq!(pg_kind("citext"), PgKind::Text);
        assert_eq!(pg_kind("UNKNOWN"), PgKind::Text);
        assert_eq!(pg_kind("BPCHAR"), PgKind::Text);
        assert_eq!(pg_kind("JSONB"), PgKind::Unsupported);
    }

    #[test]
    fn rejects_suspicious_table_names() {
        assert!(is_plain_identifier("agworld_custom_report"));
        assert!(is_plain_identifier("reports.agworld_custom_report"));
        assert!(!is_plain_identifier("t; DROP TABLE x"));
        assert!(!is_plain_identifier(""));

        let source = PostgresSource::new(DatabaseConfig {
            table: "x y".into(),
            ..Default::default()
        });
        assert!(source.query().is_err());
    }

    #[test]
    fn snapshot_config_selects_csv_source() {
        let mut config = Config::default();
        assert!(source_from_config(&config).describe().starts_with("postgres://"));
        config.source.snapshot = Some(PathBuf::from("report.csv"));
        assert_eq!(source_from_config(&config).describe(), "report.csv");
    }
}

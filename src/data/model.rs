use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Display format for the `Date Created` column, e.g. `March 04, 2025`.
pub const DISPLAY_DATE_FORMAT: &str = "%B %d, %Y";

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as returned by a source
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, before the loader shapes it.
/// Must be `Ord` so rows can be sorted by any column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
                DateTime(_) => 6,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text form of a non-null value; `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – rows exactly as a source produced them
// ---------------------------------------------------------------------------

/// Column names plus row-major cells. Every row has `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ObservationColumn – the presented columns, in their fixed order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObservationColumn {
    DateCreated,
    Field,
    Crop,
    Variety,
    PestList,
    ProblemSeverity,
    ActivityComment,
    ActivityAuthor,
}

impl ObservationColumn {
    pub const ORDER: [ObservationColumn; 8] = [
        ObservationColumn::DateCreated,
        ObservationColumn::Field,
        ObservationColumn::Crop,
        ObservationColumn::Variety,
        ObservationColumn::PestList,
        ObservationColumn::ProblemSeverity,
        ObservationColumn::ActivityComment,
        ObservationColumn::ActivityAuthor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ObservationColumn::DateCreated => "Date Created",
            ObservationColumn::Field => "Field",
            ObservationColumn::Crop => "Crop",
            ObservationColumn::Variety => "Variety",
            ObservationColumn::PestList => "Pest List",
            ObservationColumn::ProblemSeverity => "Problem Severity",
            ObservationColumn::ActivityComment => "Activity Comment",
            ObservationColumn::ActivityAuthor => "Activity Author",
        }
    }
}

// ---------------------------------------------------------------------------
// ObservationRecord / ObservationTable – the shaped result
// ---------------------------------------------------------------------------

/// One field observation. Attributes are optional because the source may
/// return nulls or omit the column entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationRecord {
    pub date_created: Option<NaiveDate>,
    pub field: Option<String>,
    pub crop: Option<String>,
    pub variety: Option<String>,
    pub pest_list: Option<String>,
    pub problem_severity: Option<String>,
    pub activity_comment: Option<String>,
    pub activity_author: Option<String>,
}

impl ObservationRecord {
    fn text(&self, column: ObservationColumn) -> Option<&str> {
        let value = match column {
            ObservationColumn::DateCreated => return None,
            ObservationColumn::Field => &self.field,
            ObservationColumn::Crop => &self.crop,
            ObservationColumn::Variety => &self.variety,
            ObservationColumn::PestList => &self.pest_list,
            ObservationColumn::ProblemSeverity => &self.problem_severity,
            ObservationColumn::ActivityComment => &self.activity_comment,
            ObservationColumn::ActivityAuthor => &self.activity_author,
        };
        value.as_deref()
    }

    /// Display text for a cell. Nulls render as an empty string.
    pub fn cell_text(&self, column: ObservationColumn) -> String {
        match column {
            ObservationColumn::DateCreated => self
                .date_created
                .map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            other => self.text(other).unwrap_or_default().to_string(),
        }
    }

    pub(crate) fn set_text(&mut self, column: ObservationColumn, value: Option<String>) {
        match column {
            ObservationColumn::DateCreated => {}
            ObservationColumn::Field => self.field = value,
            ObservationColumn::Crop => self.crop = value,
            ObservationColumn::Variety => self.variety = value,
            ObservationColumn::PestList => self.pest_list = value,
            ObservationColumn::ProblemSeverity => self.problem_severity = value,
            ObservationColumn::ActivityComment => self.activity_comment = value,
            ObservationColumn::ActivityAuthor => self.activity_author = value,
        }
    }
}

/// The shaped table: present columns (in fixed order) and records sorted by
/// field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationTable {
    pub columns: Vec<ObservationColumn>,
    pub records: Vec<ObservationRecord>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: ObservationColumn) -> bool {
        self.columns.contains(&column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sorts_before_everything() {
        let mut cells = vec![
            CellValue::String("b".into()),
            CellValue::Null,
            CellValue::String("a".into()),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                CellValue::Null,
                CellValue::String("a".into()),
                CellValue::String("b".into()),
            ]
        );
    }

    #[test]
    fn date_created_uses_long_month_format() {
        let record = ObservationRecord {
            date_created: NaiveDate::from_ymd_opt(2025, 3, 4),
            ..Default::default()
        };
        assert_eq!(record.cell_text(ObservationColumn::DateCreated), "March 04, 2025");
        assert_eq!(record.cell_text(ObservationColumn::Field), "");
    }

    #[test]
    fn fixed_order_starts_with_date_and_field() {
        let labels: Vec<&str> = ObservationColumn::ORDER.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            [
                "Date Created",
                "Field",
                "Crop",
                "Variety",
                "Pest List",
                "Problem Severity",
                "Activity Comment",
                "Activity Author",
            ]
        );
    }
}

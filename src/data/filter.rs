use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use super::model::{ObservationColumn, ObservationTable};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive calendar-date range. `start > end` is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp both ends into `[min, max]`.
    pub fn clamped(self, (min, max): (NaiveDate, NaiveDate)) -> Self {
        Self {
            start: self.start.clamp(min, max),
            end: self.end.clamp(min, max),
        }
    }
}

/// Earliest and latest non-null `Date Created`.
pub fn date_bounds(table: &ObservationTable) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = table.records.iter().filter_map(|r| r.date_created);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

pub fn monday_of(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// The week containing `today`, clipped to the data:
/// start is `max(min, monday)`, end is `min(max, start + 6 days)`.
pub fn default_range((min, max): (NaiveDate, NaiveDate), today: NaiveDate) -> DateRange {
    let start = min.max(monday_of(today));
    let end = max.min(start + Duration::days(6));
    DateRange::new(start, end)
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// User selections. `crops: None` means every crop is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub date_range: Option<DateRange>,
    pub crops: Option<BTreeSet<String>>,
}

impl FilterState {
    pub fn is_crop_selected(&self, crop: &str) -> bool {
        self.crops.as_ref().map_or(true, |set| set.contains(crop))
    }
}

/// Rows inside the date range. Without a `Date Created` column every row
/// passes; with one, rows with a null date (or no range at all) never do.
pub fn date_filtered_indices(table: &ObservationTable, range: Option<DateRange>) -> Vec<usize> {
    if !table.has_column(ObservationColumn::DateCreated) {
        return (0..table.len()).collect();
    }
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| match (range, r.date_created) {
            (Some(range), Some(date)) => range.contains(date),
            _ => false,
        })
        .map(|(i, _)| i)
        .collect()
}

/// Sorted unique non-null crops among `indices`.
pub fn crop_options(table: &ObservationTable, indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&i| table.records[i].crop.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Return indices of records that pass the date filter, then the crop filter.
///
/// The crop filter only applies when the table has a `Crop` column. A record
/// passes it when its crop is selected, so null crops never pass and an
/// empty selection hides everything.
pub fn filtered_indices(table: &ObservationTable, filters: &FilterState) -> Vec<usize> {
    let dated = date_filtered_indices(table, filters.date_range);
    if !table.has_column(ObservationColumn::Crop) {
        return dated;
    }
    dated
        .into_iter()
        .filter(|&i| {
            table.records[i]
                .crop
                .as_deref()
                .is_some_and(|crop| filters.is_crop_selected(crop))
        })
        .collect()
}

/// `Observations from <start> to <end>`; both ends are `today` when no
/// range is active.
pub fn headline(filters: &FilterState, today: NaiveDate) -> String {
    let (start, end) = filters
        .date_range
        .map(|r| (r.start, r.end))
        .unwrap_or((today, today));
    format!(
        "Observations from {} to {}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ObservationRecord;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: Option<NaiveDate>, crop: Option<&str>) -> ObservationRecord {
        ObservationRecord {
            date_created: day,
            crop: crop.map(str::to_string),
            ..Default::default()
        }
    }

    fn table() -> ObservationTable {
        ObservationTable {
            columns: vec![ObservationColumn::DateCreated, ObservationColumn::Crop],
            records: vec![
                record(Some(date(2025, 3, 3)), Some("Wheat")),
                record(Some(date(2025, 3, 5)), Some("Barley")),
                record(Some(date(2025, 3, 9)), None),
                record(None, Some("Wheat")),
                record(Some(date(2025, 3, 12)), Some("Canola")),
            ],
        }
    }

    #[test]
    fn bounds_skip_null_dates() {
        assert_eq!(date_bounds(&table()), Some((date(2025, 3, 3), date(2025, 3, 12))));
        assert_eq!(date_bounds(&ObservationTable::default()), None);
    }

    #[test]
    fn default_range_is_current_week_clipped_to_data() {
        let bounds = (date(2025, 3, 3), date(2025, 3, 12));
        // Wednesday 2025-03-05 -> week of Monday 03-03.
        assert_eq!(
            default_range(bounds, date(2025, 3, 5)),
            DateRange::new(date(2025, 3, 3), date(2025, 3, 9))
        );
        // Next week's range is cut at the last observation.
        assert_eq!(
            default_range(bounds, date(2025, 3, 11)),
            DateRange::new(date(2025, 3, 10), date(2025, 3, 12))
        );
        // Long after the data ends the range inverts and matches nothing.
        let stale = default_range(bounds, date(2025, 6, 4));
        assert!(stale.start > stale.end);
        let filters = FilterState {
            date_range: Some(stale),
            crops: None,
        };
        assert!(filtered_indices(&table(), &filters).is_empty());
    }

    #[test]
    fn date_filter_is_inclusive_and_drops_null_dates() {
        let range = DateRange::new(date(2025, 3, 3), date(2025, 3, 9));
        assert_eq!(date_filtered_indices(&table(), Some(range)), vec![0, 1, 2]);
    }

    #[test]
    fn crop_filter_excludes_null_crops() {
        let filters = FilterState {
            date_range: Some(DateRange::new(date(2025, 3, 1), date(2025, 3, 31))),
            crops: None,
        };
        assert_eq!(filtered_indices(&table(), &filters), vec![0, 1, 4]);

        let filters = FilterState {
            crops: Some(BTreeSet::from(["Barley".to_string()])),
            ..filters
        };
        assert_eq!(filtered_indices(&table(), &filters), vec![1]);

        let filters = FilterState {
            crops: Some(BTreeSet::new()),
            ..filters
        };
        assert!(filtered_indices(&table(), &filters).is_empty());
    }

    #[test]
    fn crop_options_follow_given_rows() {
        let t = table();
        assert_eq!(crop_options(&t, &[0, 1, 2, 3, 4]), vec!["Barley", "Canola", "Wheat"]);
        assert_eq!(crop_options(&t, &[2]), Vec::<String>::new());
    }

    #[test]
    fn missing_columns_disable_their_filters() {
        let t = ObservationTable {
            columns: vec![ObservationColumn::Field],
            records: vec![record(None, None), record(None, None)],
        };
        let filters = FilterState {
            date_range: None,
            crops: Some(BTreeSet::new()),
        };
        assert_eq!(filtered_indices(&t, &filters), vec![0, 1]);
    }

    #[test]
    fn headline_falls_back_to_today() {
        let today = date(2025, 3, 5);
        assert_eq!(
            headline(&FilterState::default(), today),
            "Observations from 2025-03-05 to 2025-03-05"
        );
        let filters = FilterState {
            date_range: Some(DateRange::new(date(2025, 3, 3), date(2025, 3, 9))),
            crops: None,
        };
        assert_eq!(headline(&filters, today), "Observations from 2025-03-03 to 2025-03-09");
    }

    #[test]
    fn clamp_keeps_range_inside_bounds() {
        let bounds = (date(2025, 3, 3), date(2025, 3, 12));
        let r = DateRange::new(date(2025, 2, 1), date(2025, 4, 1)).clamped(bounds);
        assert_eq!(r, DateRange::new(date(2025, 3, 3), date(2025, 3, 12)));
    }
}

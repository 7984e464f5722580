use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::data::filter::{
    crop_options, date_bounds, date_filtered_indices, default_range, filtered_indices, headline,
    DateRange, FilterState,
};
use crate::data::model::ObservationTable;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Shaped observations (None until a load succeeds).
    pub table: Option<ObservationTable>,

    /// Date range and crop selection.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Crops present in the date-filtered rows, sorted.
    pub crop_options: Vec<String>,

    /// Earliest / latest `Date Created` in the table.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,

    /// Where the current table came from.
    pub source_label: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// When the table was last loaded, for cache expiry.
    pub loaded_at: Option<Instant>,
}

impl AppState {
    /// Ingest a freshly loaded table. A previous date range is kept (clamped
    /// to the new data); otherwise the range defaults to the week of `today`.
    pub fn set_table(&mut self, table: ObservationTable, source: String, today: NaiveDate) {
        self.date_bounds = date_bounds(&table);
        self.filters.date_range = self.date_bounds.map(|bounds| match self.filters.date_range {
            Some(previous) => previous.clamped(bounds),
            None => default_range(bounds, today),
        });

        self.table = Some(table);
        self.source_label = Some(source);
        self.status_message = None;
        self.loaded_at = Some(Instant::now());
        self.refilter();
    }

    /// Record a failed load. The view is emptied, as if nothing was loaded.
    pub fn set_load_error(&mut self, err: &anyhow::Error) {
        self.table = None;
        self.visible_indices.clear();
        self.crop_options.clear();
        self.date_bounds = None;
        self.status_message = Some(format!("Database query failed: {err:#}"));
        self.loaded_at = Some(Instant::now());
    }

    pub fn has_data(&self) -> bool {
        self.table.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Recompute crop options and `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            let dated = date_filtered_indices(table, self.filters.date_range);
            self.crop_options = crop_options(table, &dated);
            self.visible_indices = filtered_indices(table, &self.filters);
        }
    }

    /// Set the date range, clamped to the data.
    pub fn set_date_range(&mut self, range: DateRange) {
        self.filters.date_range = Some(match self.date_bounds {
            Some(bounds) => range.clamped(bounds),
            None => range,
        });
        self.refilter();
    }

    pub fn is_crop_selected(&self, crop: &str) -> bool {
        self.filters.is_crop_selected(crop)
    }

    /// Toggle a single crop in the selection.
    pub fn toggle_crop(&mut self, crop: &str) {
        let selected = self
            .filters
            .crops
            .get_or_insert_with(|| self.crop_options.iter().cloned().collect::<BTreeSet<_>>());
        if !selected.remove(crop) {
            selected.insert(crop.to_string());
        }
        self.refilter();
    }

    /// Select all crops, including ones that appear later.
    pub fn select_all_crops(&mut self) {
        self.filters.crops = None;
        self.refilter();
    }

    pub fn select_none_crops(&mut self) {
        self.filters.crops = Some(BTreeSet::new());
        self.refilter();
    }

    /// Number of crop options currently selected.
    pub fn selected_crop_count(&self) -> usize {
        self.crop_options
            .iter()
            .filter(|c| self.is_crop_selected(c))
            .count()
    }

    pub fn headline(&self, today: NaiveDate) -> String {
        headline(&self.filters, today)
    }

    /// Whether the cached table is older than `ttl`. Never true without a ttl.
    pub fn needs_reload(&self, now: Instant, ttl: Option<Duration>) -> bool {
        match (ttl, self.loaded_at) {
            (Some(ttl), Some(at)) => now.saturating_duration_since(at) >= ttl,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ObservationColumn, ObservationRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table() -> ObservationTable {
        let rec = |d: u32, field: &str, crop: &str| ObservationRecord {
            date_created: Some(date(2025, 3, d)),
            field: Some(field.into()),
            crop: Some(crop.into()),
            ..Default::default()
        };
        ObservationTable {
            columns: vec![
                ObservationColumn::DateCreated,
                ObservationColumn::Field,
                ObservationColumn::Crop,
            ],
            records: vec![
                rec(3, "East", "Wheat"),
                rec(4, "North", "Barley"),
                rec(6, "South", "Wheat"),
                rec(12, "West", "Canola"),
            ],
        }
    }

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.set_table(table(), "test".into(), date(2025, 3, 5));
        state
    }

    #[test]
    fn load_applies_default_week() {
        let state = loaded();
        assert_eq!(
            state.filters.date_range,
            Some(DateRange::new(date(2025, 3, 3), date(2025, 3, 9)))
        );
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.crop_options, vec!["Barley", "Wheat"]);
        assert_eq!(state.selected_crop_count(), 2);
        assert_eq!(state.headline(date(2025, 3, 5)), "Observations from 2025-03-03 to 2025-03-09");
    }

    #[test]
    fn toggling_crop_narrows_view() {
        let mut state = loaded();
        state.toggle_crop("Wheat");
        assert_eq!(state.visible_indices, vec![1]);
        assert!(!state.is_crop_selected("Wheat"));
        state.toggle_crop("Wheat");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn select_none_then_all() {
        let mut state = loaded();
        state.select_none_crops();
        assert!(state.visible_indices.is_empty());
        state.select_all_crops();
        assert_eq!(state.visible_indices.len(), 3);
    }

    #[test]
    fn widening_range_adds_new_crop_options() {
        let mut state = loaded();
        state.set_date_range(DateRange::new(date(2025, 1, 1), date(2025, 12, 31)));
        assert_eq!(
            state.filters.date_range,
            Some(DateRange::new(date(2025, 3, 3), date(2025, 3, 12)))
        );
        assert_eq!(state.crop_options, vec!["Barley", "Canola", "Wheat"]);
        assert_eq!(state.visible_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reload_keeps_user_range() {
        let mut state = loaded();
        state.set_date_range(DateRange::new(date(2025, 3, 4), date(2025, 3, 4)));
        state.set_table(table(), "test".into(), date(2025, 3, 5));
        assert_eq!(state.visible_indices, vec![1]);
    }

    #[test]
    fn load_error_clears_table() {
        let mut state = loaded();
        state.set_load_error(&anyhow::anyhow!("connection refused"));
        assert!(!state.has_data());
        assert!(state.visible_indices.is_empty());
        assert_eq!(
            state.status_message.as_deref(),
            Some("Database query failed: connection refused")
        );
    }

    #[test]
    fn cache_expiry_follows_ttl() {
        let state = loaded();
        let now = Instant::now();
        assert!(!state.needs_reload(now, None));
        assert!(!state.needs_reload(now, Some(Duration::from_secs(3600))));
        assert!(state.needs_reload(now + Duration::from_secs(61), Some(Duration::from_secs(60))));
    }
}

/// Data layer: sources, shaping, filtering and export.
///
/// Architecture:
/// ```text
///  Postgres report table / CSV snapshot
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  fetch rows → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  coerce dates, drop, rename, sort, project → ObservationTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range + crop selection → visible indices
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod source;

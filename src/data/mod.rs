/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CensusTable (once, at startup)
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ CensusTable  │  immutable Vec<Record>
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  AND-composed predicates → matching indices
///   └──────────┘
/// ```
///
/// The table is never mutated after load; the query engine (`crate::query`)
/// borrows it per request.

pub mod filter;
pub mod loader;
pub mod model;

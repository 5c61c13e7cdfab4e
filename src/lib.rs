//! # census-lens
//!
//! Aggregation and query core for an interactive Canadian census dashboard.
//!
//! The crate has two components with a read-only data flow between them:
//!
//! - the **loader** (`data::loader`) reads a census extract (CSV, JSON or
//!   Parquet) once at startup into an immutable [`data::model::CensusTable`],
//!   normalizing labels and dropping malformed rows;
//! - the **query engine** (`query`) turns (table, filter, aggregation) into a
//!   small [`query::ResultTable`] ready for charting. It is a pure function, so
//!   concurrent requests can share one table with no locking.
//!
//! The presentation layer (web frontend, CLI, whatever) owns all selection
//! state: it builds a [`data::filter::Filter`] and [`query::Aggregation`]
//! from its controls and renders the result. `views` packages the
//! dashboard's canned charts as such builders; `report` renders a result as
//! plain text.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use census_lens::data::filter::Filter;
//! use census_lens::data::loader::{load_file, LoadOptions};
//! use census_lens::data::model::Gender;
//! use census_lens::query::{query, Aggregation, Attribute, GroupBy};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = load_file(Path::new("census.csv"), &LoadOptions::default())?;
//!
//!     // Female share of registered nurses per province.
//!     let filter = Filter::all().noc_group("31301").exclude_canada();
//!     let agg = Aggregation::ratio(
//!         GroupBy::One(Attribute::Jurisdiction),
//!         Some(Filter::all().gender(Gender::Female)),
//!         Some(Filter::all().gender(Gender::Total)),
//!     )?;
//!     let result = query(&table, &filter, &agg)?;
//!
//!     for (key, share) in result.rows() {
//!         println!("{key}: {share}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod query;
pub mod report;
pub mod views;

//! The dashboard's canned views, expressed as pure query builders.
//!
//! Each function reads nothing but its arguments: the presentation layer
//! turns its control state (radio, dropdown, slider) into plain values,
//! calls one of these, and renders the returned table. No callbacks, no
//! module-level dataset, no hidden recomputation triggers.

use crate::data::filter::Filter;
use crate::data::model::{CensusTable, Gender, Jurisdiction};
use crate::query::{query, Aggregation, Attribute, GroupBy, QueryError, ResultTable};

/// Essential-service occupations by NOC code, as shown in the first tab.
pub const ESSENTIAL_SERVICES: [(&str, &str); 3] = [
    ("31301", "Nurses"),
    ("42100", "Police Officers"),
    ("42101", "Firefighters"),
];

/// Engineering occupations by NOC code, as shown in the third tab.
pub const ENGINEERING: [(&str, &str); 3] = [
    ("21311", "Computer"),
    ("21301", "Mechanical"),
    ("21310", "Electrical"),
];

fn codes(set: &[(&'static str, &'static str)]) -> Vec<&'static str> {
    set.iter().map(|(code, _)| *code).collect()
}

/// Gender breakdown of essential-service workers per occupation, across the
/// provinces and territories (Canada aggregate excluded to avoid double
/// counting). `service` narrows to one NOC code; `None` is the "All
/// Services" radio option.
pub fn essential_services(
    table: &CensusTable,
    service: Option<&str>,
) -> Result<ResultTable, QueryError> {
    let filter = match service {
        Some(code) => Filter::all().noc_group(code),
        None => Filter::all().noc_group_in(codes(&ESSENTIAL_SERVICES)),
    }
    .exclude_canada()
    .gender_in([Gender::Male, Gender::Female].into_iter().collect());

    let agg = Aggregation::sum(GroupBy::Two(Attribute::Occupation, Attribute::Gender));
    query(table, &filter, &agg)
}

/// Female share of the workforce per jurisdiction within one NOC group,
/// highest share first. Denominator is the reported `total` row, so a
/// jurisdiction with no total row comes back as `Undefined` rather than 0.
pub fn gender_share_by_jurisdiction(
    table: &CensusTable,
    noc_group: &str,
) -> Result<ResultTable, QueryError> {
    let filter = Filter::all().noc_group(noc_group).exclude_canada();
    let agg = Aggregation::ratio(
        GroupBy::One(Attribute::Jurisdiction),
        Some(Filter::all().gender(Gender::Female)),
        Some(Filter::all().gender(Gender::Total)),
    )?
    .sorted_by_value();
    query(table, &filter, &agg)
}

/// Engineering headcount per jurisdiction, largest first, restricted to
/// rows at or above the slider threshold. `kind` narrows to one
/// engineering discipline by NOC code.
pub fn engineering_manpower(
    table: &CensusTable,
    kind: Option<&str>,
    threshold: u64,
) -> Result<ResultTable, QueryError> {
    let filter = match kind {
        Some(code) => Filter::all().noc_group(code),
        None => Filter::all().noc_group_in(codes(&ENGINEERING)),
    }
    .exclude_canada()
    .gender(Gender::Total)
    .min_count(threshold);

    let agg = Aggregation::sum(GroupBy::One(Attribute::Jurisdiction)).sorted_by_value();
    query(table, &filter, &agg)
}

/// National workforce split across the top-level NOC broad categories:
/// the pie-chart feed. Uses the `Canada` aggregate rows directly instead
/// of re-summing provinces.
pub fn sector_distribution(table: &CensusTable) -> Result<ResultTable, QueryError> {
    let top_level: Vec<String> = table
        .top_level_categories()
        .into_iter()
        .map(|(code, _)| code.to_string())
        .collect();

    let filter = Filter::all()
        .jurisdiction(Jurisdiction::Canada)
        .gender(Gender::Total)
        .noc_group_in(top_level);

    let agg = Aggregation::sum(GroupBy::One(Attribute::Occupation)).sorted_by_value();
    query(table, &filter, &agg)
}

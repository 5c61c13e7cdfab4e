use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::data::filter::Filter;
use crate::data::model::{AttrValue, CensusTable, Record};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rejected query. Surfaced to the presentation layer per request; never
/// aborts the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid aggregation: {0}")]
    InvalidAggregation(String),
}

// ---------------------------------------------------------------------------
// Attribute – a groupable record dimension
// ---------------------------------------------------------------------------

/// A record attribute usable as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Jurisdiction,
    NocGroup,
    Gender,
    Occupation,
}

impl Attribute {
    fn value_of(self, rec: &Record) -> AttrValue {
        match self {
            Attribute::Jurisdiction => AttrValue::Jurisdiction(rec.jurisdiction),
            Attribute::NocGroup => AttrValue::Text(rec.noc_group.clone()),
            Attribute::Gender => AttrValue::Gender(rec.gender),
            Attribute::Occupation => AttrValue::Text(rec.occupation.clone()),
        }
    }
}

impl FromStr for Attribute {
    type Err = QueryError;

    /// UI controls hand attribute names over as strings; unknown names are
    /// rejected as an invalid aggregation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jurisdiction" | "province" | "geo" => Ok(Attribute::Jurisdiction),
            "noc_group" | "noc" => Ok(Attribute::NocGroup),
            "gender" | "sex" => Ok(Attribute::Gender),
            "occupation" => Ok(Attribute::Occupation),
            other => Err(QueryError::InvalidAggregation(format!(
                "unknown attribute '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// GroupBy / GroupKey
// ---------------------------------------------------------------------------

/// The grouping key: one or two attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    One(Attribute),
    Two(Attribute, Attribute),
}

impl GroupBy {
    /// Build a grouping key from caller-supplied attribute names.
    pub fn from_names(names: &[&str]) -> Result<GroupBy, QueryError> {
        match names {
            [a] => Ok(GroupBy::One(a.parse()?)),
            [a, b] => {
                let group_by = GroupBy::Two(a.parse()?, b.parse()?);
                group_by.validate()?;
                Ok(group_by)
            }
            other => Err(QueryError::InvalidAggregation(format!(
                "expected 1 or 2 grouping attributes, got {}",
                other.len()
            ))),
        }
    }

    fn validate(&self) -> Result<(), QueryError> {
        if let GroupBy::Two(a, b) = self {
            if a == b {
                return Err(QueryError::InvalidAggregation(
                    "duplicate grouping attribute".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn key_of(&self, rec: &Record) -> GroupKey {
        match self {
            GroupBy::One(a) => GroupKey(a.value_of(rec), None),
            GroupBy::Two(a, b) => GroupKey(a.value_of(rec), Some(b.value_of(rec))),
        }
    }
}

/// The tuple of attribute values identifying one group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub AttrValue, pub Option<AttrValue>);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.1 {
            Some(second) => write!(f, "{} / {second}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation spec
// ---------------------------------------------------------------------------

/// Numerator/denominator sub-filters for a ratio reduction, e.g. the female
/// share of a workforce (gender=female over gender=total).
#[derive(Debug, Clone)]
pub struct RatioSpec {
    pub numerator: Filter,
    pub denominator: Filter,
}

/// How each group is reduced to a single number.
#[derive(Debug, Clone)]
pub enum Reduction {
    /// Sum of the count column.
    Sum,
    /// Numerator-subgroup sum divided by denominator-subgroup sum.
    Ratio(RatioSpec),
}

/// Output ordering. Insertion order is first appearance in the filtered
/// input; value order sorts descending with ties broken by ascending key so
/// results are deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Insertion,
    ByValueDesc,
}

/// A complete aggregation spec: what to group by, how to reduce, how to
/// order the output. Built fresh per query and discarded afterwards.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub group_by: GroupBy,
    pub reduction: Reduction,
    pub sort: SortOrder,
}

impl Aggregation {
    /// Sum-of-counts aggregation over the given grouping key.
    pub fn sum(group_by: GroupBy) -> Self {
        Aggregation {
            group_by,
            reduction: Reduction::Sum,
            sort: SortOrder::Insertion,
        }
    }

    /// Ratio aggregation. Both sub-filters are required; a ratio request
    /// missing either is rejected rather than guessed at.
    pub fn ratio(
        group_by: GroupBy,
        numerator: Option<Filter>,
        denominator: Option<Filter>,
    ) -> Result<Self, QueryError> {
        let (Some(numerator), Some(denominator)) = (numerator, denominator) else {
            return Err(QueryError::InvalidAggregation(
                "ratio requires both numerator and denominator sub-filters".to_string(),
            ));
        };
        Ok(Aggregation {
            group_by,
            reduction: Reduction::Ratio(RatioSpec {
                numerator,
                denominator,
            }),
            sort: SortOrder::Insertion,
        })
    }

    /// Sort the output descending by reduced value.
    pub fn sorted_by_value(mut self) -> Self {
        self.sort = SortOrder::ByValueDesc;
        self
    }
}

// ---------------------------------------------------------------------------
// Reduced / ResultTable
// ---------------------------------------------------------------------------

/// The reduced value of one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reduced {
    /// Sum of counts.
    Count(u64),
    /// A ratio in `[0, 1]` (or above, if the caller's sub-filters overlap
    /// oddly; the engine does not second-guess them).
    Share(f64),
    /// Ratio whose denominator was exactly zero. Distinct from a true zero
    /// share so renderers can label it instead of plotting 0.
    Undefined,
}

impl Reduced {
    /// Numeric view used for sorting and plotting; `Undefined` reads as 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Reduced::Count(n) => *n as f64,
            Reduced::Share(v) => *v,
            Reduced::Undefined => 0.0,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Reduced::Undefined)
    }
}

impl fmt::Display for Reduced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduced::Count(n) => write!(f, "{n}"),
            Reduced::Share(v) => write!(f, "{v:.4}"),
            Reduced::Undefined => f.write_str("undefined"),
        }
    }
}

/// The derived table handed to the renderer: one row per group, no key
/// appearing twice.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    rows: Vec<(GroupKey, Reduced)>,
}

impl ResultTable {
    pub fn rows(&self) -> &[(GroupKey, Reduced)] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum across all `Count` rows. For a sum reduction this equals the sum
    /// of counts of the filtered input.
    pub fn total_count(&self) -> u64 {
        self.rows
            .iter()
            .map(|(_, v)| match v {
                Reduced::Count(n) => *n,
                _ => 0,
            })
            .sum()
    }

    /// Look up the reduced value for one group key.
    pub fn value(&self, key: &GroupKey) -> Option<&Reduced> {
        self.rows.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

// ---------------------------------------------------------------------------
// The engine
// ---------------------------------------------------------------------------

/// Run one aggregation query: filter, group, reduce, order.
///
/// Pure function of its inputs: the table is only borrowed and nothing is
/// cached, so concurrent callers need no coordination and identical calls
/// are safe to memoize upstream.
pub fn query(
    table: &CensusTable,
    filter: &Filter,
    aggregation: &Aggregation,
) -> Result<ResultTable, QueryError> {
    aggregation.group_by.validate()?;

    // Group in first-appearance order: a Vec keeps the order, the map finds
    // the slot.
    let mut groups: Vec<(GroupKey, Vec<&Record>)> = Vec::new();
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();

    for idx in filter.apply(table) {
        let rec = &table.records()[idx];
        let key = aggregation.group_by.key_of(rec);
        match slots.get(&key) {
            Some(&slot) => groups[slot].1.push(rec),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![rec]));
            }
        }
    }

    let mut rows: Vec<(GroupKey, Reduced)> = groups
        .into_iter()
        .map(|(key, members)| {
            let value = match &aggregation.reduction {
                Reduction::Sum => {
                    Reduced::Count(members.iter().map(|r| r.count).sum())
                }
                Reduction::Ratio(spec) => reduce_ratio(&members, spec),
            };
            (key, value)
        })
        .collect();

    if aggregation.sort == SortOrder::ByValueDesc {
        rows.sort_by(|(ka, va), (kb, vb)| {
            vb.as_f64()
                .total_cmp(&va.as_f64())
                .then_with(|| ka.cmp(kb))
        });
    }

    Ok(ResultTable { rows })
}

fn reduce_ratio(members: &[&Record], spec: &RatioSpec) -> Reduced {
    let sum_where = |f: &Filter| -> u64 {
        members
            .iter()
            .filter(|r| f.matches(r))
            .map(|r| r.count)
            .sum()
    };
    let numerator = sum_where(&spec.numerator);
    let denominator = sum_where(&spec.denominator);
    if denominator == 0 {
        Reduced::Undefined
    } else {
        Reduced::Share(numerator as f64 / denominator as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Gender, Jurisdiction};

    fn rec(j: Jurisdiction, code: &str, label: &str, g: Gender, count: u64) -> Record {
        Record {
            jurisdiction: j,
            noc_group: code.to_string(),
            occupation: label.to_string(),
            gender: g,
            count,
        }
    }

    fn nurses_table() -> CensusTable {
        CensusTable::new(
            vec![
                rec(Jurisdiction::Ontario, "31301", "Registered nurses", Gender::Female, 100),
                rec(Jurisdiction::Ontario, "31301", "Registered nurses", Gender::Male, 150),
                rec(Jurisdiction::Ontario, "31301", "Registered nurses", Gender::Total, 250),
                rec(Jurisdiction::Quebec, "31301", "Registered nurses", Gender::Female, 90),
                rec(Jurisdiction::Quebec, "31301", "Registered nurses", Gender::Total, 200),
                rec(Jurisdiction::Quebec, "42101", "Firefighters", Gender::Total, 80),
            ],
            0,
        )
    }

    #[test]
    fn sum_partitions_the_filtered_input() {
        let table = nurses_table();
        let filter = Filter::all().gender(Gender::Total);
        let agg = Aggregation::sum(GroupBy::One(Attribute::Jurisdiction));
        let result = query(&table, &filter, &agg).expect("query");

        assert_eq!(result.len(), 2);
        assert_eq!(result.total_count(), 250 + 200 + 80);
        assert_eq!(result.total_count(), table.filtered(&filter).total_count());
        assert!(result.total_count() <= table.total_count());
    }

    #[test]
    fn groups_appear_in_first_seen_order() {
        let table = nurses_table();
        let agg = Aggregation::sum(GroupBy::One(Attribute::Gender));
        let result = query(&table, &Filter::all(), &agg).expect("query");

        let keys: Vec<String> = result.rows().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["female", "male", "total"]);
    }

    #[test]
    fn two_attribute_grouping_produces_tuple_keys() {
        let table = nurses_table();
        let agg = Aggregation::sum(GroupBy::Two(Attribute::Jurisdiction, Attribute::Gender));
        let result = query(&table, &Filter::all(), &agg).expect("query");

        assert_eq!(result.len(), 5);
        let key = GroupKey(
            AttrValue::Jurisdiction(Jurisdiction::Quebec),
            Some(AttrValue::Gender(Gender::Total)),
        );
        // QC/total spans two occupations: nurses 200 + firefighters 80.
        assert_eq!(result.value(&key), Some(&Reduced::Count(280)));
    }

    #[test]
    fn female_share_of_ontario_nurses_is_0_4() {
        let table = nurses_table();
        let filter = Filter::all()
            .jurisdiction(Jurisdiction::Ontario)
            .noc_group("31301");
        let agg = Aggregation::ratio(
            GroupBy::One(Attribute::Jurisdiction),
            Some(Filter::all().gender(Gender::Female)),
            Some(Filter::all().gender(Gender::Total)),
        )
        .expect("ratio spec");
        let result = query(&table, &filter, &agg).expect("query");

        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].1, Reduced::Share(0.4));
    }

    #[test]
    fn zero_denominator_yields_the_undefined_marker() {
        let table = CensusTable::new(
            vec![rec(Jurisdiction::Yukon, "42101", "Firefighters", Gender::Female, 5)],
            0,
        );
        // No total rows at all, so every denominator sums to zero.
        let agg = Aggregation::ratio(
            GroupBy::One(Attribute::Jurisdiction),
            Some(Filter::all().gender(Gender::Female)),
            Some(Filter::all().gender(Gender::Total)),
        )
        .expect("ratio spec");
        let result = query(&table, &Filter::all(), &agg).expect("query");

        assert_eq!(result.len(), 1);
        assert!(result.rows()[0].1.is_undefined());
        // Distinguishable from a true zero share.
        assert_ne!(result.rows()[0].1, Reduced::Share(0.0));
    }

    #[test]
    fn empty_filtered_set_is_an_empty_result_not_an_error() {
        let table = nurses_table();
        let filter = Filter::all().jurisdiction(Jurisdiction::Nunavut);
        let agg = Aggregation::sum(GroupBy::One(Attribute::Occupation));
        let result = query(&table, &filter, &agg).expect("query");
        assert!(result.is_empty());
    }

    #[test]
    fn value_sort_is_descending_with_ties_broken_by_key() {
        let table = CensusTable::new(
            vec![
                rec(Jurisdiction::Quebec, "1", "B", Gender::Total, 10),
                rec(Jurisdiction::Quebec, "1", "C", Gender::Total, 10),
                rec(Jurisdiction::Quebec, "1", "A", Gender::Total, 30),
            ],
            0,
        );
        let agg = Aggregation::sum(GroupBy::One(Attribute::Occupation)).sorted_by_value();
        let result = query(&table, &Filter::all(), &agg).expect("query");

        let keys: Vec<String> = result.rows().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
    }

    #[test]
    fn querying_a_refiltered_table_matches_the_direct_query() {
        let table = nurses_table();
        let filter = Filter::all().jurisdiction(Jurisdiction::Quebec);
        let agg = Aggregation::sum(GroupBy::One(Attribute::Occupation));

        let direct = query(&table, &filter, &agg).expect("query");
        let refiltered = query(&table.filtered(&filter), &filter, &agg).expect("query");
        assert_eq!(direct, refiltered);
    }

    #[test]
    fn unknown_attribute_names_are_rejected() {
        let err = GroupBy::from_names(&["postal_code"]).unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregation(_)));

        let err = GroupBy::from_names(&[]).unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregation(_)));
    }

    #[test]
    fn duplicate_grouping_attributes_are_rejected() {
        let table = nurses_table();
        let agg = Aggregation::sum(GroupBy::Two(Attribute::Gender, Attribute::Gender));
        let err = query(&table, &Filter::all(), &agg).unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregation(_)));
    }

    #[test]
    fn ratio_without_both_sub_filters_is_rejected() {
        let err = Aggregation::ratio(
            GroupBy::One(Attribute::Jurisdiction),
            Some(Filter::all().gender(Gender::Female)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregation(_)));
    }

    #[test]
    fn attribute_names_parse_case_insensitively() {
        assert_eq!("Jurisdiction".parse::<Attribute>(), Ok(Attribute::Jurisdiction));
        assert_eq!("NOC".parse::<Attribute>(), Ok(Attribute::NocGroup));
        assert_eq!("sex".parse::<Attribute>(), Ok(Attribute::Gender));
    }
}

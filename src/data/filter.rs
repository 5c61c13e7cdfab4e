use std::collections::BTreeSet;

use super::model::{CensusTable, Gender, Jurisdiction, Record};

// ---------------------------------------------------------------------------
// Predicate – one condition over a record attribute
// ---------------------------------------------------------------------------

/// A single condition on one record attribute. The variants mirror the
/// dashboard's controls: equality (radio), set membership (dropdown /
/// checkboxes), numeric threshold (slider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    JurisdictionIs(Jurisdiction),
    JurisdictionIn(BTreeSet<Jurisdiction>),
    GenderIs(Gender),
    GenderIn(BTreeSet<Gender>),
    NocGroupIs(String),
    NocGroupIn(BTreeSet<String>),
    OccupationIn(BTreeSet<String>),
    MinCount(u64),
    /// Drop the `Canada` national aggregate rows. Per-jurisdiction views
    /// must apply this to avoid counting every worker twice.
    ExcludeAggregate,
}

impl Predicate {
    fn matches(&self, rec: &Record) -> bool {
        match self {
            Predicate::JurisdictionIs(j) => rec.jurisdiction == *j,
            // An empty selection set means nothing is selected, not
            // "no constraint": it matches no record.
            Predicate::JurisdictionIn(set) => set.contains(&rec.jurisdiction),
            Predicate::GenderIs(g) => rec.gender == *g,
            Predicate::GenderIn(set) => set.contains(&rec.gender),
            Predicate::NocGroupIs(code) => rec.noc_group == *code,
            Predicate::NocGroupIn(set) => set.contains(&rec.noc_group),
            Predicate::OccupationIn(set) => set.contains(&rec.occupation),
            Predicate::MinCount(n) => rec.count >= *n,
            Predicate::ExcludeAggregate => !rec.jurisdiction.is_aggregate(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter – AND-composition of predicates
// ---------------------------------------------------------------------------

/// A conjunction of predicates over record attributes. The empty filter
/// matches every record. Built incrementally, builder-style, from whatever
/// the presentation layer's controls currently say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// The match-all filter.
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn jurisdiction(mut self, j: Jurisdiction) -> Self {
        self.predicates.push(Predicate::JurisdictionIs(j));
        self
    }

    pub fn jurisdiction_in(mut self, set: BTreeSet<Jurisdiction>) -> Self {
        self.predicates.push(Predicate::JurisdictionIn(set));
        self
    }

    pub fn gender(mut self, g: Gender) -> Self {
        self.predicates.push(Predicate::GenderIs(g));
        self
    }

    pub fn gender_in(mut self, set: BTreeSet<Gender>) -> Self {
        self.predicates.push(Predicate::GenderIn(set));
        self
    }

    pub fn noc_group(mut self, code: impl Into<String>) -> Self {
        self.predicates.push(Predicate::NocGroupIs(code.into()));
        self
    }

    pub fn noc_group_in<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = codes.into_iter().map(Into::into).collect();
        self.predicates.push(Predicate::NocGroupIn(set));
        self
    }

    pub fn occupation_in<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = labels.into_iter().map(Into::into).collect();
        self.predicates.push(Predicate::OccupationIn(set));
        self
    }

    /// Keep only records with `count >= n` (the slider control).
    pub fn min_count(mut self, n: u64) -> Self {
        self.predicates.push(Predicate::MinCount(n));
        self
    }

    /// Drop the `Canada` aggregate rows.
    pub fn exclude_canada(mut self) -> Self {
        self.predicates.push(Predicate::ExcludeAggregate);
        self
    }

    /// Whether no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// True when the record satisfies every predicate.
    pub fn matches(&self, rec: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(rec))
    }

    /// Indices of records passing the filter, in original table order.
    pub fn apply(&self, table: &CensusTable) -> Vec<usize> {
        table
            .records()
            .iter()
            .enumerate()
            .filter(|(_, rec)| self.matches(rec))
            .map(|(i, _)| i)
            .collect()
    }
}

impl CensusTable {
    /// Materialize the filtered subset as a new table, preserving record
    /// order. The skipped-row diagnostic belongs to the load, so it is
    /// carried over unchanged.
    pub fn filtered(&self, filter: &Filter) -> CensusTable {
        let records = self
            .records()
            .iter()
            .filter(|rec| filter.matches(rec))
            .cloned()
            .collect();
        CensusTable::new(records, self.skipped_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CensusTable {
        let rec = |j: Jurisdiction, code: &str, label: &str, g: Gender, count: u64| Record {
            jurisdiction: j,
            noc_group: code.to_string(),
            occupation: label.to_string(),
            gender: g,
            count,
        };
        CensusTable::new(
            vec![
                rec(Jurisdiction::Ontario, "31301", "Registered nurses", Gender::Female, 100),
                rec(Jurisdiction::Ontario, "31301", "Registered nurses", Gender::Male, 150),
                rec(Jurisdiction::Ontario, "31301", "Registered nurses", Gender::Total, 250),
                rec(Jurisdiction::Quebec, "42101", "Firefighters", Gender::Total, 80),
                rec(Jurisdiction::Canada, "31301", "Registered nurses", Gender::Total, 900),
            ],
            0,
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        let table = sample_table();
        assert_eq!(Filter::all().apply(&table), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn predicates_compose_with_and() {
        let table = sample_table();
        let filter = Filter::all()
            .jurisdiction(Jurisdiction::Ontario)
            .gender(Gender::Female);
        assert_eq!(filter.apply(&table), vec![0]);
    }

    #[test]
    fn min_count_is_a_threshold() {
        let table = sample_table();
        let filter = Filter::all().min_count(150);
        assert_eq!(filter.apply(&table), vec![1, 2, 4]);
    }

    #[test]
    fn exclude_canada_drops_only_the_aggregate() {
        let table = sample_table();
        let filter = Filter::all().exclude_canada();
        assert_eq!(filter.apply(&table), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_membership_set_matches_nothing() {
        let table = sample_table();
        let filter = Filter::all().occupation_in(Vec::<String>::new());
        assert!(filter.apply(&table).is_empty());
    }

    #[test]
    fn filtered_table_preserves_order_and_skip_count() {
        let table = CensusTable::new(sample_table().records().to_vec(), 7);
        let filter = Filter::all().jurisdiction(Jurisdiction::Ontario);
        let subset = table.filtered(&filter);
        assert_eq!(subset.len(), 3);
        assert_eq!(subset.skipped_rows(), 7);
        assert!(subset.records().iter().all(|r| r.jurisdiction == Jurisdiction::Ontario));
    }

    #[test]
    fn refiltering_a_filtered_table_changes_nothing() {
        let table = sample_table();
        let filter = Filter::all().jurisdiction(Jurisdiction::Ontario).min_count(120);
        let once = table.filtered(&filter);
        let twice = once.filtered(&filter);
        assert_eq!(once.records(), twice.records());
    }
}

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Jurisdiction – a province/territory or the national aggregate
// ---------------------------------------------------------------------------

/// A Canadian jurisdiction: one of the 13 provinces and territories, or the
/// `Canada` national aggregate. The aggregate is a real row in census
/// extracts and must be excluded from per-province breakdowns to avoid
/// double counting (see `Filter::exclude_canada`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Jurisdiction {
    Canada,
    Alberta,
    BritishColumbia,
    Manitoba,
    NewBrunswick,
    NewfoundlandAndLabrador,
    NorthwestTerritories,
    NovaScotia,
    Nunavut,
    Ontario,
    PrinceEdwardIsland,
    Quebec,
    Saskatchewan,
    Yukon,
}

impl Jurisdiction {
    /// All jurisdictions, national aggregate first.
    pub const ALL: [Jurisdiction; 14] = [
        Jurisdiction::Canada,
        Jurisdiction::Alberta,
        Jurisdiction::BritishColumbia,
        Jurisdiction::Manitoba,
        Jurisdiction::NewBrunswick,
        Jurisdiction::NewfoundlandAndLabrador,
        Jurisdiction::NorthwestTerritories,
        Jurisdiction::NovaScotia,
        Jurisdiction::Nunavut,
        Jurisdiction::Ontario,
        Jurisdiction::PrinceEdwardIsland,
        Jurisdiction::Quebec,
        Jurisdiction::Saskatchewan,
        Jurisdiction::Yukon,
    ];

    /// Two-letter postal code (`CA` stands in for the national aggregate).
    pub fn code(&self) -> &'static str {
        match self {
            Jurisdiction::Canada => "CA",
            Jurisdiction::Alberta => "AB",
            Jurisdiction::BritishColumbia => "BC",
            Jurisdiction::Manitoba => "MB",
            Jurisdiction::NewBrunswick => "NB",
            Jurisdiction::NewfoundlandAndLabrador => "NL",
            Jurisdiction::NorthwestTerritories => "NT",
            Jurisdiction::NovaScotia => "NS",
            Jurisdiction::Nunavut => "NU",
            Jurisdiction::Ontario => "ON",
            Jurisdiction::PrinceEdwardIsland => "PE",
            Jurisdiction::Quebec => "QC",
            Jurisdiction::Saskatchewan => "SK",
            Jurisdiction::Yukon => "YT",
        }
    }

    /// Full English name as printed in StatCan extracts.
    pub fn name(&self) -> &'static str {
        match self {
            Jurisdiction::Canada => "Canada",
            Jurisdiction::Alberta => "Alberta",
            Jurisdiction::BritishColumbia => "British Columbia",
            Jurisdiction::Manitoba => "Manitoba",
            Jurisdiction::NewBrunswick => "New Brunswick",
            Jurisdiction::NewfoundlandAndLabrador => "Newfoundland and Labrador",
            Jurisdiction::NorthwestTerritories => "Northwest Territories",
            Jurisdiction::NovaScotia => "Nova Scotia",
            Jurisdiction::Nunavut => "Nunavut",
            Jurisdiction::Ontario => "Ontario",
            Jurisdiction::PrinceEdwardIsland => "Prince Edward Island",
            Jurisdiction::Quebec => "Quebec",
            Jurisdiction::Saskatchewan => "Saskatchewan",
            Jurisdiction::Yukon => "Yukon",
        }
    }

    /// Whether this is the national aggregate rather than a real province
    /// or territory.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Jurisdiction::Canada)
    }
}

impl FromStr for Jurisdiction {
    type Err = ();

    /// Accepts either the postal code (`ON`) or the full name (`Ontario`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for j in Jurisdiction::ALL {
            if s.eq_ignore_ascii_case(j.code()) || s.eq_ignore_ascii_case(j.name()) {
                return Ok(j);
            }
        }
        Err(())
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Gender – census gender dimension
// ---------------------------------------------------------------------------

/// Gender dimension of a census row. `Total` is the both-genders aggregate
/// reported by the source, carried as its own value rather than recomputed
/// from the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Total,
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = ();

    /// Accepts the census vocabulary (`total`, `men`, `women`) as well as
    /// plain `male`/`female`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" | "all" | "both" => Ok(Gender::Total),
            "male" | "man" | "men" => Ok(Gender::Male),
            "female" | "woman" | "women" => Ok(Gender::Female),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gender::Total => "total",
            Gender::Male => "male",
            Gender::Female => "female",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// AttrValue – a single cell of a group key
// ---------------------------------------------------------------------------

/// A typed attribute value, used as (part of) a group key in query results.
/// Kept `Ord` so keys sort deterministically when ties are broken.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrValue {
    Jurisdiction(Jurisdiction),
    Gender(Gender),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Jurisdiction(j) => f.write_str(j.name()),
            AttrValue::Gender(g) => write!(f, "{g}"),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the census table
// ---------------------------------------------------------------------------

/// A single census observation: how many people of a given gender work in a
/// given occupation in a given jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub jurisdiction: Jurisdiction,
    /// NOC code, e.g. `"31301"`. Single-digit codes are the top-level
    /// broad categories. Empty when the source label carried no code.
    pub noc_group: String,
    /// Occupation label with the NOC code prefix and footnote markers
    /// already stripped by the loader.
    pub occupation: String,
    pub gender: Gender,
    pub count: u64,
}

// ---------------------------------------------------------------------------
// CensusTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Immutable after load; queries only ever borrow
/// it, so it can be shared across request handlers without locking.
#[derive(Debug, Clone)]
pub struct CensusTable {
    records: Vec<Record>,
    skipped_rows: usize,
}

impl CensusTable {
    /// Build a table from parsed records, remembering how many source rows
    /// the loader had to drop.
    pub fn new(records: Vec<Record>, skipped_rows: usize) -> Self {
        CensusTable {
            records,
            skipped_rows,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Malformed source rows excluded during load. Exposed for diagnostics;
    /// individual drops are never surfaced as errors.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Sum of all record counts.
    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }

    /// Sorted set of distinct occupation labels, for populating dropdowns.
    pub fn unique_occupations(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.occupation.as_str()).collect()
    }

    /// Sorted set of distinct NOC group codes.
    pub fn unique_noc_groups(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.noc_group.as_str())
            .filter(|g| !g.is_empty())
            .collect()
    }

    /// Top-level NOC broad categories present in the table, as
    /// (single-digit code, label) pairs in first-seen order.
    pub fn top_level_categories(&self) -> Vec<(&str, &str)> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for r in &self.records {
            if r.noc_group.len() == 1 && seen.insert(r.noc_group.as_str()) {
                out.push((r.noc_group.as_str(), r.occupation.as_str()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jurisdiction_parses_codes_and_names() {
        assert_eq!("ON".parse::<Jurisdiction>(), Ok(Jurisdiction::Ontario));
        assert_eq!("ontario".parse::<Jurisdiction>(), Ok(Jurisdiction::Ontario));
        assert_eq!(
            " Newfoundland and Labrador ".parse::<Jurisdiction>(),
            Ok(Jurisdiction::NewfoundlandAndLabrador)
        );
        assert_eq!("Canada".parse::<Jurisdiction>(), Ok(Jurisdiction::Canada));
        assert!("Atlantis".parse::<Jurisdiction>().is_err());
    }

    #[test]
    fn only_canada_is_the_aggregate() {
        assert!(Jurisdiction::Canada.is_aggregate());
        for j in Jurisdiction::ALL.iter().skip(1) {
            assert!(!j.is_aggregate(), "{j} should not be the aggregate");
        }
    }

    #[test]
    fn gender_parses_census_vocabulary() {
        assert_eq!("Men".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("women".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("TOTAL".parse::<Gender>(), Ok(Gender::Total));
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn top_level_categories_are_deduplicated_in_first_seen_order() {
        let rec = |code: &str, label: &str| Record {
            jurisdiction: Jurisdiction::Ontario,
            noc_group: code.to_string(),
            occupation: label.to_string(),
            gender: Gender::Total,
            count: 1,
        };
        let table = CensusTable::new(
            vec![
                rec("3", "Health occupations"),
                rec("31301", "Registered nurses"),
                rec("2", "Sciences"),
                rec("3", "Health occupations"),
            ],
            0,
        );
        assert_eq!(
            table.top_level_categories(),
            vec![("3", "Health occupations"), ("2", "Sciences")]
        );
    }
}

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use mergeguard_frame::{JoinHow, Provenance, Table};
use serde::Serialize;

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// Declared cardinality
// ---------------------------------------------------------------------------

/// Declared expectation of key duplication. The first position constrains
/// the left table, the second the right table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MergeType {
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:m")]
    OneToMany,
    #[serde(rename = "m:1")]
    ManyToOne,
    #[serde(rename = "m:m")]
    ManyToMany,
}

impl MergeType {
    pub fn left_unique(&self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany)
    }

    pub fn right_unique(&self) -> bool {
        matches!(self, Self::OneToOne | Self::ManyToOne)
    }
}

impl FromStr for MergeType {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1:1" | "one_to_one" => Ok(Self::OneToOne),
            "1:m" | "one_to_many" => Ok(Self::OneToMany),
            "m:1" | "many_to_one" => Ok(Self::ManyToOne),
            "m:m" | "many_to_many" => Ok(Self::ManyToMany),
            other => Err(MergeError::InvalidMergeType(other.to_string())),
        }
    }
}

impl fmt::Display for MergeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneToOne => write!(f, "1:1"),
            Self::OneToMany => write!(f, "1:m"),
            Self::ManyToOne => write!(f, "m:1"),
            Self::ManyToMany => write!(f, "m:m"),
        }
    }
}

pub fn parse_how(s: &str) -> Result<JoinHow, MergeError> {
    JoinHow::parse(s).ok_or_else(|| MergeError::InvalidJoinHow(s.to_string()))
}

/// Parse provenance labels (`left_only`, `right_only`, `both`) into a set.
pub fn parse_provenance_set<S: AsRef<str>>(labels: &[S]) -> Result<BTreeSet<Provenance>, MergeError> {
    labels
        .iter()
        .map(|l| {
            let l = l.as_ref();
            Provenance::parse(l).ok_or_else(|| MergeError::InvalidProvenanceSet(l.to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// One key column name or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keys(pub Vec<String>);

impl From<&str> for Keys {
    fn from(s: &str) -> Self {
        Keys(vec![s.to_string()])
    }
}

impl From<String> for Keys {
    fn from(s: String) -> Self {
        Keys(vec![s])
    }
}

impl From<Vec<String>> for Keys {
    fn from(v: Vec<String>) -> Self {
        Keys(v)
    }
}

impl From<Vec<&str>> for Keys {
    fn from(v: Vec<&str>) -> Self {
        Keys(v.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Keys {
    fn from(v: [&str; N]) -> Self {
        Keys(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Caller's key arguments before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyArgs {
    pub on: Option<Keys>,
    pub left_on: Option<Keys>,
    pub right_on: Option<Keys>,
}

impl KeyArgs {
    pub fn on(keys: impl Into<Keys>) -> Self {
        Self {
            on: Some(keys.into()),
            ..Self::default()
        }
    }

    pub fn sides(left_on: impl Into<Keys>, right_on: impl Into<Keys>) -> Self {
        Self {
            on: None,
            left_on: Some(left_on.into()),
            right_on: Some(right_on.into()),
        }
    }
}

/// Normalized key specification: equal-length, non-empty, positionally paired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySpec {
    pub left: Vec<String>,
    pub right: Vec<String>,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

pub const DEFAULT_INDICATOR: &str = "_merge";

/// Whether (and under which name) the provenance column is kept in the result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    Off,
    Default,
    Named(String),
}

impl Indicator {
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Indicator::Off => None,
            Indicator::Default => Some(DEFAULT_INDICATOR),
            Indicator::Named(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub mergetype: MergeType,
    pub how: JoinHow,
    pub keys: KeyArgs,
    /// Expected provenance categories. `None` or an empty set disables the
    /// membership check.
    pub expected: Option<BTreeSet<Provenance>>,
    pub suffixes: Option<(String, String)>,
    pub matches_required: bool,
    pub indicator: Indicator,
    pub sort: bool,
    /// Suppress the stats report. Messages and violation examples are still sent.
    pub quiet: bool,
    pub message: Option<String>,
}

impl MergeOptions {
    pub fn new(mergetype: MergeType, how: JoinHow, keys: KeyArgs) -> Self {
        Self {
            mergetype,
            how,
            keys,
            expected: None,
            suffixes: None,
            matches_required: true,
            indicator: Indicator::Off,
            sort: false,
            quiet: false,
            message: None,
        }
    }

    pub fn expect(mut self, sets: impl IntoIterator<Item = Provenance>) -> Self {
        self.expected = Some(sets.into_iter().collect());
        self
    }

    pub fn suffixes(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.suffixes = Some((left.into(), right.into()));
        self
    }

    pub fn matches_required(mut self, required: bool) -> Self {
        self.matches_required = required;
        self
    }

    pub fn indicator(mut self, indicator: Indicator) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The declared set, if it actually constrains anything.
    pub fn expected_set(&self) -> Option<&BTreeSet<Provenance>> {
        self.expected.as_ref().filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Stats + Output
// ---------------------------------------------------------------------------

/// Frequency table of the provenance column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvenanceCounts {
    pub left_only: usize,
    pub right_only: usize,
    pub both: usize,
}

impl ProvenanceCounts {
    pub fn tally(provenance: &[Provenance]) -> Self {
        let mut counts = Self::default();
        for p in provenance {
            match p {
                Provenance::LeftOnly => counts.left_only += 1,
                Provenance::RightOnly => counts.right_only += 1,
                Provenance::Both => counts.both += 1,
            }
        }
        counts
    }

    pub fn get(&self, p: Provenance) -> usize {
        match p {
            Provenance::LeftOnly => self.left_only,
            Provenance::RightOnly => self.right_only,
            Provenance::Both => self.both,
        }
    }

    pub fn total(&self) -> usize {
        self.left_only + self.right_only + self.both
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeStats {
    pub how: JoinHow,
    pub mergetype: MergeType,
    pub left_keys: Vec<String>,
    pub right_keys: Vec<String>,
    pub counts: ProvenanceCounts,
    pub left_rows: usize,
    pub right_rows: usize,
    pub result_rows: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub table: Table,
    pub stats: MergeStats,
}

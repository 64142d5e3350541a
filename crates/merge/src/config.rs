use std::collections::BTreeMap;

use mergeguard_frame::ColumnType;
use serde::Deserialize;

use crate::error::MergeError;
use crate::keys;
use crate::model::{parse_how, parse_provenance_set, Indicator, KeyArgs, Keys, MergeOptions, MergeType};

// ---------------------------------------------------------------------------
// Top-level job
// ---------------------------------------------------------------------------

/// A merge described in TOML: two input files plus the declared contract.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeJob {
    pub name: String,
    pub mergetype: String,
    pub how: String,
    pub left: TableSource,
    pub right: TableSource,
    pub keys: KeysConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Printed at the top of the report, even when quiet.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub quiet: bool,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSource {
    /// Path relative to the job file.
    pub file: String,
    /// Column type overrides (`column = "text"`); other columns are inferred.
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

impl TableSource {
    pub fn type_hints(&self) -> Result<BTreeMap<String, ColumnType>, MergeError> {
        self.types
            .iter()
            .map(|(col, ty)| {
                ColumnType::parse(ty)
                    .map(|t| (col.clone(), t))
                    .ok_or_else(|| MergeError::ConfigValidation(format!("column '{col}': unknown type '{ty}'")))
            })
            .collect()
    }
}

/// A single column name or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyList {
    One(String),
    Many(Vec<String>),
}

impl From<KeyList> for Keys {
    fn from(k: KeyList) -> Self {
        match k {
            KeyList::One(s) => Keys(vec![s]),
            KeyList::Many(v) => Keys(v),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeysConfig {
    #[serde(default)]
    pub on: Option<KeyList>,
    #[serde(default)]
    pub left_on: Option<KeyList>,
    #[serde(default)]
    pub right_on: Option<KeyList>,
}

impl KeysConfig {
    pub fn args(&self) -> KeyArgs {
        KeyArgs {
            on: self.on.clone().map(Into::into),
            left_on: self.left_on.clone().map(Into::into),
            right_on: self.right_on.clone().map(Into::into),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidateConfig {
    /// Expected provenance labels; empty disables the membership check.
    #[serde(default)]
    pub sets: Vec<String>,
    #[serde(default = "default_matches_required")]
    pub matches_required: bool,
}

fn default_matches_required() -> bool {
    true
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            sets: Vec::new(),
            matches_required: true,
        }
    }
}

/// `indicator = true` keeps `_merge`; a string keeps it under that name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndicatorConfig {
    Flag(bool),
    Name(String),
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::Flag(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Merged CSV destination, relative to the job file.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub suffixes: Option<Vec<String>>,
    #[serde(default)]
    pub indicator: IndicatorConfig,
    #[serde(default)]
    pub sort: bool,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeJob {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let job: MergeJob = toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.name.trim().is_empty() {
            return Err(MergeError::ConfigValidation("name must not be empty".into()));
        }
        if self.left.file.trim().is_empty() || self.right.file.trim().is_empty() {
            return Err(MergeError::ConfigValidation("left.file and right.file are required".into()));
        }
        self.left.type_hints()?;
        self.right.type_hints()?;
        self.options()?;
        Ok(())
    }

    /// Merge options described by this job.
    pub fn options(&self) -> Result<MergeOptions, MergeError> {
        let mergetype: MergeType = self.mergetype.parse()?;
        let how = parse_how(&self.how)?;
        let key_args = self.keys.args();
        keys::normalize(&key_args)?;

        let mut options = MergeOptions::new(mergetype, how, key_args)
            .matches_required(self.validate.matches_required)
            .sort(self.output.sort)
            .quiet(self.quiet);

        if !self.validate.sets.is_empty() {
            options.expected = Some(parse_provenance_set(&self.validate.sets)?);
        }

        if let Some(ref suffixes) = self.output.suffixes {
            match suffixes.as_slice() {
                [l, r] => options.suffixes = Some((l.clone(), r.clone())),
                _ => {
                    return Err(MergeError::ConfigValidation(format!(
                        "suffixes must have exactly 2 entries, got {}",
                        suffixes.len()
                    )))
                }
            }
        }

        options.indicator = match &self.output.indicator {
            IndicatorConfig::Flag(false) => Indicator::Off,
            IndicatorConfig::Flag(true) => Indicator::Default,
            IndicatorConfig::Name(name) if name.trim().is_empty() => {
                return Err(MergeError::ConfigValidation("indicator name must not be empty".into()))
            }
            IndicatorConfig::Name(name) => Indicator::Named(name.clone()),
        };

        options.message = self.message.clone();
        Ok(options)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mergeguard_frame::{JoinHow, Provenance};

    const BASIC: &str = r#"
name = "orders to customers"
mergetype = "m:1"
how = "left"

[left]
file = "orders.csv"

[right]
file = "customers.csv"

[right.types]
customer_id = "int"

[keys]
on = "customer_id"
"#;

    #[test]
    fn parse_basic_job() {
        let job = MergeJob::from_toml(BASIC).unwrap();
        assert_eq!(job.name, "orders to customers");
        let opts = job.options().unwrap();
        assert_eq!(opts.mergetype, MergeType::ManyToOne);
        assert_eq!(opts.how, JoinHow::Left);
        assert_eq!(opts.keys, KeyArgs::on("customer_id"));
        assert!(opts.matches_required);
        assert!(opts.expected.is_none());
        assert_eq!(opts.indicator, Indicator::Off);
        assert_eq!(
            job.right.type_hints().unwrap().get("customer_id"),
            Some(&ColumnType::Int)
        );
    }

    #[test]
    fn parse_full_job() {
        let input = r#"
name = "full"
mergetype = "1:1"
how = "inner"
message = "checking ledger"
quiet = true

[left]
file = "a.csv"

[right]
file = "b.csv"

[keys]
left_on = ["acct", "day"]
right_on = ["account", "date"]

[validate]
sets = ["both", "left_only"]
matches_required = false

[output]
file = "out.csv"
suffixes = ["_a", "_b"]
indicator = "source"
sort = true
"#;
        let opts = MergeJob::from_toml(input).unwrap().options().unwrap();
        assert_eq!(opts.keys, KeyArgs::sides(["acct", "day"], ["account", "date"]));
        let sets = opts.expected.as_ref().unwrap();
        assert!(sets.contains(&Provenance::Both) && sets.contains(&Provenance::LeftOnly));
        assert_eq!(opts.suffixes, Some(("_a".to_string(), "_b".to_string())));
        assert_eq!(opts.indicator, Indicator::Named("source".into()));
        assert!(opts.sort && opts.quiet && !opts.matches_required);
        assert_eq!(opts.message.as_deref(), Some("checking ledger"));
    }

    #[test]
    fn indicator_flag_uses_default_name() {
        let input = format!("{BASIC}\n[output]\nindicator = true\n");
        let opts = MergeJob::from_toml(&input).unwrap().options().unwrap();
        assert_eq!(opts.indicator.column_name(), Some("_merge"));
    }

    #[test]
    fn reject_bad_mergetype() {
        let input = BASIC.replace("m:1", "1:n");
        let err = MergeJob::from_toml(&input).unwrap_err();
        assert!(matches!(err, MergeError::InvalidMergeType(ref v) if v == "1:n"));
    }

    #[test]
    fn reject_bad_how() {
        let input = BASIC.replace("how = \"left\"", "how = \"cross\"");
        assert!(matches!(MergeJob::from_toml(&input), Err(MergeError::InvalidJoinHow(_))));
    }

    #[test]
    fn reject_bad_set_label() {
        let input = format!("{BASIC}\n[validate]\nsets = [\"both\", \"neither\"]\n");
        let err = MergeJob::from_toml(&input).unwrap_err();
        assert!(matches!(err, MergeError::InvalidProvenanceSet(ref v) if v == "neither"));
    }

    #[test]
    fn reject_ambiguous_keys() {
        let input = BASIC.replace("on = \"customer_id\"", "on = \"customer_id\"\nleft_on = \"cid\"");
        assert!(matches!(MergeJob::from_toml(&input), Err(MergeError::AmbiguousKeySpec)));
    }

    #[test]
    fn reject_three_suffixes() {
        let input = format!("{BASIC}\n[output]\nsuffixes = [\"a\", \"b\", \"c\"]\n");
        let err = MergeJob::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("exactly 2 entries"));
    }

    #[test]
    fn reject_unknown_type_hint() {
        let input = BASIC.replace("customer_id = \"int\"", "customer_id = \"decimal\"");
        let err = MergeJob::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("unknown type 'decimal'"));
    }

    #[test]
    fn reject_unknown_field() {
        let input = BASIC.replace("how = \"left\"", "how = \"left\"\nhwo = \"left\"");
        assert!(matches!(MergeJob::from_toml(&input), Err(MergeError::ConfigParse(_))));
    }
}

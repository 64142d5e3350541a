use std::fmt;

use mergeguard_frame::{JoinError, JoinHow, Side, Table, TypeClass, Value};

use crate::model::MergeType;

#[derive(Debug)]
pub enum MergeError {
    /// `on` given together with `left_on` or `right_on`.
    AmbiguousKeySpec,
    /// No key columns for one side.
    MissingKeySpec { side: Side },
    /// Left and right key lists differ in length.
    KeyArityMismatch { left: usize, right: usize },
    /// A key column does not exist in its table.
    MissingKeyColumn { side: Side, column: String },
    /// Non-key column present on both sides and no suffixes supplied.
    AmbiguousColumnOverlap { column: String },
    KeyTypeMismatch {
        left_column: String,
        left_class: TypeClass,
        right_column: String,
        right_class: TypeClass,
    },
    InvalidMergeType(String),
    InvalidJoinHow(String),
    /// A side declared unique has repeated key tuples.
    NonUniqueKey {
        side: Side,
        duplicate_rows: usize,
        sample: Vec<Vec<Value>>,
    },
    InvalidProvenanceSet(String),
    /// Rows fell outside the declared provenance set.
    UnexpectedProvenance {
        count: usize,
        mergetype: MergeType,
        how: JoinHow,
        left_keys: Vec<String>,
        right_keys: Vec<String>,
        sample: Table,
    },
    /// `matches_required` and no row came from both tables.
    EmptyIntersection {
        left_keys: Vec<String>,
        right_keys: Vec<String>,
    },
    /// Result size outside the combinatorial bound. Indicates a defect in the
    /// join primitive or a declared contract that cannot hold.
    RowCountInvariantViolated {
        how: JoinHow,
        mergetype: MergeType,
        left_rows: usize,
        right_rows: usize,
        result_rows: usize,
        rule: &'static str,
    },
    /// The requested provenance column name is already taken.
    IndicatorCollision { column: String },
    /// The join primitive itself failed.
    Join(JoinError),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Merge job validation error.
    ConfigValidation(String),
}

impl MergeError {
    /// Stable snake_case tag for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AmbiguousKeySpec => "ambiguous_key_spec",
            Self::MissingKeySpec { .. } => "missing_key_spec",
            Self::KeyArityMismatch { .. } => "key_arity_mismatch",
            Self::MissingKeyColumn { .. } => "missing_key_column",
            Self::AmbiguousColumnOverlap { .. } => "ambiguous_column_overlap",
            Self::KeyTypeMismatch { .. } => "key_type_mismatch",
            Self::InvalidMergeType(_) => "invalid_merge_type",
            Self::InvalidJoinHow(_) => "invalid_join_how",
            Self::NonUniqueKey { .. } => "non_unique_key",
            Self::InvalidProvenanceSet(_) => "invalid_provenance_set",
            Self::UnexpectedProvenance { .. } => "unexpected_provenance",
            Self::EmptyIntersection { .. } => "empty_intersection",
            Self::RowCountInvariantViolated { .. } => "row_count_invariant_violated",
            Self::IndicatorCollision { .. } => "indicator_collision",
            Self::Join(_) => "join",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
        }
    }
}

fn tuple(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("({})", parts.join(", "))
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousKeySpec => {
                write!(f, "cannot specify 'on' as well as 'left_on' or 'right_on'")
            }
            Self::MissingKeySpec { side } => write!(f, "no key columns given for the {side} table"),
            Self::KeyArityMismatch { left, right } => {
                write!(f, "left_on has {left} column(s) but right_on has {right}")
            }
            Self::MissingKeyColumn { side, column } => {
                write!(f, "key column '{column}' not found in {side} table")
            }
            Self::AmbiguousColumnOverlap { column } => write!(
                f,
                "column '{column}' exists in both tables; specify suffixes if both columns are to be kept"
            ),
            Self::KeyTypeMismatch {
                left_column,
                left_class,
                right_column,
                right_class,
            } => write!(
                f,
                "column '{left_column}' in left table is {left_class}; column '{right_column}' in right table is {right_class}"
            ),
            Self::InvalidMergeType(v) => {
                write!(f, "invalid mergetype '{v}' (expected 1:1, 1:m, m:1 or m:m)")
            }
            Self::InvalidJoinHow(v) => {
                write!(f, "invalid how '{v}' (expected left, right, inner or outer)")
            }
            Self::NonUniqueKey {
                side,
                duplicate_rows,
                sample,
            } => {
                let shown: Vec<String> = sample.iter().map(|t| tuple(t)).collect();
                write!(
                    f,
                    "{side} key is not unique: {duplicate_rows} duplicate row(s), e.g. {}",
                    shown.join(", ")
                )
            }
            Self::InvalidProvenanceSet(v) => write!(
                f,
                "invalid provenance '{v}' (sets may only contain left_only, right_only or both)"
            ),
            Self::UnexpectedProvenance {
                count,
                mergetype,
                how,
                left_keys,
                right_keys,
                ..
            } => write!(
                f,
                "{count} row(s) outside the expected provenance set ({how} {mergetype} on {}/{})",
                left_keys.join(","),
                right_keys.join(",")
            ),
            Self::EmptyIntersection { left_keys, right_keys } => write!(
                f,
                "intersection of left and right tables is empty (on {}/{})",
                left_keys.join(","),
                right_keys.join(",")
            ),
            Self::RowCountInvariantViolated {
                how,
                mergetype,
                left_rows,
                right_rows,
                result_rows,
                rule,
            } => write!(
                f,
                "row count invariant '{rule}' violated for {how} {mergetype}: l={left_rows} r={right_rows} n={result_rows}"
            ),
            Self::IndicatorCollision { column } => {
                write!(f, "indicator column '{column}' already exists in the merged table")
            }
            Self::Join(e) => write!(f, "join failed: {e}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Join(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JoinError> for MergeError {
    fn from(e: JoinError) -> Self {
        MergeError::Join(e)
    }
}

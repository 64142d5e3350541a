use mergeguard_frame::{JoinHow, JoinOutput, JoinPrimitive, JoinRequest, Table};

use crate::error::MergeError;
use crate::model::KeySpec;

/// Suffixes handed to the primitive when the caller supplied none. Only
/// reachable for key columns, since non-key overlap is rejected first.
pub const DEFAULT_SUFFIXES: (&str, &str) = ("_x", "_y");

/// How the join primitive is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Caller's join mode as-is.
    Direct(JoinHow),
    /// Full outer join, restricted afterwards. Rows the caller's join mode
    /// would drop must be visible to the provenance check.
    Probe,
}

impl ExecMode {
    pub fn select(how: JoinHow, validate_sets: bool) -> Self {
        if validate_sets {
            ExecMode::Probe
        } else {
            ExecMode::Direct(how)
        }
    }

    pub fn how(&self) -> JoinHow {
        match self {
            ExecMode::Direct(how) => *how,
            ExecMode::Probe => JoinHow::Outer,
        }
    }
}

/// Reject non-key column names present in both tables.
pub fn check_overlap(left: &Table, right: &Table, spec: &KeySpec) -> Result<(), MergeError> {
    let is_key = |name: &str| spec.left.iter().any(|k| k == name) || spec.right.iter().any(|k| k == name);

    for name in left.column_names() {
        if right.has_column(name) && !is_key(name) {
            return Err(MergeError::AmbiguousColumnOverlap {
                column: name.to_string(),
            });
        }
    }
    Ok(())
}

pub fn execute<J: JoinPrimitive + ?Sized>(
    join: &J,
    left: &Table,
    right: &Table,
    spec: &KeySpec,
    mode: ExecMode,
    suffixes: Option<&(String, String)>,
    sort: bool,
) -> Result<JoinOutput, MergeError> {
    if suffixes.is_none() {
        check_overlap(left, right, spec)?;
    }

    let suffixes = suffixes
        .map(|(l, r)| (l.as_str(), r.as_str()))
        .unwrap_or(DEFAULT_SUFFIXES);

    let request = JoinRequest {
        how: mode.how(),
        left_on: &spec.left,
        right_on: &spec.right,
        suffixes,
        sort,
    };

    log::debug!("executing {mode:?} join on {:?}/{:?}", spec.left, spec.right);
    let output = join.join(left, right, &request)?;

    if output.provenance.len() != output.table.len() {
        return Err(MergeError::Join(mergeguard_frame::JoinError::Backend(format!(
            "{} provenance tags for {} rows",
            output.provenance.len(),
            output.table.len()
        ))));
    }

    Ok(output)
}

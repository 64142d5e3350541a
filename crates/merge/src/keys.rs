use mergeguard_frame::{Side, Table};

use crate::error::MergeError;
use crate::model::{KeyArgs, KeySpec, Keys};

/// Resolve `on` / `left_on` / `right_on` into a paired key specification.
pub fn normalize(args: &KeyArgs) -> Result<KeySpec, MergeError> {
    if args.on.is_some() && (args.left_on.is_some() || args.right_on.is_some()) {
        return Err(MergeError::AmbiguousKeySpec);
    }

    let (left, right) = match &args.on {
        Some(on) => (on.clone(), on.clone()),
        None => (
            args.left_on.clone().ok_or(MergeError::MissingKeySpec { side: Side::Left })?,
            args.right_on.clone().ok_or(MergeError::MissingKeySpec { side: Side::Right })?,
        ),
    };
    let (Keys(left), Keys(right)) = (left, right);

    if left.is_empty() {
        return Err(MergeError::MissingKeySpec { side: Side::Left });
    }
    if right.is_empty() {
        return Err(MergeError::MissingKeySpec { side: Side::Right });
    }
    if left.len() != right.len() {
        return Err(MergeError::KeyArityMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    Ok(KeySpec { left, right })
}

/// Column positions of the key columns on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPositions {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

pub fn resolve(spec: &KeySpec, left: &Table, right: &Table) -> Result<KeyPositions, MergeError> {
    let find = |table: &Table, names: &[String], side: Side| -> Result<Vec<usize>, MergeError> {
        names
            .iter()
            .map(|n| {
                table.column_index(n).ok_or_else(|| MergeError::MissingKeyColumn {
                    side,
                    column: n.clone(),
                })
            })
            .collect()
    };

    Ok(KeyPositions {
        left: find(left, &spec.left, Side::Left)?,
        right: find(right, &spec.right, Side::Right)?,
    })
}

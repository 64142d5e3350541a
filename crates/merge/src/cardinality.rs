use std::collections::HashSet;

use mergeguard_frame::{Side, Table, Value};

use crate::error::MergeError;
use crate::keys::KeyPositions;
use crate::model::MergeType;

/// Offending key tuples carried in a `NonUniqueKey` error.
pub const DUPLICATE_SAMPLE: usize = 5;

/// Repeated key tuples on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicates {
    /// Rows whose key tuple already appeared earlier.
    pub rows: usize,
    /// Distinct repeated tuples, in order of first repetition.
    pub sample: Vec<Vec<Value>>,
}

pub fn find_duplicates(table: &Table, positions: &[usize]) -> Duplicates {
    let mut seen: HashSet<Vec<&Value>> = HashSet::with_capacity(table.len());
    let mut reported: HashSet<Vec<&Value>> = HashSet::new();
    let mut rows = 0;
    let mut sample = Vec::new();

    for row in 0..table.len() {
        let key = table.key_of(row, positions);
        if seen.contains(&key) {
            rows += 1;
            if sample.len() < DUPLICATE_SAMPLE && !reported.contains(&key) {
                sample.push(key.iter().map(|v| (*v).clone()).collect());
                reported.insert(key);
            }
        } else {
            seen.insert(key);
        }
    }

    Duplicates { rows, sample }
}

/// Check uniqueness on every side the declared merge type claims unique.
/// Runs before any join is executed.
pub fn check_cardinality(
    mergetype: MergeType,
    left: &Table,
    right: &Table,
    keys: &KeyPositions,
) -> Result<(), MergeError> {
    let sides = [
        (mergetype.left_unique(), Side::Left, left, &keys.left),
        (mergetype.right_unique(), Side::Right, right, &keys.right),
    ];

    for (declared_unique, side, table, positions) in sides {
        if !declared_unique {
            continue;
        }
        let dups = find_duplicates(table, positions);
        if dups.rows > 0 {
            log::debug!("{side} key not unique: {} duplicate row(s)", dups.rows);
            return Err(MergeError::NonUniqueKey {
                side,
                duplicate_rows: dups.rows,
                sample: dups.sample,
            });
        }
    }

    Ok(())
}

use std::collections::HashSet;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::table::{Column, Table, TableError};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Join vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinHow {
    Left,
    Right,
    Inner,
    Outer,
}

impl JoinHow {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "inner" => Some(Self::Inner),
            "outer" | "full" | "full_outer" => Some(Self::Outer),
            _ => None,
        }
    }
}

impl fmt::Display for JoinHow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Inner => write!(f, "inner"),
            Self::Outer => write!(f, "outer"),
        }
    }
}

/// Which input table(s) contributed an output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    LeftOnly,
    RightOnly,
    Both,
}

impl Provenance {
    pub const ALL: [Provenance; 3] = [Provenance::LeftOnly, Provenance::RightOnly, Provenance::Both];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LeftOnly => "left_only",
            Self::RightOnly => "right_only",
            Self::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "left_only" => Some(Self::LeftOnly),
            "right_only" => Some(Self::RightOnly),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Primitive contract
// ---------------------------------------------------------------------------

/// Everything a join primitive needs to execute one join.
#[derive(Debug, Clone, Copy)]
pub struct JoinRequest<'a> {
    pub how: JoinHow,
    pub left_on: &'a [String],
    pub right_on: &'a [String],
    /// Appended to non-key column names present on both sides.
    pub suffixes: (&'a str, &'a str),
    /// Sort output rows by join key.
    pub sort: bool,
}

/// Joined rows plus one provenance tag per row.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutput {
    pub table: Table,
    pub provenance: Vec<Provenance>,
}

#[derive(Debug)]
pub enum JoinError {
    MissingColumn { side: Side, column: String },
    KeyArity { left: usize, right: usize },
    Table(TableError),
    /// Failure reported by a foreign join implementation.
    Backend(String),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { side, column } => {
                write!(f, "{side} table has no column '{column}'")
            }
            Self::KeyArity { left, right } => {
                write!(f, "{left} left key column(s) vs {right} right key column(s)")
            }
            Self::Table(e) => write!(f, "{e}"),
            Self::Backend(msg) => write!(f, "join backend: {msg}"),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<TableError> for JoinError {
    fn from(e: TableError) -> Self {
        JoinError::Table(e)
    }
}

/// A two-table equi-join with provenance tagging.
///
/// Implementations must return exactly one `Provenance` per output row.
pub trait JoinPrimitive {
    fn join(&self, left: &Table, right: &Table, request: &JoinRequest<'_>) -> Result<JoinOutput, JoinError>;
}

impl<J: JoinPrimitive + ?Sized> JoinPrimitive for &J {
    fn join(&self, left: &Table, right: &Table, request: &JoinRequest<'_>) -> Result<JoinOutput, JoinError> {
        (**self).join(left, right, request)
    }
}

// ---------------------------------------------------------------------------
// Reference implementation
// ---------------------------------------------------------------------------

/// In-memory hash join.
///
/// Key columns named identically on both sides are emitted once (left value,
/// falling back to right for right-only rows). Left-driven joins keep left
/// row order; right joins keep right row order; outer joins append unmatched
/// right rows after the left-driven rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashJoin;

type RowPair = (Option<usize>, Option<usize>);

impl JoinPrimitive for HashJoin {
    fn join(&self, left: &Table, right: &Table, request: &JoinRequest<'_>) -> Result<JoinOutput, JoinError> {
        let lpos = key_positions(left, request.left_on, Side::Left)?;
        let rpos = key_positions(right, request.right_on, Side::Right)?;
        if lpos.len() != rpos.len() {
            return Err(JoinError::KeyArity {
                left: lpos.len(),
                right: rpos.len(),
            });
        }

        let mut pairs: Vec<RowPair> = Vec::new();

        if request.how == JoinHow::Right {
            let left_map = index_keys(left, &lpos);
            for r in 0..right.len() {
                match left_map.get(&right.key_of(r, &rpos)) {
                    Some(ls) => pairs.extend(ls.iter().map(|&l| (Some(l), Some(r)))),
                    None => pairs.push((None, Some(r))),
                }
            }
        } else {
            let right_map = index_keys(right, &rpos);
            let mut right_used = vec![false; right.len()];
            for l in 0..left.len() {
                match right_map.get(&left.key_of(l, &lpos)) {
                    Some(rs) => {
                        for &r in rs {
                            right_used[r] = true;
                            pairs.push((Some(l), Some(r)));
                        }
                    }
                    None if matches!(request.how, JoinHow::Left | JoinHow::Outer) => {
                        pairs.push((Some(l), None));
                    }
                    None => {}
                }
            }
            if request.how == JoinHow::Outer {
                pairs.extend(
                    right_used
                        .iter()
                        .enumerate()
                        .filter(|(_, used)| !**used)
                        .map(|(r, _)| (None, Some(r))),
                );
            }
        }

        if request.sort {
            let key = |p: &RowPair| match p {
                (Some(l), _) => left.key_of(*l, &lpos),
                (None, Some(r)) => right.key_of(*r, &rpos),
                (None, None) => Vec::new(),
            };
            pairs.sort_by(|a, b| key(a).cmp(&key(b)));
        }

        let layout = plan_layout(left, right, request, &lpos, &rpos);
        let columns: Vec<Column> = layout.iter().map(|c| c.column.clone()).collect();
        let mut table = Table::new(columns)?;
        let mut provenance = Vec::with_capacity(pairs.len());

        for (l, r) in &pairs {
            let row = layout
                .iter()
                .map(|c| match c.source {
                    Source::Left(i) => l.map(|l| left.rows()[l][i].clone()).unwrap_or_default(),
                    Source::Right(j) => r.map(|r| right.rows()[r][j].clone()).unwrap_or_default(),
                    Source::Coalesced(i, j) => match (l, r) {
                        (Some(l), _) => left.rows()[*l][i].clone(),
                        (None, Some(r)) => right.rows()[*r][j].clone(),
                        (None, None) => Value::Null,
                    },
                })
                .collect();
            table.push_row(row)?;
            provenance.push(match (l, r) {
                (Some(_), Some(_)) => Provenance::Both,
                (Some(_), None) => Provenance::LeftOnly,
                _ => Provenance::RightOnly,
            });
        }

        log::debug!(
            "hash join ({}): {} x {} rows -> {} rows",
            request.how,
            left.len(),
            right.len(),
            table.len()
        );

        Ok(JoinOutput { table, provenance })
    }
}

fn key_positions(table: &Table, names: &[String], side: Side) -> Result<Vec<usize>, JoinError> {
    names
        .iter()
        .map(|n| {
            table.column_index(n).ok_or_else(|| JoinError::MissingColumn {
                side,
                column: n.clone(),
            })
        })
        .collect()
}

fn index_keys<'t>(table: &'t Table, positions: &[usize]) -> FxHashMap<Vec<&'t Value>, Vec<usize>> {
    let mut map: FxHashMap<Vec<&Value>, Vec<usize>> = FxHashMap::default();
    for row in 0..table.len() {
        map.entry(table.key_of(row, positions)).or_default().push(row);
    }
    map
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Left(usize),
    Right(usize),
    Coalesced(usize, usize),
}

struct OutputColumn {
    column: Column,
    source: Source,
}

fn plan_layout(
    left: &Table,
    right: &Table,
    request: &JoinRequest<'_>,
    lpos: &[usize],
    rpos: &[usize],
) -> Vec<OutputColumn> {
    // Key pairs with identical names collapse into one output column.
    let coalesced: FxHashMap<usize, usize> = lpos
        .iter()
        .zip(rpos)
        .filter(|(l, r)| left.columns()[**l].name == right.columns()[**r].name)
        .map(|(l, r)| (*l, *r))
        .collect();
    let right_skipped: HashSet<usize> = coalesced.values().copied().collect();

    let left_names: HashSet<&str> = left.column_names().collect();
    let right_names: HashSet<&str> = right
        .columns()
        .iter()
        .enumerate()
        .filter(|(j, _)| !right_skipped.contains(j))
        .map(|(_, c)| c.name.as_str())
        .collect();

    let (lsuffix, rsuffix) = request.suffixes;
    let mut layout = Vec::with_capacity(left.columns().len() + right.columns().len());

    for (i, col) in left.columns().iter().enumerate() {
        if let Some(&j) = coalesced.get(&i) {
            layout.push(OutputColumn {
                column: col.clone(),
                source: Source::Coalesced(i, j),
            });
            continue;
        }
        let name = if right_names.contains(col.name.as_str()) {
            format!("{}{lsuffix}", col.name)
        } else {
            col.name.clone()
        };
        layout.push(OutputColumn {
            column: Column::new(name, col.dtype),
            source: Source::Left(i),
        });
    }

    for (j, col) in right.columns().iter().enumerate() {
        if right_skipped.contains(&j) {
            continue;
        }
        let name = if left_names.contains(col.name.as_str()) {
            format!("{}{rsuffix}", col.name)
        } else {
            col.name.clone()
        };
        layout.push(OutputColumn {
            column: Column::new(name, col.dtype),
            source: Source::Right(j),
        });
    }

    layout
}

use std::collections::BTreeSet;

use mergeguard_frame::{Column, ColumnType, JoinHow, JoinOutput, Provenance, Table, TableError, Value};

use crate::error::MergeError;

/// Example rows reported for a provenance violation.
pub const EXAMPLE_ROWS: usize = 10;

/// Rows whose provenance falls outside the declared set.
#[derive(Debug, Clone, PartialEq)]
pub struct Violations {
    pub count: usize,
    /// Up to `EXAMPLE_ROWS` offending rows, with the provenance column attached.
    pub sample: Table,
}

pub fn find_violations(
    output: &JoinOutput,
    expected: &BTreeSet<Provenance>,
    indicator: &str,
) -> Result<Option<Violations>, MergeError> {
    let offending: Vec<usize> = output
        .provenance
        .iter()
        .enumerate()
        .filter(|(_, p)| !expected.contains(*p))
        .map(|(i, _)| i)
        .collect();

    if offending.is_empty() {
        return Ok(None);
    }

    let shown = &offending[..offending.len().min(EXAMPLE_ROWS)];
    let tags: Vec<Provenance> = shown.iter().map(|&i| output.provenance[i]).collect();
    let column = free_column_name(&output.table, indicator);
    let sample = attach_indicator(output.table.take_rows(shown), &column, &tags)?;

    Ok(Some(Violations {
        count: offending.len(),
        sample,
    }))
}

/// `name`, extended with underscores until no column of `table` uses it.
fn free_column_name(table: &Table, name: &str) -> String {
    let mut name = name.to_string();
    while table.has_column(&name) {
        name.push('_');
    }
    name
}

/// Provenance categories each join mode keeps from a full outer join.
pub fn retained(how: JoinHow) -> &'static [Provenance] {
    match how {
        JoinHow::Left => &[Provenance::LeftOnly, Provenance::Both],
        JoinHow::Right => &[Provenance::RightOnly, Provenance::Both],
        JoinHow::Inner => &[Provenance::Both],
        JoinHow::Outer => &Provenance::ALL,
    }
}

/// Cut a full outer join down to the rows `how` would have produced.
pub fn restrict(output: JoinOutput, how: JoinHow) -> JoinOutput {
    if how == JoinHow::Outer {
        return output;
    }
    let keep = retained(how);
    let rows: Vec<usize> = output
        .provenance
        .iter()
        .enumerate()
        .filter(|(_, p)| keep.contains(*p))
        .map(|(i, _)| i)
        .collect();

    JoinOutput {
        table: output.table.take_rows(&rows),
        provenance: rows.iter().map(|&i| output.provenance[i]).collect(),
    }
}

/// Append the provenance column as categorical labels.
pub fn attach_indicator(table: Table, name: &str, provenance: &[Provenance]) -> Result<Table, MergeError> {
    let values = provenance.iter().map(|p| Value::from(p.label())).collect();
    table
        .with_column(Column::new(name, ColumnType::Categorical), values)
        .map_err(|e| match e {
            TableError::DuplicateColumn(column) => MergeError::IndicatorCollision { column },
            other => MergeError::Join(other.into()),
        })
}

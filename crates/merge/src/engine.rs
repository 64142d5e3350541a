use std::time::Instant;

use mergeguard_frame::{HashJoin, JoinOutput, JoinPrimitive, Table};

use crate::cardinality::check_cardinality;
use crate::error::MergeError;
use crate::executor::{execute, ExecMode};
use crate::invariants::check_row_counts;
use crate::keys;
use crate::membership::{attach_indicator, find_violations, restrict};
use crate::model::{MergeOptions, MergeResult, MergeStats, ProvenanceCounts, DEFAULT_INDICATOR};
use crate::report::{check_intersection, ReportSink};
use crate::types::check_key_types;

/// Validated merge using the in-memory `HashJoin`.
pub fn merge(
    left: &Table,
    right: &Table,
    options: &MergeOptions,
    sink: &mut dyn ReportSink,
) -> Result<MergeResult, MergeError> {
    merge_with(&HashJoin, left, right, options, sink)
}

/// Validated merge on top of any join primitive.
///
/// Pre-conditions (keys, key types, declared uniqueness) are checked before
/// the primitive runs; provenance and row-count post-conditions after. The
/// call is all-or-nothing: an error never comes with a partial result.
pub fn merge_with<J: JoinPrimitive + ?Sized>(
    join: &J,
    left: &Table,
    right: &Table,
    options: &MergeOptions,
    sink: &mut dyn ReportSink,
) -> Result<MergeResult, MergeError> {
    let start = Instant::now();

    if let Some(ref msg) = options.message {
        sink.message(msg);
    }

    // Pre-conditions
    let spec = keys::normalize(&options.keys)?;
    let positions = keys::resolve(&spec, left, right)?;
    check_key_types(left, right, &positions)?;
    check_cardinality(options.mergetype, left, right, &positions)?;

    // Join
    let expected = options.expected_set();
    let mode = ExecMode::select(options.how, expected.is_some());
    let output = execute(
        join,
        left,
        right,
        &spec,
        mode,
        options.suffixes.as_ref(),
        options.sort,
    )?;

    let stats_for = |output: &JoinOutput| MergeStats {
        how: options.how,
        mergetype: options.mergetype,
        left_keys: spec.left.clone(),
        right_keys: spec.right.clone(),
        counts: ProvenanceCounts::tally(&output.provenance),
        left_rows: left.len(),
        right_rows: right.len(),
        result_rows: output.table.len(),
        elapsed: start.elapsed(),
    };

    // Post-conditions
    let counts = ProvenanceCounts::tally(&output.provenance);
    if let Err(e) = check_intersection(&counts, options.matches_required, &spec.left, &spec.right) {
        if !options.quiet {
            sink.stats(&stats_for(&output));
        }
        return Err(e);
    }

    let output = match expected {
        Some(expected) => {
            let indicator = options.indicator.column_name().unwrap_or(DEFAULT_INDICATOR);
            if let Some(violations) = find_violations(&output, expected, indicator)? {
                if !options.quiet {
                    sink.stats(&stats_for(&output));
                }
                sink.violations(&violations.sample);
                return Err(MergeError::UnexpectedProvenance {
                    count: violations.count,
                    mergetype: options.mergetype,
                    how: options.how,
                    left_keys: spec.left.clone(),
                    right_keys: spec.right.clone(),
                    sample: violations.sample,
                });
            }
            restrict(output, options.how)
        }
        None => output,
    };

    check_row_counts(
        options.how,
        options.mergetype,
        left.len(),
        right.len(),
        output.table.len(),
    )?;

    let stats = stats_for(&output);
    if !options.quiet {
        sink.stats(&stats);
    }

    let table = match options.indicator.column_name() {
        Some(name) => attach_indicator(output.table, name, &output.provenance)?,
        None => output.table,
    };

    log::debug!(
        "merge ({} {}) produced {} rows in {:?}",
        options.how,
        options.mergetype,
        table.len(),
        stats.elapsed
    );

    Ok(MergeResult { table, stats })
}

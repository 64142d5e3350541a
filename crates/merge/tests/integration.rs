use std::cell::Cell;

use mergeguard_frame::{JoinError, JoinOutput, JoinRequest, Side};
use mergeguard_merge::{
    merge, merge_with, CollectingSink, Column, HashJoin, Indicator, JoinHow, JoinPrimitive, KeyArgs, MergeError,
    MergeOptions, MergeType, NullSink, Provenance, Table, Value,
};

fn left() -> Table {
    Table::from_rows(
        vec![Column::int("id"), Column::text("a")],
        vec![vec![1.into(), "x".into()], vec![2.into(), "y".into()]],
    )
    .unwrap()
}

fn right() -> Table {
    Table::from_rows(
        vec![Column::int("id"), Column::text("b")],
        vec![vec![1.into(), "p".into()], vec![3.into(), "q".into()]],
    )
    .unwrap()
}

fn ids(n: i64) -> Table {
    Table::from_rows(vec![Column::int("id")], (1..=n).map(|i| vec![Value::from(i)]).collect()).unwrap()
}

/// Delegates to `HashJoin`, counting invocations.
#[derive(Default)]
struct CountingJoin {
    calls: Cell<usize>,
}

impl JoinPrimitive for CountingJoin {
    fn join(&self, left: &Table, right: &Table, request: &JoinRequest<'_>) -> Result<JoinOutput, JoinError> {
        self.calls.set(self.calls.get() + 1);
        HashJoin.join(left, right, request)
    }
}

/// Ignores its inputs and returns `rows` matched rows.
struct FixedRowsJoin {
    rows: usize,
}

impl JoinPrimitive for FixedRowsJoin {
    fn join(&self, _left: &Table, _right: &Table, _request: &JoinRequest<'_>) -> Result<JoinOutput, JoinError> {
        Ok(JoinOutput {
            table: ids(self.rows as i64),
            provenance: vec![Provenance::Both; self.rows],
        })
    }
}

// -------------------------------------------------------------------------
// Reference scenarios
// -------------------------------------------------------------------------

#[test]
fn inner_one_to_one_keeps_matched_row() {
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Inner, KeyArgs::on("id"));
    let result = merge(&left(), &right(), &options, &mut NullSink).unwrap();

    assert_eq!(result.table.column_names().collect::<Vec<_>>(), vec!["id", "a", "b"]);
    assert_eq!(result.table.rows(), &[vec![Value::from(1), Value::from("x"), Value::from("p")]]);
    assert_eq!(result.stats.result_rows, 1);
}

#[test]
fn outer_with_both_only_reports_unmatched_rows() {
    let options =
        MergeOptions::new(MergeType::OneToOne, JoinHow::Outer, KeyArgs::on("id")).expect([Provenance::Both]);
    let mut sink = CollectingSink::new();
    let err = merge(&left(), &right(), &options, &mut sink).unwrap_err();

    match err {
        MergeError::UnexpectedProvenance { count, ref sample, .. } => {
            assert_eq!(count, 2);
            let ids = sample.values("id").unwrap();
            assert!(ids.contains(&&Value::from(2)));
            assert!(ids.contains(&&Value::from(3)));
        }
        other => panic!("expected UnexpectedProvenance, got {other:?}"),
    }
    assert_eq!(err.kind(), "unexpected_provenance");

    // Stats and examples were reported before failing.
    assert_eq!(sink.recorded_stats().len(), 1);
    assert_eq!(sink.recorded_violations().map(Table::len), Some(2));
}

#[test]
fn duplicate_left_key_fails_before_join() {
    let dup = Table::from_rows(
        vec![Column::int("id"), Column::text("a")],
        vec![vec![1.into(), "x".into()], vec![1.into(), "z".into()]],
    )
    .unwrap();
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id"));
    let join = CountingJoin::default();

    let err = merge_with(&join, &dup, &right(), &options, &mut NullSink).unwrap_err();
    assert!(matches!(
        err,
        MergeError::NonUniqueKey { side: Side::Left, duplicate_rows: 1, .. }
    ));
    assert_eq!(join.calls.get(), 0);
}

#[test]
fn empty_left_table_left_join() {
    let empty = Table::new(vec![Column::int("id")]).unwrap();
    let options =
        MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id")).matches_required(false);
    let result = merge(&empty, &ids(1), &options, &mut NullSink).unwrap();
    assert!(result.table.is_empty());
    assert_eq!(result.stats.left_rows, 0);

    // With matches required the empty intersection is the failure, not the row count.
    let strict = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id"));
    assert!(matches!(
        merge(&empty, &ids(1), &strict, &mut NullSink),
        Err(MergeError::EmptyIntersection { .. })
    ));
}

// -------------------------------------------------------------------------
// Pre-conditions
// -------------------------------------------------------------------------

#[test]
fn many_to_many_allows_duplicates_on_both_sides() {
    let l = Table::from_rows(vec![Column::int("id")], vec![vec![1.into()], vec![1.into()]]).unwrap();
    let r = Table::from_rows(vec![Column::int("id")], vec![vec![1.into()], vec![1.into()]]).unwrap();
    let options = MergeOptions::new(MergeType::ManyToMany, JoinHow::Inner, KeyArgs::on("id"));
    assert_eq!(merge(&l, &r, &options, &mut NullSink).unwrap().table.len(), 4);

    let declared = MergeOptions::new(MergeType::ManyToOne, JoinHow::Inner, KeyArgs::on("id"));
    assert!(matches!(
        merge(&l, &r, &declared, &mut NullSink),
        Err(MergeError::NonUniqueKey { side: Side::Right, .. })
    ));
}

#[test]
fn numeric_key_against_text_key() {
    let text_ids = Table::from_rows(vec![Column::text("id")], vec![vec!["1".into()]]).unwrap();
    let options = MergeOptions::new(MergeType::ManyToMany, JoinHow::Outer, KeyArgs::on("id"));
    let err = merge(&left(), &text_ids, &options, &mut NullSink).unwrap_err();
    assert!(matches!(err, MergeError::KeyTypeMismatch { .. }));
    assert!(err.to_string().contains("numeric"));
}

#[test]
fn date_keys_join() {
    use chrono::NaiveDate;

    let day = |d| Value::from(NaiveDate::from_ymd_opt(2024, 3, d).unwrap());
    let l = Table::from_rows(
        vec![Column::date("day"), Column::text("a")],
        vec![vec![day(1), "x".into()], vec![day(2), "y".into()]],
    )
    .unwrap();
    let r = Table::from_rows(vec![Column::date("day"), Column::float("rate")], vec![vec![day(2), 1.5.into()]]).unwrap();
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("day"));
    let result = merge(&l, &r, &options, &mut NullSink).unwrap();
    assert_eq!(result.stats.counts.both, 1);
    assert_eq!(result.table.values("rate").unwrap(), vec![&Value::Null, &Value::from(1.5)]);
}

#[test]
fn overlapping_columns_need_suffixes() {
    let l = Table::from_rows(
        vec![Column::int("id"), Column::text("name")],
        vec![vec![1.into(), "a".into()]],
    )
    .unwrap();
    let r = Table::from_rows(
        vec![Column::int("id"), Column::text("name")],
        vec![vec![1.into(), "b".into()]],
    )
    .unwrap();

    let bare = MergeOptions::new(MergeType::OneToOne, JoinHow::Inner, KeyArgs::on("id"));
    assert!(matches!(
        merge(&l, &r, &bare, &mut NullSink),
        Err(MergeError::AmbiguousColumnOverlap { ref column }) if column == "name"
    ));

    let suffixed = bare.suffixes("_l", "_r");
    let result = merge(&l, &r, &suffixed, &mut NullSink).unwrap();
    assert_eq!(result.table.column_names().collect::<Vec<_>>(), vec!["id", "name_l", "name_r"]);
}

#[test]
fn differently_named_keys() {
    let r = Table::from_rows(
        vec![Column::int("key"), Column::text("b")],
        vec![vec![2.into(), "q".into()]],
    )
    .unwrap();
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::sides("id", "key"));
    let result = merge(&left(), &r, &options, &mut NullSink).unwrap();
    assert_eq!(result.table.len(), 2);
    assert_eq!(result.table.values("b").unwrap(), vec![&Value::Null, &Value::from("q")]);
}

// -------------------------------------------------------------------------
// Provenance
// -------------------------------------------------------------------------

#[test]
fn probe_sees_rows_the_join_mode_drops() {
    // id 3 is right-only; an inner join would hide it, the probe does not.
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Inner, KeyArgs::on("id"))
        .expect([Provenance::Both, Provenance::LeftOnly]);
    let err = merge(&left(), &right(), &options, &mut NullSink).unwrap_err();
    assert!(matches!(err, MergeError::UnexpectedProvenance { count: 1, .. }));
}

#[test]
fn probe_result_restricted_to_join_mode() {
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id"))
        .expect(Provenance::ALL)
        .indicator(Indicator::Default);
    let result = merge(&left(), &right(), &options, &mut NullSink).unwrap();
    assert_eq!(result.table.len(), 2);
    assert_eq!(
        result.table.values("_merge").unwrap(),
        vec![&Value::from("both"), &Value::from("left_only")]
    );
}

#[test]
fn indicator_name_taken_by_input_column() {
    let l = Table::from_rows(
        vec![Column::int("id"), Column::text("_merge")],
        vec![vec![1.into(), "x".into()]],
    )
    .unwrap();
    let options =
        MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id")).indicator(Indicator::Default);
    assert!(matches!(
        merge(&l, &ids(1), &options, &mut NullSink),
        Err(MergeError::IndicatorCollision { .. })
    ));
}

#[test]
fn unexpected_provenance_wins_over_input_indicator_column() {
    let l = Table::from_rows(
        vec![Column::int("id"), Column::text("_merge")],
        vec![vec![1.into(), "x".into()], vec![5.into(), "y".into()], vec![6.into(), "z".into()]],
    )
    .unwrap();
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id"))
        .expect([Provenance::Both])
        .quiet(true);
    let mut sink = CollectingSink::default();
    let err = merge(&l, &ids(1), &options, &mut sink).unwrap_err();
    assert!(matches!(err, MergeError::UnexpectedProvenance { count: 2, .. }), "{err:?}");

    let sample = sink.recorded_violations().unwrap();
    assert_eq!(sample.values("_merge").unwrap(), vec![&Value::from("y"), &Value::from("z")]);
    assert_eq!(
        sample.values("_merge_").unwrap(),
        vec![&Value::from("left_only"), &Value::from("left_only")]
    );
}

#[test]
fn ids_beyond_float_precision_join_exactly() {
    let big = 9_007_199_254_740_992i64;
    let l = Table::from_rows(vec![Column::int("id")], vec![vec![big.into()], vec![(big + 1).into()]]).unwrap();
    let r = Table::from_rows(vec![Column::int("id")], vec![vec![(big + 1).into()]]).unwrap();
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Left, KeyArgs::on("id"));
    let result = merge(&l, &r, &options, &mut NullSink).unwrap();
    assert_eq!(result.table.len(), 2);
    assert_eq!(result.stats.counts.both, 1);
    assert_eq!(result.stats.counts.left_only, 1);
}

// -------------------------------------------------------------------------
// Row-count invariants
// -------------------------------------------------------------------------

#[test]
fn every_bound_rejects_out_of_range_result() {
    use JoinHow::*;
    use MergeType::*;

    // l = 2, r = 3, both sides unique so every mergetype passes its pre-checks.
    let cases: &[(JoinHow, MergeType, usize, &str)] = &[
        (Left, OneToOne, 3, "n == l"),
        (Left, ManyToOne, 1, "n == l"),
        (Left, OneToMany, 1, "n >= l"),
        (Left, OneToMany, 5, "n <= l + r - 1"),
        (Left, ManyToMany, 7, "n <= l * r"),
        (Right, OneToOne, 2, "n == r"),
        (Right, OneToMany, 4, "n == r"),
        (Right, ManyToOne, 2, "n >= r"),
        (Right, ManyToOne, 5, "n <= l + r - 1"),
        (Right, ManyToMany, 7, "n <= l * r"),
        (Inner, OneToOne, 4, "n <= max(l, r)"),
        (Outer, OneToOne, 2, "n >= max(l, r)"),
        (Outer, ManyToOne, 6, "n <= l + r"),
        (Outer, ManyToMany, 7, "n <= l * r"),
    ];

    for &(how, mergetype, rows, expected_rule) in cases {
        let options = MergeOptions::new(mergetype, how, KeyArgs::on("id"));
        let err = merge_with(&FixedRowsJoin { rows }, &ids(2), &ids(3), &options, &mut NullSink).unwrap_err();
        match err {
            MergeError::RowCountInvariantViolated { rule, result_rows, .. } => {
                assert_eq!(rule, expected_rule, "{how} {mergetype} n={rows}");
                assert_eq!(result_rows, rows);
            }
            other => panic!("{how} {mergetype} n={rows}: unexpected {other:?}"),
        }
    }
}

#[test]
fn in_range_result_passes() {
    let options = MergeOptions::new(MergeType::OneToMany, JoinHow::Left, KeyArgs::on("id"));
    let result = merge_with(&FixedRowsJoin { rows: 4 }, &ids(2), &ids(3), &options, &mut NullSink).unwrap();
    assert_eq!(result.table.len(), 4);
}

#[test]
fn identical_inputs_give_identical_results() {
    let options = MergeOptions::new(MergeType::OneToOne, JoinHow::Outer, KeyArgs::on("id")).sort(true);
    let first = merge(&left(), &right(), &options, &mut NullSink).unwrap();
    let second = merge(&left(), &right(), &options, &mut NullSink).unwrap();
    assert_eq!(first.table, second.table);
    assert_eq!(first.stats.counts, second.stats.counts);
}

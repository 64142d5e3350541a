use mergeguard_frame::JoinHow;

use crate::error::MergeError;
use crate::model::MergeType;

/// Assert the result size against the bounds implied by `(how, mergetype)`.
///
/// `left_rows`, `right_rows` and `result_rows` are `l`, `r` and `n` in the
/// rule names. Inner joins only bound `1:1`; the other inner combinations are
/// left unchecked.
pub fn check_row_counts(
    how: JoinHow,
    mergetype: MergeType,
    left_rows: usize,
    right_rows: usize,
    result_rows: usize,
) -> Result<(), MergeError> {
    let (l, r, n) = (left_rows, right_rows, result_rows);
    let l_plus_r_minus_1 = (l + r).saturating_sub(1);
    let l_times_r = l.saturating_mul(r);

    use MergeType::*;
    let rules: Vec<(&'static str, bool)> = match (how, mergetype) {
        (JoinHow::Left, OneToOne | ManyToOne) => vec![("n == l", n == l)],
        (JoinHow::Left, OneToMany) => vec![("n >= l", n >= l), ("n <= l + r - 1", n <= l_plus_r_minus_1)],
        (JoinHow::Left, ManyToMany) => vec![("n >= l", n >= l), ("n <= l * r", n <= l_times_r)],

        (JoinHow::Right, OneToOne | OneToMany) => vec![("n == r", n == r)],
        (JoinHow::Right, ManyToOne) => vec![("n >= r", n >= r), ("n <= l + r - 1", n <= l_plus_r_minus_1)],
        (JoinHow::Right, ManyToMany) => vec![("n >= r", n >= r), ("n <= l * r", n <= l_times_r)],

        (JoinHow::Inner, OneToOne) => vec![("n <= max(l, r)", n <= l.max(r))],
        (JoinHow::Inner, _) => Vec::new(),

        (JoinHow::Outer, ManyToMany) => vec![("n >= max(l, r)", n >= l.max(r)), ("n <= l * r", n <= l_times_r)],
        (JoinHow::Outer, _) => vec![("n >= max(l, r)", n >= l.max(r)), ("n <= l + r", n <= l + r)],
    };

    match rules.into_iter().find(|(_, holds)| !holds) {
        Some((rule, _)) => {
            log::error!("row count invariant '{rule}' violated ({how} {mergetype}): l={l} r={r} n={n}");
            Err(MergeError::RowCountInvariantViolated {
                how,
                mergetype,
                left_rows: l,
                right_rows: r,
                result_rows: n,
                rule,
            })
        }
        None => Ok(()),
    }
}

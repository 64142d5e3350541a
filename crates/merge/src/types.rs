use mergeguard_frame::Table;

use crate::error::MergeError;
use crate::keys::KeyPositions;

/// Every key pair must share a type class (text, temporal, numeric).
///
/// A numeric id joined against a text id matches nothing instead of failing;
/// this turns that into an early error.
pub fn check_key_types(left: &Table, right: &Table, keys: &KeyPositions) -> Result<(), MergeError> {
    for (&l, &r) in keys.left.iter().zip(&keys.right) {
        let lcol = &left.columns()[l];
        let rcol = &right.columns()[r];
        let (lclass, rclass) = (lcol.dtype.class(), rcol.dtype.class());
        if lclass != rclass {
            return Err(MergeError::KeyTypeMismatch {
                left_column: lcol.name.clone(),
                left_class: lclass,
                right_column: rcol.name.clone(),
                right_class: rclass,
            });
        }
    }
    Ok(())
}

//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                      |
//! |------|--------------------------------------------------------------|
//! | 0    | Success                                                      |
//! | 1    | General error (join backend failure)                         |
//! | 2    | CLI usage error (bad args)                                   |
//! | 3    | Invalid merge job (TOML, merge type, join mode, key spec)    |
//! | 4    | I/O error (job file, input tables, output files)             |
//! | 5    | Pre-condition failed (key columns, key types, uniqueness)    |
//! | 6    | Provenance check failed (unexpected rows, empty intersection)|
//! | 7    | Row-count invariant violated                                 |

use mergeguard_merge::MergeError;

/// Success - merge completed and every check passed.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - the join primitive itself failed.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments reported by clap.
pub const EXIT_USAGE: u8 = 2;

/// Job file does not parse or does not validate.
pub const EXIT_INVALID_JOB: u8 = 3;

/// Cannot read or write a file.
pub const EXIT_IO: u8 = 4;

/// Inputs do not satisfy the declared contract before joining.
pub const EXIT_PRECONDITION: u8 = 5;

/// Joined rows fall outside the declared provenance set, or nothing matched.
pub const EXIT_PROVENANCE: u8 = 6;

/// Result size outside the bounds implied by join mode and merge type.
pub const EXIT_INVARIANT: u8 = 7;

/// Map a merge error to its exit code.
pub fn merge_exit_code(err: &MergeError) -> u8 {
    match err {
        MergeError::ConfigParse(_)
        | MergeError::ConfigValidation(_)
        | MergeError::InvalidMergeType(_)
        | MergeError::InvalidJoinHow(_)
        | MergeError::InvalidProvenanceSet(_)
        | MergeError::AmbiguousKeySpec
        | MergeError::MissingKeySpec { .. }
        | MergeError::KeyArityMismatch { .. } => EXIT_INVALID_JOB,

        MergeError::MissingKeyColumn { .. }
        | MergeError::AmbiguousColumnOverlap { .. }
        | MergeError::KeyTypeMismatch { .. }
        | MergeError::NonUniqueKey { .. }
        | MergeError::IndicatorCollision { .. } => EXIT_PRECONDITION,

        MergeError::UnexpectedProvenance { .. } | MergeError::EmptyIntersection { .. } => EXIT_PROVENANCE,

        MergeError::RowCountInvariantViolated { .. } => EXIT_INVARIANT,

        MergeError::Join(_) => EXIT_ERROR,
    }
}

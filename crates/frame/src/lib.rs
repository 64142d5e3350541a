//! `mergeguard-frame`: typed in-memory tables and the join primitive seam.
//!
//! The merge engine only depends on the `JoinPrimitive` trait; `HashJoin` is
//! the in-memory implementation used by the CLI and the tests.

pub mod join;
pub mod table;
pub mod value;

pub use join::{HashJoin, JoinError, JoinHow, JoinOutput, JoinPrimitive, JoinRequest, Provenance, Side};
pub use table::{Column, Table, TableError};
pub use value::{ColumnType, TypeClass, Value};

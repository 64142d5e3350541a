//! `mergeguard-merge`: validated two-table merge.
//!
//! Wraps a join primitive with declared-cardinality checks, provenance-set
//! validation and row-count invariants. No CLI or file IO.

pub mod cardinality;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod invariants;
pub mod keys;
pub mod membership;
pub mod model;
pub mod report;
pub mod types;

pub use config::MergeJob;
pub use engine::{merge, merge_with};
pub use error::MergeError;
pub use model::{Indicator, KeyArgs, Keys, MergeOptions, MergeResult, MergeStats, MergeType, ProvenanceCounts};
pub use report::{CollectingSink, LogSink, NullSink, ReportEvent, ReportSink};

pub use mergeguard_frame::{Column, ColumnType, HashJoin, JoinHow, JoinPrimitive, Provenance, Table, Value};

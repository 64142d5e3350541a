// File I/O operations

pub mod csv;
pub mod infer;
pub mod json;

pub use self::csv::{read_table, write_table};

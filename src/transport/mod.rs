/// Filesystem discovery and CSV persistence.
pub mod fs;

pub use fs::{numbered_files, read_table, write_table};

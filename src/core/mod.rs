//! Core data types and I/O operations.

pub mod frame;
pub mod loader;
pub mod writers;

pub use frame::{ColumnValues, Frame};
pub use loader::{load_dataset, Dataset, LoadError};
pub use writers::{artifact_path, write_frame_csv, write_table_csv, WriteError};

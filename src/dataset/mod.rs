//! Dataset loading and lenient field parsing.

pub mod loader;
pub mod values;

pub use loader::{is_remote, load_source, validate_columns, LoadOptions, LoadOutput};

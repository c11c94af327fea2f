//! Domain layer: pure rules with no I/O.

pub mod format;
pub mod patch;

pub use format::{find_specifier, is_valid_format, FormatSpecifier};
pub use patch::{merge_event, merge_reading, merge_value_descriptor, renames};

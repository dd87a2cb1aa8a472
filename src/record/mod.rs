pub mod builder;
pub mod format;

pub use builder::{build_record, FixedRecord};

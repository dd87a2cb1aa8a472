pub mod reader;
pub mod value;

pub use reader::{load_dataset, read_parquet_rows, resolve_files};
pub use value::{Row, Value};

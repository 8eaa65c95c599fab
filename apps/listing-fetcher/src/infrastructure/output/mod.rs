//! Output Adapters

mod json_writer;

pub use json_writer::{DEFAULT_OUTPUT_PATH, JsonFileWriter, OutputError};

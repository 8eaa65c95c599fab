//! JSON file output for harvested records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;

/// Default output file.
pub const DEFAULT_OUTPUT_PATH: &str = "autotrader_query_output.json";

/// Output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The file could not be created or written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The records could not be serialized.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes values as pretty-printed JSON with four-space indentation.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    path: PathBuf,
}

impl Default for JsonFileWriter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_PATH)
    }
}

impl JsonFileWriter {
    /// Create a writer for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `value`, replacing any existing file.
    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), OutputError> {
        let io_err = |source| OutputError::Io {
            path: self.path.clone(),
            source,
        };

        let file = File::create(&self.path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut serializer)?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        tracing::info!(path = %self.path.display(), "Wrote output");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn writes_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonFileWriter::new(dir.path().join("out.json"));
        let records = vec![json!({ "id": 1, "price": 9500 }), json!({ "id": 2, "price": 12_000 })];

        writer.write(&records).unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert!(text.starts_with("[\n    {\n        \""));
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, Value::Array(records));
    }

    #[test]
    fn overwrites_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "stale").unwrap();

        JsonFileWriter::new(file.path()).write(&Vec::<Value>::new()).unwrap();

        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "[]\n");
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonFileWriter::new(dir.path().join("missing").join("out.json"));

        let err = writer.write(&json!([])).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
    }

    #[test]
    fn default_path() {
        assert_eq!(
            JsonFileWriter::default().path(),
            Path::new("autotrader_query_output.json")
        );
    }
}

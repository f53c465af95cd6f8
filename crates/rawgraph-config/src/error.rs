//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

use rawgraph_core::PipelineError;

/// Errors that can occur while loading, saving or building a pipeline file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// No factory pipeline with this name
    #[error("pipeline not found: {0}")]
    PipelineNotFound(String),

    /// Unknown module kind
    #[error("unknown module kind: {0}")]
    UnknownModule(String),

    /// A connection names a module that is not declared
    #[error("unknown module instance: {0}")]
    UnknownInstance(String),

    /// Two modules share kind and instance name
    #[error("duplicate module '{0}'")]
    DuplicateModule(String),

    /// Malformed `kind:instance:connector` endpoint
    #[error("invalid endpoint '{0}': expected kind:instance:connector")]
    InvalidEndpoint(String),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    /// The pipeline rejected a module, parameter or connection
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawgraph_core::ModuleId;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_display() {
        let err = ConfigError::read_file("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn write_file_keeps_path() {
        let err = ConfigError::write_file("/out/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::WriteFile { ref path, .. } if path == std::path::Path::new("/out/path"))
        );
    }

    #[test]
    fn endpoint_display() {
        let err = ConfigError::InvalidEndpoint("crop:main".to_string());
        assert_eq!(
            err.to_string(),
            "invalid endpoint 'crop:main': expected kind:instance:connector"
        );
    }

    #[test]
    fn pipeline_error_is_transparent() {
        let inner = PipelineError::ModuleNotFound(ModuleId::from_index(3));
        let err = ConfigError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
    }
}

//! Error types for epgen.
//!
//! The generator distinguishes one non-fatal condition — an unrecognised
//! package type, which callers receive as a `false` build result — from the
//! fatal conditions that abort a call: a component whose recorded history no
//! longer matches what an update expects, invalid parameters, a malformed
//! footprint payload, and external I/O failures during export.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::expr::ExprError;

/// Result type for generator operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Errors that can occur while building or updating a package model.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The requested package type is not in the supported set.
    ///
    /// Non-fatal: the dispatcher reports this as an unsuccessful build and
    /// leaves the design untouched.
    #[error("Unsupported package type: {package_type}")]
    UnsupportedType {
        /// The type tag that was requested.
        package_type: String,
    },

    /// An update path could not find a feature it expects to patch.
    #[error("Component '{component}' has no '{key}' feature to update")]
    StructuralMismatch {
        /// The feature key the update path looked for.
        key: String,
        /// Name of the component being updated.
        component: String,
    },

    /// The component's history was altered outside the generator.
    #[error("Component '{component}' is in an unsupported state: {message}")]
    UnsupportedState {
        /// Name of the component.
        component: String,
        /// Description of the mismatch.
        message: String,
    },

    /// A supplied parameter value is unusable.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Description of what's wrong.
        message: String,
    },

    /// A dimension expression failed to parse or evaluate.
    #[error("Expression error")]
    Expression {
        /// Underlying expression error.
        #[from]
        source: ExprError,
    },

    /// A thread designation could not be resolved.
    #[error("Unknown thread designation: {designation}")]
    UnknownThread {
        /// The designation string as supplied.
        designation: String,
    },

    /// A footprint payload is not well-formed XML.
    #[error("Footprint XML is malformed")]
    FootprintXml {
        /// Underlying XML parse error.
        #[from]
        source: roxmltree::Error,
    },

    /// A footprint element is missing an attribute or carries an unusable one.
    #[error("Invalid footprint element <{element}>: {message}")]
    FootprintElement {
        /// Tag name of the offending element.
        element: &'static str,
        /// Description of what's wrong.
        message: String,
    },

    /// Failed to write an export snapshot.
    #[error("Failed to write snapshot: {path}")]
    SnapshotWrite {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The upload service rejected or lost the transfer.
    #[error("Upload failed")]
    UploadFailed,

    /// An upload did not complete before its deadline.
    #[error("Upload did not complete within {seconds} s")]
    UploadTimeout {
        /// The deadline that expired.
        seconds: u64,
    },
}

impl GenerateError {
    /// Creates an unsupported type error.
    pub fn unsupported_type(package_type: impl Into<String>) -> Self {
        Self::UnsupportedType {
            package_type: package_type.into(),
        }
    }

    /// Creates a structural mismatch error.
    pub fn structural_mismatch(key: impl Into<String>, component: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            key: key.into(),
            component: component.into(),
        }
    }

    /// Creates an unsupported state error.
    pub fn unsupported_state(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedState {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown thread error.
    pub fn unknown_thread(designation: impl Into<String>) -> Self {
        Self::UnknownThread {
            designation: designation.into(),
        }
    }

    /// Creates an invalid footprint element error.
    pub fn footprint_element(element: &'static str, message: impl Into<String>) -> Self {
        Self::FootprintElement {
            element,
            message: message.into(),
        }
    }

    /// Creates a snapshot write error.
    pub fn snapshot_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SnapshotWrite {
            path: path.into(),
            source,
        }
    }

    /// `true` for the one non-fatal variant the dispatcher maps to `false`.
    #[must_use]
    pub const fn is_unsupported_type(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. })
    }
}

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display() {
        let err = GenerateError::unsupported_type("flatpack");
        assert_eq!(err.to_string(), "Unsupported package type: flatpack");
        assert!(err.is_unsupported_type());
    }

    #[test]
    fn structural_mismatch_display() {
        let err = GenerateError::structural_mismatch("ThermalPad", "SOIC-20");
        assert_eq!(
            err.to_string(),
            "Component 'SOIC-20' has no 'ThermalPad' feature to update"
        );
        assert!(!err.is_unsupported_type());
    }

    #[test]
    fn footprint_element_display() {
        let err = GenerateError::footprint_element("smd", "missing attribute 'dx'");
        assert_eq!(
            err.to_string(),
            "Invalid footprint element <smd>: missing attribute 'dx'"
        );
    }

    #[test]
    fn config_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        assert!(error.to_string().contains("invalid setting"));
    }
}

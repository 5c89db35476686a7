// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the errors raised by configuration lookups, structural
//! mutations of composite configs, interpolation and polling sources. All errors
//! use `thiserror` for proper error handling and conversion.

use thiserror::Error;

/// Boxed error type used for errors produced by external collaborators
/// (snapshot readers, decoders, file watchers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for configuration operations.
///
/// Lookup and conversion problems are normally absorbed by the defaulted
/// accessors; the variants here reach callers only through the strict
/// accessors, structural operations and polling triggers. It is marked as
/// `#[non_exhaustive]` to allow for future additions without breaking
/// backwards compatibility.
///
/// # Examples
///
/// ```
/// use livecfg::domain::errors::ConfigError;
///
/// fn lookup() -> Result<String, ConfigError> {
///     Err(ConfigError::MissingKey {
///         key: "database.host".to_string(),
///     })
/// }
///
/// assert!(lookup().is_err());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The requested key is absent and the config treats missing keys as fatal.
    #[error("Configuration key not found: {key}")]
    MissingKey {
        /// The key that was not found
        key: String,
    },

    /// Failed to convert a configuration value to the requested type.
    #[error(
        "Failed to convert configuration value for key '{key}' to type {target_type}: {source}"
    )]
    TypeConversionError {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The underlying conversion error
        source: DecodeError,
    },

    /// A child config was added to a composite under a name already in use.
    #[error("A configuration named '{name}' is already registered")]
    DuplicateName {
        /// The conflicting child name
        name: String,
    },

    /// Variable references form a loop during interpolation.
    #[error("Circular reference while interpolating '{key}': {}", .chain.join(" -> "))]
    InterpolationCycle {
        /// The key whose value could not be resolved
        key: String,
        /// The chain of references that closed the loop
        chain: Vec<String>,
    },

    /// The snapshot reader of a polling source failed.
    #[error("Failed to fetch snapshot for '{source_name}': {source}")]
    FetchError {
        /// The name of the polling source
        source_name: String,
        /// The error raised by the reader
        #[source]
        source: BoxError,
    },

    /// An error occurred in a configuration source or its polling strategy.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// An error occurred in a file watcher.
    #[error("Configuration watcher error: {message}")]
    WatcherError {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<BoxError>,
    },
}

impl ConfigError {
    /// Wraps a decoder failure with the key that was being read.
    pub fn conversion(key: impl Into<String>, source: DecodeError) -> Self {
        ConfigError::TypeConversionError {
            key: key.into(),
            target_type: source.target_type().to_string(),
            source,
        }
    }

    /// Returns `true` if the owning polling source no longer exists.
    ///
    /// Background strategies use this to stop their worker once the config
    /// they drive has been dropped.
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            ConfigError::SourceError { message, .. } if message == DISCONNECTED_MESSAGE
        )
    }

    pub(crate) fn disconnected(source_name: impl Into<String>) -> Self {
        ConfigError::SourceError {
            source_name: source_name.into(),
            message: DISCONNECTED_MESSAGE.to_string(),
            source: None,
        }
    }
}

const DISCONNECTED_MESSAGE: &str = "polling source has been dropped";

/// Error produced by a [`Decoder`](crate::ports::Decoder).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The decoder has no conversion registered for the target type.
    #[error("no decoder registered for type {target_type}")]
    UnsupportedType {
        /// The requested type name
        target_type: &'static str,
    },

    /// The raw value is not a valid representation of the target type.
    #[error("invalid value '{value}' for type {target_type}: {source}")]
    Invalid {
        /// The requested type name
        target_type: &'static str,
        /// The raw value that failed to decode
        value: String,
        /// The underlying parse error
        source: BoxError,
    },
}

impl DecodeError {
    /// Returns the name of the type the decoder was asked to produce.
    pub fn target_type(&self) -> &'static str {
        match self {
            DecodeError::UnsupportedType { target_type } => *target_type,
            DecodeError::Invalid { target_type, .. } => *target_type,
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

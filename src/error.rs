//! Error types for glyph metrics resolution.
//!
//! This module defines all error types that can occur while loading CMap
//! resources, decoding width tables and selecting font profiles.
//!
//! Unmapped code points, unmapped CIDs and unrecognised CMap lines are not
//! errors: they resolve to zero width, the default width and a skipped line.

/// Result type alias for metrics operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during metrics resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The CMap resource for an encoding could not be opened or read
    #[error("CMap resource '{resource}' unavailable: {source}")]
    ResourceUnavailable {
        /// Encoding resource identifier (e.g. "UniJIS-UTF16-H")
        resource: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The compact width source does not follow the run grammar
    #[error("Malformed width table at token {position} ('{token}'): {reason}")]
    MalformedWidthTable {
        /// Zero-based index of the offending token
        position: usize,
        /// The offending token, or empty at end of input
        token: String,
        /// Reason for the failure
        reason: String,
    },

    /// A query was made against a font whose load already failed
    #[error("Font '{font}' is unavailable: {reason}")]
    FontUnavailable {
        /// Base font name
        font: String,
        /// Message of the first load failure
        reason: String,
    },

    /// No catalog entry exists for the requested key
    #[error("No metric profile for language '{language}' and style '{style}'")]
    UnknownProfile {
        /// Language code
        language: String,
        /// Style code
        style: String,
    },

    /// Unrecognised language or style code
    #[error("Invalid code: {0}")]
    InvalidCode(String),

    /// External catalog could not be deserialized
    #[error("Catalog error: {0}")]
    Catalog(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error leaves a font instance permanently unusable.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::ResourceUnavailable { .. }
                | Error::MalformedWidthTable { .. }
                | Error::FontUnavailable { .. }
        )
    }
}

//! Error types shared by the audio, store and persistence layers.
//!
//! Nothing in this crate treats an error as fatal: callers either surface
//! the value to the host or log it and degrade (for example, visual-only
//! effects when the audio output cannot be resumed).

use thiserror::Error;

/// Errors raised by the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A category / instrument key that is not part of the library.
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    /// The audio output could not be started or resumed.
    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),

    /// A configuration value violates an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A persisted snapshot could not be parsed or produced.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// A persisted snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion {
        /// Version found in the snapshot.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Snapshot(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_message_quotes_key() {
        let e = CoreError::UnknownCategory("bazooka".to_string());
        assert_eq!(e.to_string(), "unknown category: \"bazooka\"");
    }

    #[test]
    fn version_mismatch_message() {
        let e = CoreError::SnapshotVersion { found: 1, expected: 2 };
        assert_eq!(e.to_string(), "unsupported snapshot version 1 (expected 2)");
    }
}

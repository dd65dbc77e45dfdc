//! The things that can go wrong while registering a single descriptor.
//!
//! None of these are fatal to the loading pass. Each one is logged where it happens and collected
//! into the descriptor's [`Report`](crate::registrar::Report) so callers can see what was skipped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Problem {
    /// No candidate location held the asset. The asset is treated as absent.
    #[error("'{key}.{extension}' was not found in any candidate location")]
    MissingFile { key: String, extension: &'static str },

    /// The asset was found but couldn't be decoded. Handled the same way as a missing file.
    #[error("failed to decode '{key}' from {source_desc}: {reason}")]
    DecodeFailure {
        key: String,
        source_desc: String,
        reason: String,
    },

    /// The descriptor file couldn't be read or didn't have the expected shape.
    #[error("malformed descriptor {}: {reason}", .path.display())]
    MalformedDescriptor { path: PathBuf, reason: String },

    /// The archive bundle named by a non-fallback descriptor couldn't be opened.
    #[error("failed to load bundle {}: {reason}", .bundle.display())]
    ArchiveLoadFailure { bundle: PathBuf, reason: String },

    /// The tech type string isn't part of the enumeration. Only the story goal is skipped.
    #[error("invalid tech type '{name}' for '{key}'")]
    InvalidTechType { key: String, name: String },

    /// The key or sound id was registered earlier in this run.
    #[error("'{id}' is already registered")]
    DuplicateRegistration { id: String },

    /// The host rejected one of our registration calls.
    #[error("host failed to {action} for '{key}': {reason}")]
    HostRegistrationFailure {
        key: String,
        action: &'static str,
        reason: String,
    },
}

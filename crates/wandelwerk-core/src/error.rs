// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Wandelwerk.

use thiserror::Error;

/// Top-level error type for all Wandelwerk operations.
#[derive(Debug, Error)]
pub enum WandelwerkError {
    // -- Dispatch errors --
    #[error("no converter available for {from} to {to}")]
    UnsupportedPair { from: String, to: String },

    // -- Codec errors --
    #[error("could not read {format} input: {reason}")]
    DecodeFailure { format: String, reason: String },

    #[error("could not write {format} output: {reason}")]
    EncodeFailure { format: String, reason: String },

    #[error("PDF page rendering unavailable: {0}")]
    RendererUnavailable(String),

    // -- Layout / request errors --
    #[error("invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Failure raised inside a converter, tagged with the converter that ran.
    #[error("{converter} conversion failed: {cause}")]
    Conversion {
        converter: String,
        #[source]
        cause: Box<WandelwerkError>,
    },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by callers that must tell "we don't do that"
/// apart from "your file is broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedPair,
    DecodeFailure,
    EncodeFailure,
    RendererUnavailable,
    InvalidGeometry,
    InvalidInput,
    Io,
    Serialization,
}

impl WandelwerkError {
    /// Shorthand for a [`WandelwerkError::DecodeFailure`].
    pub fn decode(format: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DecodeFailure {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`WandelwerkError::EncodeFailure`].
    pub fn encode(format: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::EncodeFailure {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`WandelwerkError::UnsupportedPair`].
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UnsupportedPair {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Classify this error, looking through any [`WandelwerkError::Conversion`]
    /// wrappers to the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedPair { .. } => ErrorKind::UnsupportedPair,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::EncodeFailure { .. } => ErrorKind::EncodeFailure,
            Self::RendererUnavailable(_) => ErrorKind::RendererUnavailable,
            Self::InvalidGeometry(_) => ErrorKind::InvalidGeometry,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Conversion { cause, .. } => cause.kind(),
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// The innermost error, with every conversion wrapper removed.
    pub fn root_cause(&self) -> &WandelwerkError {
        match self {
            Self::Conversion { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WandelwerkError>;

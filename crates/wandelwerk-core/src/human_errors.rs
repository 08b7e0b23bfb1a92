// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people converting their own files.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the CLI reports the failure and its exit code.

use crate::error::WandelwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request itself cannot be served (unknown format pair, bad options).
    Unsupported,
    /// The input file is damaged or not what its extension claims.
    BadInput,
    /// Something went wrong on our side while producing the output.
    Internal,
    /// A capability is missing from this build or machine.
    Unavailable,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    /// Whether trying the same request again could succeed.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

impl HumanError {
    /// Process exit code the CLI should use for this error.
    pub fn exit_code(&self) -> u8 {
        match self.severity {
            Severity::Unsupported => 2,
            Severity::BadInput => 3,
            Severity::Internal => 4,
            Severity::Unavailable => 5,
        }
    }
}

/// Convert a `WandelwerkError` into a `HumanError`.
pub fn humanize_error(err: &WandelwerkError) -> HumanError {
    match err.root_cause() {
        WandelwerkError::UnsupportedPair { from, to } => HumanError {
            message: format!("We can't convert .{from} files to .{to}."),
            suggestion: "Run `wandelwerk formats` to see every conversion that is available.".into(),
            retriable: false,
            severity: Severity::Unsupported,
        },

        WandelwerkError::DecodeFailure { format, reason } => HumanError {
            message: format!("This .{format} file couldn't be read."),
            suggestion: format!(
                "The file may be damaged or saved in a different format than its name says. \
                 Try opening and re-saving it first. ({reason})"
            ),
            retriable: false,
            severity: Severity::BadInput,
        },

        WandelwerkError::EncodeFailure { format, reason } => HumanError {
            message: format!("We couldn't write the .{format} result."),
            suggestion: format!("Try a different output format. ({reason})"),
            retriable: true,
            severity: Severity::Internal,
        },

        WandelwerkError::RendererUnavailable(detail) => HumanError {
            message: "Turning PDF pages into pictures isn't available here.".into(),
            suggestion: format!(
                "This build needs the PDFium library to render PDF pages. ({detail})"
            ),
            retriable: false,
            severity: Severity::Unavailable,
        },

        WandelwerkError::InvalidGeometry(detail) => HumanError {
            message: "The page size or margins don't fit together.".into(),
            suggestion: format!("Check the margins in your configuration file. ({detail})"),
            retriable: false,
            severity: Severity::Unsupported,
        },

        WandelwerkError::InvalidInput(detail) => HumanError {
            message: "The request is missing something.".into(),
            suggestion: detail.clone(),
            retriable: false,
            severity: Severity::Unsupported,
        },

        // Only reachable if a wrapper nests itself, which root_cause unwraps.
        WandelwerkError::Conversion { converter, .. } => HumanError {
            message: format!("The {converter} conversion failed."),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Internal,
        },

        WandelwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::BadInput,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::BadInput,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Internal,
                }
            }
        }

        WandelwerkError::Serialization(_) => HumanError {
            message: "The configuration file couldn't be understood.".into(),
            suggestion: "Check that it is valid JSON, or remove it to use the defaults.".into(),
            retriable: false,
            severity: Severity::BadInput,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_pair_is_distinct_from_corrupt_input() {
        let unsupported = humanize_error(&WandelwerkError::unsupported("svg", "pdf"));
        let corrupt = humanize_error(&WandelwerkError::decode("png", "invalid signature"));
        assert_eq!(unsupported.severity, Severity::Unsupported);
        assert_eq!(corrupt.severity, Severity::BadInput);
        assert_ne!(unsupported.exit_code(), corrupt.exit_code());
    }

    #[test]
    fn wrapped_errors_are_humanized_by_cause() {
        let err = WandelwerkError::Conversion {
            converter: "text-to-pdf".into(),
            cause: Box::new(WandelwerkError::encode("pdf", "writer refused")),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Internal);
        assert!(human.message.contains(".pdf"));
    }

    #[test]
    fn missing_file_is_bad_input() {
        let err = WandelwerkError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::BadInput);
        assert!(!human.retriable);
    }

    #[test]
    fn missing_renderer_is_unavailable() {
        let human = humanize_error(&WandelwerkError::RendererUnavailable("not compiled in".into()));
        assert_eq!(human.severity, Severity::Unavailable);
        assert_eq!(human.exit_code(), 5);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion — the converter contract, the dispatch registry, and one
// converter per supported family of format pairs.

use std::path::Path;

use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::media_type;

pub mod image;
pub mod merge;
pub mod office;
pub mod pdf;
pub mod registry;
pub mod text;

pub use merge::merge_documents;
pub use registry::ConverterRegistry;

/// Encoded input handed to a converter.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub bytes: Vec<u8>,
    /// Declared source extension, without the leading dot.
    pub extension: String,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
        }
    }

    /// Read a file, taking the source extension from its name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                WandelwerkError::InvalidInput(format!(
                    "{} has no file extension to infer its format from",
                    path.display()
                ))
            })?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(bytes, extension))
    }
}

/// Encoded output of a conversion.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub bytes: Vec<u8>,
    /// Target extension exactly as requested.
    pub extension: String,
    pub media_type: &'static str,
}

impl ConvertedDocument {
    pub fn new(bytes: Vec<u8>, extension: &str) -> Self {
        Self {
            bytes,
            extension: extension.to_string(),
            media_type: media_type(extension),
        }
    }
}

/// A strategy converting between one family of format pairs.
///
/// Implementations hold only immutable settings, so one registry can serve
/// concurrent conversions. Every call builds its own page state.
pub trait Converter: Send + Sync {
    /// Short name used in logs and error context.
    fn name(&self) -> &'static str;

    /// Human-readable summary of the pairs this converter handles.
    fn pairs(&self) -> &'static str;

    /// Whether this converter handles `source` → `target`. Extensions are
    /// compared case-insensitively.
    fn supports(&self, source: &str, target: &str) -> bool;

    /// Convert `source` to the `target` extension.
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument>;
}

/// Case-insensitive membership test for extension lists.
pub(crate) fn ext_in(ext: &str, list: &[&str]) -> bool {
    list.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Wandelwerk conversion engine.

use serde::{Deserialize, Serialize};

/// Broad family a file extension belongs to. Converters declare the pairs
/// they handle in terms of these classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatClass {
    /// Bitmap images (PNG, JPEG, BMP, GIF, TIFF).
    Raster,
    /// Windows icon.
    Icon,
    Pdf,
    PlainText,
    /// Word-processor document (DOCX).
    WordDocument,
    /// Presentation (PPTX).
    SlideDeck,
    /// Spreadsheet (XLSX, XLS).
    Spreadsheet,
}

impl FormatClass {
    /// Infer the format class from a file extension (case-insensitive,
    /// without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" => Some(Self::Raster),
            "ico" => Some(Self::Icon),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "docx" | "doc" => Some(Self::WordDocument),
            "pptx" | "ppt" => Some(Self::SlideDeck),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            _ => None,
        }
    }

    /// True when `ext` belongs to this class.
    pub fn matches(&self, ext: &str) -> bool {
        Self::from_extension(ext) == Some(*self)
    }
}

/// Fold extension spellings that name the same encoding (`jpg`/`jpeg`,
/// `tif`/`tiff`) onto one canonical lowercase form.
pub fn canonical_extension(ext: &str) -> String {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" => "jpeg".into(),
        "tif" => "tiff".into(),
        other => other.into(),
    }
}

/// MIME type for a target extension, used for download headers and logs.
pub fn media_type(ext: &str) -> &'static str {
    match canonical_extension(ext).as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpeg" => "image/jpeg",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        "docx" | "doc" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        "pptx" | "ppt" => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        "xlsx" | "xls" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    /// Arbitrary size in points.
    Custom { width_pt: f32, height_pt: f32 },
}

impl PaperSize {
    /// Portrait dimensions in points (width, height), using the rounded
    /// PostScript sizes so layout constants stay integral.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::A3 => (842.0, 1191.0),
            Self::A5 => (420.0, 595.0),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::Tabloid => (792.0, 1224.0),
            Self::Custom {
                width_pt,
                height_pt,
            } => (*width_pt, *height_pt),
        }
    }

    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        let (w, h) = self.dimensions_pt();
        (w * 25.4 / 72.0, h * 25.4 / 72.0)
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Orientation matching a content rectangle: strictly wider than tall is
    /// landscape, everything else portrait.
    pub fn for_content(width: f32, height: f32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Page margins in points (1 inch = 72 points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Margins {
    pub fn new(top: f32, bottom: f32, left: f32, right: f32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Equal margins on all sides.
    pub fn uniform(margin: f32) -> Self {
        Self::new(margin, margin, margin, margin)
    }

    /// No margins (full-bleed pages).
    pub fn none() -> Self {
        Self::uniform(0.0)
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

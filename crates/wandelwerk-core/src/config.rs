// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion configuration — every layout constant the converters use, with
// JSON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Margins, PaperSize};

/// Page and line settings for converters that flow lines of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayout {
    pub paper_size: PaperSize,
    pub margins: Margins,
    pub font_size: f32,
    /// Vertical advance per line, including leading.
    pub line_height: f32,
    /// Word-wrap lines longer than this many characters before layout.
    /// `None` emits every input line as-is.
    pub wrap_columns: Option<usize>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margins: Margins::new(46.0, 46.0, 25.0, 25.0),
            font_size: 12.0,
            line_height: 15.0,
            wrap_columns: None,
        }
    }
}

/// Settings for word-processor documents rendered to PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordLayout {
    pub paper_size: PaperSize,
    pub margins: Margins,
    pub font_size: f32,
    pub line_height: f32,
    /// Space left below each embedded image.
    pub image_gap: f32,
    /// Space left below each paragraph.
    pub paragraph_gap: f32,
}

impl Default for WordLayout {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margins: Margins::new(92.0, 50.0, 50.0, 50.0),
            font_size: 10.0,
            line_height: 12.0,
            image_gap: 10.0,
            paragraph_gap: 5.0,
        }
    }
}

/// Settings for rasterizing PDF pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// DPI for single-image export (PDF to PNG/JPEG).
    pub single_page_dpi: u32,
    /// DPI for multi-page export (PDF to slides or word documents).
    pub multi_page_dpi: u32,
    /// JPEG quality (1-100) for every JPEG we encode.
    pub jpeg_quality: u8,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            single_page_dpi: 300,
            multi_page_dpi: 150,
            jpeg_quality: 90,
        }
    }
}

/// All conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Plain text to PDF.
    pub text: TextLayout,
    /// Word documents to PDF.
    pub word: WordLayout,
    /// Spreadsheets to PDF (one line of text per row).
    pub sheet: TextLayout,
    /// Paper for image-to-PDF; orientation follows the image.
    pub image_paper_size: PaperSize,
    /// Uniform margin around images placed on a PDF page.
    pub image_margin: f32,
    pub raster: RasterSettings,
    /// Edge length of the square icon canvas, in pixels.
    pub icon_size: u32,
    /// Slide size in points (width, height).
    pub slide_size: (f32, f32),
    /// Width in points of pictures inserted into word documents.
    pub word_picture_width: f32,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            text: TextLayout::default(),
            word: WordLayout::default(),
            sheet: TextLayout {
                margins: Margins::new(92.0, 50.0, 50.0, 50.0),
                font_size: 10.0,
                line_height: 14.0,
                ..TextLayout::default()
            },
            image_paper_size: PaperSize::A4,
            image_margin: 20.0,
            raster: RasterSettings::default(),
            icon_size: 256,
            slide_size: (720.0, 540.0),
            word_picture_width: 500.0,
        }
    }
}

impl ConversionConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

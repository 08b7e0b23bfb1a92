// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// wandelwerk-document — Pagination engine and format converters for Wandelwerk.
//
// Provides the page layout core (geometry, page flow, content emitters), the
// conversion dispatch registry with its converters, and the codec boundary:
// PDF writing, reading, merging and rasterisation, image processing, and
// OOXML word, slide and spreadsheet packages.

pub mod convert;
pub mod image;
pub mod layout;
pub mod office;
pub mod pdf;

// Re-export the primary types so callers can use `wandelwerk_document::ConverterRegistry` etc.
pub use convert::{ConvertedDocument, Converter, ConverterRegistry, SourceDocument, merge_documents};
pub use image::processor::ImageProcessor;
pub use layout::{PageFlow, PageGeometry, PageSequence};
pub use pdf::{PageRasterizer, PdfReader, PdfWriter, default_rasterizer};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading, merging, rasterising, and writing PDFs.

pub mod raster;
pub mod reader;
pub mod writer;

#[cfg(feature = "pdfium")]
pub use raster::PdfiumRasterizer;
pub use raster::{PageRasterizer, UnavailableRasterizer, default_rasterizer};
pub use reader::{PdfReader, merge_pdfs};
pub use writer::{PdfWriter, write_pdf};

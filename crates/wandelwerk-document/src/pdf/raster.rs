// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterisation — turning PDF pages into bitmaps.
//
// Rendering needs a full PDF engine. With the `pdfium` feature the system
// PDFium library is bound at call time; without it every render fails with
// `RendererUnavailable` and the PDF-to-raster conversions report that
// cleanly instead of producing blank output.

use std::sync::Arc;

use image::DynamicImage;
use wandelwerk_core::error::{Result, WandelwerkError};

/// Renders pages of an encoded PDF.
pub trait PageRasterizer: Send + Sync {
    /// Render up to `max_pages` pages (all pages when `None`) at `dpi`, in
    /// page order. Each bitmap is `page_size_pt * dpi / 72` pixels.
    fn render_pages(&self, pdf: &[u8], dpi: u32, max_pages: Option<usize>) -> Result<Vec<DynamicImage>>;

    /// Short backend name for logs and `formats` output.
    fn backend(&self) -> &'static str;
}

/// Pixel length of `points` at `dpi`, never below one pixel.
pub fn points_to_pixels(points: f32, dpi: u32) -> u32 {
    ((points * dpi as f32 / 72.0).round() as u32).max(1)
}

// -- PDFium backend -----------------------------------------------------------

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use image::{DynamicImage, RgbaImage};
    use pdfium_render::prelude::*;
    use tracing::{debug, instrument};
    use wandelwerk_core::error::{Result, WandelwerkError};

    use super::{PageRasterizer, points_to_pixels};

    /// Rasterizer backed by the system PDFium library.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfiumRasterizer;

    impl PdfiumRasterizer {
        fn bind() -> Result<Pdfium> {
            let bindings = Pdfium::bind_to_system_library()
                .map_err(|err| WandelwerkError::RendererUnavailable(format!("PDFium: {err}")))?;
            Ok(Pdfium::new(bindings))
        }
    }

    impl PageRasterizer for PdfiumRasterizer {
        #[instrument(skip(self, pdf), fields(bytes = pdf.len()))]
        fn render_pages(
            &self,
            pdf: &[u8],
            dpi: u32,
            max_pages: Option<usize>,
        ) -> Result<Vec<DynamicImage>> {
            let pdfium = Self::bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|err| WandelwerkError::decode("pdf", err))?;

            let limit = max_pages.unwrap_or(usize::MAX);
            let mut images = Vec::new();
            for page in document.pages().iter().take(limit) {
                let width = points_to_pixels(page.width().value, dpi);
                let height = points_to_pixels(page.height().value, dpi);
                let config = PdfRenderConfig::new()
                    .set_target_width(width as i32)
                    .set_maximum_height(height as i32);
                let bitmap = page
                    .render_with_config(&config)
                    .map_err(|err| WandelwerkError::decode("pdf", err))?;
                let (w, h) = (bitmap.width() as u32, bitmap.height() as u32);
                let rgba = RgbaImage::from_raw(w, h, bitmap.as_rgba_bytes()).ok_or_else(|| {
                    WandelwerkError::decode("pdf", "PDFium bitmap has unexpected length")
                })?;
                debug!(w, h, dpi, "page rendered");
                images.push(DynamicImage::ImageRgba8(rgba));
            }
            Ok(images)
        }

        fn backend(&self) -> &'static str {
            "pdfium"
        }
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium_backend::PdfiumRasterizer;

// -- Fallback -----------------------------------------------------------------

/// Rasterizer used when no rendering backend is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRasterizer;

impl PageRasterizer for UnavailableRasterizer {
    fn render_pages(&self, _pdf: &[u8], _dpi: u32, _max_pages: Option<usize>) -> Result<Vec<DynamicImage>> {
        Err(WandelwerkError::RendererUnavailable(
            "no PDF rendering backend in this build".into(),
        ))
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}

/// The best rasterizer this build offers.
pub fn default_rasterizer() -> Arc<dyn PageRasterizer> {
    #[cfg(feature = "pdfium")]
    {
        Arc::new(PdfiumRasterizer)
    }
    #[cfg(not(feature = "pdfium"))]
    {
        Arc::new(UnavailableRasterizer)
    }
}

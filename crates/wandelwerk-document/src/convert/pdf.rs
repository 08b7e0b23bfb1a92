// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Converters whose source is a PDF.
//
// Image, slide and word targets rasterize pages through the injected
// `PageRasterizer` and place one full-page picture per output page. The
// spreadsheet target works from extracted text alone.

use std::sync::{Arc, OnceLock};

use image::DynamicImage;
use regex::Regex;
use tracing::{debug, info, instrument};
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{ConversionConfig, FormatClass, PaperSize};

use super::{ConvertedDocument, Converter, SourceDocument, ext_in};
use crate::image::ImageProcessor;
use crate::layout::{Page, PageSequence, PlacedItem, RasterHandle};
use crate::office::{write_docx, write_pptx, write_xlsx};
use crate::pdf::{PageRasterizer, PdfReader};

/// Sheet name used for text pulled out of a PDF.
pub const EXTRACTED_SHEET_NAME: &str = "Converted PDF";

/// Validate the PDF and render up to `max_pages` pages. Malformed input is
/// reported as a decode failure before any rendering is attempted.
fn render(
    rasterizer: &dyn PageRasterizer,
    source: &SourceDocument,
    dpi: u32,
    max_pages: Option<usize>,
) -> Result<Vec<DynamicImage>> {
    let reader = PdfReader::from_bytes(&source.bytes)?;
    if reader.page_count() == 0 {
        return Err(WandelwerkError::InvalidInput("PDF has no pages".into()));
    }
    let pages = rasterizer.render_pages(&source.bytes, dpi, max_pages)?;
    debug!(
        rendered = pages.len(),
        dpi,
        backend = rasterizer.backend(),
        "PDF pages rasterized"
    );
    Ok(pages)
}

/// Render pages and re-encode each as JPEG, the way pages are stored in
/// office packages.
fn render_for_embedding(
    rasterizer: &dyn PageRasterizer,
    source: &SourceDocument,
    dpi: u32,
    jpeg_quality: u8,
) -> Result<Vec<RasterHandle>> {
    render(rasterizer, source, dpi, None)?
        .into_iter()
        .map(|page| {
            let jpeg = ImageProcessor::from_dynamic(page).to_jpeg_bytes(jpeg_quality)?;
            Ok(ImageProcessor::from_bytes(&jpeg, "jpeg")?.into_handle())
        })
        .collect()
}

// -- PDF → image ----------------------------------------------------------------

/// Renders the first page at the single-image DPI.
pub struct PdfToImage {
    rasterizer: Arc<dyn PageRasterizer>,
    dpi: u32,
    jpeg_quality: u8,
}

impl PdfToImage {
    pub fn new(config: &ConversionConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            rasterizer,
            dpi: config.raster.single_page_dpi,
            jpeg_quality: config.raster.jpeg_quality,
        }
    }
}

impl Converter for PdfToImage {
    fn name(&self) -> &'static str {
        "pdf-to-image"
    }

    fn pairs(&self) -> &'static str {
        "pdf -> png, jpg, jpeg, bmp, gif, tif, tiff (first page)"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Pdf.matches(source) && FormatClass::Raster.matches(target)
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len(), dpi = self.dpi))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let first = render(self.rasterizer.as_ref(), source, self.dpi, Some(1))?
            .into_iter()
            .next()
            .ok_or_else(|| WandelwerkError::decode("pdf", "renderer returned no pages"))?;
        let bytes = ImageProcessor::from_dynamic(first).to_format_bytes(target, self.jpeg_quality)?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- PDF → slide deck -------------------------------------------------------------

/// One slide per page, the rendered page stretched over the whole slide.
pub struct PdfToSlides {
    rasterizer: Arc<dyn PageRasterizer>,
    slide_size: (f32, f32),
    dpi: u32,
    jpeg_quality: u8,
}

impl PdfToSlides {
    pub fn new(config: &ConversionConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            rasterizer,
            slide_size: config.slide_size,
            dpi: config.raster.multi_page_dpi,
            jpeg_quality: config.raster.jpeg_quality,
        }
    }
}

impl Converter for PdfToSlides {
    fn name(&self) -> &'static str {
        "pdf-to-slides"
    }

    fn pairs(&self) -> &'static str {
        "pdf -> pptx, ppt"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Pdf.matches(source) && ext_in(target, &["pptx", "ppt"])
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len(), dpi = self.dpi))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let (width, height) = self.slide_size;
        let pages: Vec<Page> =
            render_for_embedding(self.rasterizer.as_ref(), source, self.dpi, self.jpeg_quality)?
                .into_iter()
                .map(|raster| {
                    let mut page = Page::new(width, height);
                    page.items.push(PlacedItem::Image {
                        raster,
                        x: 0.0,
                        y: 0.0,
                        width,
                        height,
                    });
                    page
                })
                .collect();
        info!(slides = pages.len(), "PDF pages placed on slides");

        let bytes = write_pptx(&PageSequence::new(pages), self.jpeg_quality)?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- PDF → word document ----------------------------------------------------------

/// One centered, fixed-width picture per page, each on its own page of the
/// word document.
pub struct PdfToWord {
    rasterizer: Arc<dyn PageRasterizer>,
    picture_width: f32,
    dpi: u32,
    jpeg_quality: u8,
}

impl PdfToWord {
    pub fn new(config: &ConversionConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            rasterizer,
            picture_width: config.word_picture_width,
            dpi: config.raster.multi_page_dpi,
            jpeg_quality: config.raster.jpeg_quality,
        }
    }
}

impl Converter for PdfToWord {
    fn name(&self) -> &'static str {
        "pdf-to-word"
    }

    fn pairs(&self) -> &'static str {
        "pdf -> docx, doc"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Pdf.matches(source) && ext_in(target, &["docx", "doc"])
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len(), dpi = self.dpi))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let (page_w, page_h) = PaperSize::A4.dimensions_pt();
        let width = self.picture_width;
        let pages: Vec<Page> =
            render_for_embedding(self.rasterizer.as_ref(), source, self.dpi, self.jpeg_quality)?
                .into_iter()
                .map(|raster| {
                    let height =
                        width * raster.pixel_height() as f32 / raster.pixel_width().max(1) as f32;
                    let mut page = Page::new(page_w, page_h);
                    page.items.push(PlacedItem::Image {
                        raster,
                        x: (page_w - width) / 2.0,
                        y: (page_h - height).max(0.0),
                        width,
                        height,
                    });
                    page
                })
                .collect();
        info!(pages = pages.len(), "PDF pages placed in word document");

        let bytes = write_docx(&PageSequence::new(pages), self.jpeg_quality)?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- PDF → spreadsheet ------------------------------------------------------------

/// Extracted text, one row per line, cells split on runs of two or more
/// whitespace characters.
pub struct PdfToSpreadsheet;

impl Converter for PdfToSpreadsheet {
    fn name(&self) -> &'static str {
        "pdf-to-spreadsheet"
    }

    fn pairs(&self) -> &'static str {
        "pdf -> xlsx, xls"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Pdf.matches(source) && ext_in(target, &["xlsx", "xls"])
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let text = PdfReader::from_bytes(&source.bytes)?.extract_text()?;
        let rows = text_to_rows(&text);
        debug!(rows = rows.len(), "text split into rows");
        let bytes = write_xlsx(EXTRACTED_SHEET_NAME, &rows)?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

static LINE_BREAK: OnceLock<Option<Regex>> = OnceLock::new();
static COLUMN_GAP: OnceLock<Option<Regex>> = OnceLock::new();

/// Split `text` with a lazily compiled pattern, dropping trailing empty
/// pieces. Text that matches nowhere stays one piece.
fn split_pattern<'t>(cell: &OnceLock<Option<Regex>>, pattern: &str, text: &'t str) -> Vec<&'t str> {
    let mut pieces: Vec<&str> = match cell.get_or_init(|| Regex::new(pattern).ok()) {
        Some(regex) => regex.split(text).collect(),
        None => vec![text],
    };
    while pieces.len() > 1 && pieces.last().is_some_and(|piece| piece.is_empty()) {
        pieces.pop();
    }
    pieces
}

/// Heuristic table detection: rows on line breaks, cells on gaps of at least
/// two whitespace characters.
pub fn text_to_rows(text: &str) -> Vec<Vec<String>> {
    split_pattern(&LINE_BREAK, r"\r?\n", text)
        .into_iter()
        .map(|line| {
            split_pattern(&COLUMN_GAP, r"\s{2,}", line)
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
        .collect()
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — serialise a laid-out `PageSequence` with `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. Every page keeps its own size, so mixed portrait and
// landscape sequences come out as they were laid out.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};

use crate::image::processor::composite_on_white;
use crate::layout::{Page, PageSequence, PlacedItem, RasterHandle};

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Baseline distance above the bottom of a text slot, as a share of the
/// font size. Keeps descenders inside the slot.
const DESCENT_RATIO: f32 = 0.2;

/// Serialises page sequences to PDF bytes.
///
/// Text uses the built-in Helvetica font, which only covers Latin-1;
/// other characters are written as `?`. Images are embedded once per
/// distinct raster even when placed several times.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Encode `sequence`. An empty sequence still yields a valid PDF with
    /// one blank A4 page.
    #[instrument(skip(self, sequence), fields(pages = sequence.len()))]
    pub fn write(&self, sequence: &PageSequence) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(&self.title);
        let mut embedded: Vec<(RasterHandle, XObjectId)> = Vec::new();
        let mut pages = Vec::with_capacity(sequence.len());

        for page in sequence.pages() {
            let ops = self.page_ops(&mut doc, &mut embedded, page)?;
            pages.push(PdfPage::new(
                Mm(page.width / PT_PER_MM),
                Mm(page.height / PT_PER_MM),
                ops,
            ));
        }

        if pages.is_empty() {
            let (w, h) = wandelwerk_core::PaperSize::A4.dimensions_pt();
            pages.push(PdfPage::new(Mm(w / PT_PER_MM), Mm(h / PT_PER_MM), Vec::new()));
        }

        let page_count = pages.len();
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }
        if output.is_empty() {
            return Err(WandelwerkError::encode("pdf", "printpdf produced no output"));
        }

        info!(
            pages = page_count,
            images = embedded.len(),
            bytes = output.len(),
            "PDF written"
        );
        Ok(output)
    }

    fn page_ops(
        &self,
        doc: &mut PdfDocument,
        embedded: &mut Vec<(RasterHandle, XObjectId)>,
        page: &Page,
    ) -> Result<Vec<Op>> {
        let mut ops = Vec::new();
        for item in &page.items {
            match item {
                PlacedItem::Text {
                    line,
                    x,
                    y,
                    font_size,
                } => {
                    let text = to_latin1(line);
                    if text.trim().is_empty() {
                        continue;
                    }
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(*x),
                            y: Pt(*y + font_size * DESCENT_RATIO),
                        },
                    });
                    ops.push(Op::SetFontSizeBuiltinFont {
                        size: Pt(*font_size),
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(text)],
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::EndTextSection);
                }
                PlacedItem::Image {
                    raster,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let (px_w, px_h) = (raster.pixel_width(), raster.pixel_height());
                    if px_w == 0 || px_h == 0 {
                        warn!("skipping placed image without pixels");
                        continue;
                    }
                    let id = embed_raster(doc, embedded, raster);
                    // At 72 dpi one pixel is one point before scaling.
                    ops.push(Op::UseXobject {
                        id,
                        transform: XObjectTransform {
                            translate_x: Some(Pt(*x)),
                            translate_y: Some(Pt(*y)),
                            scale_x: Some(width / px_w as f32),
                            scale_y: Some(height / px_h as f32),
                            dpi: Some(72.0),
                            rotate: None,
                        },
                    });
                }
            }
        }
        Ok(ops)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("Wandelwerk Document")
    }
}

/// Convenience wrapper around [`PdfWriter::write`].
pub fn write_pdf(sequence: &PageSequence, title: &str) -> Result<Vec<u8>> {
    PdfWriter::new(title).write(sequence)
}

/// Add a raster to the document unless the same pixel buffer is already
/// embedded.
fn embed_raster(
    doc: &mut PdfDocument,
    embedded: &mut Vec<(RasterHandle, XObjectId)>,
    raster: &RasterHandle,
) -> XObjectId {
    if let Some((_, id)) = embedded.iter().find(|(known, _)| known.same_raster(raster)) {
        return id.clone();
    }
    let rgb = composite_on_white(raster.image());
    let raw = RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: raster.pixel_width() as usize,
        height: raster.pixel_height() as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let id = doc.add_image(&raw);
    embedded.push((raster.clone(), id.clone()));
    id
}

/// Replace characters the built-in fonts cannot encode.
fn to_latin1(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if c.is_control() => '?',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

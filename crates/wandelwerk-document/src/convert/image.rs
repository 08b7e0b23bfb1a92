// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Converters whose source is a raster image.

use tracing::{debug, instrument};
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{
    ConversionConfig, FormatClass, Margins, Orientation, PaperSize,
};

use super::{ConvertedDocument, Converter, SourceDocument, ext_in};
use crate::image::ImageProcessor;
use crate::image::processor::format_drops_alpha;
use crate::layout::geometry::{FitMode, center_offset, fit_size};
use crate::layout::{Page, PageGeometry, PageSequence, PlacedItem, RasterHandle};
use crate::office::{write_docx, write_pptx};
use crate::pdf::write_pdf;

fn decode(source: &SourceDocument) -> Result<ImageProcessor> {
    ImageProcessor::from_bytes(&source.bytes, &source.extension)
}

/// A single page holding `raster` fitted into `geometry`'s content box and
/// centered on the page.
fn centered_page(raster: RasterHandle, geometry: &PageGeometry, mode: FitMode) -> Result<Page> {
    let (w, h) = (raster.pixel_width() as f32, raster.pixel_height() as f32);
    let (width, height) = fit_size(w, h, geometry.content_width(), geometry.content_height(), mode)
        .ok_or_else(|| WandelwerkError::InvalidInput(format!("image has no pixels ({w}x{h})")))?;
    let (x, y) = center_offset(geometry.width(), geometry.height(), width, height);

    let mut page = Page::new(geometry.width(), geometry.height());
    page.items.push(PlacedItem::Image {
        raster,
        x,
        y,
        width,
        height,
    });
    Ok(page)
}

// -- image → image ------------------------------------------------------------

/// Re-encodes between raster formats, flattening alpha onto white when the
/// target has no alpha channel. Pairs naming the same encoding are not
/// handled.
pub struct ImageToImage {
    jpeg_quality: u8,
}

impl ImageToImage {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            jpeg_quality: config.raster.jpeg_quality,
        }
    }
}

impl Converter for ImageToImage {
    fn name(&self) -> &'static str {
        "image-to-image"
    }

    fn pairs(&self) -> &'static str {
        "png, jpg, jpeg, bmp, gif, tif, tiff -> any other of these"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Raster.matches(source)
            && FormatClass::Raster.matches(target)
            && !source.eq_ignore_ascii_case(target)
    }

    #[instrument(skip(self, source), fields(from = %source.extension, bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let mut processor = decode(source)?;
        if format_drops_alpha(target) {
            processor = processor.flatten_onto_white();
        }
        let bytes = processor.to_format_bytes(target, self.jpeg_quality)?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- image → icon -------------------------------------------------------------

/// Fits an image onto a square transparent canvas (scaling up or down) and
/// encodes it as an ICO.
pub struct ImageToIcon {
    size: u32,
}

impl ImageToIcon {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            size: config.icon_size,
        }
    }
}

impl Converter for ImageToIcon {
    fn name(&self) -> &'static str {
        "image-to-icon"
    }

    fn pairs(&self) -> &'static str {
        "raster images -> ico"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Raster.matches(source) && FormatClass::Icon.matches(target)
    }

    #[instrument(skip(self, source), fields(from = %source.extension, size = self.size))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let icon = decode(source)?.fit_onto_square(self.size)?;
        let bytes = icon.to_format_bytes("ico", 100)?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- image → PDF --------------------------------------------------------------

/// One page, oriented like the image, with the image fitted inside the
/// margins and centered.
pub struct ImageToPdf {
    paper: PaperSize,
    margin: f32,
}

impl ImageToPdf {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            paper: config.image_paper_size,
            margin: config.image_margin,
        }
    }
}

impl Converter for ImageToPdf {
    fn name(&self) -> &'static str {
        "image-to-pdf"
    }

    fn pairs(&self) -> &'static str {
        "raster images -> pdf"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Raster.matches(source) && FormatClass::Pdf.matches(target)
    }

    #[instrument(skip(self, source), fields(from = %source.extension, bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let raster = decode(source)?.into_handle();
        let orientation =
            Orientation::for_content(raster.pixel_width() as f32, raster.pixel_height() as f32);
        let geometry = PageGeometry::from_paper(self.paper, Margins::uniform(self.margin))?
            .oriented(orientation);
        debug!(?orientation, "page oriented to image");

        let page = centered_page(raster, &geometry, FitMode::Contain)?;
        let bytes = write_pdf(&PageSequence::new(vec![page]), "Converted Image")?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- image → word document / slide deck -----------------------------------------

/// Inserts an image into a new word document (fixed picture width, centered)
/// or a new one-slide deck (fitted and centered on the slide).
pub struct ImageToOffice {
    picture_width: f32,
    slide_size: (f32, f32),
    jpeg_quality: u8,
}

impl ImageToOffice {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            picture_width: config.word_picture_width,
            slide_size: config.slide_size,
            jpeg_quality: config.raster.jpeg_quality,
        }
    }

    fn word_page(&self, raster: RasterHandle) -> Result<Page> {
        let (w, h) = (raster.pixel_width() as f32, raster.pixel_height() as f32);
        if w <= 0.0 || h <= 0.0 {
            return Err(WandelwerkError::InvalidInput("image has no pixels".into()));
        }
        let (page_w, page_h) = PaperSize::A4.dimensions_pt();
        let width = self.picture_width;
        let height = h * width / w;
        let mut page = Page::new(page_w, page_h);
        page.items.push(PlacedItem::Image {
            raster,
            x: (page_w - width) / 2.0,
            y: (page_h - height).max(0.0),
            width,
            height,
        });
        Ok(page)
    }
}

impl Converter for ImageToOffice {
    fn name(&self) -> &'static str {
        "image-to-office"
    }

    fn pairs(&self) -> &'static str {
        "raster images -> docx, pptx"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        FormatClass::Raster.matches(source) && ext_in(target, &["docx", "pptx"])
    }

    #[instrument(skip(self, source), fields(from = %source.extension, bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let raster = decode(source)?.into_handle();
        let bytes = if target.eq_ignore_ascii_case("docx") {
            let page = self.word_page(raster)?;
            write_docx(&PageSequence::new(vec![page]), self.jpeg_quality)?
        } else {
            let (w, h) = self.slide_size;
            let geometry = PageGeometry::full_bleed(w, h)?;
            let page = centered_page(raster, &geometry, FitMode::Fill)?;
            write_pptx(&PageSequence::new(vec![page]), self.jpeg_quality)?
        };
        Ok(ConvertedDocument::new(bytes, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::{read_docx, read_pptx};
    use crate::pdf::PdfReader;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

    fn png(w: u32, h: u32, alpha: u8) -> SourceDocument {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, alpha])));
        let bytes = ImageProcessor::from_dynamic(img).to_png_bytes().unwrap();
        SourceDocument::new(bytes, "png")
    }

    fn config() -> ConversionConfig {
        ConversionConfig::default()
    }

    #[test]
    fn only_identical_extensions_are_refused() {
        let converter = ImageToImage::new(&config());
        assert!(converter.supports("png", "JPG"));
        assert!(!converter.supports("PNG", "png"));
        assert!(converter.supports("jpg", "jpeg"));
        assert!(converter.supports("TIF", "tiff"));
        assert!(!converter.supports("png", "pdf"));
    }

    #[test]
    fn jpg_reencodes_as_jpeg() {
        let source = SourceDocument::new(
            ImageProcessor::from_dynamic(DynamicImage::new_rgb8(4, 4))
                .to_jpeg_bytes(90)
                .unwrap(),
            "jpg",
        );
        let out = ImageToImage::new(&config()).convert(&source, "jpeg").unwrap();
        assert_eq!(out.extension, "jpeg");
        assert_eq!(image::load_from_memory(&out.bytes).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn transparent_png_becomes_white_backed_jpeg() {
        let out = ImageToImage::new(&config()).convert(&png(4, 4, 0), "jpg").unwrap();
        assert_eq!(out.extension, "jpg");
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        let Rgba([r, g, b, _]) = decoded.get_pixel(2, 2);
        assert!(r > 245 && g > 245 && b > 245, "expected white, got {r},{g},{b}");
    }

    #[test]
    fn icon_is_square_at_configured_size() {
        let out = ImageToIcon::new(&config()).convert(&png(64, 32, 255), "ico").unwrap();
        let icon = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(icon.dimensions(), (256, 256));
        // Letterbox rows stay transparent; the center carries the image.
        assert_eq!(icon.get_pixel(128, 10)[3], 0);
        assert_eq!(icon.get_pixel(128, 128)[3], 255);
    }

    #[test]
    fn wide_image_gets_a_landscape_page() {
        let out = ImageToPdf::new(&config()).convert(&png(100, 50, 255), "pdf").unwrap();
        let reader = PdfReader::from_bytes(&out.bytes).unwrap();
        let sizes = reader.page_sizes();
        assert_eq!(sizes.len(), 1);
        let (w, h) = sizes[0];
        assert!((w - 842.0).abs() < 1.0 && (h - 595.0).abs() < 1.0, "{w}x{h}");
    }

    #[test]
    fn image_page_is_centered_inside_margins() {
        let geometry = PageGeometry::from_paper(PaperSize::A4, Margins::uniform(20.0))
            .unwrap()
            .oriented(Orientation::Landscape);
        let raster = RasterHandle::new(DynamicImage::new_rgb8(1000, 500));
        let page = centered_page(raster, &geometry, FitMode::Contain).unwrap();
        match &page.items[0] {
            PlacedItem::Image {
                x,
                y,
                width,
                height,
                ..
            } => {
                assert!((width / height - 2.0).abs() < 1e-3);
                assert!(*width <= 802.0 && *height <= 555.0);
                assert!((x + width - (842.0 - x)).abs() < 1e-3);
                assert!((y + height - (595.0 - y)).abs() < 1e-3);
            }
            other => panic!("expected an image, got {other:?}"),
        }
    }

    #[test]
    fn image_to_word_inserts_one_picture() {
        let out = ImageToOffice::new(&config()).convert(&png(100, 50, 255), "docx").unwrap();
        let doc = read_docx(&out.bytes).unwrap();
        let pictures: usize = doc
            .paragraphs
            .iter()
            .flat_map(|p| &p.runs)
            .map(|r| r.pictures.len())
            .sum();
        assert_eq!(pictures, 1);
    }

    #[test]
    fn image_to_slides_fills_the_slide() {
        let out = ImageToOffice::new(&config()).convert(&png(100, 50, 255), "pptx").unwrap();
        let deck = read_pptx(&out.bytes).unwrap();
        assert_eq!(deck.size, (720.0, 540.0));
        let picture = &deck.slides[0].pictures[0];
        assert_eq!(picture.width, 720.0);
        assert_eq!(picture.height, 360.0);
        assert_eq!(picture.y, 90.0);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = ImageToPdf::new(&config())
            .convert(&SourceDocument::new(b"not an image".to_vec(), "png"), "pdf")
            .unwrap_err();
        assert_eq!(err.kind(), wandelwerk_core::ErrorKind::DecodeFailure);
    }
}

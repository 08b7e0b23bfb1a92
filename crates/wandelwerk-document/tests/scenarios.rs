// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end conversion scenarios through the standard registry.

use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use wandelwerk_core::error::Result;
use wandelwerk_core::{ConversionConfig, ErrorKind, WandelwerkError};
use wandelwerk_document::convert::{ConvertedDocument, Converter, SourceDocument};
use wandelwerk_document::layout::{Page, PageSequence, PlacedItem, RasterHandle};
use wandelwerk_document::office::{read_docx, read_pptx, write_docx};
use wandelwerk_document::pdf::raster::points_to_pixels;
use wandelwerk_document::{ConverterRegistry, ImageProcessor, PageRasterizer, PdfReader, merge_documents};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Paints every page light grey at the requested DPI.
struct GreyRasterizer;

impl PageRasterizer for GreyRasterizer {
    fn render_pages(&self, pdf: &[u8], dpi: u32, max_pages: Option<usize>) -> Result<Vec<DynamicImage>> {
        let sizes = PdfReader::from_bytes(pdf)?.page_sizes();
        Ok(sizes
            .into_iter()
            .take(max_pages.unwrap_or(usize::MAX))
            .map(|(w, h)| {
                DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    points_to_pixels(w, dpi),
                    points_to_pixels(h, dpi),
                    Rgb([220, 220, 220]),
                ))
            })
            .collect())
    }

    fn backend(&self) -> &'static str {
        "grey"
    }
}

fn registry() -> ConverterRegistry {
    ConverterRegistry::standard(&ConversionConfig::default(), Arc::new(GreyRasterizer))
}

/// A PDF whose pages are `width` points wide, so page order can be read back
/// from the page sizes.
fn pdf_with_widths(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for width in widths {
        let content = Content {
            operations: vec![
                Operation::new("re", vec![0.into(), 0.into(), 10.into(), 10.into()]),
                Operation::new("f", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), 500.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => widths.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    ImageProcessor::from_dynamic(img).to_jpeg_bytes(90).unwrap()
}

fn page_widths(pdf: &[u8]) -> Vec<f32> {
    PdfReader::from_bytes(pdf)
        .unwrap()
        .page_sizes()
        .into_iter()
        .map(|(w, _)| w)
        .collect()
}

/// Effective size (in points) of every image XObject painted on the first
/// page, following `q`/`Q`/`cm` to the `Do` operator.
fn painted_image_sizes(pdf: &[u8]) -> Vec<(f32, f32)> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let content = doc.get_and_decode_page_content(page_id).unwrap();

    type Matrix = [f32; 6];
    let multiply = |m: Matrix, n: Matrix| -> Matrix {
        [
            m[0] * n[0] + m[1] * n[2],
            m[0] * n[1] + m[1] * n[3],
            m[2] * n[0] + m[3] * n[2],
            m[2] * n[1] + m[3] * n[3],
            m[4] * n[0] + m[5] * n[2] + n[4],
            m[4] * n[1] + m[5] * n[3] + n[5],
        ]
    };

    let mut ctm: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut stack = Vec::new();
    let mut sizes = Vec::new();
    for op in &content.operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => ctm = stack.pop().unwrap_or(ctm),
            "cm" => {
                let v: Vec<f32> = op
                    .operands
                    .iter()
                    .map(|o| match o {
                        Object::Integer(i) => *i as f32,
                        Object::Real(r) => *r,
                        other => panic!("non-numeric cm operand {other:?}"),
                    })
                    .collect();
                ctm = multiply([v[0], v[1], v[2], v[3], v[4], v[5]], ctm);
            }
            "Do" => sizes.push((ctm[0].hypot(ctm[1]), ctm[2].hypot(ctm[3]))),
            _ => {}
        }
    }
    sizes
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[test]
fn svg_to_pdf_is_an_unsupported_pair() {
    let err = registry()
        .convert(&SourceDocument::new(b"<svg/>".to_vec(), "svg"), "pdf")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedPair);
    match err {
        WandelwerkError::UnsupportedPair { from, to } => {
            assert_eq!((from.as_str(), to.as_str()), ("svg", "pdf"));
        }
        other => panic!("expected UnsupportedPair, got {other:?}"),
    }
}

#[test]
fn later_registrations_never_shadow_earlier_ones() {
    struct Impostor;

    impl Converter for Impostor {
        fn name(&self) -> &'static str {
            "impostor"
        }

        fn pairs(&self) -> &'static str {
            "png -> pdf"
        }

        fn supports(&self, source: &str, target: &str) -> bool {
            source == "png" && target == "pdf"
        }

        fn convert(&self, _source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
            Ok(ConvertedDocument::new(Vec::new(), target))
        }
    }

    let mut registry = registry();
    registry.register(Impostor);
    assert_eq!(registry.resolve("png", "pdf").unwrap().name(), "image-to-pdf");
    assert_eq!(registry.describe().last().map(|d| d.0), Some("impostor"));
}

#[test]
fn concurrent_conversions_do_not_share_layout_state() {
    let registry = registry();
    let text: String = (1..=120).map(|n| format!("row {n}\n")).collect();
    let source = SourceDocument::new(text.into_bytes(), "txt");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| registry.convert(&source, "pdf")))
            .collect();
        for handle in handles {
            let out = handle.join().unwrap().unwrap();
            assert_eq!(PdfReader::from_bytes(&out.bytes).unwrap().page_count(), 3);
        }
    });
}

// ---------------------------------------------------------------------------
// Layout scenarios
// ---------------------------------------------------------------------------

#[test]
fn text_pages_hold_fifty_lines_each() {
    let text: String = (1..=120).map(|n| format!("line {n}\n")).collect();
    let out = registry()
        .convert(&SourceDocument::new(text.into_bytes(), "txt"), "pdf")
        .unwrap();
    // 750pt of usable height at 15pt per line: 50 + 50 + 20.
    assert_eq!(PdfReader::from_bytes(&out.bytes).unwrap().page_count(), 3);
}

#[test]
fn jpeg_to_pdf_preserves_aspect_ratio() {
    let out = registry()
        .convert(&SourceDocument::new(jpeg(1000, 500), "jpg"), "pdf")
        .unwrap();

    let reader = PdfReader::from_bytes(&out.bytes).unwrap();
    let (page_w, page_h) = reader.page_sizes()[0];
    assert!(page_w > page_h, "wide image should get a landscape page");

    let sizes = painted_image_sizes(&out.bytes);
    assert_eq!(sizes.len(), 1);
    let (w, h) = sizes[0];
    assert!(w <= page_w - 40.0 + 0.5 && h <= page_h - 40.0 + 0.5);
    assert!(((w / h) / 2.0 - 1.0).abs() < 0.01, "aspect {w}x{h}");

    // Rendering the page back at 300 DPI keeps the page's proportions.
    let png = registry()
        .convert(&SourceDocument::new(out.bytes, "pdf"), "png")
        .unwrap();
    let rendered = image::load_from_memory(&png.bytes).unwrap();
    let expected = page_w / page_h;
    let actual = rendered.width() as f32 / rendered.height() as f32;
    assert!((actual / expected - 1.0).abs() < 0.01);
}

#[test]
fn merge_keeps_document_then_page_order() {
    let merged = merge_documents(&[
        SourceDocument::new(pdf_with_widths(&[301, 302, 303]), "pdf"),
        SourceDocument::new(pdf_with_widths(&[401, 402]), "pdf"),
    ])
    .unwrap();
    assert_eq!(
        page_widths(&merged.bytes),
        vec![301.0, 302.0, 303.0, 401.0, 402.0]
    );
}

#[test]
fn word_document_round_trips_through_pdf() {
    let picture = RasterHandle::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        40,
        20,
        Rgb([0, 90, 0]),
    )));
    let mut page = Page::new(595.0, 842.0);
    page.items.push(PlacedItem::Text {
        line: "Quarterly report".into(),
        x: 50.0,
        y: 700.0,
        font_size: 10.0,
    });
    page.items.push(PlacedItem::Image {
        raster: picture,
        x: 50.0,
        y: 600.0,
        width: 40.0,
        height: 20.0,
    });
    let docx = write_docx(&PageSequence::new(vec![page]), 90).unwrap();
    assert_eq!(read_docx(&docx).unwrap().paragraphs.len(), 2);

    let out = registry()
        .convert(&SourceDocument::new(docx, "DOCX"), "pdf")
        .unwrap();
    let reader = PdfReader::from_bytes(&out.bytes).unwrap();
    assert_eq!(reader.page_count(), 1);
    assert!(reader.extract_text().unwrap().contains("Quarterly"));
    let sizes = painted_image_sizes(&out.bytes);
    assert_eq!(sizes.len(), 1);
    assert!((sizes[0].0 - 40.0).abs() < 0.5 && (sizes[0].1 - 20.0).abs() < 0.5);
}

#[test]
fn pdf_pages_become_slides() {
    let out = registry()
        .convert(&SourceDocument::new(pdf_with_widths(&[300, 300]), "pdf"), "pptx")
        .unwrap();
    let deck = read_pptx(&out.bytes).unwrap();
    assert_eq!(deck.slides.len(), 2);
    assert_eq!(deck.size, (720.0, 540.0));
}

#[test]
fn corrupt_inputs_surface_as_decode_failures() {
    let registry = registry();
    for (ext, target) in [("png", "pdf"), ("docx", "pdf"), ("pptx", "pdf"), ("xlsx", "pdf"), ("pdf", "png")] {
        let err = registry
            .convert(&SourceDocument::new(b"garbage".to_vec(), ext), target)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailure, "{ext} -> {target}");
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office documents to PDF.
//
// Word documents flow their pictures and run text through one page flow;
// slide decks become one full-page picture per slide; spreadsheets fall back
// to one line of text per row.

use tracing::{debug, instrument, warn};
use wandelwerk_core::ConversionConfig;
use wandelwerk_core::config::{TextLayout, WordLayout};
use wandelwerk_core::error::Result;

use super::{ConvertedDocument, Converter, SourceDocument, ext_in};
use crate::image::ImageProcessor;
use crate::layout::emit::emit_image_with_gap;
use crate::layout::{Page, PageFlow, PageGeometry, PageSequence, PlacedItem, emit_text_line};
use crate::office::{Sheet, WordDocument, read_docx, read_pptx, read_workbook};
use crate::pdf::raster::points_to_pixels;
use crate::pdf::write_pdf;

// -- word document → PDF --------------------------------------------------------

pub struct WordToPdf {
    layout: WordLayout,
}

impl WordToPdf {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            layout: config.word.clone(),
        }
    }
}

impl Converter for WordToPdf {
    fn name(&self) -> &'static str {
        "word-to-pdf"
    }

    fn pairs(&self) -> &'static str {
        "docx -> pdf"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        ext_in(source, &["docx"]) && ext_in(target, &["pdf"])
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let document = read_docx(&source.bytes)?;
        let sequence = paginate_word(&document, &self.layout)?;
        let bytes = write_pdf(&sequence, "Converted Document")?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

/// Lay out a word document: for each paragraph, each run's pictures (scaled
/// down to the column width) and then its text lines, followed by the
/// paragraph gap. Pictures that fail to decode are skipped.
pub fn paginate_word(document: &WordDocument, layout: &WordLayout) -> Result<PageSequence> {
    let geometry = PageGeometry::from_paper(layout.paper_size, layout.margins)?;
    let column_width = geometry.content_width();
    let mut flow = PageFlow::new(geometry).with_font_size(layout.font_size);
    let mut picture_index = 0usize;

    for paragraph in &document.paragraphs {
        for run in &paragraph.runs {
            for data in &run.pictures {
                let index = picture_index;
                picture_index += 1;
                let raster = match ImageProcessor::from_bytes(data, "embedded picture") {
                    Ok(processor) => processor.into_handle(),
                    Err(err) => {
                        warn!(index, %err, "embedded picture failed to decode, skipping");
                        continue;
                    }
                };
                emit_image_with_gap(&mut flow, &raster, column_width, layout.image_gap);
            }

            for line in run.text.lines() {
                emit_text_line(&mut flow, &line.replace('\t', " "), layout.line_height);
            }
        }
        flow.advance(layout.paragraph_gap);
    }

    debug!(
        paragraphs = document.paragraphs.len(),
        pictures = picture_index,
        pages = flow.page_count(),
        "word document paginated"
    );
    Ok(flow.finish())
}

// -- slide deck → PDF -----------------------------------------------------------

/// One PDF page per slide, the size of the slide, holding the rendered slide
/// as a single full-page image.
pub struct SlidesToPdf {
    jpeg_quality: u8,
}

impl SlidesToPdf {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            jpeg_quality: config.raster.jpeg_quality,
        }
    }
}

impl Converter for SlidesToPdf {
    fn name(&self) -> &'static str {
        "slides-to-pdf"
    }

    fn pairs(&self) -> &'static str {
        "pptx -> pdf"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        ext_in(source, &["pptx"]) && ext_in(target, &["pdf"])
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let deck = read_pptx(&source.bytes)?;
        let (width, height) = deck.size;
        let (px_w, px_h) = (points_to_pixels(width, 72), points_to_pixels(height, 72));

        let mut pages = Vec::with_capacity(deck.slides.len());
        for slide in &deck.slides {
            // Slides are opaque; re-encoding as JPEG keeps the PDF small.
            let rendered = ImageProcessor::from_dynamic(slide.render(deck.size, px_w, px_h));
            let jpeg = rendered.to_jpeg_bytes(self.jpeg_quality)?;
            let raster = ImageProcessor::from_bytes(&jpeg, "jpeg")?.into_handle();

            let mut page = Page::new(width, height);
            page.items.push(PlacedItem::Image {
                raster,
                x: 0.0,
                y: 0.0,
                width,
                height,
            });
            pages.push(page);
        }
        debug!(slides = pages.len(), px_w, px_h, "slides rendered");

        let bytes = write_pdf(&PageSequence::new(pages), "Converted Presentation")?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

// -- spreadsheet → PDF ----------------------------------------------------------

/// Text fallback: each sheet is introduced by a `Sheet: <name>` line, each
/// row becomes one line of its cells joined by two spaces, and a blank line
/// closes the sheet.
pub struct SpreadsheetToPdf {
    layout: TextLayout,
}

impl SpreadsheetToPdf {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            layout: config.sheet.clone(),
        }
    }
}

impl Converter for SpreadsheetToPdf {
    fn name(&self) -> &'static str {
        "spreadsheet-to-pdf"
    }

    fn pairs(&self) -> &'static str {
        "xlsx, xls -> pdf"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        ext_in(source, &["xlsx", "xls"]) && ext_in(target, &["pdf"])
    }

    #[instrument(skip(self, source), fields(from = %source.extension, bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let sheets = read_workbook(&source.bytes)?;
        let sequence = paginate_sheets(&sheets, &self.layout)?;
        let bytes = write_pdf(&sequence, "Converted Spreadsheet")?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

/// Text lines standing in for a workbook.
pub fn sheet_lines(sheets: &[Sheet]) -> Vec<String> {
    let mut lines = Vec::new();
    for sheet in sheets {
        lines.push(format!("Sheet: {}", sheet.name));
        for row in &sheet.rows {
            let cells: Vec<&str> = row
                .iter()
                .map(String::as_str)
                .filter(|cell| !cell.is_empty())
                .collect();
            lines.push(cells.join("  "));
        }
        lines.push(String::new());
    }
    lines
}

pub fn paginate_sheets(sheets: &[Sheet], layout: &TextLayout) -> Result<PageSequence> {
    let geometry = PageGeometry::from_paper(layout.paper_size, layout.margins)?;
    let mut flow = PageFlow::new(geometry).with_font_size(layout.font_size);
    for line in sheet_lines(sheets) {
        let line = line.replace('\t', "    ").replace(['\r', '\n'], " ");
        emit_text_line(&mut flow, &line, layout.line_height);
    }
    Ok(flow.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RasterHandle;
    use crate::office::docx::fixtures::docx;
    use crate::office::{write_pptx, write_xlsx};
    use crate::pdf::PdfReader;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 10, 10])));
        ImageProcessor::from_dynamic(img).to_png_bytes().unwrap()
    }

    fn config() -> ConversionConfig {
        ConversionConfig::default()
    }

    #[test]
    fn word_pictures_are_scaled_to_the_column() {
        let bytes = docx(&[&[None, Some("caption")]], &png(990, 100));
        let document = read_docx(&bytes).unwrap();
        let pages = paginate_word(&document, &config().word).unwrap();

        let page = &pages.pages()[0];
        match &page.items[0] {
            PlacedItem::Image {
                x, width, height, ..
            } => {
                assert_eq!(*x, 50.0);
                assert!((width - 495.0).abs() < 1e-3);
                assert!((height - 50.0).abs() < 1e-3);
            }
            other => panic!("expected the picture first, got {other:?}"),
        }
        assert_eq!(page.text_lines().collect::<Vec<_>>(), vec!["caption"]);
    }

    #[test]
    fn broken_word_picture_is_skipped() {
        let bytes = docx(&[&[None], &[Some("after")]], b"not an image");
        let document = read_docx(&bytes).unwrap();
        let pages = paginate_word(&document, &config().word).unwrap();
        assert_eq!(pages.pages()[0].images().count(), 0);
        assert_eq!(pages.pages()[0].text_lines().collect::<Vec<_>>(), vec!["after"]);
    }

    #[test]
    fn run_breaks_and_tabs_become_separate_clean_lines() {
        let document = WordDocument {
            paragraphs: vec![crate::office::WordParagraph {
                runs: vec![crate::office::WordRun {
                    text: "one\ttwo\nthree".into(),
                    pictures: vec![],
                }],
            }],
        };
        let pages = paginate_word(&document, &config().word).unwrap();
        assert_eq!(
            pages.pages()[0].text_lines().collect::<Vec<_>>(),
            vec!["one two", "three"]
        );
    }

    #[test]
    fn long_word_documents_spill_onto_new_pages() {
        let paragraphs: Vec<Vec<Option<&str>>> = (0..100).map(|_| vec![Some("text")]).collect();
        let refs: Vec<&[Option<&str>]> = paragraphs.iter().map(Vec::as_slice).collect();
        let document = read_docx(&docx(&refs, &png(1, 1))).unwrap();
        let pages = paginate_word(&document, &config().word).unwrap();
        // 700pt of column, 17pt per paragraph.
        assert_eq!(pages.len(), 3);
        let total: usize = pages.pages().iter().map(|p| p.text_lines().count()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn each_slide_becomes_a_full_page_image() {
        let raster = RasterHandle::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            4,
            3,
            Rgb([0, 0, 0]),
        )));
        let slide = |raster: &RasterHandle| {
            let mut page = Page::new(720.0, 540.0);
            page.items.push(PlacedItem::Image {
                raster: raster.clone(),
                x: 0.0,
                y: 0.0,
                width: 720.0,
                height: 540.0,
            });
            page
        };
        let deck = write_pptx(&PageSequence::new(vec![slide(&raster), slide(&raster)]), 90).unwrap();

        let out = SlidesToPdf::new(&config())
            .convert(&SourceDocument::new(deck, "pptx"), "pdf")
            .unwrap();
        let reader = PdfReader::from_bytes(&out.bytes).unwrap();
        assert_eq!(reader.page_count(), 2);
        for (w, h) in reader.page_sizes() {
            assert!((w - 720.0).abs() < 1.0 && (h - 540.0).abs() < 1.0, "{w}x{h}");
        }
    }

    #[test]
    fn sheets_become_labelled_line_blocks() {
        let sheets = vec![
            Sheet {
                name: "Q1".into(),
                rows: vec![
                    vec!["Region".into(), "Sales".into()],
                    vec!["North".into(), String::new(), "12".into()],
                ],
            },
            Sheet {
                name: "Q2".into(),
                rows: vec![],
            },
        ];
        assert_eq!(
            sheet_lines(&sheets),
            vec!["Sheet: Q1", "Region  Sales", "North  12", "", "Sheet: Q2", ""]
        );
    }

    #[test]
    fn sheet_fallback_fits_fifty_lines_per_page() {
        let rows: Vec<Vec<String>> = (0..60).map(|n| vec![n.to_string()]).collect();
        let sheets = vec![Sheet {
            name: "Data".into(),
            rows,
        }];
        // 62 lines: label, 60 rows, closing blank line.
        let pages = paginate_sheets(&sheets, &config().sheet).unwrap();
        let counts: Vec<usize> = pages.pages().iter().map(|p| p.text_lines().count()).collect();
        assert_eq!(counts, vec![50, 12]);
    }

    #[test]
    fn workbook_converts_to_pdf() {
        let xlsx = write_xlsx("Data", &[vec!["a".into(), "b".into()]]).unwrap();
        let out = SpreadsheetToPdf::new(&config())
            .convert(&SourceDocument::new(xlsx, "xlsx"), "pdf")
            .unwrap();
        assert_eq!(PdfReader::from_bytes(&out.bytes).unwrap().page_count(), 1);
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatch registry — an ordered list of converters resolved by linear scan.
//
// Registration order is the precedence rule: when two converters claim the
// same pair, the one registered first is always selected. The registry is
// built once and only read afterwards, so `&ConverterRegistry` can be shared
// across threads without locking.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use wandelwerk_core::ConversionConfig;
use wandelwerk_core::error::{Result, WandelwerkError};

use super::image::{ImageToIcon, ImageToImage, ImageToOffice, ImageToPdf};
use super::office::{SlidesToPdf, SpreadsheetToPdf, WordToPdf};
use super::pdf::{PdfToImage, PdfToSlides, PdfToSpreadsheet, PdfToWord};
use super::text::TextToPdf;
use super::{ConvertedDocument, Converter, SourceDocument};
use crate::pdf::PageRasterizer;

/// Ordered collection of converters; first match wins.
#[derive(Default)]
pub struct ConverterRegistry {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in converter, in precedence order, configured from
    /// `config`. PDF-consuming converters render pages through `rasterizer`.
    pub fn standard(config: &ConversionConfig, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        let mut registry = Self::new();
        registry.register(ImageToImage::new(config));
        registry.register(ImageToIcon::new(config));
        registry.register(ImageToPdf::new(config));
        registry.register(ImageToOffice::new(config));
        registry.register(TextToPdf::new(config));
        registry.register(WordToPdf::new(config));
        registry.register(SlidesToPdf::new(config));
        registry.register(SpreadsheetToPdf::new(config));
        registry.register(PdfToImage::new(config, rasterizer.clone()));
        registry.register(PdfToSlides::new(config, rasterizer.clone()));
        registry.register(PdfToWord::new(config, rasterizer));
        registry.register(PdfToSpreadsheet);
        info!(converters = registry.len(), "standard registry built");
        registry
    }

    /// Append a converter. Duplicated pairs are allowed; the earlier
    /// registration keeps precedence.
    pub fn register(&mut self, converter: impl Converter + 'static) {
        debug!(converter = converter.name(), position = self.converters.len(), "converter registered");
        self.converters.push(Box::new(converter));
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// The first converter, in registration order, that supports the pair.
    pub fn resolve(&self, source: &str, target: &str) -> Result<&dyn Converter> {
        self.converters
            .iter()
            .find(|converter| converter.supports(source, target))
            .map(|converter| converter.as_ref())
            .ok_or_else(|| WandelwerkError::unsupported(source, target))
    }

    /// Resolve a converter and run it. Failures raised by the converter are
    /// wrapped in [`WandelwerkError::Conversion`]; an unresolvable pair is
    /// reported as `UnsupportedPair` directly.
    #[instrument(skip(self, source), fields(from = %source.extension, to = %target, bytes_len = source.bytes.len()))]
    pub fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let converter = self.resolve(&source.extension, target)?;
        debug!(converter = converter.name(), "converter resolved");

        let output = converter
            .convert(source, target)
            .map_err(|cause| WandelwerkError::Conversion {
                converter: converter.name().to_string(),
                cause: Box::new(cause),
            })?;

        info!(
            converter = converter.name(),
            output_len = output.bytes.len(),
            "conversion finished"
        );
        Ok(output)
    }

    /// `(name, pairs)` for every converter, in precedence order.
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        self.converters
            .iter()
            .map(|converter| (converter.name(), converter.pairs()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::raster::testing::BlankRasterizer;
    use wandelwerk_core::ErrorKind;

    /// Converter answering every pair it was built for with a fixed tag.
    struct Tagged {
        name: &'static str,
        source: &'static str,
        target: &'static str,
    }

    impl Converter for Tagged {
        fn name(&self) -> &'static str {
            self.name
        }

        fn pairs(&self) -> &'static str {
            "test"
        }

        fn supports(&self, source: &str, target: &str) -> bool {
            source.eq_ignore_ascii_case(self.source) && target.eq_ignore_ascii_case(self.target)
        }

        fn convert(&self, _source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
            Ok(ConvertedDocument::new(self.name.as_bytes().to_vec(), target))
        }
    }

    /// Converter that always fails to decode.
    struct Broken;

    impl Converter for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn pairs(&self) -> &'static str {
            "test"
        }

        fn supports(&self, _source: &str, _target: &str) -> bool {
            true
        }

        fn convert(&self, source: &SourceDocument, _target: &str) -> Result<ConvertedDocument> {
            Err(WandelwerkError::decode(source.extension.clone(), "truncated"))
        }
    }

    fn tagged(name: &'static str) -> Tagged {
        Tagged {
            name,
            source: "png",
            target: "pdf",
        }
    }

    #[test]
    fn first_registered_converter_wins() {
        let mut registry = ConverterRegistry::new();
        registry.register(tagged("first"));
        registry.register(tagged("second"));

        for _ in 0..10 {
            assert_eq!(registry.resolve("png", "pdf").unwrap().name(), "first");
        }
        let out = registry
            .convert(&SourceDocument::new(vec![], "png"), "pdf")
            .unwrap();
        assert_eq!(out.bytes, b"first");
    }

    #[test]
    fn resolution_ignores_extension_case() {
        let mut registry = ConverterRegistry::new();
        registry.register(tagged("only"));
        assert_eq!(registry.resolve("PNG", "Pdf").unwrap().name(), "only");
    }

    #[test]
    fn unknown_pair_is_unsupported() {
        let registry = ConverterRegistry::new();
        let err = registry
            .convert(&SourceDocument::new(b"<svg/>".to_vec(), "svg"), "pdf")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedPair);
        assert!(matches!(err, WandelwerkError::UnsupportedPair { .. }));
    }

    #[test]
    fn converter_failures_are_wrapped_but_classifiable() {
        let mut registry = ConverterRegistry::new();
        registry.register(Broken);
        let err = registry
            .convert(&SourceDocument::new(vec![0], "docx"), "pdf")
            .unwrap_err();
        match &err {
            WandelwerkError::Conversion { converter, .. } => assert_eq!(converter, "broken"),
            other => panic!("expected a conversion wrapper, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    }

    #[test]
    fn standard_registry_covers_every_documented_pair() {
        let registry =
            ConverterRegistry::standard(&ConversionConfig::default(), Arc::new(BlankRasterizer));
        assert_eq!(registry.len(), 12);

        let expected = [
            ("png", "jpg", "image-to-image"),
            ("jpeg", "png", "image-to-image"),
            ("png", "ico", "image-to-icon"),
            ("jpg", "pdf", "image-to-pdf"),
            ("png", "docx", "image-to-office"),
            ("jpeg", "pptx", "image-to-office"),
            ("txt", "pdf", "text-to-pdf"),
            ("docx", "pdf", "word-to-pdf"),
            ("pptx", "pdf", "slides-to-pdf"),
            ("xlsx", "pdf", "spreadsheet-to-pdf"),
            ("xls", "pdf", "spreadsheet-to-pdf"),
            ("pdf", "png", "pdf-to-image"),
            ("pdf", "jpg", "pdf-to-image"),
            ("pdf", "pptx", "pdf-to-slides"),
            ("pdf", "ppt", "pdf-to-slides"),
            ("pdf", "docx", "pdf-to-word"),
            ("pdf", "doc", "pdf-to-word"),
            ("pdf", "xlsx", "pdf-to-spreadsheet"),
            ("pdf", "xls", "pdf-to-spreadsheet"),
        ];
        for (source, target, name) in expected {
            assert_eq!(
                registry.resolve(source, target).unwrap().name(),
                name,
                "{source} -> {target}"
            );
        }

        for (source, target) in [("png", "png"), ("JPG", "jpg"), ("svg", "pdf"), ("pdf", "pdf")] {
            assert_eq!(
                registry.resolve(source, target).err().map(|e| e.kind()),
                Some(ErrorKind::UnsupportedPair),
                "{source} -> {target}"
            );
        }
        assert_eq!(registry.describe().first().map(|d| d.0), Some("image-to-image"));
    }

    #[test]
    fn resolution_is_shareable_across_threads() {
        let registry =
            ConverterRegistry::standard(&ConversionConfig::default(), Arc::new(BlankRasterizer));
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..100)
                            .map(|_| registry.resolve("txt", "pdf").map(|c| c.name()))
                            .collect::<Result<Vec<_>>>()
                    })
                })
                .collect();
            for handle in handles {
                let names = handle.join().unwrap().unwrap();
                assert!(names.iter().all(|name| *name == "text-to-pdf"));
            }
        });
    }
}

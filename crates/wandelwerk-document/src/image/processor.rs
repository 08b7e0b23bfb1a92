// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, alpha flattening, fit-onto-canvas, and encoding
// to any raster format the `image` crate maps from an extension.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tracing::{debug, info, instrument};
use wandelwerk_core::canonical_extension;
use wandelwerk_core::error::{Result, WandelwerkError};

use crate::layout::RasterHandle;
use crate::layout::geometry::{FitMode, center_offset_px, fit_px};

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so
/// steps chain:
///
/// ```ignore
/// let png = ImageProcessor::from_bytes(&bytes, "jpg")?
///     .fit_onto_square(256)
///     .to_format_bytes("png", 90)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes. `format` names the declared source format
    /// and is only used for error reporting; the codec is sniffed from the
    /// bytes.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], format: &str) -> Result<Self> {
        let image =
            image::load_from_memory(data).map_err(|err| WandelwerkError::decode(format, err))?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the pixel format carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Hand the pixels to the layout engine.
    pub fn into_handle(self) -> RasterHandle {
        RasterHandle::new(self.image)
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Composite the image onto an opaque white background, dropping the
    /// alpha channel. Opaque images pass through unchanged.
    #[instrument(skip(self))]
    pub fn flatten_onto_white(self) -> Self {
        if !self.has_alpha() {
            return self;
        }
        info!(
            width = self.width(),
            height = self.height(),
            "Flattening alpha onto white"
        );
        let flattened = composite_on_white(&self.image);
        Self {
            image: DynamicImage::ImageRgb8(flattened),
        }
    }

    /// Scale the image (up or down) to fit a transparent `side` x `side`
    /// canvas and center it there.
    #[instrument(skip(self))]
    pub fn fit_onto_square(self, side: u32) -> Result<Self> {
        let (w, h) = fit_px(self.width(), self.height(), side, side, FitMode::Fill)
            .ok_or_else(|| {
                WandelwerkError::InvalidInput(format!(
                    "cannot fit a {}x{} image onto a {side}px canvas",
                    self.width(),
                    self.height()
                ))
            })?;
        let scaled = self.image.resize_exact(w, h, FilterType::Triangle);
        let (x, y) = center_offset_px(side, side, w, h);

        let mut canvas = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 0]));
        imageops::overlay(&mut canvas, &scaled.to_rgba8(), x, y);
        debug!(w, h, x, y, "Image placed on canvas");
        Ok(Self {
            image: DynamicImage::ImageRgba8(canvas),
        })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode for the format an extension names. The extension is mapped to
    /// a codec here (`jpg` and `jpeg` both select JPEG); formats without an
    /// alpha channel receive a flattened copy.
    pub fn to_format_bytes(&self, ext: &str, jpeg_quality: u8) -> Result<Vec<u8>> {
        let format = ImageFormat::from_extension(ext)
            .ok_or_else(|| WandelwerkError::encode(ext, "unknown image format"))?;
        match format {
            ImageFormat::Jpeg => self.to_jpeg_bytes(jpeg_quality),
            ImageFormat::Bmp => {
                let opaque = DynamicImage::ImageRgb8(composite_on_white(&self.image));
                encode_to_format(&opaque, format, ext)
            }
            ImageFormat::Ico => {
                let rgba = DynamicImage::ImageRgba8(self.image.to_rgba8());
                encode_to_format(&rgba, format, ext)
            }
            _ => encode_to_format(&self.image, format, ext),
        }
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png, "png")
    }

    /// Encode as JPEG with the given quality (1-100), flattening any alpha
    /// onto white first.
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = composite_on_white(&self.image);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| WandelwerkError::encode("jpeg", err))?;
        Ok(buffer)
    }
}

/// RGB pixels of `image` composited over white. Opaque images are only
/// converted.
pub fn composite_on_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let alpha = a as u32;
        let blend = |channel: u8| -> u8 {
            ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode a picture for embedding in an office package: JPEG for opaque
/// images, PNG when transparency must survive. Returns the bytes and the
/// file extension to store them under.
pub fn encode_for_embedding(image: &DynamicImage, jpeg_quality: u8) -> Result<(Vec<u8>, &'static str)> {
    let processor = ImageProcessor::from_dynamic(image.clone());
    if processor.has_alpha() {
        Ok((processor.to_png_bytes()?, "png"))
    } else {
        Ok((processor.to_jpeg_bytes(jpeg_quality)?, "jpeg"))
    }
}

/// Whether encoding to `ext` loses the alpha channel.
pub fn format_drops_alpha(ext: &str) -> bool {
    matches!(canonical_extension(ext).as_str(), "jpeg" | "bmp")
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat, ext: &str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| WandelwerkError::encode(ext, err))?;
    Ok(buffer)
}

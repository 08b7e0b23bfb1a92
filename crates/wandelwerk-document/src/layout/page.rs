// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page model — page geometry, content blocks, and the placed-item page
// sequence that every PDF-producing converter hands to an encoder.

use std::sync::Arc;

use image::DynamicImage;
use wandelwerk_core::error::{Result, WandelwerkError};
use wandelwerk_core::{Margins, Orientation, PaperSize};

/// Size and margins of a target page, in points (1/72 inch).
///
/// Construction validates that the page has a positive size and that each
/// margin is less than half of its dimension, so the content box is never
/// empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    width: f32,
    height: f32,
    margins: Margins,
}

impl PageGeometry {
    pub fn new(width: f32, height: f32, margins: Margins) -> Result<Self> {
        if !(width > 0.0 && height > 0.0) {
            return Err(WandelwerkError::InvalidGeometry(format!(
                "page must have a positive size, got {width}x{height}"
            )));
        }
        let Margins {
            top,
            bottom,
            left,
            right,
        } = margins;
        if [top, bottom, left, right].iter().any(|m| *m < 0.0) {
            return Err(WandelwerkError::InvalidGeometry(
                "margins must not be negative".into(),
            ));
        }
        if top >= height / 2.0 || bottom >= height / 2.0 {
            return Err(WandelwerkError::InvalidGeometry(format!(
                "vertical margins {top}/{bottom} must be less than half the page height {height}"
            )));
        }
        if left >= width / 2.0 || right >= width / 2.0 {
            return Err(WandelwerkError::InvalidGeometry(format!(
                "horizontal margins {left}/{right} must be less than half the page width {width}"
            )));
        }
        Ok(Self {
            width,
            height,
            margins,
        })
    }

    /// Portrait page of a standard paper size.
    pub fn from_paper(paper: PaperSize, margins: Margins) -> Result<Self> {
        let (w, h) = paper.dimensions_pt();
        Self::new(w, h, margins)
    }

    /// Full-bleed page (no margins).
    pub fn full_bleed(width: f32, height: f32) -> Result<Self> {
        Self::new(width, height, Margins::none())
    }

    /// The same page turned to the requested orientation. Margins stay
    /// attached to their edges.
    pub fn oriented(self, orientation: Orientation) -> Self {
        let is_landscape = self.width > self.height;
        match (orientation, is_landscape) {
            (Orientation::Landscape, false) | (Orientation::Portrait, true) => Self {
                width: self.height,
                height: self.width,
                margins: self.margins,
            },
            _ => self,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Width available between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Height available between the top and bottom margins.
    pub fn content_height(&self) -> f32 {
        self.height - self.margins.top - self.margins.bottom
    }

    /// Vertical offset of the first line on a fresh page.
    pub fn top(&self) -> f32 {
        self.height - self.margins.top
    }
}

/// Shared, immutable reference to decoded pixel data. Cloning shares the
/// pixels.
#[derive(Debug, Clone)]
pub struct RasterHandle(Arc<DynamicImage>);

impl RasterHandle {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn pixel_width(&self) -> u32 {
        self.0.width()
    }

    pub fn pixel_height(&self) -> u32 {
        self.0.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.0
    }

    /// True when both handles refer to the same pixel buffer.
    pub fn same_raster(&self, other: &RasterHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<DynamicImage> for RasterHandle {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// An atomic unit of placeable content.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    TextLine(String),
    Image(RasterHandle),
}

/// An item fixed at a position on a page. Coordinates are in points with
/// the origin at the bottom-left corner; `(x, y)` is the item's lower-left
/// corner.
#[derive(Debug, Clone)]
pub enum PlacedItem {
    Text {
        line: String,
        x: f32,
        y: f32,
        font_size: f32,
    },
    Image {
        raster: RasterHandle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// One output page: its size and the items placed on it, in emission order.
#[derive(Debug, Clone)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub items: Vec<PlacedItem>,
}

impl Page {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Text lines on this page, top to bottom.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            PlacedItem::Text { line, .. } => Some(line.as_str()),
            PlacedItem::Image { .. } => None,
        })
    }

    /// Placed images on this page, in emission order.
    pub fn images(&self) -> impl Iterator<Item = &PlacedItem> {
        self.items
            .iter()
            .filter(|item| matches!(item, PlacedItem::Image { .. }))
    }
}

/// Ordered pages produced by a converter, handed read-only to an encoder.
#[derive(Debug, Clone, Default)]
pub struct PageSequence {
    pages: Vec<Page>,
}

impl PageSequence {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_margins_of_half_the_page() {
        let err = PageGeometry::new(100.0, 100.0, Margins::new(50.0, 0.0, 0.0, 0.0));
        assert!(err.is_err());
        let err = PageGeometry::new(100.0, 100.0, Margins::new(0.0, 0.0, 10.0, 60.0));
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_pages() {
        assert!(PageGeometry::new(0.0, 100.0, Margins::none()).is_err());
        assert!(PageGeometry::new(100.0, -1.0, Margins::none()).is_err());
        assert!(PageGeometry::new(f32::NAN, 100.0, Margins::none()).is_err());
    }

    #[test]
    fn landscape_swaps_dimensions_once() {
        let a4 = PageGeometry::from_paper(PaperSize::A4, Margins::uniform(20.0)).unwrap();
        let landscape = a4.oriented(Orientation::Landscape);
        assert_eq!((landscape.width(), landscape.height()), (842.0, 595.0));
        assert_eq!(landscape.oriented(Orientation::Landscape), landscape);
        assert_eq!(landscape.oriented(Orientation::Portrait), a4);
    }

    #[test]
    fn content_box_excludes_margins() {
        let geometry =
            PageGeometry::from_paper(PaperSize::A4, Margins::new(46.0, 46.0, 25.0, 25.0)).unwrap();
        assert_eq!(geometry.content_height(), 750.0);
        assert_eq!(geometry.content_width(), 545.0);
        assert_eq!(geometry.top(), 796.0);
    }

    #[test]
    fn cloned_handles_share_pixels() {
        let handle = RasterHandle::new(DynamicImage::new_rgb8(4, 2));
        let copy = handle.clone();
        assert!(handle.same_raster(&copy));
        assert_eq!((copy.pixel_width(), copy.pixel_height()), (4, 2));
        let other = RasterHandle::new(DynamicImage::new_rgb8(4, 2));
        assert!(!handle.same_raster(&other));
    }
}

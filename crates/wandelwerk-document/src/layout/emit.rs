// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content emitters — place one text line or one image through a `PageFlow`.

use super::flow::{PageFlow, Placement};
use super::geometry::{FitMode, fit_scale};
use super::page::{ContentBlock, PlacedItem, RasterHandle};

/// Default space left below an embedded image, in points.
pub const IMAGE_GAP: f32 = 10.0;

/// Spacing used by [`emit_block`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub line_height: f32,
    /// Images wider than this are scaled down to it.
    pub max_image_width: f32,
    pub image_gap: f32,
}

/// Remove embedded line breaks; one call must produce exactly one line.
pub fn sanitize_line(line: &str) -> String {
    line.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

/// Place a single line of text at the next free line slot.
pub fn emit_text_line(flow: &mut PageFlow, line: &str, line_height: f32) -> Placement {
    let placement = flow.reserve(line_height);
    let font_size = flow.font_size();
    flow.place(
        placement.page_index,
        PlacedItem::Text {
            line: sanitize_line(line),
            x: placement.x,
            y: placement.y,
            font_size,
        },
    );
    placement
}

/// Place an image at the next free slot, scaled down (never up) to
/// `max_width`, leaving [`IMAGE_GAP`] below it.
///
/// Returns `None` without touching the flow when the image has no pixels.
pub fn emit_image(flow: &mut PageFlow, image: &RasterHandle, max_width: f32) -> Option<Placement> {
    emit_image_with_gap(flow, image, max_width, IMAGE_GAP)
}

/// [`emit_image`] with an explicit gap below the image.
pub fn emit_image_with_gap(
    flow: &mut PageFlow,
    image: &RasterHandle,
    max_width: f32,
    gap: f32,
) -> Option<Placement> {
    let (w, h) = (image.pixel_width() as f32, image.pixel_height() as f32);
    // Only the width constrains; height is free to spill onto a new page.
    let scale = fit_scale(w, h, max_width, f32::MAX, FitMode::Contain)?;
    let (width, height) = (w * scale, h * scale);

    let placement = flow.reserve_with_gap(height, gap);
    flow.place(
        placement.page_index,
        PlacedItem::Image {
            raster: image.clone(),
            x: placement.x,
            y: placement.y,
            width,
            height,
        },
    );
    Some(placement)
}

/// Emit either kind of content block.
pub fn emit_block(flow: &mut PageFlow, block: &ContentBlock, style: &BlockStyle) -> Option<Placement> {
    match block {
        ContentBlock::TextLine(line) => Some(emit_text_line(flow, line, style.line_height)),
        ContentBlock::Image(raster) => {
            emit_image_with_gap(flow, raster, style.max_image_width, style.image_gap)
        }
    }
}

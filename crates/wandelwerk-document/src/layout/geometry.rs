// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fit-and-center math for placing a content rectangle inside available space.
//
// Rounding: point-space results are exact (offsets are plain halves). Pixel-
// space results truncate scaled sizes toward zero and floor offsets toward
// negative infinity; every pixel placement in the crate goes through
// `fit_px` and `center_offset_px`.

/// Whether a fit may enlarge content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Shrink to fit, never enlarge (scale capped at 1.0).
    Contain,
    /// Scale up or down to touch the available box.
    Fill,
}

/// Largest scale keeping `content` inside `avail` without cropping.
///
/// Returns `None` for degenerate input: a content or available dimension
/// that is zero, negative, or not finite.
pub fn fit_scale(
    content_w: f32,
    content_h: f32,
    avail_w: f32,
    avail_h: f32,
    mode: FitMode,
) -> Option<f32> {
    let positive = |v: f32| v.is_finite() && v > 0.0;
    if !(positive(content_w) && positive(content_h) && positive(avail_w) && positive(avail_h)) {
        return None;
    }
    let scale = (avail_w / content_w).min(avail_h / content_h);
    Some(match mode {
        FitMode::Contain => scale.min(1.0),
        FitMode::Fill => scale,
    })
}

/// Placed size of `content` fitted into `avail`. The result is clamped so
/// floating-point error can never push it past the available box.
pub fn fit_size(
    content_w: f32,
    content_h: f32,
    avail_w: f32,
    avail_h: f32,
    mode: FitMode,
) -> Option<(f32, f32)> {
    let scale = fit_scale(content_w, content_h, avail_w, avail_h, mode)?;
    Some(((content_w * scale).min(avail_w), (content_h * scale).min(avail_h)))
}

/// Offset that centers an `inner` box inside an `outer` box.
pub fn center_offset(outer_w: f32, outer_h: f32, inner_w: f32, inner_h: f32) -> (f32, f32) {
    ((outer_w - inner_w) / 2.0, (outer_h - inner_h) / 2.0)
}

/// Pixel size of `(w, h)` fitted into `(avail_w, avail_h)`, truncated to
/// whole pixels and never smaller than one pixel.
pub fn fit_px(w: u32, h: u32, avail_w: u32, avail_h: u32, mode: FitMode) -> Option<(u32, u32)> {
    let scale = fit_scale(w as f32, h as f32, avail_w as f32, avail_h as f32, mode)?;
    let scaled_w = ((w as f32 * scale) as u32).clamp(1, avail_w);
    let scaled_h = ((h as f32 * scale) as u32).clamp(1, avail_h);
    Some((scaled_w, scaled_h))
}

/// Pixel offset centering `inner` in `outer`, floored.
pub fn center_offset_px(outer_w: u32, outer_h: u32, inner_w: u32, inner_h: u32) -> (i64, i64) {
    let half = |outer: u32, inner: u32| (outer as i64 - inner as i64).div_euclid(2);
    (half(outer_w, inner_w), half(outer_h, inner_h))
}

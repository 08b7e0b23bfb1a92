// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — geometry, the page flow controller, content emitters, and
// the page sequence model shared by every converter.

pub mod emit;
pub mod flow;
pub mod geometry;
pub mod page;

pub use emit::{BlockStyle, emit_block, emit_image, emit_text_line};
pub use flow::{Cursor, FlowState, PageFlow, Placement};
pub use geometry::{FitMode, center_offset, fit_scale};
pub use page::{ContentBlock, Page, PageGeometry, PageSequence, PlacedItem, RasterHandle};

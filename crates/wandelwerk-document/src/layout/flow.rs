// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page flow controller — a top-to-bottom cursor over fixed-size pages that
// decides when the current page is exhausted and starts new pages on demand.
//
// One `PageFlow` is owned by exactly one conversion call. It is consumed by
// `finish`, which yields the finished `PageSequence`.

use tracing::debug;

use super::page::{Page, PageGeometry, PageSequence, PlacedItem};

/// Whether the current page has received any content yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Cursor sits at the top margin of a fresh page.
    AwaitingContent,
    /// At least one block has been reserved on the current page.
    Writing,
}

/// Current writing position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    /// Zero-based index of the page being written.
    pub page_index: usize,
    /// Distance from the page bottom to the top of the next block. Starts at
    /// `height - margin_top` and only decreases within a page.
    pub vertical_offset: f32,
}

/// Where a reserved block goes: its lower-left corner on `page_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
}

/// Paginating cursor over pages of one [`PageGeometry`].
#[derive(Debug)]
pub struct PageFlow {
    geometry: PageGeometry,
    cursor: Cursor,
    state: FlowState,
    /// Space left below every reserved block unless a call says otherwise.
    block_gap: f32,
    /// Font size recorded on text placed through this flow.
    font_size: f32,
    pages: Vec<Page>,
}

impl PageFlow {
    /// Start a document on a fresh first page.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            cursor: Cursor {
                page_index: 0,
                vertical_offset: geometry.top(),
            },
            state: FlowState::AwaitingContent,
            block_gap: 0.0,
            font_size: 12.0,
            pages: vec![Page::new(geometry.width(), geometry.height())],
        }
    }

    /// Set the default gap left below each reserved block.
    pub fn with_block_gap(mut self, gap: f32) -> Self {
        self.block_gap = gap;
        self
    }

    /// Set the font size recorded on placed text.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Pages started so far, including the current one.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Reserve `height` points using the default block gap.
    pub fn reserve(&mut self, height: f32) -> Placement {
        self.reserve_with_gap(height, self.block_gap)
    }

    /// Reserve `height` points, leaving `gap` points below the block.
    ///
    /// If the block does not fit above the bottom margin and the current page
    /// already holds content, a new page is started first. A block taller
    /// than a whole page is placed at the top of a fresh page regardless and
    /// may run past the bottom margin.
    pub fn reserve_with_gap(&mut self, height: f32, gap: f32) -> Placement {
        let height = height.max(0.0);
        let margin_bottom = self.geometry.margins().bottom;

        if self.cursor.vertical_offset - height < margin_bottom {
            if self.state == FlowState::Writing {
                self.start_page();
            }
            if height > self.geometry.content_height() {
                debug!(
                    height,
                    content_height = self.geometry.content_height(),
                    page = self.cursor.page_index,
                    "block taller than a page, placing on its own page"
                );
            }
        }

        let placement = Placement {
            page_index: self.cursor.page_index,
            x: self.geometry.margins().left,
            y: self.cursor.vertical_offset - height,
        };
        self.cursor.vertical_offset -= height + gap.max(0.0);
        self.state = FlowState::Writing;
        placement
    }

    /// Move the cursor down by `gap` points without placing anything. The
    /// next reservation decides whether a new page is needed.
    pub fn advance(&mut self, gap: f32) {
        self.cursor.vertical_offset -= gap.max(0.0);
    }

    /// Finish the current page and start a new one, unless the current page
    /// is still empty.
    pub fn break_page(&mut self) {
        if self.state == FlowState::Writing {
            self.start_page();
        }
    }

    /// Record an item on the page a placement refers to.
    pub fn place(&mut self, page_index: usize, item: PlacedItem) {
        // Placements always refer to the current page or an earlier one.
        let index = page_index.min(self.pages.len() - 1);
        self.pages[index].items.push(item);
    }

    /// Finalize the document.
    pub fn finish(self) -> PageSequence {
        debug!(pages = self.pages.len(), "page flow finished");
        PageSequence::new(self.pages)
    }

    fn start_page(&mut self) {
        self.pages
            .push(Page::new(self.geometry.width(), self.geometry.height()));
        self.cursor = Cursor {
            page_index: self.pages.len() - 1,
            vertical_offset: self.geometry.top(),
        };
        self.state = FlowState::AwaitingContent;
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office module — word-processor, slide-deck, and spreadsheet codecs.

pub mod docx;
pub mod package;
pub mod pptx;
pub mod xlsx;

pub use docx::{WordDocument, WordParagraph, WordRun, read_docx, write_docx};
pub use pptx::{Slide, SlideDeck, SlidePicture, read_pptx, write_pptx};
pub use xlsx::{Sheet, read_workbook, write_xlsx};

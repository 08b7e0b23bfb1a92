// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-PDF merge — sequential concatenation of pages in input order.

use tracing::{info, instrument};
use wandelwerk_core::FormatClass;
use wandelwerk_core::error::{Result, WandelwerkError};

use super::{ConvertedDocument, SourceDocument};
use crate::pdf::merge_pdfs;

/// Merge PDFs into one document: every page of the first input, then every
/// page of the second, and so on. Inputs must all be PDFs.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn merge_documents(inputs: &[SourceDocument]) -> Result<ConvertedDocument> {
    if let Some(other) = inputs
        .iter()
        .find(|input| !FormatClass::Pdf.matches(&input.extension))
    {
        return Err(WandelwerkError::InvalidInput(format!(
            "only PDFs can be merged, got .{}",
            other.extension
        )));
    }

    let parts: Vec<&[u8]> = inputs.iter().map(|input| input.bytes.as_slice()).collect();
    let bytes = merge_pdfs(&parts)?;
    info!(output_len = bytes.len(), "PDFs merged");
    Ok(ConvertedDocument::new(bytes, "pdf"))
}

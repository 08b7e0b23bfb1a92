// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain text to PDF — one placed line per input line, spilling onto new
// pages through the page flow.

use tracing::{debug, instrument};
use wandelwerk_core::ConversionConfig;
use wandelwerk_core::config::TextLayout;
use wandelwerk_core::error::Result;

use super::{ConvertedDocument, Converter, SourceDocument, ext_in};
use crate::layout::{PageFlow, PageGeometry, PageSequence, emit_text_line};
use crate::pdf::write_pdf;

const TAB_WIDTH: usize = 4;

pub struct TextToPdf {
    layout: TextLayout,
}

impl TextToPdf {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            layout: config.text.clone(),
        }
    }
}

impl Converter for TextToPdf {
    fn name(&self) -> &'static str {
        "text-to-pdf"
    }

    fn pairs(&self) -> &'static str {
        "txt -> pdf"
    }

    fn supports(&self, source: &str, target: &str) -> bool {
        ext_in(source, &["txt"]) && ext_in(target, &["pdf"])
    }

    #[instrument(skip(self, source), fields(bytes_len = source.bytes.len()))]
    fn convert(&self, source: &SourceDocument, target: &str) -> Result<ConvertedDocument> {
        let text = String::from_utf8_lossy(&source.bytes);
        let sequence = paginate_text(&text, &self.layout)?;
        let bytes = write_pdf(&sequence, "Converted Text")?;
        Ok(ConvertedDocument::new(bytes, target))
    }
}

/// Lay out `text` one line per slot. Empty input yields one blank page.
pub fn paginate_text(text: &str, layout: &TextLayout) -> Result<PageSequence> {
    let geometry = PageGeometry::from_paper(layout.paper_size, layout.margins)?;
    let mut flow = PageFlow::new(geometry).with_font_size(layout.font_size);

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = 0usize;
    for raw in text.lines() {
        let expanded = raw.replace('\t', &" ".repeat(TAB_WIDTH));
        match layout.wrap_columns {
            Some(columns) if columns > 0 => {
                for line in wrap_line(&expanded, columns) {
                    emit_text_line(&mut flow, &line, layout.line_height);
                    lines += 1;
                }
            }
            _ => {
                emit_text_line(&mut flow, &expanded, layout.line_height);
                lines += 1;
            }
        }
    }

    debug!(lines, pages = flow.page_count(), "text paginated");
    Ok(flow.finish())
}

/// Greedy word wrap at `max_chars` characters. Words longer than a line are
/// split; runs of whitespace collapse to one space. A blank line stays one
/// blank line.
pub fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        if current_len > 0 && current_len + 1 + chars.len() <= max_chars {
            current.push(' ');
            current.extend(&chars);
            current_len += 1 + chars.len();
            continue;
        }
        if current_len > 0 {
            wrapped.push(std::mem::take(&mut current));
            current_len = 0;
        }
        while chars.len() > max_chars {
            let rest = chars.split_off(max_chars);
            wrapped.push(chars.into_iter().collect());
            chars = rest;
        }
        current_len = chars.len();
        current.extend(chars);
    }

    if current_len > 0 || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfReader;

    fn numbered_lines(count: usize) -> String {
        (1..=count).map(|n| format!("line {n}\n")).collect()
    }

    #[test]
    fn fifty_lines_fill_one_page() {
        let layout = TextLayout::default();
        let pages = paginate_text(&numbered_lines(50), &layout).unwrap();
        assert_eq!(pages.len(), 1);

        let pages = paginate_text(&numbered_lines(51), &layout).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages.pages()[1].text_lines().collect::<Vec<_>>(), vec!["line 51"]);
    }

    #[test]
    fn long_input_continues_across_pages() {
        let pages = paginate_text(&numbered_lines(120), &TextLayout::default()).unwrap();
        let counts: Vec<usize> = pages.pages().iter().map(|p| p.text_lines().count()).collect();
        assert_eq!(counts, vec![50, 50, 20]);
        assert_eq!(pages.pages()[2].text_lines().last(), Some("line 120"));
    }

    #[test]
    fn empty_input_gives_one_blank_page() {
        let pages = paginate_text("", &TextLayout::default()).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages.pages()[0].is_empty());
    }

    #[test]
    fn crlf_and_tabs_are_normalised() {
        let pages = paginate_text("\u{feff}a\tb\r\nc", &TextLayout::default()).unwrap();
        let lines: Vec<_> = pages.pages()[0].text_lines().collect();
        assert_eq!(lines, vec!["a    b", "c"]);
    }

    #[test]
    fn wrap_columns_split_long_lines() {
        let layout = TextLayout {
            wrap_columns: Some(10),
            ..TextLayout::default()
        };
        let pages = paginate_text("the quick brown fox jumps", &layout).unwrap();
        let lines: Vec<_> = pages.pages()[0].text_lines().collect();
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn wrap_splits_oversized_words_on_char_boundaries() {
        assert_eq!(wrap_line("ééééé", 2), vec!["éé", "éé", "é"]);
        assert_eq!(wrap_line("", 5), vec![""]);
        assert_eq!(wrap_line("ab cdefgh", 3), vec!["ab", "cde", "fgh"]);
    }

    #[test]
    fn converted_text_is_extractable() {
        let converter = TextToPdf::new(&ConversionConfig::default());
        let out = converter
            .convert(&SourceDocument::new(b"Hello PDF".to_vec(), "txt"), "pdf")
            .unwrap();
        assert_eq!(out.media_type, "application/pdf");
        let reader = PdfReader::from_bytes(&out.bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert!(reader.extract_text().unwrap().contains("Hello"));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word documents (.docx) — paragraph/run reader and a picture-oriented
// writer.
//
// The reader walks `word/document.xml` and keeps only what the layout engine
// needs: run text (with tabs and breaks) and the bytes of embedded pictures,
// resolved through the document's relationship part. Styling is dropped.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};

use super::package::{PackageReader, PackageWriter, pt_to_emu, relationship_attribute, xml_escape};
use crate::image::processor::encode_for_embedding;
use crate::layout::{PageSequence, PlacedItem, RasterHandle};

const DOCUMENT_PART: &str = "word/document.xml";

/// A text run and the pictures anchored in it, in document order.
#[derive(Debug, Default, Clone)]
pub struct WordRun {
    /// Run text. Tabs are kept as `\t`, line breaks as `\n`.
    pub text: String,
    /// Encoded picture data (PNG, JPEG, ...) referenced by the run.
    pub pictures: Vec<Vec<u8>>,
}

#[derive(Debug, Default, Clone)]
pub struct WordParagraph {
    pub runs: Vec<WordRun>,
}

impl WordParagraph {
    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Body content of a word-processor document.
#[derive(Debug, Default, Clone)]
pub struct WordDocument {
    pub paragraphs: Vec<WordParagraph>,
}

/// Parse a .docx package.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn read_docx(bytes: &[u8]) -> Result<WordDocument> {
    let mut package = PackageReader::open(bytes, "docx")?;
    let xml = package.require_string(DOCUMENT_PART)?;
    let rels = package.relationships(DOCUMENT_PART)?;

    let mut reader = Reader::from_str(&xml);
    let mut buf = Vec::new();

    let mut document = WordDocument::default();
    let mut paragraph = WordParagraph::default();
    let mut run = WordRun::default();
    // Depth counters: text boxes nest paragraphs inside runs.
    let mut paragraph_depth = 0usize;
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| WandelwerkError::decode("docx", format!("{DOCUMENT_PART}: {err}")))?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        paragraph = WordParagraph::default();
                    }
                }
                b"r" => {
                    run_depth += 1;
                    if run_depth == 1 {
                        run = WordRun::default();
                    }
                }
                b"t" => in_text = run_depth > 0,
                b"tab" if run_depth > 0 => run.text.push('\t'),
                b"br" | b"cr" if run_depth > 0 => run.text.push('\n'),
                b"blip" | b"imagedata" => attach_picture(&mut package, &rels, e, &mut run),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"p" if paragraph_depth == 0 => document.paragraphs.push(WordParagraph::default()),
                b"tab" if run_depth > 0 => run.text.push('\t'),
                b"br" | b"cr" if run_depth > 0 => run.text.push('\n'),
                b"blip" | b"imagedata" => attach_picture(&mut package, &rels, e, &mut run),
                _ => {}
            },
            Event::Text(ref t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|err| WandelwerkError::decode("docx", err))?;
                run.text.push_str(&text);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => {
                    run_depth = run_depth.saturating_sub(1);
                    if run_depth == 0 && (!run.text.is_empty() || !run.pictures.is_empty()) {
                        paragraph.runs.push(std::mem::take(&mut run));
                    }
                }
                b"p" => {
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                    if paragraph_depth == 0 {
                        document.paragraphs.push(std::mem::take(&mut paragraph));
                    } else if run_depth > 0 {
                        // Paragraph inside a text box: keep its text on its own line.
                        run.text.push('\n');
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(paragraphs = document.paragraphs.len(), "docx parsed");
    Ok(document)
}

/// Resolve a picture reference and add its bytes to the current run.
/// Unresolvable references are skipped.
fn attach_picture(
    package: &mut PackageReader<'_>,
    rels: &std::collections::HashMap<String, String>,
    element: &quick_xml::events::BytesStart<'_>,
    run: &mut WordRun,
) {
    let Some(rel_id) = relationship_attribute(element, "embed")
        .or_else(|| relationship_attribute(element, "id")) else {
        return;
    };
    let Some(part) = rels.get(&rel_id) else {
        warn!(%rel_id, "picture relationship not found, skipping");
        return;
    };
    match package.read_bytes(part) {
        Ok(Some(data)) => run.pictures.push(data),
        Ok(None) => warn!(%part, "picture part missing, skipping"),
        Err(err) => warn!(%part, %err, "picture part unreadable, skipping"),
    }
}

// -- Writer -------------------------------------------------------------------

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>"#;

/// A4 with half-inch margins, in twentieths of a point.
const SECTION_PROPERTIES: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="720" w:right="720" w:bottom="720" w:left="720" w:header="0" w:footer="0" w:gutter="0"/></w:sectPr>"#;

const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

/// Write a page sequence as a .docx: every placed image becomes a centered
/// picture paragraph at its placed size, every text line a plain paragraph,
/// and pages are separated by hard page breaks.
#[instrument(skip(sequence), fields(pages = sequence.len()))]
pub fn write_docx(sequence: &PageSequence, jpeg_quality: u8) -> Result<Vec<u8>> {
    let mut media: Vec<(RasterHandle, String)> = Vec::new();
    let mut package = PackageWriter::new("docx");
    let mut body = String::from(DOCUMENT_OPEN);
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );

    for (index, page) in sequence.pages().iter().enumerate() {
        if index > 0 {
            body.push_str(PAGE_BREAK);
        }
        for item in &page.items {
            match item {
                PlacedItem::Text { line, .. } => {
                    let _ = write!(
                        body,
                        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                        xml_escape(line)
                    );
                }
                PlacedItem::Image {
                    raster,
                    width,
                    height,
                    ..
                } => {
                    let position = match media.iter().position(|(known, _)| known.same_raster(raster)) {
                        Some(position) => position,
                        None => {
                            let (data, ext) = encode_for_embedding(raster.image(), jpeg_quality)?;
                            let name = format!("image{}.{ext}", media.len() + 1);
                            package.add(&format!("word/media/{name}"), &data)?;
                            let _ = write!(
                                rels,
                                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{name}"/>"#,
                                media.len() + 1
                            );
                            media.push((raster.clone(), name));
                            media.len() - 1
                        }
                    };
                    push_picture(&mut body, position + 1, &media[position].1, *width, *height);
                }
            }
        }
    }

    body.push_str(SECTION_PROPERTIES);
    body.push_str("</w:body></w:document>");
    rels.push_str("</Relationships>");

    package.add("[Content_Types].xml", CONTENT_TYPES.as_bytes())?;
    package.add("_rels/.rels", ROOT_RELS.as_bytes())?;
    package.add(DOCUMENT_PART, body.as_bytes())?;
    package.add("word/_rels/document.xml.rels", rels.as_bytes())?;

    debug!(media = media.len(), "docx assembled");
    package.finish()
}

fn push_picture(body: &mut String, id: usize, name: &str, width: f32, height: f32) {
    let (cx, cy) = (pt_to_emu(width), pt_to_emu(height));
    let _ = write!(
        body,
        concat!(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="rId{id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        name = xml_escape(name),
    );
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A .docx whose paragraphs are given as runs; a run of `None` is a
    /// picture run embedding `picture`.
    pub fn docx(paragraphs: &[&[Option<&str>]], picture: &[u8]) -> Vec<u8> {
        let mut body = String::from(DOCUMENT_OPEN);
        for runs in paragraphs {
            body.push_str("<w:p>");
            for run in *runs {
                match run {
                    Some(text) => {
                        let _ = write!(
                            body,
                            r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                            xml_escape(text)
                        );
                    }
                    None => body.push_str(
                        r#"<w:r><w:drawing><wp:inline><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="rId1"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
                    ),
                }
            }
            body.push_str("</w:p>");
        }
        body.push_str("</w:body></w:document>");

        let mut package = PackageWriter::new("docx");
        package.add("[Content_Types].xml", CONTENT_TYPES.as_bytes()).unwrap();
        package.add("_rels/.rels", ROOT_RELS.as_bytes()).unwrap();
        package.add(DOCUMENT_PART, body.as_bytes()).unwrap();
        package
            .add(
                "word/_rels/document.xml.rels",
                br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/></Relationships>"#,
            )
            .unwrap();
        package.add("word/media/image1.png", picture).unwrap();
        package.finish().unwrap()
    }
}

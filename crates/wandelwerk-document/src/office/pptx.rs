// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Slide decks (.pptx) — reader, picture-compositing slide renderer, and a
// writer producing one slide per laid-out page.

use std::fmt::Write as _;
use std::sync::OnceLock;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use tracing::{debug, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};

use super::package::{
    PackageReader, PackageWriter, attribute, emu_to_pt, pt_to_emu, relationship_attribute,
    xml_escape,
};
use crate::image::processor::encode_for_embedding;
use crate::layout::{Page, PageSequence, PlacedItem, RasterHandle};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Largest coordinate or extent DrawingML allows, in EMU.
const MAX_EMU: i64 = 51_206_400;

/// Slide size used when a deck does not declare one (4:3, in points).
pub const DEFAULT_SLIDE_SIZE: (f32, f32) = (720.0, 540.0);

static SLIDE_PART_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn slide_part_regex() -> Option<&'static Regex> {
    SLIDE_PART_REGEX
        .get_or_init(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").ok())
        .as_ref()
}

/// A picture shape, positioned in points from the slide's top-left corner.
#[derive(Debug, Clone)]
pub struct SlidePicture {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Slide {
    pub pictures: Vec<SlidePicture>,
}

/// A parsed presentation.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    /// Slide width and height in points.
    pub size: (f32, f32),
    pub slides: Vec<Slide>,
}

impl Slide {
    /// Paint the slide onto a white `width_px` x `height_px` canvas. Pictures
    /// are composited in document order; any that fail to decode are
    /// skipped. Text shapes are not rasterized.
    pub fn render(&self, slide_size: (f32, f32), width_px: u32, height_px: u32) -> DynamicImage {
        let mut canvas = RgbaImage::from_pixel(width_px, height_px, Rgba([255, 255, 255, 255]));
        let sx = width_px as f32 / slide_size.0;
        let sy = height_px as f32 / slide_size.1;

        for (index, picture) in self.pictures.iter().enumerate() {
            let decoded = match image::load_from_memory(&picture.data) {
                Ok(decoded) => decoded,
                Err(err) => {
                    warn!(index, %err, "slide picture failed to decode, skipping");
                    continue;
                }
            };
            let w = ((picture.width * sx).round() as u32).min(width_px);
            let h = ((picture.height * sy).round() as u32).min(height_px);
            if w == 0 || h == 0 {
                continue;
            }
            let scaled = decoded.resize_exact(w, h, FilterType::Triangle).to_rgba8();
            let x = (picture.x * sx).round() as i64;
            let y = (picture.y * sy).round() as i64;
            imageops::overlay(&mut canvas, &scaled, x, y);
        }
        DynamicImage::ImageRgba8(canvas)
    }
}

/// Parse a .pptx package.
#[instrument(skip(bytes), fields(bytes_len = bytes.len()))]
pub fn read_pptx(bytes: &[u8]) -> Result<SlideDeck> {
    let mut package = PackageReader::open(bytes, "pptx")?;
    let presentation = package.require_string(PRESENTATION_PART)?;
    let (size, slide_rel_ids) = parse_presentation(&presentation)?;

    let rels = package.relationships(PRESENTATION_PART)?;
    let mut slide_parts: Vec<String> = slide_rel_ids
        .iter()
        .filter_map(|id| rels.get(id).cloned())
        .collect();
    if slide_parts.is_empty() {
        slide_parts = numbered_slide_parts(&package.part_names());
    }

    let mut slides = Vec::with_capacity(slide_parts.len());
    for part in &slide_parts {
        slides.push(read_slide(&mut package, part)?);
    }

    debug!(slides = slides.len(), width = size.0, height = size.1, "pptx parsed");
    Ok(SlideDeck { size, slides })
}

/// Slide size and the relationship ids of the slides in presentation order.
fn parse_presentation(xml: &str) -> Result<((f32, f32), Vec<String>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut size = DEFAULT_SLIDE_SIZE;
    let mut ids = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"sldSz" => {
                    if let (Some(cx), Some(cy)) = (emu_attribute(e, "cx"), emu_attribute(e, "cy"))
                        && cx > 0
                        && cy > 0
                    {
                        if cx > MAX_EMU || cy > MAX_EMU {
                            return Err(WandelwerkError::decode(
                                "pptx",
                                format!("slide size {cx}x{cy} EMU exceeds {MAX_EMU}"),
                            ));
                        }
                        size = (emu_to_pt(cx), emu_to_pt(cy));
                    }
                }
                b"sldId" => ids.extend(relationship_attribute(e, "id")),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(WandelwerkError::decode("pptx", format!("{PRESENTATION_PART}: {err}")));
            }
            _ => {}
        }
        buf.clear();
    }
    Ok((size, ids))
}

/// `ppt/slides/slideN.xml` parts sorted by N.
fn numbered_slide_parts(names: &[String]) -> Vec<String> {
    let Some(pattern) = slide_part_regex() else {
        return Vec::new();
    };
    let mut numbered: Vec<(u32, &String)> = names
        .iter()
        .filter_map(|name| {
            let number = pattern.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name))
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);
    numbered.into_iter().map(|(_, name)| name.clone()).collect()
}

fn emu_attribute(e: &BytesStart, name: &str) -> Option<i64> {
    attribute(e, name)?.parse().ok()
}

#[derive(Default)]
struct PictureShape {
    embed: Option<String>,
    offset: Option<(i64, i64)>,
    extent: Option<(i64, i64)>,
}

fn read_slide(package: &mut PackageReader<'_>, part: &str) -> Result<Slide> {
    let xml = package.require_string(part)?;
    let rels = package.relationships(part)?;

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut shapes = Vec::new();
    let mut current: Option<PictureShape> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match (e.local_name().as_ref(), current.as_mut()) {
                    (b"pic", None) => current = Some(PictureShape::default()),
                    (b"blip", Some(shape)) => shape.embed = relationship_attribute(e, "embed"),
                    (b"off", Some(shape)) if shape.offset.is_none() => {
                        shape.offset = emu_attribute(e, "x").zip(emu_attribute(e, "y"));
                    }
                    // `a:ext` also names extension-list entries; only the
                    // transform's carries cx/cy.
                    (b"ext", Some(shape)) if shape.extent.is_none() => {
                        shape.extent = emu_attribute(e, "cx").zip(emu_attribute(e, "cy"));
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"pic" => {
                shapes.extend(current.take());
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(WandelwerkError::decode("pptx", format!("{part}: {err}"))),
            _ => {}
        }
        buf.clear();
    }

    let mut slide = Slide::default();
    for shape in shapes {
        let (Some(embed), Some((cx, cy))) = (shape.embed, shape.extent) else {
            continue;
        };
        let (x, y) = shape.offset.unwrap_or((0, 0));
        if [cx, cy, x.abs(), y.abs()].iter().any(|&v| v > MAX_EMU) {
            warn!(part, %embed, cx, cy, "picture geometry out of range, skipping");
            continue;
        }
        let Some(target) = rels.get(&embed) else {
            warn!(part, %embed, "picture relationship not found, skipping");
            continue;
        };
        match package.read_bytes(target) {
            Ok(Some(data)) => slide.pictures.push(SlidePicture {
                x: emu_to_pt(x),
                y: emu_to_pt(y),
                width: emu_to_pt(cx),
                height: emu_to_pt(cy),
                data,
            }),
            Ok(None) => warn!(%target, "picture part missing, skipping"),
            Err(err) => warn!(%target, %err, "picture part unreadable, skipping"),
        }
    }
    Ok(slide)
}

// -- Writer -------------------------------------------------------------------

const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const EMPTY_TREE_HEADER: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Wandelwerk"><a:themeElements><a:clrScheme name="Wandelwerk"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F1F1F"/></a:dk2><a:lt2><a:srgbClr val="EEEEEE"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Wandelwerk"><a:majorFont><a:latin typeface="Helvetica"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Helvetica"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Wandelwerk"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

/// Write a page sequence as a .pptx with one slide per page. Placed images
/// become picture shapes and placed text becomes text boxes, at their laid-
/// out positions. The deck's slide size is the first page's size.
#[instrument(skip(sequence), fields(pages = sequence.len()))]
pub fn write_pptx(sequence: &PageSequence, jpeg_quality: u8) -> Result<Vec<u8>> {
    let (width, height) = sequence
        .pages()
        .first()
        .map(|page| (page.width, page.height))
        .unwrap_or(DEFAULT_SLIDE_SIZE);
    let slide_count = sequence.len();

    let mut package = PackageWriter::new("pptx");
    package.add("[Content_Types].xml", content_types(slide_count).as_bytes())?;
    package.add(
        "_rels/.rels",
        relationships(&[(
            "officeDocument",
            "ppt/presentation.xml".to_string(),
        )])
        .as_bytes(),
    )?;
    package.add(PRESENTATION_PART, presentation(slide_count, width, height).as_bytes())?;

    let mut presentation_rels = vec![("slideMaster", "slideMasters/slideMaster1.xml".to_string())];
    presentation_rels.extend((1..=slide_count).map(|n| ("slide", format!("slides/slide{n}.xml"))));
    presentation_rels.push(("theme", "theme/theme1.xml".to_string()));
    package.add(
        "ppt/_rels/presentation.xml.rels",
        relationships(&presentation_rels).as_bytes(),
    )?;

    package.add("ppt/slideMasters/slideMaster1.xml", slide_master().as_bytes())?;
    package.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships(&[
            ("slideLayout", "../slideLayouts/slideLayout1.xml".to_string()),
            ("theme", "../theme/theme1.xml".to_string()),
        ])
        .as_bytes(),
    )?;
    package.add("ppt/slideLayouts/slideLayout1.xml", slide_layout().as_bytes())?;
    package.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships(&[("slideMaster", "../slideMasters/slideMaster1.xml".to_string())]).as_bytes(),
    )?;
    package.add("ppt/theme/theme1.xml", THEME.as_bytes())?;

    let mut media: Vec<(RasterHandle, String)> = Vec::new();
    for (index, page) in sequence.pages().iter().enumerate() {
        let number = index + 1;
        let (xml, rels) = slide_xml(page, &mut media, &mut package, jpeg_quality)?;
        package.add(&format!("ppt/slides/slide{number}.xml"), xml.as_bytes())?;
        package.add(
            &format!("ppt/slides/_rels/slide{number}.xml.rels"),
            relationships(&rels).as_bytes(),
        )?;
    }

    debug!(slides = slide_count, media = media.len(), "pptx assembled");
    package.finish()
}

/// Slide XML and its relationships (layout first, then pictures).
fn slide_xml(
    page: &Page,
    media: &mut Vec<(RasterHandle, String)>,
    package: &mut PackageWriter,
    jpeg_quality: u8,
) -> Result<(String, Vec<(&'static str, String)>)> {
    let mut rels = vec![("slideLayout", "../slideLayouts/slideLayout1.xml".to_string())];
    let mut shapes = String::new();
    // Shape ids start after the group shape's id 1.
    let mut shape_id = 2usize;

    for item in &page.items {
        match item {
            PlacedItem::Image {
                raster,
                x,
                y,
                width,
                height,
            } => {
                let name = match media.iter().find(|(known, _)| known.same_raster(raster)) {
                    Some((_, name)) => name.clone(),
                    None => {
                        let (data, ext) = encode_for_embedding(raster.image(), jpeg_quality)?;
                        let name = format!("image{}.{ext}", media.len() + 1);
                        package.add(&format!("ppt/media/{name}"), &data)?;
                        media.push((raster.clone(), name.clone()));
                        name
                    }
                };
                rels.push(("image", format!("../media/{name}")));
                let top = page.height - y - height;
                let _ = write!(
                    shapes,
                    concat!(
                        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
                        r#"<p:blipFill><a:blip r:embed="rId{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                        r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
                    ),
                    id = shape_id,
                    rel = rels.len(),
                    x = pt_to_emu(*x),
                    y = pt_to_emu(top),
                    cx = pt_to_emu(*width),
                    cy = pt_to_emu(*height),
                );
            }
            PlacedItem::Text {
                line,
                x,
                y,
                font_size,
            } => {
                let box_height = font_size * 1.2;
                let top = page.height - y - box_height;
                let _ = write!(
                    shapes,
                    concat!(
                        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                        r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
                        r#"<p:txBody><a:bodyPr wrap="none" lIns="0" tIns="0" rIns="0" bIns="0"/><a:lstStyle/>"#,
                        r#"<a:p><a:r><a:rPr lang="en-US" sz="{sz}"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                    ),
                    id = shape_id,
                    x = pt_to_emu(*x),
                    y = pt_to_emu(top.max(0.0)),
                    cx = pt_to_emu((page.width - x).max(1.0)),
                    cy = pt_to_emu(box_height),
                    sz = (font_size * 100.0).round() as i64,
                    text = xml_escape(line),
                );
            }
        }
        shape_id += 1;
    }

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NAMESPACES}><p:cSld><p:spTree>{EMPTY_TREE_HEADER}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    );
    Ok((xml, rels))
}

fn content_types(slide_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
    );
    for n in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

/// A relationships part; ids are `rId1..` in the given order.
fn relationships(entries: &[(&str, String)]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (index, (kind, target)) in entries.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<Relationship Id="rId{}" Type="{REL_NS}/{kind}" Target="{}"/>"#,
            index + 1,
            xml_escape(target)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn presentation(slide_count: usize, width: f32, height: f32) -> String {
    let mut ids = String::new();
    for n in 1..=slide_count {
        // rId1 is the master; slide ids start at 256.
        let _ = write!(ids, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1);
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NAMESPACES}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        pt_to_emu(width),
        pt_to_emu(height)
    )
}

fn slide_master() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {NAMESPACES}><p:cSld><p:spTree>{EMPTY_TREE_HEADER}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn slide_layout() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {NAMESPACES} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{EMPTY_TREE_HEADER}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

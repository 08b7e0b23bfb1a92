// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OOXML package plumbing — reading parts out of, and writing parts into, the
// ZIP containers behind .docx, .pptx and .xlsx files.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use wandelwerk_core::error::{Result, WandelwerkError};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Read access to the parts of an OOXML package.
pub struct PackageReader<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    format: &'static str,
}

impl<'a> PackageReader<'a> {
    /// Open a package; `format` names the file type for error messages.
    pub fn open(bytes: &'a [u8], format: &'static str) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|err| WandelwerkError::decode(format, format!("not a valid package: {err}")))?;
        Ok(Self { archive, format })
    }

    /// Names of every part in the package.
    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_owned).collect()
    }

    /// Raw bytes of a part, or `None` if the package has no such part.
    pub fn read_bytes(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(WandelwerkError::decode(self.format, format!("{name}: {err}"))),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|err| WandelwerkError::decode(self.format, format!("{name}: {err}")))?;
        Ok(Some(data))
    }

    /// A part decoded as UTF-8 text.
    pub fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        let format = self.format;
        self.read_bytes(name)?
            .map(|data| {
                String::from_utf8(data)
                    .map_err(|err| WandelwerkError::decode(format, format!("{name}: {err}")))
            })
            .transpose()
    }

    /// A part that must exist.
    pub fn require_string(&mut self, name: &str) -> Result<String> {
        self.read_string(name)?.ok_or_else(|| {
            WandelwerkError::decode(self.format, format!("package has no {name} part"))
        })
    }

    /// Relationship targets of `part`, keyed by relationship id, resolved to
    /// absolute part names. Missing relationship parts yield an empty map.
    pub fn relationships(&mut self, part: &str) -> Result<HashMap<String, String>> {
        let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
        let rels_name = if dir.is_empty() {
            format!("_rels/{file}.rels")
        } else {
            format!("{dir}/_rels/{file}.rels")
        };
        let Some(xml) = self.read_string(&rels_name)? else {
            return Ok(HashMap::new());
        };

        let mut reader = Reader::from_str(&xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        let mut targets = HashMap::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let external = attribute(e, "TargetMode").as_deref() == Some("External");
                    if let (Some(id), Some(target), false) =
                        (attribute(e, "Id"), attribute(e, "Target"), external)
                    {
                        targets.insert(id, resolve_part(dir, &target));
                    }
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    return Err(WandelwerkError::decode(self.format, format!("{rels_name}: {err}")));
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(targets)
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Value of an attribute by local name, ignoring namespace prefixes.
pub fn attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == name.as_bytes())
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Value of a prefixed relationship attribute such as `r:id` or `r:embed`.
/// Unprefixed attributes with the same local name (a shape's plain `id`)
/// are ignored.
pub fn relationship_attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| {
            attr.key.prefix().is_some() && attr.key.local_name().as_ref() == name.as_bytes()
        })
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Builds a new OOXML package in memory.
pub struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    format: &'static str,
}

impl PackageWriter {
    pub fn new(format: &'static str) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            format,
        }
    }

    /// Add a part with the given content.
    pub fn add(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .start_file(name, options)
            .map_err(|err| WandelwerkError::encode(self.format, format!("{name}: {err}")))?;
        self.zip
            .write_all(data)
            .map_err(|err| WandelwerkError::encode(self.format, format!("{name}: {err}")))?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let format = self.format;
        let cursor = self
            .zip
            .finish()
            .map_err(|err| WandelwerkError::encode(format, err))?;
        Ok(cursor.into_inner())
    }
}

/// Escape text for element content or attribute values.
pub fn xml_escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

/// English Metric Units per point.
pub const EMU_PER_PT: i64 = 12_700;

pub fn pt_to_emu(points: f32) -> i64 {
    (points as f64 * EMU_PER_PT as f64).round() as i64
}

pub fn emu_to_pt(emu: i64) -> f32 {
    (emu as f64 / EMU_PER_PT as f64) as f32
}

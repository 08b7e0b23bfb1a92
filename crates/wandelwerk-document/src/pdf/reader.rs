// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — load, inspect, extract text from, and merge existing PDF
// documents using the `lopdf` crate.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument, warn};
use wandelwerk_core::error::{Result, WandelwerkError};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Fallback page size when no MediaBox can be found (US Letter).
const DEFAULT_MEDIA_BOX: (f32, f32) = (612.0, 792.0);

/// Reads existing PDF documents.
///
/// Wraps `lopdf::Document` and provides the operations converters need:
/// page counts and sizes, per-page text, and merging.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF from raw bytes.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| WandelwerkError::decode("pdf", err))?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page sizes in points, in page order, honouring inherited MediaBoxes.
    pub fn page_sizes(&self) -> Vec<(f32, f32)> {
        self.document
            .get_pages()
            .values()
            .map(|page_id| self.page_size(*page_id))
            .collect()
    }

    fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
        let media_box = inherited_attribute(&self.document, page_id, b"MediaBox")
            .and_then(|obj| resolve(&self.document, obj).as_array().ok())
            .and_then(|values| {
                let nums: Vec<f32> = values
                    .iter()
                    .filter_map(|v| resolve(&self.document, v).as_float().ok())
                    .collect();
                (nums.len() == 4).then(|| ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()))
            });
        media_box.unwrap_or_else(|| {
            warn!(?page_id, "page has no usable MediaBox, assuming Letter");
            DEFAULT_MEDIA_BOX
        })
    }

    // -- Extraction -----------------------------------------------------------

    /// Text of one page (1-indexed), as lopdf decodes it from the content
    /// stream. Text objects are separated by newlines.
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.document
            .extract_text(&[page_number])
            .map_err(|err| WandelwerkError::decode("pdf", format!("page {page_number}: {err}")))
    }

    /// Text of every page, concatenated in page order.
    #[instrument(skip(self))]
    pub fn extract_text(&self) -> Result<String> {
        let mut text = String::new();
        for page_number in self.document.get_pages().keys() {
            let page = self.page_text(*page_number)?;
            text.push_str(&page);
            if !page.ends_with('\n') {
                text.push('\n');
            }
        }
        debug!(chars = text.len(), "text extracted");
        Ok(text)
    }

    // -- Merging --------------------------------------------------------------

    /// Merge this document with further PDFs, producing a combined PDF.
    /// Pages appear in the order: self, then each supplied document in order,
    /// each document's pages in their original order.
    #[instrument(skip_all, fields(additional_count = others.len()))]
    pub fn merge(&self, others: &[PdfReader]) -> Result<Vec<u8>> {
        info!(
            base_pages = self.page_count(),
            additional_documents = others.len(),
            "Merging PDFs"
        );

        let mut merged = self.document.clone();
        let pages_root = page_tree_root(&merged)?;

        for (index, other) in others.iter().enumerate() {
            // Object ids are per source document, so the memo is too.
            let mut memo = HashMap::new();
            for page_id in other.document.get_pages().into_values() {
                clone_page_into(&other.document, &mut merged, pages_root, page_id, &mut memo)?;
            }
            debug!(
                document = index + 1,
                pages = other.page_count(),
                "document appended"
            );
        }

        let mut output = Vec::new();
        merged
            .save_to(&mut output)
            .map_err(|err| WandelwerkError::encode("pdf", err))?;

        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }
}

/// Follow a single level of indirection.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Look up `key` on a page, walking up /Parent links for inheritable keys.
fn inherited_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Bounded walk; malformed files can contain /Parent cycles.
    for _ in 0..64 {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = match node.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Object id of the root /Pages node.
fn page_tree_root(doc: &Document) -> Result<ObjectId> {
    let catalog = doc
        .catalog()
        .map_err(|err| WandelwerkError::decode("pdf", format!("no catalog: {err}")))?;
    match catalog.get(b"Pages") {
        Ok(Object::Reference(id)) => Ok(*id),
        Ok(_) => Err(WandelwerkError::decode("pdf", "/Pages is not a reference")),
        Err(err) => Err(WandelwerkError::decode("pdf", format!("no /Pages: {err}"))),
    }
}

/// Clone one page (and everything it references) from `source` into
/// `target`, appending it as the last kid of `pages_root`.
fn clone_page_into(
    source: &Document,
    target: &mut Document,
    pages_root: ObjectId,
    page_id: ObjectId,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Result<()> {
    let page = source
        .get_dictionary(page_id)
        .map_err(|err| WandelwerkError::decode("pdf", format!("page {page_id:?}: {err}")))?;

    // Materialise inherited attributes on the page itself; the source page
    // tree is not carried over.
    let mut flattened = page.clone();
    for key in INHERITABLE {
        if !flattened.has(key)
            && let Some(value) = inherited_attribute(source, page_id, key)
        {
            flattened.set(key.to_vec(), value.clone());
        }
    }

    let new_id = target.new_object_id();
    memo.insert(page_id, new_id);
    let mut cloned = clone_dictionary(source, target, &flattened, memo);
    cloned.set("Parent", Object::Reference(pages_root));
    target.objects.insert(new_id, Object::Dictionary(cloned));

    append_kid(target, pages_root, new_id)
}

/// Link `kid` as the last child of `pages_root`, following an indirect
/// /Kids array or /Count.
fn append_kid(target: &mut Document, pages_root: ObjectId, kid: ObjectId) -> Result<()> {
    let unlinked = |what: &str| WandelwerkError::encode("pdf", format!("cannot update page tree {what}"));

    let root = target
        .get_dictionary(pages_root)
        .map_err(|err| WandelwerkError::encode("pdf", format!("page tree root: {err}")))?;
    let kids_ref = match root.get(b"Kids") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let count_ref = match root.get(b"Count") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let kids = match kids_ref {
        Some(id) => target.get_object_mut(id),
        None => target
            .get_object_mut(pages_root)
            .and_then(Object::as_dict_mut)
            .and_then(|dict| dict.get_mut(b"Kids")),
    };
    match kids {
        Ok(Object::Array(kids)) => kids.push(Object::Reference(kid)),
        _ => return Err(unlinked("/Kids")),
    }

    let count = match count_ref {
        Some(id) => target.get_object_mut(id),
        None => target
            .get_object_mut(pages_root)
            .and_then(Object::as_dict_mut)
            .and_then(|dict| dict.get_mut(b"Count")),
    };
    match count {
        Ok(Object::Integer(count)) => *count += 1,
        _ => return Err(unlinked("/Count")),
    }
    Ok(())
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        // /Parent would drag the source page tree along; callers re-link it.
        if key == b"Parent" {
            continue;
        }
        new_dict.set(key.clone(), clone_object(source, target, value, memo));
    }
    new_dict
}

/// Deep-clone an object into `target`. Each source object is copied at
/// most once, so shared resources stay shared and reference cycles end.
fn clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Reference(ref_id) => {
            if let Some(mapped) = memo.get(ref_id) {
                return Object::Reference(*mapped);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    memo.insert(*ref_id, new_id);
                    let cloned = clone_object(source, target, referenced, memo);
                    target.objects.insert(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Dictionary(dict) => Object::Dictionary(clone_dictionary(source, target, dict, memo)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| clone_object(source, target, item, memo))
                .collect(),
        ),
        Object::Stream(stream) => {
            let dict = clone_dictionary(source, target, &stream.dict, memo);
            let mut cloned = stream.clone();
            cloned.dict = dict;
            Object::Stream(cloned)
        }
        // Boolean, Integer, Real, String, Name, Null
        other => other.clone(),
    }
}

/// Concatenate PDFs in input order.
///
/// An empty input list is rejected; a single input is returned re-serialised.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn merge_pdfs<B: AsRef<[u8]>>(inputs: &[B]) -> Result<Vec<u8>> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| WandelwerkError::InvalidInput("no PDF files to merge".into()))?;

    let base = PdfReader::from_bytes(first.as_ref())?;
    let others = rest
        .iter()
        .map(|bytes| PdfReader::from_bytes(bytes.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    base.merge(&others)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// Build a PDF whose pages have the given widths (height 800) and each
    /// show one line of text naming the page.
    pub fn pdf_with_pages(label: &str, widths: &[i64]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for (index, width) in widths.iter().enumerate() {
            let text = format!("{label} page {}", index + 1);
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (*width).into(), 800.into()],
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

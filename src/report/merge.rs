//! Attachment merger: appends the pages of uploaded PDFs to the report.

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

use super::file::UploadKind;
use super::record::{StoredUpload, UploadRef};
use super::ReportError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

// Guard against malformed, cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// Append every page of each existing PDF reference, in order.
///
/// References that are empty, missing or not PDFs are skipped. When nothing
/// remains the input is returned untouched.
pub fn merge_attachments(document: Vec<u8>, references: &[&UploadRef]) -> Result<Vec<u8>, ReportError> {
    let attachments: Vec<&StoredUpload> = references
        .iter()
        .filter_map(|reference| match reference {
            UploadRef::Stored(stored) if stored.kind == UploadKind::Pdf && stored.path.is_file() => {
                Some(stored)
            }
            _ => None,
        })
        .collect();

    if attachments.is_empty() {
        return Ok(document);
    }

    let mut merged = Document::load_mem(&document)?;
    let pages_id = merged
        .catalog()?
        .get(b"Pages")?
        .as_reference()?;

    let mut appended = Vec::new();
    for attachment in attachments {
        let reference = attachment_name(attachment);
        let failure = |reason: String| ReportError::AttachmentMergeFailure {
            reference: reference.clone(),
            reason,
        };

        let source = Document::load(&attachment.path).map_err(|e| failure(e.to_string()))?;
        if source.is_encrypted() {
            return Err(failure("document is encrypted".to_string()));
        }
        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(failure("document has no pages".to_string()));
        }

        let mut copier = PageCopier::new(&source, &page_ids, &mut merged);
        for page_id in &page_ids {
            let new_id = copier
                .copy_page(&mut merged, *page_id, pages_id)
                .map_err(|e| failure(e.to_string()))?;
            appended.push(Object::Reference(new_id));
        }
        log::debug!("appended {} pages from {}", page_ids.len(), reference);
    }

    // Count covers every leaf below the root, not just its direct kids.
    let root = merged.get_object_mut(pages_id)?.as_dict_mut()?;
    let kids = root.get_mut(b"Kids")?.as_array_mut()?;
    let direct = kids.len() as i64;
    let added = appended.len() as i64;
    kids.extend(appended);
    let existing = root.get(b"Count").and_then(Object::as_i64).unwrap_or(direct);
    root.set("Count", Object::Integer(existing + added));

    let mut bytes = Vec::new();
    merged
        .save_to(&mut bytes)
        .map_err(|e| ReportError::Render(e.to_string()))?;
    Ok(bytes)
}

fn attachment_name(attachment: &StoredUpload) -> String {
    attachment
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| attachment.original_name.clone())
}

/// Deep-copies pages of one source document into the target.
///
/// Every source object is copied at most once, so objects shared between
/// pages stay shared and reference cycles terminate.
struct PageCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    /// Page ids are reserved up front so links between pages resolve to the
    /// copies instead of dragging in the source page tree.
    fn new(source: &'a Document, page_ids: &[ObjectId], target: &mut Document) -> Self {
        let copied = page_ids
            .iter()
            .map(|page_id| (*page_id, target.new_object_id()))
            .collect();
        Self { source, copied }
    }

    fn copy_page(
        &mut self,
        target: &mut Document,
        page_id: ObjectId,
        parent_id: ObjectId,
    ) -> lopdf::Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id)?;
        let new_id = match self.copied.get(&page_id) {
            Some(id) => *id,
            None => {
                let id = target.new_object_id();
                self.copied.insert(page_id, id);
                id
            }
        };

        let mut copy = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy(target, value)?);
        }
        for key in INHERITABLE {
            if copy.has(key) {
                continue;
            }
            if let Some(value) = self.inherited(page, key) {
                copy.set(key.to_vec(), self.copy(target, &value)?);
            }
        }
        copy.set("Parent", Object::Reference(parent_id));

        target.objects.insert(new_id, Object::Dictionary(copy));
        Ok(new_id)
    }

    /// Nearest ancestor value of an inheritable attribute.
    fn inherited(&self, page: &Dictionary, key: &[u8]) -> Option<Object> {
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        for _ in 0..MAX_TREE_DEPTH {
            let node = self.source.get_dictionary(parent?).ok()?;
            if let Ok(value) = node.get(key) {
                return Some(value.clone());
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
        None
    }

    fn copy(&mut self, target: &mut Document, object: &Object) -> lopdf::Result<Object> {
        match object {
            Object::Reference(id) => {
                if let Some(new_id) = self.copied.get(id) {
                    return Ok(Object::Reference(*new_id));
                }
                let source = self.source;
                let referenced = match source.get_object(*id) {
                    Ok(referenced) => referenced,
                    Err(e) => {
                        log::debug!("dangling reference {:?} replaced with null: {}", id, e);
                        return Ok(Object::Null);
                    }
                };
                let new_id = target.new_object_id();
                self.copied.insert(*id, new_id);
                let copy = self.copy(target, referenced)?;
                target.objects.insert(new_id, copy);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(target, dict)?)),
            Object::Array(items) => items
                .iter()
                .map(|item| self.copy(target, item))
                .collect::<lopdf::Result<Vec<_>>>()
                .map(Object::Array),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.copy_dictionary(target, &stream.dict)?;
                Ok(Object::Stream(copy))
            }
            other => Ok(other.clone()),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> lopdf::Result<Dictionary> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy(target, value)?);
        }
        Ok(copy)
    }
}

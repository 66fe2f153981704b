//! Directory record hierarchy
//!
//! Records live in an arena ([`RecordTree`]) and refer to each other by
//! index. The root is always at [`RecordTree::ROOT`] and is never written
//! as a record of its own.

pub mod assembler;
pub mod builders;
pub mod consistency;
pub mod icon;
pub mod inventor;
pub mod persist;

pub use assembler::HierarchyAssembler;
pub use builders::RecordBuilder;
pub use consistency::{check_consistency, Consistency};
pub use inventor::AttributeInventor;
pub use persist::{read_index, write_index, DirectoryIndex};

use crate::dataset::tags::*;
use crate::error::{DicomdirError, Result};
use crate::types::RecordKind;
use dicom_object::InMemDicomObject;
use std::path::PathBuf;

/// Index of a record in its [`RecordTree`]
pub type RecordId = usize;

/// One node of the DICOMDIR hierarchy
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    pub kind: RecordKind,
    /// Record keys copied from the source dataset
    pub attributes: InMemDicomObject,
    /// ReferencedFileID (0004,1500) in DICOM form, instance records only
    pub referenced_file_id: Option<String>,
    /// File that created the record; set once and never overwritten
    pub origin_file: Option<String>,
    parent: Option<RecordId>,
    children: Vec<RecordId>,
}

impl DirectoryRecord {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            attributes: InMemDicomObject::new_empty(),
            referenced_file_id: None,
            origin_file: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder: Set the referenced file ID
    pub fn with_referenced_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.referenced_file_id = Some(file_id.into());
        self
    }

    /// Records the origin file unless one is already set
    pub fn set_origin_file(&mut self, file: &str) {
        if self.origin_file.is_none() {
            self.origin_file = Some(file.to_string());
        }
    }

    pub fn parent(&self) -> Option<RecordId> {
        self.parent
    }

    pub fn children(&self) -> &[RecordId] {
        &self.children
    }

    pub fn string_value(&self, tag: dicom_core::Tag) -> Option<String> {
        get_string_value(&self.attributes, tag)
    }

    /// Value of the key attribute the record is sorted by
    pub fn sort_key(&self) -> Option<i32> {
        sort_key(self.kind, &self.attributes)
    }

    /// Short human readable key, e.g. the patient ID or instance number
    pub fn display_key(&self) -> String {
        let tag = match self.kind {
            RecordKind::Patient => PATIENT_ID,
            RecordKind::Study => STUDY_INSTANCE_UID,
            RecordKind::Series => SERIES_INSTANCE_UID,
            RecordKind::HangingProtocol => HANGING_PROTOCOL_NAME,
            RecordKind::Palette => CONTENT_LABEL,
            RecordKind::Implant => IMPLANT_NAME,
            RecordKind::ImplantGroup => IMPLANT_TEMPLATE_GROUP_NAME,
            RecordKind::ImplantAssy => IMPLANT_ASSEMBLY_TEMPLATE_NAME,
            _ => match sort_key_tag(self.kind) {
                Some(tag) => tag,
                None => REFERENCED_SOP_INSTANCE_UID_IN_FILE,
            },
        };
        self.string_value(tag).unwrap_or_default()
    }
}

/// Returns the tag a record kind is ordered by among its siblings
pub fn sort_key_tag(kind: RecordKind) -> Option<dicom_core::Tag> {
    match kind {
        RecordKind::Series => Some(SERIES_NUMBER),
        RecordKind::Overlay => Some(OVERLAY_NUMBER),
        RecordKind::Curve => Some(CURVE_NUMBER),
        RecordKind::ModalityLut | RecordKind::VoiLut => Some(LUT_NUMBER),
        RecordKind::Image
        | RecordKind::SrDocument
        | RecordKind::Presentation
        | RecordKind::Waveform
        | RecordKind::RtDose
        | RecordKind::RtStructureSet
        | RecordKind::RtPlan
        | RecordKind::RtTreatRecord
        | RecordKind::StoredPrint
        | RecordKind::KeyObjectDoc
        | RecordKind::Registration
        | RecordKind::Fiducial
        | RecordKind::RawData
        | RecordKind::Spectroscopy
        | RecordKind::EncapDoc
        | RecordKind::ValueMap
        | RecordKind::Surface
        | RecordKind::Measurement => Some(INSTANCE_NUMBER),
        RecordKind::Root
        | RecordKind::Patient
        | RecordKind::Study
        | RecordKind::HangingProtocol
        | RecordKind::Stereometric
        | RecordKind::Palette
        | RecordKind::Implant
        | RecordKind::ImplantGroup
        | RecordKind::ImplantAssy => None,
    }
}

/// Returns the ordering key of a record, `None` for unordered kinds or a
/// missing value
pub fn sort_key(kind: RecordKind, attributes: &InMemDicomObject) -> Option<i32> {
    sort_key_tag(kind).and_then(|tag| get_int_value(attributes, tag))
}

/// A file being added to the directory
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Host path of the file
    pub path: PathBuf,
    /// ReferencedFileID in DICOM form (`DIR\FILE`)
    pub file_id: String,
    pub sop_class_uid: String,
    pub transfer_syntax_uid: String,
}

impl SourceFile {
    /// Name used in diagnostics
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Arena of directory records
#[derive(Debug, Clone)]
pub struct RecordTree {
    records: Vec<DirectoryRecord>,
}

impl Default for RecordTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordTree {
    pub const ROOT: RecordId = 0;

    /// Creates a tree holding only the root
    pub fn new() -> Self {
        Self {
            records: vec![DirectoryRecord::new(RecordKind::Root)],
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&DirectoryRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut DirectoryRecord> {
        self.records.get_mut(id)
    }

    /// Children of `id`, empty for an unknown id
    pub fn children(&self, id: RecordId) -> &[RecordId] {
        self.records
            .get(id)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: RecordId) -> Option<RecordId> {
        self.records.get(id).and_then(|r| r.parent)
    }

    /// Number of records, not counting the root
    pub fn record_count(&self) -> usize {
        self.records.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// Returns the first child of `parent` that satisfies `predicate`
    pub fn find_child<F>(&self, parent: RecordId, mut predicate: F) -> Option<RecordId>
    where
        F: FnMut(&DirectoryRecord) -> bool,
    {
        self.children(parent)
            .iter()
            .copied()
            .find(|&id| self.records.get(id).map(&mut predicate).unwrap_or(false))
    }

    /// Appends `record` as the last child of `parent`
    pub fn attach(&mut self, parent: RecordId, record: DirectoryRecord) -> Result<RecordId> {
        let position = self.children(parent).len();
        self.insert_at(parent, record, position)
    }

    /// Inserts `record` under `parent` before the first sibling with a
    /// strictly greater sort key
    ///
    /// Records without a key are appended, so equal keys keep their arrival
    /// order.
    pub fn insert_sorted(&mut self, parent: RecordId, record: DirectoryRecord) -> Result<RecordId> {
        let position = match record.sort_key() {
            Some(key) => {
                let siblings = self.children(parent);
                siblings
                    .iter()
                    .position(|&id| {
                        self.records
                            .get(id)
                            .and_then(DirectoryRecord::sort_key)
                            .map(|sibling| sibling > key)
                            .unwrap_or(false)
                    })
                    .unwrap_or(siblings.len())
            }
            None => self.children(parent).len(),
        };
        self.insert_at(parent, record, position)
    }

    /// Moves `id` among its siblings to where [`insert_sorted`](Self::insert_sorted)
    /// would place it, after every sibling with an equal or smaller key
    ///
    /// Records without a sort key stay where they are.
    pub fn reposition(&mut self, id: RecordId) {
        let (parent, key) = match self.records.get(id) {
            Some(record) => match (record.parent, record.sort_key()) {
                (Some(parent), Some(key)) => (parent, key),
                _ => return,
            },
            None => return,
        };
        let mut siblings = std::mem::take(&mut self.records[parent].children);
        siblings.retain(|&sibling| sibling != id);
        let position = siblings
            .iter()
            .position(|&sibling| {
                self.records
                    .get(sibling)
                    .and_then(DirectoryRecord::sort_key)
                    .map(|other| other > key)
                    .unwrap_or(false)
            })
            .unwrap_or(siblings.len());
        siblings.insert(position, id);
        self.records[parent].children = siblings;
    }

    fn insert_at(
        &mut self,
        parent: RecordId,
        mut record: DirectoryRecord,
        position: usize,
    ) -> Result<RecordId> {
        if parent >= self.records.len() {
            return Err(DicomdirError::Build {
                kind: record.kind,
                operation: "insert".to_string(),
            });
        }
        self.records
            .try_reserve(1)
            .map_err(|e| DicomdirError::ResourceExhausted(format!("record arena: {}", e)))?;

        let id = self.records.len();
        record.parent = Some(parent);
        record.children.clear();
        self.records.push(record);

        let children = &mut self.records[parent].children;
        children
            .try_reserve(1)
            .map_err(|e| DicomdirError::ResourceExhausted(format!("record children: {}", e)))?;
        children.insert(position.min(children.len()), id);
        Ok(id)
    }

    /// Record ids in depth-first pre-order, excluding the root
    pub fn depth_first(&self) -> Vec<RecordId> {
        let mut order = Vec::with_capacity(self.record_count());
        let mut stack: Vec<RecordId> = self.children(Self::ROOT).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Number of records of the given kind
    pub fn count_kind(&self, kind: RecordKind) -> usize {
        self.records.iter().skip(1).filter(|r| r.kind == kind).count()
    }
}

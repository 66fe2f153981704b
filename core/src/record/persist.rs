//! Reading and writing the DICOMDIR file
//!
//! Records are written depth-first into the DirectoryRecordSequence. The
//! links between them are byte offsets from the start of the file, so the
//! encoded size of every item is computed up front with the same rules the
//! writer applies: explicit VR little endian, values padded to even length,
//! sequences and items of undefined length.

use super::{DirectoryRecord, RecordId, RecordTree};
use crate::dataset::tags::*;
use dicom_dictionary_std::uids::{EXPLICIT_VR_LITTLE_ENDIAN, MEDIA_STORAGE_DIRECTORY_STORAGE};
use crate::error::{DicomdirError, Result};
use crate::types::{FilesetDescriptor, RecordKind};
use dicom_core::value::{DataSetSequence, PrimitiveValue, Value};
use dicom_core::{Length, VR};
use dicom_object::mem::InMemElement;
use dicom_object::{open_file, FileMetaTableBuilder, InMemDicomObject};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

/// Preamble plus the `DICM` magic
const PREAMBLE_LENGTH: u64 = 128 + 4;
/// FileMetaInformationGroupLength element, which the group length excludes
const GROUP_LENGTH_ELEMENT: u64 = 12;
const ITEM_HEADER: u64 = 8;
const DELIMITER: u64 = 8;
const RECORD_IN_USE: u16 = 0xFFFF;

/// A directory held in memory together with its file-set attributes
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    pub tree: RecordTree,
    pub fileset_id: Option<String>,
    pub descriptor: Option<FilesetDescriptor>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

/// How items and sequences are delimited in a file being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Undefined lengths with item and sequence delimiters
    Delimited,
    /// Explicit lengths, no delimiters
    Explicit,
}

impl Layout {
    fn delimiter(self) -> u64 {
        match self {
            Layout::Delimited => DELIMITER,
            Layout::Explicit => 0,
        }
    }
}

/// VRs with a 4 byte reserved field and 32-bit length in explicit VR
fn has_long_header(vr: VR) -> bool {
    matches!(
        vr,
        VR::OB
            | VR::OD
            | VR::OF
            | VR::OL
            | VR::OV
            | VR::OW
            | VR::SQ
            | VR::SV
            | VR::UC
            | VR::UN
            | VR::UR
            | VR::UT
            | VR::UV
    )
}

fn padded(len: u64) -> u64 {
    (len + 1) & !1
}

/// Length of a primitive value before padding
fn value_length(value: &PrimitiveValue) -> u64 {
    match value {
        PrimitiveValue::Str(s) => s.len() as u64,
        PrimitiveValue::Strs(values) if values.is_empty() => 0,
        PrimitiveValue::Strs(values) => {
            values.iter().map(|s| s.len() as u64).sum::<u64>() + values.len() as u64 - 1
        }
        PrimitiveValue::Date(_) | PrimitiveValue::Time(_) | PrimitiveValue::DateTime(_) => {
            value.to_str().len() as u64
        }
        other => other.calculate_byte_len() as u64,
    }
}

fn element_size(elem: &InMemElement, layout: Layout) -> u64 {
    let header = if has_long_header(elem.vr()) { 12 } else { 8 };
    match elem.value() {
        Value::Primitive(value) => header + padded(value_length(value)),
        Value::Sequence(_) => {
            let items = elem.value().items().unwrap_or(&[]);
            header
                + items.iter().map(|item| item_size(item, layout)).sum::<u64>()
                + layout.delimiter()
        }
        Value::PixelSequence(_) => {
            let offsets = elem.value().offset_table().map(|t| t.len()).unwrap_or(0) as u64;
            let fragments: u64 = elem
                .value()
                .fragments()
                .unwrap_or(&[])
                .iter()
                .map(|f| ITEM_HEADER + padded(f.len() as u64))
                .sum();
            header + ITEM_HEADER + 4 * offsets + fragments + DELIMITER
        }
    }
}

fn item_size(item: &InMemDicomObject, layout: Layout) -> u64 {
    let content: u64 = item.iter().map(|e| element_size(e, layout)).sum();
    ITEM_HEADER + content + layout.delimiter()
}

/// Copy of `obj` with every nested sequence switched to undefined length
fn with_undefined_lengths(obj: &InMemDicomObject) -> InMemDicomObject {
    let mut out = InMemDicomObject::new_empty();
    for elem in obj.iter() {
        match elem.value() {
            Value::Sequence(_) => {
                let items: Vec<InMemDicomObject> = elem
                    .value()
                    .items()
                    .unwrap_or(&[])
                    .iter()
                    .map(with_undefined_lengths)
                    .collect();
                out.put(InMemElement::new(
                    elem.header().tag,
                    VR::SQ,
                    DataSetSequence::new(items, Length::UNDEFINED),
                ));
            }
            _ => {
                out.put(elem.clone());
            }
        }
    }
    out
}

fn to_offset(position: u64) -> Result<u32> {
    u32::try_from(position).map_err(|_| {
        DicomdirError::ResourceExhausted(format!(
            "directory record offset {} exceeds 32 bits",
            position
        ))
    })
}

/// Builds one DirectoryRecordSequence item with zeroed links
fn record_item(record: &DirectoryRecord) -> InMemDicomObject {
    let mut item = with_undefined_lengths(&record.attributes);
    put_u32(&mut item, OFFSET_OF_NEXT_RECORD, 0);
    put_u16(&mut item, RECORD_IN_USE_FLAG, RECORD_IN_USE);
    put_u32(&mut item, OFFSET_OF_LOWER_LEVEL_ENTITY, 0);
    put_string_with_vr(&mut item, DIRECTORY_RECORD_TYPE, VR::CS, record.kind.record_type());
    if let Some(file_id) = record.referenced_file_id.as_deref() {
        put_string_with_vr(&mut item, REFERENCED_FILE_ID, VR::CS, file_id);
    }
    item
}

fn media_storage_instance_uid() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("2.25.{}", nanos.unsigned_abs())
}

/// Writes `index` to `path` as a Basic Directory file
///
/// The file is written in place; callers wanting a backup of a previous
/// index make it before calling this.
pub fn write_index(index: &DirectoryIndex, path: &Path) -> Result<()> {
    let tree = &index.tree;
    let order = tree.depth_first();

    let mut items = Vec::with_capacity(order.len());
    let mut positions: HashMap<RecordId, usize> = HashMap::with_capacity(order.len());
    for (position, &id) in order.iter().enumerate() {
        let record = tree.get(id).ok_or_else(|| DicomdirError::Build {
            kind: RecordKind::Root,
            operation: "write".to_string(),
        })?;
        items.push(record_item(record));
        positions.insert(id, position);
    }

    let meta = FileMetaTableBuilder::new()
        .media_storage_sop_class_uid(MEDIA_STORAGE_DIRECTORY_STORAGE)
        .media_storage_sop_instance_uid(media_storage_instance_uid())
        .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
        .build()
        .map_err(|e| DicomdirError::Dicom(format!("cannot build file meta group: {}", e)))?;

    let mut obj = InMemDicomObject::new_empty();
    put_string_with_vr(
        &mut obj,
        FILE_SET_ID,
        VR::CS,
        index.fileset_id.as_deref().unwrap_or(""),
    );
    if let Some(descriptor) = &index.descriptor {
        put_string_with_vr(
            &mut obj,
            FILE_SET_DESCRIPTOR_FILE_ID,
            VR::CS,
            &descriptor.file_id,
        );
        if let Some(charset) = &descriptor.charset {
            put_string_with_vr(
                &mut obj,
                SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE,
                VR::CS,
                charset,
            );
        }
    }
    put_u32(&mut obj, OFFSET_OF_FIRST_ROOT_RECORD, 0);
    put_u32(&mut obj, OFFSET_OF_LAST_ROOT_RECORD, 0);
    put_u16(&mut obj, FILE_SET_CONSISTENCY_FLAG, 0);

    // every element written so far precedes the record sequence
    let header_size: u64 = obj
        .iter()
        .map(|e| element_size(e, Layout::Delimited))
        .sum();
    let mut position = PREAMBLE_LENGTH
        + GROUP_LENGTH_ELEMENT
        + u64::from(meta.information_group_length)
        + header_size
        + 12;
    let mut offsets = Vec::with_capacity(items.len());
    for item in &items {
        offsets.push(to_offset(position)?);
        position += item_size(item, Layout::Delimited);
    }

    let offset_of = |id: Option<&RecordId>| -> u32 {
        id.and_then(|id| positions.get(id))
            .map(|&p| offsets[p])
            .unwrap_or(0)
    };

    for (&id, item) in order.iter().zip(items.iter_mut()) {
        let next = tree.parent(id).and_then(|parent| {
            let siblings = tree.children(parent);
            siblings
                .iter()
                .position(|&s| s == id)
                .and_then(|i| siblings.get(i + 1))
        });
        put_u32(item, OFFSET_OF_NEXT_RECORD, offset_of(next));
        put_u32(
            item,
            OFFSET_OF_LOWER_LEVEL_ENTITY,
            offset_of(tree.children(id).first()),
        );
    }

    let roots = tree.children(RecordTree::ROOT);
    put_u32(&mut obj, OFFSET_OF_FIRST_ROOT_RECORD, offset_of(roots.first()));
    put_u32(&mut obj, OFFSET_OF_LAST_ROOT_RECORD, offset_of(roots.last()));
    put_sequence(&mut obj, DIRECTORY_RECORD_SEQUENCE, items);

    obj.with_exact_meta(meta)
        .write_to_file(path)
        .map_err(|e| DicomdirError::Dicom(format!("cannot write {}: {}", path.display(), e)))?;

    debug!(
        "wrote {} directory records to {}",
        order.len(),
        path.display()
    );
    Ok(())
}

/// Byte offset of every record item, keyed by offset
fn item_offsets(items: &[InMemDicomObject], first: u64, layout: Layout) -> HashMap<u32, usize> {
    let mut map = HashMap::with_capacity(items.len());
    let mut position = first;
    for (index, item) in items.iter().enumerate() {
        if let Ok(offset) = u32::try_from(position) {
            map.insert(offset, index);
        }
        position += item_size(item, layout);
    }
    map
}

/// Every link in the file resolves to a record item
fn resolves(map: &HashMap<u32, usize>, items: &[InMemDicomObject], first_root: u32) -> bool {
    let linked = |offset: u32| offset == 0 || map.contains_key(&offset);
    linked(first_root)
        && items.iter().all(|item| {
            linked(get_u32_value(item, OFFSET_OF_NEXT_RECORD).unwrap_or(0))
                && linked(get_u32_value(item, OFFSET_OF_LOWER_LEVEL_ENTITY).unwrap_or(0))
        })
}

/// Strips the directory structure keys from a record item
fn record_from_item(kind: RecordKind, item: &InMemDicomObject, origin: &str) -> DirectoryRecord {
    let mut record = DirectoryRecord::new(kind);
    for elem in item.iter() {
        let tag = elem.header().tag;
        let kept = tag.group() != 0x0004
            || tag == REFERENCED_SOP_CLASS_UID_IN_FILE
            || tag == REFERENCED_SOP_INSTANCE_UID_IN_FILE
            || tag == REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE;
        if kept {
            record.attributes.put(elem.clone());
        }
    }
    record.referenced_file_id =
        get_multi_string_value(item, REFERENCED_FILE_ID).map(|parts| parts.join("\\"));
    record.set_origin_file(origin);
    record
}

/// Reads a DICOMDIR file back into memory
///
/// Records flagged as not in use are skipped together with their lower
/// levels, as are records of a type this crate does not know.
pub fn read_index(path: &Path) -> Result<DirectoryIndex> {
    let name = path.display().to_string();
    let corrupted = |reason: String| DicomdirError::CorruptedFile {
        file: name.clone(),
        reason,
    };

    let file = open_file(path).map_err(|e| corrupted(e.to_string()))?;
    let sop_class = file
        .meta()
        .media_storage_sop_class_uid
        .trim_end_matches(|c: char| c == '\0' || c == ' ')
        .to_string();
    if sop_class != MEDIA_STORAGE_DIRECTORY_STORAGE {
        return Err(corrupted(format!(
            "not a Media Storage Directory (SOP class {})",
            sop_class
        )));
    }
    let group_length = u64::from(file.meta().information_group_length);
    let ds = file.into_inner();

    let mut index = DirectoryIndex {
        tree: RecordTree::new(),
        fileset_id: get_string_value(&ds, FILE_SET_ID).filter(|s| !s.is_empty()),
        descriptor: get_multi_string_value(&ds, FILE_SET_DESCRIPTOR_FILE_ID)
            .filter(|parts| !parts.is_empty())
            .map(|parts| FilesetDescriptor {
                file_id: parts.join("\\"),
                charset: get_string_value(&ds, SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE)
                    .filter(|s| !s.is_empty()),
            }),
    };

    let items = sequence_items(&ds, DIRECTORY_RECORD_SEQUENCE);
    let first_root = get_u32_value(&ds, OFFSET_OF_FIRST_ROOT_RECORD).unwrap_or(0);
    if items.is_empty() || first_root == 0 {
        return Ok(index);
    }

    let header_size: u64 = ds
        .iter()
        .take_while(|e| e.header().tag < DIRECTORY_RECORD_SEQUENCE)
        .map(|e| element_size(e, Layout::Delimited))
        .sum();
    let computed_first = PREAMBLE_LENGTH + GROUP_LENGTH_ELEMENT + group_length + header_size + 12;

    // the first item is normally the first root record, which anchors the
    // offsets when the header was encoded differently
    let candidates = [
        (computed_first, Layout::Delimited),
        (computed_first, Layout::Explicit),
        (u64::from(first_root), Layout::Delimited),
        (u64::from(first_root), Layout::Explicit),
    ];
    let offsets = candidates
        .iter()
        .map(|&(first, layout)| item_offsets(items, first, layout))
        .find(|map| resolves(map, items, first_root))
        .ok_or_else(|| corrupted("cannot resolve directory record offsets".to_string()))?;

    let mut visited = vec![false; items.len()];
    let mut pending: Vec<(u32, RecordId)> = vec![(first_root, RecordTree::ROOT)];
    while let Some((offset, parent)) = pending.pop() {
        let mut siblings = Vec::new();
        let mut next = offset;
        while next != 0 {
            let position = *offsets
                .get(&next)
                .ok_or_else(|| corrupted(format!("dangling record offset {}", next)))?;
            if std::mem::replace(&mut visited[position], true) {
                return Err(corrupted(format!("record at offset {} linked twice", next)));
            }
            siblings.push(position);
            next = get_u32_value(&items[position], OFFSET_OF_NEXT_RECORD).unwrap_or(0);
        }

        // children are pushed in reverse so they are attached in file order
        let mut lower = Vec::new();
        for position in siblings {
            let item = &items[position];
            if get_u16_value(item, RECORD_IN_USE_FLAG) == Some(0) {
                debug!("skipping record not in use at item {}", position);
                continue;
            }
            let record_type = get_string_value(item, DIRECTORY_RECORD_TYPE).unwrap_or_default();
            let kind = match RecordKind::from_record_type(&record_type) {
                Some(kind) if kind != RecordKind::Root => kind,
                _ => {
                    warn!(
                        "skipping directory record of unknown type {:?} in {}",
                        record_type, name
                    );
                    continue;
                }
            };
            let id = index
                .tree
                .attach(parent, record_from_item(kind, item, &name))?;
            let child = get_u32_value(item, OFFSET_OF_LOWER_LEVEL_ENTITY).unwrap_or(0);
            if child != 0 {
                lower.push((child, id));
            }
        }
        pending.extend(lower.into_iter().rev());
    }

    debug!(
        "read {} directory records from {}",
        index.tree.record_count(),
        name
    );
    Ok(index)
}

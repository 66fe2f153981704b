//! Type 1/1C/2/3 copy semantics between a source dataset and a record

use crate::dataset::tags::{
    element_has_value, exists_with_value, insert_empty, put_string, tag_label, vr_of,
};
use crate::types::{DiagnosticKind, Diagnostics, RecordKind};
use dicom_core::Tag;
use dicom_object::InMemDicomObject;

/// DICOM attribute presence class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// Mandatory with a value; an empty placeholder is written when absent
    Type1,
    /// Copied only when present
    Type1C,
    /// Mandatory, may be empty; inserted empty when absent
    Type2,
    /// Optional
    Type3,
}

/// Copies attributes from a source dataset into a directory record
///
/// Anomalies (empty placeholders, VR mismatches, default values) are
/// recorded in the diagnostic sink; copying itself never fails.
pub struct AttributeCopier<'a> {
    kind: RecordKind,
    file: &'a str,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> AttributeCopier<'a> {
    pub fn new(kind: RecordKind, file: &'a str, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            kind,
            file,
            diagnostics,
        }
    }

    /// Copies `tag` from `source` into `record` with the given presence class
    pub fn copy(
        &mut self,
        source: &InMemDicomObject,
        record: &mut InMemDicomObject,
        tag: Tag,
        attribute_type: AttributeType,
    ) {
        match source.element(tag) {
            Ok(elem) => {
                if let Some(expected) = vr_of(tag) {
                    if elem.vr() != expected {
                        self.diagnostics.warning(
                            DiagnosticKind::VrMismatch,
                            self.file,
                            format!(
                                "VR mismatch for {}: expected {}, found {} in file: {}",
                                tag_label(tag),
                                expected,
                                elem.vr(),
                                self.file
                            ),
                        );
                    }
                }
                if attribute_type == AttributeType::Type1 && !element_has_value(elem) {
                    self.report_empty(tag);
                }
                record.put(elem.clone());
            }
            Err(_) => match attribute_type {
                AttributeType::Type1 => {
                    insert_empty(record, tag);
                    self.report_empty(tag);
                }
                AttributeType::Type2 => insert_empty(record, tag),
                AttributeType::Type1C | AttributeType::Type3 => {}
            },
        }
    }

    /// Copies a key attribute of a Patient, Study or Series record
    ///
    /// New records get type 1 behaviour so the key is always present; an
    /// existing record keeps its value unless the dataset supplies one.
    pub fn copy_key(
        &mut self,
        source: &InMemDicomObject,
        record: &mut InMemDicomObject,
        tag: Tag,
        new_record: bool,
    ) {
        let attribute_type = if new_record {
            AttributeType::Type1
        } else {
            AttributeType::Type1C
        };
        self.copy(source, record, tag, attribute_type);
    }

    /// Copies a string attribute, falling back to `default` when the source
    /// has no value
    ///
    /// An empty default inserts the tag without a value.
    pub fn copy_string_with_default(
        &mut self,
        source: &InMemDicomObject,
        record: &mut InMemDicomObject,
        tag: Tag,
        default: &str,
    ) {
        if exists_with_value(source, tag) {
            self.copy(source, record, tag, AttributeType::Type1);
        } else if default.is_empty() {
            insert_empty(record, tag);
        } else {
            put_string(record, tag, default);
            self.diagnostics.warning(
                DiagnosticKind::DefaultValue,
                self.file,
                format!(
                    "{} missing, using alternative: {} in file: {}",
                    tag_label(tag),
                    default,
                    self.file
                ),
            );
        }
    }

    /// Reports a source attribute the copy needed but could not find
    pub fn report_missing(&mut self, tag: Tag) {
        self.diagnostics.warning(
            DiagnosticKind::MandatoryAttributeMissing,
            self.file,
            format!(
                "{} record: cannot retrieve {} from file: {}",
                self.kind,
                tag_label(tag),
                self.file
            ),
        );
    }

    fn report_empty(&mut self, tag: Tag) {
        self.diagnostics.warning(
            DiagnosticKind::MandatoryAttributeEmpty,
            self.file,
            format!(
                "{} record: empty value inserted for {} from file: {}",
                self.kind,
                tag_label(tag),
                self.file
            ),
        );
    }
}

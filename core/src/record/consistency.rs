//! Comparison of an existing directory record against a re-added file

use super::DirectoryRecord;
use crate::dataset::tags::*;
use dicom_core::value::Value;
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;

/// Values longer than this are left out of inconsistency messages
const MAX_PREVIEW_LENGTH: usize = 64;

/// Outcome of a consistency check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consistency {
    Consistent,
    Inconsistent(Vec<String>),
}

impl Consistency {
    pub fn is_consistent(&self) -> bool {
        matches!(self, Consistency::Consistent)
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Consistency::Consistent => &[],
            Consistency::Inconsistent(reasons) => reasons,
        }
    }
}

struct Comparison<'a> {
    record: &'a DirectoryRecord,
    file: &'a str,
    abort: bool,
    reasons: Vec<String>,
}

impl<'a> Comparison<'a> {
    fn done(&self) -> bool {
        self.abort && !self.reasons.is_empty()
    }

    fn compare_items(&mut self, record: &InMemDicomObject, ds: &InMemDicomObject) {
        for elem in record.iter() {
            if self.done() {
                return;
            }
            let tag = elem.header().tag;
            if skipped(tag) || !element_has_value(elem) {
                continue;
            }
            let other = match ds.element(tag) {
                Ok(other) if element_has_value(other) => other,
                _ => continue,
            };
            self.compare_elements(elem, other);
        }
    }

    fn compare_elements(&mut self, elem: &InMemElement, other: &InMemElement) {
        match (elem.value(), other.value()) {
            (Value::Sequence(_), Value::Sequence(_)) => {
                let ours = elem.value().items().unwrap_or(&[]);
                let theirs = other.value().items().unwrap_or(&[]);
                if ours.len() != theirs.len() {
                    self.push_reason(elem, "has different number of items");
                    return;
                }
                for (a, b) in ours.iter().zip(theirs) {
                    if self.done() {
                        return;
                    }
                    if a.iter().count() != b.iter().count() {
                        self.push_reason(elem, "has item with different number of attributes");
                    } else {
                        self.compare_items(a, b);
                    }
                }
            }
            (Value::Sequence(_), _) | (_, Value::Sequence(_)) => {
                self.push(elem, "sequence", "value");
            }
            _ => {
                let ours = normalized(elem);
                let theirs = normalized(other);
                if ours != theirs {
                    self.push(elem, &ours, &theirs);
                }
            }
        }
    }

    fn push(&mut self, elem: &InMemElement, ours: &str, theirs: &str) {
        if ours.len() < MAX_PREVIEW_LENGTH && theirs.len() < MAX_PREVIEW_LENGTH {
            self.push_reason(elem, &format!("has different value ({} != {})", ours, theirs));
        } else {
            self.push_reason(elem, "has different value");
        }
    }

    fn push_reason(&mut self, elem: &InMemElement, detail: &str) {
        let tag = elem.header().tag;
        self.reasons.push(format!(
            "file inconsistent with existing DICOMDIR record: {} ({}) attribute {} {} in file: {}",
            self.record.kind,
            self.record
                .origin_file
                .as_deref()
                .unwrap_or("<unknown>"),
            tag_label(tag),
            detail,
            self.file
        ));
    }
}

/// Sequences and directory keys that legitimately differ from the file
fn skipped(tag: dicom_core::Tag) -> bool {
    tag.group() == 0x0004
        || tag == CONTENT_SEQUENCE
        || tag == BLENDING_SEQUENCE
        || tag == ICON_IMAGE_SEQUENCE
}

/// String form of a primitive value with DICOM padding removed
fn normalized(elem: &InMemElement) -> String {
    elem.to_str()
        .map(|s| s.trim_matches(|c: char| c == ' ' || c == '\0').to_string())
        .unwrap_or_default()
}

/// Compares every valued attribute of `record` with the same attribute of `ds`
///
/// Attributes missing or empty in either side are not compared. With `abort`
/// set the check stops at the first difference. Neither side is modified.
pub fn check_consistency(
    record: &DirectoryRecord,
    ds: &InMemDicomObject,
    file: &str,
    abort: bool,
) -> Consistency {
    let mut comparison = Comparison {
        record,
        file,
        abort,
        reasons: Vec::new(),
    };
    comparison.compare_items(&record.attributes, ds);

    if comparison.reasons.is_empty() {
        Consistency::Consistent
    } else {
        Consistency::Inconsistent(comparison.reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKind;
    use rstest::rstest;

    fn patient() -> DirectoryRecord {
        let mut record = DirectoryRecord::new(RecordKind::Patient);
        put_string(&mut record.attributes, PATIENT_ID, "P1");
        put_string(&mut record.attributes, PATIENT_NAME, "Doe^Jane");
        insert_empty(&mut record.attributes, PATIENT_SEX);
        record.set_origin_file("IMG1");
        record
    }

    fn dataset(name: &str) -> InMemDicomObject {
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, PATIENT_ID, "P1 ");
        put_string(&mut ds, PATIENT_NAME, name);
        put_string(&mut ds, PATIENT_SEX, "F");
        ds
    }

    #[test]
    fn test_same_values_are_consistent() {
        let result = check_consistency(&patient(), &dataset("Doe^Jane"), "IMG2", false);
        assert!(result.is_consistent());
    }

    #[test]
    fn test_different_value_reported() {
        let result = check_consistency(&patient(), &dataset("Roe^Jane"), "IMG2", false);
        let reasons = result.reasons();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("PatientName (0010,0010)"), "{}", reasons[0]);
        assert!(reasons[0].contains("Doe^Jane != Roe^Jane"));
        assert!(reasons[0].ends_with("in file: IMG2"));
    }

    #[test]
    fn test_long_values_not_shown() {
        let long = "X".repeat(80);
        let result = check_consistency(&patient(), &dataset(&long), "IMG2", false);
        assert!(!result.reasons()[0].contains(&long));
    }

    #[test]
    fn test_abort_stops_at_first_difference() {
        let mut ds = dataset("Roe^Jane");
        put_string(&mut ds, PATIENT_ID, "P2");
        assert_eq!(
            check_consistency(&patient(), &ds, "IMG2", false).reasons().len(),
            2
        );
        assert_eq!(
            check_consistency(&patient(), &ds, "IMG2", true).reasons().len(),
            1
        );
    }

    #[test]
    fn test_sequences_compared_item_by_item() {
        let mut record = DirectoryRecord::new(RecordKind::Presentation);
        let mut item = InMemDicomObject::new_empty();
        put_string(&mut item, SERIES_INSTANCE_UID, "1.2.3");
        put_sequence(&mut record.attributes, REFERENCED_SERIES_SEQUENCE, vec![item]);

        let mut ds = InMemDicomObject::new_empty();
        let mut other = InMemDicomObject::new_empty();
        put_string(&mut other, SERIES_INSTANCE_UID, "1.2.4");
        put_sequence(&mut ds, REFERENCED_SERIES_SEQUENCE, vec![other]);

        let result = check_consistency(&record, &ds, "PR1", false);
        assert_eq!(result.reasons().len(), 1);
        assert!(result.reasons()[0].contains("SeriesInstanceUID"));
    }

    #[test]
    fn test_content_sequence_skipped() {
        let mut record = DirectoryRecord::new(RecordKind::SrDocument);
        let mut item = InMemDicomObject::new_empty();
        put_string(&mut item, RELATIONSHIP_TYPE, "HAS CONCEPT MOD");
        put_sequence(&mut record.attributes, CONTENT_SEQUENCE, vec![item]);

        let mut ds = InMemDicomObject::new_empty();
        let mut other = InMemDicomObject::new_empty();
        put_string(&mut other, RELATIONSHIP_TYPE, "CONTAINS");
        put_sequence(&mut ds, CONTENT_SEQUENCE, vec![other]);

        assert!(check_consistency(&record, &ds, "SR1", true).is_consistent());
    }

    fn series_reference(uids: &[&str], with_modality: bool) -> InMemDicomObject {
        let items = uids
            .iter()
            .map(|uid| {
                let mut item = InMemDicomObject::new_empty();
                put_string(&mut item, SERIES_INSTANCE_UID, uid);
                if with_modality {
                    put_string(&mut item, MODALITY, "CT");
                }
                item
            })
            .collect();
        let mut ds = InMemDicomObject::new_empty();
        put_sequence(&mut ds, REFERENCED_SERIES_SEQUENCE, items);
        ds
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_sequence_item_count_differs(#[case] abort: bool) {
        let mut record = DirectoryRecord::new(RecordKind::Presentation);
        record.attributes = series_reference(&["1.2.3", "1.2.4"], false);

        let result = check_consistency(&record, &series_reference(&["1.2.3"], false), "PR1", abort);
        assert_eq!(result.reasons().len(), 1);
        assert!(
            result.reasons()[0].contains("ReferencedSeriesSequence"),
            "{}",
            result.reasons()[0]
        );
        assert!(result.reasons()[0].contains("different number of items"));
    }

    #[test]
    fn test_sequence_item_attribute_count_differs() {
        let mut record = DirectoryRecord::new(RecordKind::Presentation);
        record.attributes = series_reference(&["1.2.3"], false);

        let result = check_consistency(&record, &series_reference(&["1.2.3"], true), "PR1", true);
        assert!(!result.is_consistent());
        assert!(result.reasons()[0].contains("different number of attributes"));
    }
}

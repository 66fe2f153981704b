//! Back-filling of missing key attributes

use super::{RecordId, RecordTree};
use crate::dataset::tags::*;
use crate::types::{DiagnosticKind, Diagnostics, RecordKind};
use dicom_core::Tag;

/// Prefixes of invented PatientID and StudyID values
///
/// The counter follows as six zero-padded digits, so invented IDs compare in
/// the same order as strings and as numbers.
const PATIENT_ID_PREFIX: &str = "AUTOPAT_";
const STUDY_ID_PREFIX: &str = "AUTOSTDY";

/// Invents PatientID, StudyID, SeriesNumber and instance numbers for records
/// that lack them
///
/// The counters belong to one session and only ever increase, so a value is
/// never handed out twice even if the record it went to is later updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInventor {
    patient: u32,
    study: u32,
    series: u32,
    instance: u32,
    /// Shared by overlay, LUT and curve numbers
    number: u32,
}

impl Default for AttributeInventor {
    fn default() -> Self {
        Self {
            patient: 0,
            study: 0,
            series: 0,
            instance: 1,
            number: 1,
        }
    }
}

impl AttributeInventor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the missing keys of every patient below the root
    ///
    /// Without `recurse` only PatientID is invented. Returns the number of
    /// values invented.
    pub fn invent_missing(
        &mut self,
        tree: &mut RecordTree,
        recurse: bool,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        let mut invented = 0;
        for patient in tree.children(RecordTree::ROOT).to_vec() {
            if tree.get(patient).map(|r| r.kind) != Some(RecordKind::Patient) {
                continue;
            }
            if self.fill(tree, patient, PATIENT_ID, Counter::Patient, diagnostics) {
                invented += 1;
            }
            if recurse {
                invented += self.invent_study_level(tree, patient, diagnostics);
            }
        }
        invented
    }

    fn invent_study_level(
        &mut self,
        tree: &mut RecordTree,
        patient: RecordId,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        let mut invented = 0;
        for study in tree.children(patient).to_vec() {
            if self.fill(tree, study, STUDY_ID, Counter::Study, diagnostics) {
                invented += 1;
            }
            for series in tree.children(study).to_vec() {
                if self.fill(tree, series, SERIES_NUMBER, Counter::Series, diagnostics) {
                    invented += 1;
                }
                for instance in tree.children(series).to_vec() {
                    let key = tree.get(instance).and_then(|r| instance_key(r.kind));
                    if let Some((tag, counter)) = key {
                        if self.fill(tree, instance, tag, counter, diagnostics) {
                            invented += 1;
                        }
                    }
                }
            }
        }
        invented
    }

    /// Sets `tag` on the record from the next counter value when it has none
    fn fill(
        &mut self,
        tree: &mut RecordTree,
        id: RecordId,
        tag: Tag,
        counter: Counter,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let record = match tree.get_mut(id) {
            Some(record) => record,
            None => return false,
        };
        if exists_with_value(&record.attributes, tag) {
            return false;
        }

        let value = self.next(counter);
        put_string(&mut record.attributes, tag, &value);
        let origin = record.origin_file.clone().unwrap_or_default();
        diagnostics.warning(
            DiagnosticKind::InventedValue,
            &origin,
            format!(
                "inventing {}: {} for {} record (origin: {})",
                tag_name(tag),
                value,
                record.kind,
                origin
            ),
        );
        tree.reposition(id);
        true
    }

    fn next(&mut self, counter: Counter) -> String {
        let slot = match counter {
            Counter::Patient => &mut self.patient,
            Counter::Study => &mut self.study,
            Counter::Series => &mut self.series,
            Counter::Instance => &mut self.instance,
            Counter::Number => &mut self.number,
        };
        let number = *slot;
        *slot += 1;
        match counter {
            Counter::Patient => format!("{}{:06}", PATIENT_ID_PREFIX, number),
            Counter::Study => format!("{}{:06}", STUDY_ID_PREFIX, number),
            _ => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    Patient,
    Study,
    Series,
    Instance,
    Number,
}

/// The countable key of an instance record kind, if it has one
fn instance_key(kind: RecordKind) -> Option<(Tag, Counter)> {
    match kind {
        RecordKind::Image
        | RecordKind::RtDose
        | RecordKind::RtStructureSet
        | RecordKind::RtPlan
        | RecordKind::StoredPrint
        | RecordKind::Surface => Some((INSTANCE_NUMBER, Counter::Instance)),
        RecordKind::Overlay => Some((OVERLAY_NUMBER, Counter::Number)),
        RecordKind::ModalityLut | RecordKind::VoiLut => Some((LUT_NUMBER, Counter::Number)),
        RecordKind::Curve => Some((CURVE_NUMBER, Counter::Number)),
        _ => None,
    }
}

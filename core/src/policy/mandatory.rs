//! Attributes a file must carry before it may be indexed

use crate::dataset::tags::*;
use crate::error::DicomdirError;
use crate::types::{ApplicationProfile, RecordKind};
use dicom_core::Tag;
use dicom_object::InMemDicomObject;

/// A mandatory attribute that is absent or has no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingAttribute {
    pub tag: Tag,
    /// Present without a value
    pub empty: bool,
}

impl MissingAttribute {
    /// Converts into the matching error for `file`
    pub fn into_error(self, file: &str) -> DicomdirError {
        if self.empty {
            DicomdirError::MandatoryAttributeEmpty {
                tag: tag_label(self.tag),
                file: file.to_string(),
            }
        } else {
            DicomdirError::MandatoryAttributeMissing {
                tag: tag_label(self.tag),
                file: file.to_string(),
            }
        }
    }
}

struct Requirements<'a> {
    ds: &'a InMemDicomObject,
    missing: Vec<MissingAttribute>,
}

impl<'a> Requirements<'a> {
    fn with_value(&mut self, tags: &[Tag]) {
        for &tag in tags {
            if !exists(self.ds, tag) {
                self.missing.push(MissingAttribute { tag, empty: false });
            } else if !exists_with_value(self.ds, tag) {
                self.missing.push(MissingAttribute { tag, empty: true });
            }
        }
    }

    fn present(&mut self, tags: &[Tag]) {
        for &tag in tags {
            if !exists(self.ds, tag) {
                self.missing.push(MissingAttribute { tag, empty: false });
            }
        }
    }

    /// Checked only when the value will not be invented later
    fn unless_invented(&mut self, inventing: bool, tags: &[Tag]) {
        if !inventing {
            self.with_value(tags);
        }
    }
}

/// Lists the mandatory attributes of a record kind that `ds` lacks
///
/// `invent_patient_id` and `invent` suppress the checks for keys the
/// inventor back-fills.
pub fn check_mandatory(
    kind: RecordKind,
    profile: ApplicationProfile,
    ds: &InMemDicomObject,
    invent: bool,
    invent_patient_id: bool,
) -> Vec<MissingAttribute> {
    let mut req = Requirements {
        ds,
        missing: Vec::new(),
    };

    match kind {
        RecordKind::HangingProtocol => req.with_value(&[
            HANGING_PROTOCOL_NAME,
            HANGING_PROTOCOL_DESCRIPTION,
            HANGING_PROTOCOL_LEVEL,
            HANGING_PROTOCOL_CREATOR,
            HANGING_PROTOCOL_CREATION_DATE_TIME,
            HANGING_PROTOCOL_DEFINITION_SEQUENCE,
            NUMBER_OF_PRIORS_REFERENCED,
        ]),
        RecordKind::Palette => req.with_value(&[CONTENT_LABEL]),
        RecordKind::Implant => req.with_value(&[MANUFACTURER, IMPLANT_NAME, IMPLANT_PART_NUMBER]),
        RecordKind::ImplantGroup => {
            req.with_value(&[IMPLANT_TEMPLATE_GROUP_NAME, IMPLANT_TEMPLATE_GROUP_ISSUER])
        }
        RecordKind::ImplantAssy => req.with_value(&[
            IMPLANT_ASSEMBLY_TEMPLATE_NAME,
            IMPLANT_ASSEMBLY_TEMPLATE_ISSUER,
            PROCEDURE_TYPE_CODE_SEQUENCE,
        ]),
        _ => {
            req.unless_invented(invent_patient_id, &[PATIENT_ID]);
            req.present(&[PATIENT_NAME]);
            req.unless_invented(invent, &[STUDY_DATE, STUDY_TIME, STUDY_ID]);
            req.with_value(&[STUDY_INSTANCE_UID, MODALITY, SERIES_INSTANCE_UID]);
            req.unless_invented(invent, &[SERIES_NUMBER]);
            check_instance_keys(&mut req, kind, profile, invent);
        }
    }
    req.missing
}

fn check_instance_keys(
    req: &mut Requirements,
    kind: RecordKind,
    profile: ApplicationProfile,
    invent: bool,
) {
    match kind {
        RecordKind::Overlay => req.unless_invented(invent, &[OVERLAY_NUMBER]),
        RecordKind::ModalityLut | RecordKind::VoiLut => req.unless_invented(invent, &[LUT_NUMBER]),
        RecordKind::Curve => req.unless_invented(invent, &[CURVE_NUMBER]),
        RecordKind::SrDocument => {
            req.with_value(&[
                INSTANCE_NUMBER,
                COMPLETION_FLAG,
                VERIFICATION_FLAG,
                CONTENT_DATE,
                CONTENT_TIME,
                CONCEPT_NAME_CODE_SEQUENCE,
            ]);
            if get_string_value(req.ds, VERIFICATION_FLAG).as_deref() == Some("VERIFIED") {
                let last = sequence_items(req.ds, VERIFYING_OBSERVER_SEQUENCE).last();
                let verified = last
                    .map(|item| exists_with_value(item, VERIFICATION_DATE_TIME))
                    .unwrap_or(false);
                if !verified {
                    req.missing.push(MissingAttribute {
                        tag: VERIFICATION_DATE_TIME,
                        empty: last.is_some(),
                    });
                }
            }
        }
        RecordKind::Presentation => req.with_value(&[
            INSTANCE_NUMBER,
            CONTENT_LABEL,
            PRESENTATION_CREATION_DATE,
            PRESENTATION_CREATION_TIME,
        ]),
        RecordKind::Waveform => req.with_value(&[INSTANCE_NUMBER, CONTENT_DATE, CONTENT_TIME]),
        RecordKind::RtDose => {
            req.unless_invented(invent, &[INSTANCE_NUMBER]);
            req.with_value(&[DOSE_SUMMATION_TYPE]);
        }
        RecordKind::RtStructureSet => {
            req.unless_invented(invent, &[INSTANCE_NUMBER]);
            req.with_value(&[STRUCTURE_SET_LABEL]);
        }
        RecordKind::RtPlan => {
            req.unless_invented(invent, &[INSTANCE_NUMBER]);
            req.with_value(&[RT_PLAN_LABEL]);
        }
        RecordKind::RtTreatRecord => req.with_value(&[INSTANCE_NUMBER]),
        RecordKind::KeyObjectDoc => req.with_value(&[
            INSTANCE_NUMBER,
            CONTENT_DATE,
            CONTENT_TIME,
            CONCEPT_NAME_CODE_SEQUENCE,
        ]),
        RecordKind::RawData => req.with_value(&[CONTENT_DATE, CONTENT_TIME]),
        RecordKind::Spectroscopy => req.with_value(&[
            INSTANCE_NUMBER,
            IMAGE_TYPE,
            CONTENT_DATE,
            CONTENT_TIME,
            NUMBER_OF_FRAMES,
            ROWS,
            COLUMNS,
            DATA_POINT_ROWS,
            DATA_POINT_COLUMNS,
        ]),
        RecordKind::EncapDoc => {
            req.with_value(&[INSTANCE_NUMBER, MIME_TYPE_OF_ENCAPSULATED_DOCUMENT])
        }
        RecordKind::Registration
        | RecordKind::Fiducial
        | RecordKind::ValueMap
        | RecordKind::Surface
        | RecordKind::Measurement => {
            req.with_value(&[INSTANCE_NUMBER, CONTENT_DATE, CONTENT_TIME, CONTENT_LABEL])
        }
        RecordKind::Image => {
            req.unless_invented(invent, &[INSTANCE_NUMBER]);
            if profile.has_extended_keys() {
                req.with_value(&[ROWS, COLUMNS]);
            }
        }
        RecordKind::StoredPrint | RecordKind::Stereometric => {}
        RecordKind::Root
        | RecordKind::Patient
        | RecordKind::Study
        | RecordKind::Series
        | RecordKind::HangingProtocol
        | RecordKind::Palette
        | RecordKind::Implant
        | RecordKind::ImplantGroup
        | RecordKind::ImplantAssy => {}
    }
}

//! Per-kind directory record construction

use super::{DirectoryRecord, SourceFile};
use crate::dataset::tags::*;
use dicom_dictionary_std::uids::X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE;
use crate::dataset::{AttributeCopier, AttributeType};
use crate::error::{DicomdirError, Result};
use crate::types::{ApplicationProfile, Diagnostics, RecordKind};
use dicom_core::{Tag, VR};
use dicom_object::InMemDicomObject;

/// Character set assumed when SpecificCharacterSet is absent
const DEFAULT_CHARACTER_SET: &str = "ISO_IR 6";

/// Blending sequence items kept on a presentation record
const MAX_BLENDING_ITEMS: usize = 2;

/// Copies the record keys of one file into a directory record
struct RecordFill<'c, 'a> {
    copier: AttributeCopier<'a>,
    ds: &'c InMemDicomObject,
    record: &'c mut InMemDicomObject,
}

impl<'c, 'a> RecordFill<'c, 'a> {
    fn copy(&mut self, tags: &[Tag], attribute_type: AttributeType) {
        for &tag in tags {
            self.copier.copy(self.ds, self.record, tag, attribute_type);
        }
    }

    fn type1(&mut self, tags: &[Tag]) {
        self.copy(tags, AttributeType::Type1);
    }

    fn type1c(&mut self, tags: &[Tag]) {
        self.copy(tags, AttributeType::Type1C);
    }

    fn type2(&mut self, tags: &[Tag]) {
        self.copy(tags, AttributeType::Type2);
    }

    fn type3(&mut self, tags: &[Tag]) {
        self.copy(tags, AttributeType::Type3);
    }

    fn key(&mut self, tag: Tag, new_record: bool) {
        self.copier.copy_key(self.ds, self.record, tag, new_record);
    }

    fn with_default(&mut self, tag: Tag, default: &str) {
        self.copier
            .copy_string_with_default(self.ds, self.record, tag, default);
    }
}

/// Builds and updates directory records
///
/// One builder serves a whole session; anomalies found while copying go to
/// the session's diagnostics.
pub struct RecordBuilder<'a> {
    profile: ApplicationProfile,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(profile: ApplicationProfile, diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            profile,
            diagnostics,
        }
    }

    /// Creates a record of `kind` from `ds`, or refreshes `existing` in place
    ///
    /// Missing type 1 keys become empty placeholders with a diagnostic; only a
    /// kind mismatch or an attempt to build the root fails.
    pub fn build(
        &mut self,
        kind: RecordKind,
        existing: Option<DirectoryRecord>,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) -> Result<DirectoryRecord> {
        let new_record = existing.is_none();
        let operation = if new_record { "create" } else { "update" };
        if kind == RecordKind::Root {
            return Err(DicomdirError::Build {
                kind,
                operation: operation.to_string(),
            });
        }

        let mut record = match existing {
            Some(record) if record.kind != kind => {
                return Err(DicomdirError::Build {
                    kind,
                    operation: operation.to_string(),
                })
            }
            Some(record) => record,
            None if kind.is_instance_level() => {
                DirectoryRecord::new(kind).with_referenced_file_id(&source.file_id)
            }
            None => DirectoryRecord::new(kind),
        };

        let file = source.name();
        let profile = self.profile;
        {
            let mut fill = RecordFill {
                copier: AttributeCopier::new(kind, &file, self.diagnostics),
                ds,
                record: &mut record.attributes,
            };
            match kind {
                RecordKind::Patient => patient(&mut fill, profile, new_record),
                RecordKind::Study => study(&mut fill, new_record),
                RecordKind::Series => series(&mut fill, profile, new_record),
                RecordKind::Image => image(&mut fill, profile, &source.sop_class_uid),
                _ => instance(&mut fill, kind, profile),
            }
        }

        if kind.is_instance_level() {
            reference_file(&mut record, ds, source);
        }
        self.copy_character_set(&mut record, ds, &file);
        record.set_origin_file(&file);
        log::debug!("{} {} record for {}", operation, kind, file);
        Ok(record)
    }

    /// Copies SpecificCharacterSet when the record holds text keys and the
    /// file uses an extended character set
    fn copy_character_set(
        &mut self,
        record: &mut DirectoryRecord,
        ds: &InMemDicomObject,
        file: &str,
    ) {
        let extended = get_string_value(ds, SPECIFIC_CHARACTER_SET)
            .map(|cs| !cs.is_empty() && cs != DEFAULT_CHARACTER_SET)
            .unwrap_or(false);
        if extended && has_text_keys(&record.attributes) {
            let mut copier = AttributeCopier::new(record.kind, file, self.diagnostics);
            copier.copy(
                ds,
                &mut record.attributes,
                SPECIFIC_CHARACTER_SET,
                AttributeType::Type1C,
            );
        }
    }
}

fn patient(fill: &mut RecordFill, profile: ApplicationProfile, new_record: bool) {
    fill.key(PATIENT_ID, new_record);
    fill.type2(&[PATIENT_NAME]);
    match profile {
        p if p.has_extended_keys() => fill.type1c(&[PATIENT_BIRTH_DATE, PATIENT_SEX]),
        p if p.is_angiographic() => fill.type2(&[PATIENT_BIRTH_DATE, PATIENT_SEX]),
        _ => {}
    }
}

fn series(fill: &mut RecordFill, profile: ApplicationProfile, new_record: bool) {
    fill.type1(&[MODALITY, SERIES_INSTANCE_UID]);
    fill.key(SERIES_NUMBER, new_record);
    let extra = [INSTITUTION_NAME, INSTITUTION_ADDRESS, PERFORMING_PHYSICIAN_NAME];
    match profile {
        p if p.has_extended_keys() => fill.type1c(&extra),
        p if p.is_angiographic() => {
            for tag in extra {
                fill.with_default(tag, "");
            }
        }
        _ => {}
    }
}

fn image(fill: &mut RecordFill, profile: ApplicationProfile, sop_class_uid: &str) {
    fill.type1(&[INSTANCE_NUMBER]);
    match profile {
        ApplicationProfile::GeneralPurpose => fill.type1c(&[IMAGE_TYPE, REFERENCED_IMAGE_SEQUENCE]),
        ApplicationProfile::GeneralPurposeDvd | ApplicationProfile::UsbAndFlash => {
            fill.type1(&[ROWS, COLUMNS]);
            fill.type1c(&[
                IMAGE_TYPE,
                CALIBRATION_IMAGE,
                LOSSY_IMAGE_COMPRESSION_RATIO,
                FRAME_OF_REFERENCE_UID,
                SYNCHRONIZATION_FRAME_OF_REFERENCE_UID,
                NUMBER_OF_FRAMES,
                ACQUISITION_TIME_SYNCHRONIZED,
                ACQUISITION_DATE_TIME,
                REFERENCED_IMAGE_SEQUENCE,
                IMAGE_POSITION_PATIENT,
                IMAGE_ORIENTATION_PATIENT,
                PIXEL_SPACING,
            ]);
        }
        ApplicationProfile::Mpeg2MpAtMlDvd => {
            fill.type1(&[ROWS, COLUMNS]);
            fill.type1c(&[IMAGE_TYPE, LOSSY_IMAGE_COMPRESSION_RATIO]);
        }
        p if p.is_angiographic() => {
            if p != ApplicationProfile::BasicCardiac {
                fill.type1c(&[LOSSY_IMAGE_COMPRESSION_RATIO]);
            }
            if sop_class_uid == X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE {
                fill.type1(&[IMAGE_TYPE]);
                let plane = get_string_component(fill.ds, IMAGE_TYPE, 2);
                if matches!(plane.as_deref(), Some("BIPLANE A") | Some("BIPLANE B")) {
                    fill.type1(&[REFERENCED_IMAGE_SEQUENCE]);
                }
            }
            fill.with_default(CALIBRATION_IMAGE, "");
        }
        ApplicationProfile::CtAndMr => {
            fill.type1(&[ROWS, COLUMNS]);
            fill.type1c(&[
                REFERENCED_IMAGE_SEQUENCE,
                IMAGE_POSITION_PATIENT,
                IMAGE_ORIENTATION_PATIENT,
                FRAME_OF_REFERENCE_UID,
                PIXEL_SPACING,
            ]);
        }
        _ => {}
    }
}

fn study(fill: &mut RecordFill, new_record: bool) {
    let date = alternative_value(fill.ds, &[SERIES_DATE, ACQUISITION_DATE, CONTENT_DATE])
        .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d").to_string());
    let time = alternative_value(fill.ds, &[SERIES_TIME, ACQUISITION_TIME, CONTENT_TIME])
        .unwrap_or_else(|| chrono::Local::now().format("%H%M%S").to_string());
    fill.with_default(STUDY_DATE, &date);
    fill.with_default(STUDY_TIME, &time);
    fill.type2(&[STUDY_DESCRIPTION]);
    fill.type1(&[STUDY_INSTANCE_UID]);
    fill.key(STUDY_ID, new_record);
    fill.type2(&[ACCESSION_NUMBER]);
}

/// First of `tags` with a value in `ds`
fn alternative_value(ds: &InMemDicomObject, tags: &[Tag]) -> Option<String> {
    tags.iter()
        .filter_map(|&tag| get_string_value(ds, tag))
        .find(|value| !value.is_empty())
}

fn instance(fill: &mut RecordFill, kind: RecordKind, profile: ApplicationProfile) {
    match kind {
        RecordKind::Overlay => fill.type1(&[OVERLAY_NUMBER]),
        RecordKind::ModalityLut | RecordKind::VoiLut => fill.type1(&[LUT_NUMBER]),
        RecordKind::Curve => fill.type1(&[CURVE_NUMBER]),
        RecordKind::SrDocument => {
            fill.type1(&[
                INSTANCE_NUMBER,
                COMPLETION_FLAG,
                VERIFICATION_FLAG,
                CONTENT_DATE,
                CONTENT_TIME,
            ]);
            if get_string_value(fill.ds, VERIFICATION_FLAG).as_deref() == Some("VERIFIED") {
                match sequence_items(fill.ds, VERIFYING_OBSERVER_SEQUENCE).last() {
                    Some(observer) => fill.copier.copy(
                        observer,
                        fill.record,
                        VERIFICATION_DATE_TIME,
                        AttributeType::Type1,
                    ),
                    None => {
                        insert_empty(fill.record, VERIFICATION_DATE_TIME);
                        fill.copier.report_missing(VERIFYING_OBSERVER_SEQUENCE);
                    }
                }
            }
            fill.type1(&[CONCEPT_NAME_CODE_SEQUENCE]);
            copy_concept_modifiers(fill);
        }
        RecordKind::Presentation => {
            fill.type1(&[INSTANCE_NUMBER, CONTENT_LABEL]);
            fill.type2(&[CONTENT_DESCRIPTION]);
            fill.type1(&[PRESENTATION_CREATION_DATE, PRESENTATION_CREATION_TIME]);
            fill.type2(&[CONTENT_CREATOR_NAME]);
            fill.type1c(&[REFERENCED_SERIES_SEQUENCE]);
            copy_blending_sequence(fill);
        }
        RecordKind::Waveform => fill.type1(&[INSTANCE_NUMBER, CONTENT_DATE, CONTENT_TIME]),
        RecordKind::RtDose => {
            fill.type1(&[INSTANCE_NUMBER, DOSE_SUMMATION_TYPE]);
            fill.type3(&[DOSE_COMMENT]);
        }
        RecordKind::RtStructureSet => {
            fill.type1(&[INSTANCE_NUMBER, STRUCTURE_SET_LABEL]);
            fill.type2(&[STRUCTURE_SET_DATE, STRUCTURE_SET_TIME]);
        }
        RecordKind::RtPlan => {
            fill.type1(&[INSTANCE_NUMBER, RT_PLAN_LABEL]);
            fill.type2(&[RT_PLAN_DATE, RT_PLAN_TIME]);
        }
        RecordKind::RtTreatRecord => {
            fill.type1(&[INSTANCE_NUMBER]);
            fill.type2(&[TREATMENT_DATE, TREATMENT_TIME]);
        }
        RecordKind::StoredPrint => fill.type2(&[INSTANCE_NUMBER]),
        RecordKind::KeyObjectDoc => {
            fill.type1(&[
                INSTANCE_NUMBER,
                CONTENT_DATE,
                CONTENT_TIME,
                CONCEPT_NAME_CODE_SEQUENCE,
            ]);
            copy_concept_modifiers(fill);
        }
        RecordKind::Registration
        | RecordKind::Fiducial
        | RecordKind::ValueMap
        | RecordKind::Surface
        | RecordKind::Measurement => {
            fill.type1(&[CONTENT_DATE, CONTENT_TIME, INSTANCE_NUMBER, CONTENT_LABEL]);
            fill.type2(&[CONTENT_DESCRIPTION, CONTENT_CREATOR_NAME]);
        }
        RecordKind::RawData => {
            fill.type1(&[CONTENT_DATE, CONTENT_TIME]);
            fill.type2(&[INSTANCE_NUMBER]);
        }
        RecordKind::Spectroscopy => {
            fill.type1(&[IMAGE_TYPE, CONTENT_DATE, CONTENT_TIME, INSTANCE_NUMBER]);
            fill.type1c(&[REFERENCED_IMAGE_EVIDENCE_SEQUENCE]);
            fill.type1(&[
                NUMBER_OF_FRAMES,
                ROWS,
                COLUMNS,
                DATA_POINT_ROWS,
                DATA_POINT_COLUMNS,
            ]);
            if matches!(
                profile,
                ApplicationProfile::GeneralPurposeDvd | ApplicationProfile::UsbAndFlash
            ) {
                fill.type1c(&[
                    FRAME_OF_REFERENCE_UID,
                    SYNCHRONIZATION_FRAME_OF_REFERENCE_UID,
                    ACQUISITION_TIME_SYNCHRONIZED,
                    ACQUISITION_DATE_TIME,
                    REFERENCED_IMAGE_SEQUENCE,
                    IMAGE_POSITION_PATIENT,
                    IMAGE_ORIENTATION_PATIENT,
                    PIXEL_SPACING,
                ]);
            }
        }
        RecordKind::EncapDoc => {
            fill.type2(&[CONTENT_DATE, CONTENT_TIME]);
            fill.type1(&[INSTANCE_NUMBER]);
            fill.type2(&[DOCUMENT_TITLE]);
            fill.type1c(&[HL7_INSTANCE_IDENTIFIER]);
            fill.type2(&[CONCEPT_NAME_CODE_SEQUENCE]);
            fill.type1(&[MIME_TYPE_OF_ENCAPSULATED_DOCUMENT]);
        }
        RecordKind::HangingProtocol => {
            fill.type1(&[
                HANGING_PROTOCOL_NAME,
                HANGING_PROTOCOL_DESCRIPTION,
                HANGING_PROTOCOL_LEVEL,
                HANGING_PROTOCOL_CREATOR,
                HANGING_PROTOCOL_CREATION_DATE_TIME,
                HANGING_PROTOCOL_DEFINITION_SEQUENCE,
                NUMBER_OF_PRIORS_REFERENCED,
            ]);
            fill.type2(&[HANGING_PROTOCOL_USER_IDENTIFICATION_CODE_SEQUENCE]);
        }
        RecordKind::Palette => {
            fill.type1(&[CONTENT_LABEL]);
            fill.type2(&[CONTENT_DESCRIPTION]);
        }
        RecordKind::Implant => {
            fill.type1(&[MANUFACTURER, IMPLANT_NAME]);
            fill.type1c(&[IMPLANT_SIZE]);
            fill.type1(&[IMPLANT_PART_NUMBER]);
        }
        RecordKind::ImplantAssy => fill.type1(&[
            IMPLANT_ASSEMBLY_TEMPLATE_NAME,
            IMPLANT_ASSEMBLY_TEMPLATE_ISSUER,
            PROCEDURE_TYPE_CODE_SEQUENCE,
        ]),
        RecordKind::ImplantGroup => {
            fill.type1(&[IMPLANT_TEMPLATE_GROUP_NAME]);
            fill.type3(&[IMPLANT_TEMPLATE_GROUP_DESCRIPTION]);
            fill.type1(&[IMPLANT_TEMPLATE_GROUP_ISSUER]);
        }
        RecordKind::Stereometric => {}
        RecordKind::Root
        | RecordKind::Patient
        | RecordKind::Study
        | RecordKind::Series
        | RecordKind::Image => {}
    }
}

/// Keeps the HAS CONCEPT MOD items of the content sequence
fn copy_concept_modifiers(fill: &mut RecordFill) {
    let modifiers: Vec<InMemDicomObject> = sequence_items(fill.ds, CONTENT_SEQUENCE)
        .iter()
        .filter(|item| {
            get_string_value(item, RELATIONSHIP_TYPE).as_deref() == Some("HAS CONCEPT MOD")
        })
        .cloned()
        .collect();
    if !modifiers.is_empty() {
        put_sequence(fill.record, CONTENT_SEQUENCE, modifiers);
    }
}

/// Keeps the study and series references of the first two blending items
fn copy_blending_sequence(fill: &mut RecordFill) {
    let items = sequence_items(fill.ds, BLENDING_SEQUENCE);
    if items.is_empty() {
        return;
    }
    let trimmed: Vec<InMemDicomObject> = items
        .iter()
        .take(MAX_BLENDING_ITEMS)
        .map(|item| {
            let mut trimmed = InMemDicomObject::new_empty();
            for tag in [STUDY_INSTANCE_UID, REFERENCED_SERIES_SEQUENCE] {
                if let Ok(elem) = item.element(tag) {
                    trimmed.put(elem.clone());
                }
            }
            trimmed
        })
        .collect();
    put_sequence(fill.record, BLENDING_SEQUENCE, trimmed);
}

/// Stores the referenced SOP class, instance and transfer syntax of the file
fn reference_file(record: &mut DirectoryRecord, ds: &InMemDicomObject, source: &SourceFile) {
    record.referenced_file_id = Some(source.file_id.clone());
    let attrs = &mut record.attributes;
    put_string(attrs, REFERENCED_SOP_CLASS_UID_IN_FILE, &source.sop_class_uid);
    match get_string_value(ds, SOP_INSTANCE_UID) {
        Some(uid) => put_string(attrs, REFERENCED_SOP_INSTANCE_UID_IN_FILE, &uid),
        None => insert_empty(attrs, REFERENCED_SOP_INSTANCE_UID_IN_FILE),
    }
    put_string(
        attrs,
        REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE,
        &source.transfer_syntax_uid,
    );
}

/// Returns whether any valued record key is a text attribute
fn has_text_keys(attributes: &InMemDicomObject) -> bool {
    attributes.iter().any(|elem| {
        matches!(
            elem.vr(),
            VR::PN | VR::LO | VR::SH | VR::ST | VR::LT | VR::UT | VR::UC
        ) && element_has_value(elem)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_dictionary_std::uids::*;
    use std::path::PathBuf;
    use crate::types::DiagnosticKind;

    fn source(sop_class_uid: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("IMAGES/CT1"),
            file_id: "IMAGES\\CT1".to_string(),
            sop_class_uid: sop_class_uid.to_string(),
            transfer_syntax_uid: EXPLICIT_VR_LITTLE_ENDIAN.to_string(),
        }
    }

    fn ct_dataset() -> InMemDicomObject {
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, SOP_CLASS_UID, CT_IMAGE_STORAGE);
        put_string(&mut ds, SOP_INSTANCE_UID, "1.2.3.4.5");
        put_string(&mut ds, PATIENT_ID, "P1");
        put_string(&mut ds, PATIENT_NAME, "Doe^Jane");
        put_string(&mut ds, STUDY_INSTANCE_UID, "S1");
        put_string(&mut ds, STUDY_DATE, "20240101");
        put_string(&mut ds, STUDY_TIME, "120000");
        put_string(&mut ds, STUDY_ID, "1");
        put_string(&mut ds, SERIES_INSTANCE_UID, "SE1");
        put_string(&mut ds, SERIES_NUMBER, "1");
        put_string(&mut ds, MODALITY, "CT");
        put_string(&mut ds, INSTANCE_NUMBER, "1");
        put_u16(&mut ds, ROWS, 512);
        put_u16(&mut ds, COLUMNS, 512);
        ds
    }

    fn build(
        profile: ApplicationProfile,
        kind: RecordKind,
        ds: &InMemDicomObject,
        diags: &mut Diagnostics,
    ) -> DirectoryRecord {
        RecordBuilder::new(profile, diags)
            .build(kind, None, ds, &source(CT_IMAGE_STORAGE))
            .unwrap()
    }

    #[test]
    fn test_image_record_references_file() {
        let mut diags = Diagnostics::new();
        let record = build(
            ApplicationProfile::CtAndMr,
            RecordKind::Image,
            &ct_dataset(),
            &mut diags,
        );
        assert_eq!(record.referenced_file_id.as_deref(), Some("IMAGES\\CT1"));
        assert_eq!(
            record.string_value(REFERENCED_SOP_INSTANCE_UID_IN_FILE).as_deref(),
            Some("1.2.3.4.5")
        );
        assert_eq!(record.string_value(ROWS).as_deref(), Some("512"));
        assert_eq!(record.origin_file.as_deref(), Some("IMAGES/CT1"));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_missing_patient_id_gets_placeholder() {
        let mut ds = ct_dataset();
        ds.remove_element(PATIENT_ID);
        let mut diags = Diagnostics::new();
        let record = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Patient,
            &ds,
            &mut diags,
        );
        assert!(exists(&record.attributes, PATIENT_ID));
        assert!(!exists_with_value(&record.attributes, PATIENT_ID));
        assert!(diags.has_kind(DiagnosticKind::MandatoryAttributeEmpty));
        assert!(record.referenced_file_id.is_none());
    }

    #[test]
    fn test_update_keeps_existing_key() {
        let mut diags = Diagnostics::new();
        let patient = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Patient,
            &ct_dataset(),
            &mut diags,
        );
        let mut ds = ct_dataset();
        ds.remove_element(PATIENT_ID);
        let updated = RecordBuilder::new(ApplicationProfile::GeneralPurpose, &mut diags)
            .build(RecordKind::Patient, Some(patient), &ds, &source(CT_IMAGE_STORAGE))
            .unwrap();
        assert_eq!(updated.string_value(PATIENT_ID).as_deref(), Some("P1"));
    }

    #[test]
    fn test_study_date_falls_back_to_series_date() {
        let mut ds = ct_dataset();
        ds.remove_element(STUDY_DATE);
        put_string(&mut ds, SERIES_DATE, "20230505");
        let mut diags = Diagnostics::new();
        let record = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Study,
            &ds,
            &mut diags,
        );
        assert_eq!(record.string_value(STUDY_DATE).as_deref(), Some("20230505"));
        assert!(diags.has_kind(DiagnosticKind::DefaultValue));
    }

    #[test]
    fn test_study_time_falls_back_to_now() {
        let mut ds = ct_dataset();
        ds.remove_element(STUDY_TIME);
        let mut diags = Diagnostics::new();
        let record = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Study,
            &ds,
            &mut diags,
        );
        let time = record.string_value(STUDY_TIME).unwrap();
        assert_eq!(time.len(), 6);
    }

    #[test]
    fn test_sr_keeps_concept_modifiers_only() {
        let mut ds = ct_dataset();
        let mut modifier = InMemDicomObject::new_empty();
        put_string(&mut modifier, RELATIONSHIP_TYPE, "HAS CONCEPT MOD");
        let mut contains = InMemDicomObject::new_empty();
        put_string(&mut contains, RELATIONSHIP_TYPE, "CONTAINS");
        put_sequence(&mut ds, CONTENT_SEQUENCE, vec![contains, modifier]);

        let mut diags = Diagnostics::new();
        let record = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::SrDocument,
            &ds,
            &mut diags,
        );
        assert_eq!(sequence_items(&record.attributes, CONTENT_SEQUENCE).len(), 1);
    }

    #[test]
    fn test_blending_sequence_trimmed() {
        let mut ds = ct_dataset();
        let items = (0..3)
            .map(|i| {
                let mut item = InMemDicomObject::new_empty();
                put_string(&mut item, STUDY_INSTANCE_UID, &format!("1.2.{}", i));
                put_string(&mut item, MODALITY, "CT");
                item
            })
            .collect();
        put_sequence(&mut ds, BLENDING_SEQUENCE, items);

        let mut diags = Diagnostics::new();
        let record = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Presentation,
            &ds,
            &mut diags,
        );
        let blending = sequence_items(&record.attributes, BLENDING_SEQUENCE);
        assert_eq!(blending.len(), 2);
        assert!(!exists(&blending[0], MODALITY));
        assert_eq!(
            get_string_value(&blending[1], STUDY_INSTANCE_UID).as_deref(),
            Some("1.2.1")
        );
    }

    #[test]
    fn test_character_set_copied_for_text_keys() {
        let mut ds = ct_dataset();
        put_string(&mut ds, SPECIFIC_CHARACTER_SET, "ISO_IR 100");
        let mut diags = Diagnostics::new();
        let patient = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Patient,
            &ds,
            &mut diags,
        );
        assert!(exists(&patient.attributes, SPECIFIC_CHARACTER_SET));

        let overlay_ds = {
            let mut ds = InMemDicomObject::new_empty();
            put_string(&mut ds, SPECIFIC_CHARACTER_SET, "ISO_IR 100");
            put_string(&mut ds, OVERLAY_NUMBER, "1");
            ds
        };
        let overlay = build(
            ApplicationProfile::GeneralPurpose,
            RecordKind::Overlay,
            &overlay_ds,
            &mut diags,
        );
        assert!(!exists(&overlay.attributes, SPECIFIC_CHARACTER_SET));
    }

    #[test]
    fn test_kind_mismatch_fails() {
        let mut diags = Diagnostics::new();
        let series = DirectoryRecord::new(RecordKind::Series);
        let err = RecordBuilder::new(ApplicationProfile::GeneralPurpose, &mut diags)
            .build(
                RecordKind::Study,
                Some(series),
                &ct_dataset(),
                &source(CT_IMAGE_STORAGE),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot update Study record");
    }

    #[test]
    fn test_xa_biplane_references_images() {
        let mut ds = ct_dataset();
        put_string(&mut ds, MODALITY, "XA");
        put_string_with_vr(&mut ds, IMAGE_TYPE, VR::CS, "ORIGINAL\\PRIMARY\\BIPLANE A");
        let mut diags = Diagnostics::new();
        let record = RecordBuilder::new(ApplicationProfile::XrayAngiographic, &mut diags)
            .build(
                RecordKind::Image,
                None,
                &ds,
                &source(X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE),
            )
            .unwrap();
        assert!(exists(&record.attributes, REFERENCED_IMAGE_SEQUENCE));
        assert!(exists(&record.attributes, CALIBRATION_IMAGE));
        assert!(diags.has_kind(DiagnosticKind::MandatoryAttributeEmpty));
    }
}

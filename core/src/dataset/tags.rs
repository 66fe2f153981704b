use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom_core::value::{DataSetSequence, PrimitiveValue, Value};
use dicom_core::{Length, Tag, VR};
use dicom_dictionary_std::StandardDataDictionary;
use dicom_object::mem::InMemElement;
use dicom_object::InMemDicomObject;

// File Meta Tags
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);

// Directory Structure Tags
pub const FILE_SET_ID: Tag = Tag(0x0004, 0x1130);
pub const FILE_SET_DESCRIPTOR_FILE_ID: Tag = Tag(0x0004, 0x1141);
pub const SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE: Tag = Tag(0x0004, 0x1142);
pub const OFFSET_OF_FIRST_ROOT_RECORD: Tag = Tag(0x0004, 0x1200);
pub const OFFSET_OF_LAST_ROOT_RECORD: Tag = Tag(0x0004, 0x1202);
pub const FILE_SET_CONSISTENCY_FLAG: Tag = Tag(0x0004, 0x1212);
pub const DIRECTORY_RECORD_SEQUENCE: Tag = Tag(0x0004, 0x1220);
pub const OFFSET_OF_NEXT_RECORD: Tag = Tag(0x0004, 0x1400);
pub const RECORD_IN_USE_FLAG: Tag = Tag(0x0004, 0x1410);
pub const OFFSET_OF_LOWER_LEVEL_ENTITY: Tag = Tag(0x0004, 0x1420);
pub const DIRECTORY_RECORD_TYPE: Tag = Tag(0x0004, 0x1430);
pub const REFERENCED_FILE_ID: Tag = Tag(0x0004, 0x1500);
pub const REFERENCED_SOP_CLASS_UID_IN_FILE: Tag = Tag(0x0004, 0x1510);
pub const REFERENCED_SOP_INSTANCE_UID_IN_FILE: Tag = Tag(0x0004, 0x1511);
pub const REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE: Tag = Tag(0x0004, 0x1512);

// SOP Common Tags
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);

// Date/Time Tags
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const ACQUISITION_DATE: Tag = Tag(0x0008, 0x0022);
pub const CONTENT_DATE: Tag = Tag(0x0008, 0x0023);
pub const ACQUISITION_DATE_TIME: Tag = Tag(0x0008, 0x002A);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const ACQUISITION_TIME: Tag = Tag(0x0008, 0x0032);
pub const CONTENT_TIME: Tag = Tag(0x0008, 0x0033);

// Study/Series Identification Tags
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
pub const OVERLAY_NUMBER: Tag = Tag(0x0020, 0x0022);
pub const CURVE_NUMBER: Tag = Tag(0x0020, 0x0024);
pub const LUT_NUMBER: Tag = Tag(0x0020, 0x0026);

// Patient Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);

// Institution/Device Tags
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);
pub const INSTITUTION_ADDRESS: Tag = Tag(0x0008, 0x0081);
pub const PERFORMING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x1050);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);
pub const DETECTOR_ID: Tag = Tag(0x0018, 0x700A);
pub const DETECTOR_MANUFACTURER_NAME: Tag = Tag(0x0018, 0x702A);
pub const DETECTOR_MANUFACTURER_MODEL_NAME: Tag = Tag(0x0018, 0x702B);

// Image Reference Tags
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
pub const REFERENCED_IMAGE_SEQUENCE: Tag = Tag(0x0008, 0x1140);
pub const REFERENCED_IMAGE_EVIDENCE_SEQUENCE: Tag = Tag(0x0008, 0x9092);
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag(0x0020, 0x0037);
pub const FRAME_OF_REFERENCE_UID: Tag = Tag(0x0020, 0x0052);
pub const SYNCHRONIZATION_FRAME_OF_REFERENCE_UID: Tag = Tag(0x0020, 0x0200);
pub const ACQUISITION_TIME_SYNCHRONIZED: Tag = Tag(0x0018, 0x1800);
pub const CALIBRATION_IMAGE: Tag = Tag(0x0050, 0x0004);
pub const LOSSY_IMAGE_COMPRESSION_RATIO: Tag = Tag(0x0028, 0x2112);

// Image Pixel Tags
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
pub const HIGH_BIT: Tag = Tag(0x0028, 0x0102);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const REPRESENTATIVE_FRAME_NUMBER: Tag = Tag(0x0028, 0x6010);
pub const DATA_POINT_ROWS: Tag = Tag(0x0028, 0x9001);
pub const DATA_POINT_COLUMNS: Tag = Tag(0x0028, 0x9002);
pub const ICON_IMAGE_SEQUENCE: Tag = Tag(0x0088, 0x0200);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// Overlay Plane Tags (group 0x6000, repeating)
pub const OVERLAY_ROWS: Tag = Tag(0x6000, 0x0010);
pub const OVERLAY_COLUMNS: Tag = Tag(0x6000, 0x0011);
pub const OVERLAY_BITS_ALLOCATED: Tag = Tag(0x6000, 0x0100);
pub const OVERLAY_BIT_POSITION: Tag = Tag(0x6000, 0x0102);
pub const OVERLAY_DATA: Tag = Tag(0x6000, 0x3000);

// Structured Report Tags
pub const VERIFICATION_DATE_TIME: Tag = Tag(0x0040, 0xA030);
pub const RELATIONSHIP_TYPE: Tag = Tag(0x0040, 0xA010);
pub const CONCEPT_NAME_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA043);
pub const VERIFYING_OBSERVER_SEQUENCE: Tag = Tag(0x0040, 0xA073);
pub const COMPLETION_FLAG: Tag = Tag(0x0040, 0xA491);
pub const VERIFICATION_FLAG: Tag = Tag(0x0040, 0xA493);
pub const CONTENT_SEQUENCE: Tag = Tag(0x0040, 0xA730);

// Presentation State Tags
pub const CONTENT_LABEL: Tag = Tag(0x0070, 0x0080);
pub const CONTENT_DESCRIPTION: Tag = Tag(0x0070, 0x0081);
pub const PRESENTATION_CREATION_DATE: Tag = Tag(0x0070, 0x0082);
pub const PRESENTATION_CREATION_TIME: Tag = Tag(0x0070, 0x0083);
pub const CONTENT_CREATOR_NAME: Tag = Tag(0x0070, 0x0084);
pub const BLENDING_SEQUENCE: Tag = Tag(0x0070, 0x0402);

// Radiotherapy Tags
pub const DOSE_COMMENT: Tag = Tag(0x3004, 0x0006);
pub const DOSE_SUMMATION_TYPE: Tag = Tag(0x3004, 0x000A);
pub const STRUCTURE_SET_LABEL: Tag = Tag(0x3006, 0x0002);
pub const STRUCTURE_SET_DATE: Tag = Tag(0x3006, 0x0008);
pub const STRUCTURE_SET_TIME: Tag = Tag(0x3006, 0x0009);
pub const TREATMENT_DATE: Tag = Tag(0x3008, 0x0250);
pub const TREATMENT_TIME: Tag = Tag(0x3008, 0x0251);
pub const RT_PLAN_LABEL: Tag = Tag(0x300A, 0x0002);
pub const RT_PLAN_DATE: Tag = Tag(0x300A, 0x0006);
pub const RT_PLAN_TIME: Tag = Tag(0x300A, 0x0007);

// Encapsulated Document Tags
pub const HL7_INSTANCE_IDENTIFIER: Tag = Tag(0x0040, 0xE001);
pub const DOCUMENT_TITLE: Tag = Tag(0x0042, 0x0010);
pub const MIME_TYPE_OF_ENCAPSULATED_DOCUMENT: Tag = Tag(0x0042, 0x0012);

// Hanging Protocol Tags
pub const HANGING_PROTOCOL_NAME: Tag = Tag(0x0072, 0x0002);
pub const HANGING_PROTOCOL_DESCRIPTION: Tag = Tag(0x0072, 0x0004);
pub const HANGING_PROTOCOL_LEVEL: Tag = Tag(0x0072, 0x0006);
pub const HANGING_PROTOCOL_CREATOR: Tag = Tag(0x0072, 0x0008);
pub const HANGING_PROTOCOL_CREATION_DATE_TIME: Tag = Tag(0x0072, 0x000A);
pub const HANGING_PROTOCOL_DEFINITION_SEQUENCE: Tag = Tag(0x0072, 0x000C);
pub const HANGING_PROTOCOL_USER_IDENTIFICATION_CODE_SEQUENCE: Tag = Tag(0x0072, 0x000E);
pub const NUMBER_OF_PRIORS_REFERENCED: Tag = Tag(0x0072, 0x0014);

// Implant Template Tags
pub const IMPLANT_NAME: Tag = Tag(0x0022, 0x1095);
pub const IMPLANT_PART_NUMBER: Tag = Tag(0x0022, 0x1097);
pub const IMPLANT_SIZE: Tag = Tag(0x0068, 0x6210);
pub const IMPLANT_ASSEMBLY_TEMPLATE_NAME: Tag = Tag(0x0076, 0x0001);
pub const IMPLANT_ASSEMBLY_TEMPLATE_ISSUER: Tag = Tag(0x0076, 0x0003);
pub const PROCEDURE_TYPE_CODE_SEQUENCE: Tag = Tag(0x0076, 0x0020);
pub const IMPLANT_TEMPLATE_GROUP_NAME: Tag = Tag(0x0078, 0x0001);
pub const IMPLANT_TEMPLATE_GROUP_DESCRIPTION: Tag = Tag(0x0078, 0x0010);
pub const IMPLANT_TEMPLATE_GROUP_ISSUER: Tag = Tag(0x0078, 0x0020);

// Ultrasound Region Calibration Tags
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);
pub const REGION_SPATIAL_FORMAT: Tag = Tag(0x0018, 0x6012);
pub const REGION_DATA_TYPE: Tag = Tag(0x0018, 0x6014);
pub const REGION_FLAGS: Tag = Tag(0x0018, 0x6016);
pub const REGION_LOCATION_MIN_X0: Tag = Tag(0x0018, 0x6018);
pub const REGION_LOCATION_MIN_Y0: Tag = Tag(0x0018, 0x601A);
pub const REGION_LOCATION_MAX_X1: Tag = Tag(0x0018, 0x601C);
pub const REGION_LOCATION_MAX_Y1: Tag = Tag(0x0018, 0x601E);
pub const PHYSICAL_UNITS_X_DIRECTION: Tag = Tag(0x0018, 0x6024);
pub const PHYSICAL_UNITS_Y_DIRECTION: Tag = Tag(0x0018, 0x6026);
pub const PHYSICAL_DELTA_X: Tag = Tag(0x0018, 0x602C);
pub const PHYSICAL_DELTA_Y: Tag = Tag(0x0018, 0x602E);
pub const PIXEL_COMPONENT_ORGANIZATION: Tag = Tag(0x0018, 0x6044);
pub const PIXEL_COMPONENT_MASK: Tag = Tag(0x0018, 0x6046);
pub const PIXEL_COMPONENT_RANGE_START: Tag = Tag(0x0018, 0x6048);
pub const PIXEL_COMPONENT_RANGE_STOP: Tag = Tag(0x0018, 0x604A);
pub const PIXEL_COMPONENT_PHYSICAL_UNITS: Tag = Tag(0x0018, 0x604C);
pub const PIXEL_COMPONENT_DATA_TYPE: Tag = Tag(0x0018, 0x604E);
pub const NUMBER_OF_TABLE_BREAK_POINTS: Tag = Tag(0x0018, 0x6050);
pub const TABLE_OF_X_BREAK_POINTS: Tag = Tag(0x0018, 0x6052);
pub const TABLE_OF_Y_BREAK_POINTS: Tag = Tag(0x0018, 0x6054);
pub const NUMBER_OF_TABLE_ENTRIES: Tag = Tag(0x0018, 0x6056);
pub const TABLE_OF_PIXEL_VALUES: Tag = Tag(0x0018, 0x6058);
pub const TABLE_OF_PARAMETER_VALUES: Tag = Tag(0x0018, 0x605A);

/// Value representations of the attributes written into directory records
static TAG_VRS: &[(Tag, VR)] = &[
    (FILE_SET_ID, VR::CS),
    (FILE_SET_DESCRIPTOR_FILE_ID, VR::CS),
    (SPECIFIC_CHARACTER_SET_OF_FILE_SET_DESCRIPTOR_FILE, VR::CS),
    (OFFSET_OF_FIRST_ROOT_RECORD, VR::UL),
    (OFFSET_OF_LAST_ROOT_RECORD, VR::UL),
    (FILE_SET_CONSISTENCY_FLAG, VR::US),
    (DIRECTORY_RECORD_SEQUENCE, VR::SQ),
    (OFFSET_OF_NEXT_RECORD, VR::UL),
    (RECORD_IN_USE_FLAG, VR::US),
    (OFFSET_OF_LOWER_LEVEL_ENTITY, VR::UL),
    (DIRECTORY_RECORD_TYPE, VR::CS),
    (REFERENCED_FILE_ID, VR::CS),
    (REFERENCED_SOP_CLASS_UID_IN_FILE, VR::UI),
    (REFERENCED_SOP_INSTANCE_UID_IN_FILE, VR::UI),
    (REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE, VR::UI),
    (SPECIFIC_CHARACTER_SET, VR::CS),
    (IMAGE_TYPE, VR::CS),
    (SOP_CLASS_UID, VR::UI),
    (SOP_INSTANCE_UID, VR::UI),
    (STUDY_DATE, VR::DA),
    (SERIES_DATE, VR::DA),
    (ACQUISITION_DATE, VR::DA),
    (CONTENT_DATE, VR::DA),
    (ACQUISITION_DATE_TIME, VR::DT),
    (STUDY_TIME, VR::TM),
    (SERIES_TIME, VR::TM),
    (ACQUISITION_TIME, VR::TM),
    (CONTENT_TIME, VR::TM),
    (ACCESSION_NUMBER, VR::SH),
    (MODALITY, VR::CS),
    (STUDY_DESCRIPTION, VR::LO),
    (STUDY_INSTANCE_UID, VR::UI),
    (SERIES_INSTANCE_UID, VR::UI),
    (STUDY_ID, VR::SH),
    (SERIES_NUMBER, VR::IS),
    (INSTANCE_NUMBER, VR::IS),
    (OVERLAY_NUMBER, VR::IS),
    (CURVE_NUMBER, VR::IS),
    (LUT_NUMBER, VR::IS),
    (PATIENT_NAME, VR::PN),
    (PATIENT_ID, VR::LO),
    (PATIENT_BIRTH_DATE, VR::DA),
    (PATIENT_SEX, VR::CS),
    (MANUFACTURER, VR::LO),
    (INSTITUTION_NAME, VR::LO),
    (INSTITUTION_ADDRESS, VR::ST),
    (PERFORMING_PHYSICIAN_NAME, VR::PN),
    (MANUFACTURER_MODEL_NAME, VR::LO),
    (REFERENCED_SERIES_SEQUENCE, VR::SQ),
    (REFERENCED_IMAGE_SEQUENCE, VR::SQ),
    (REFERENCED_IMAGE_EVIDENCE_SEQUENCE, VR::SQ),
    (IMAGE_POSITION_PATIENT, VR::DS),
    (IMAGE_ORIENTATION_PATIENT, VR::DS),
    (FRAME_OF_REFERENCE_UID, VR::UI),
    (SYNCHRONIZATION_FRAME_OF_REFERENCE_UID, VR::UI),
    (ACQUISITION_TIME_SYNCHRONIZED, VR::CS),
    (CALIBRATION_IMAGE, VR::CS),
    (LOSSY_IMAGE_COMPRESSION_RATIO, VR::DS),
    (SAMPLES_PER_PIXEL, VR::US),
    (PHOTOMETRIC_INTERPRETATION, VR::CS),
    (NUMBER_OF_FRAMES, VR::IS),
    (ROWS, VR::US),
    (COLUMNS, VR::US),
    (PIXEL_SPACING, VR::DS),
    (BITS_ALLOCATED, VR::US),
    (BITS_STORED, VR::US),
    (HIGH_BIT, VR::US),
    (PIXEL_REPRESENTATION, VR::US),
    (DATA_POINT_ROWS, VR::UL),
    (DATA_POINT_COLUMNS, VR::UL),
    (ICON_IMAGE_SEQUENCE, VR::SQ),
    (VERIFICATION_DATE_TIME, VR::DT),
    (RELATIONSHIP_TYPE, VR::CS),
    (CONCEPT_NAME_CODE_SEQUENCE, VR::SQ),
    (COMPLETION_FLAG, VR::CS),
    (VERIFICATION_FLAG, VR::CS),
    (CONTENT_SEQUENCE, VR::SQ),
    (CONTENT_LABEL, VR::CS),
    (CONTENT_DESCRIPTION, VR::LO),
    (PRESENTATION_CREATION_DATE, VR::DA),
    (PRESENTATION_CREATION_TIME, VR::TM),
    (CONTENT_CREATOR_NAME, VR::PN),
    (BLENDING_SEQUENCE, VR::SQ),
    (DOSE_COMMENT, VR::LO),
    (DOSE_SUMMATION_TYPE, VR::CS),
    (STRUCTURE_SET_LABEL, VR::SH),
    (STRUCTURE_SET_DATE, VR::DA),
    (STRUCTURE_SET_TIME, VR::TM),
    (TREATMENT_DATE, VR::DA),
    (TREATMENT_TIME, VR::TM),
    (RT_PLAN_LABEL, VR::SH),
    (RT_PLAN_DATE, VR::DA),
    (RT_PLAN_TIME, VR::TM),
    (HL7_INSTANCE_IDENTIFIER, VR::ST),
    (DOCUMENT_TITLE, VR::ST),
    (MIME_TYPE_OF_ENCAPSULATED_DOCUMENT, VR::LO),
    (HANGING_PROTOCOL_NAME, VR::SH),
    (HANGING_PROTOCOL_DESCRIPTION, VR::LO),
    (HANGING_PROTOCOL_LEVEL, VR::CS),
    (HANGING_PROTOCOL_CREATOR, VR::LO),
    (HANGING_PROTOCOL_CREATION_DATE_TIME, VR::DT),
    (HANGING_PROTOCOL_DEFINITION_SEQUENCE, VR::SQ),
    (HANGING_PROTOCOL_USER_IDENTIFICATION_CODE_SEQUENCE, VR::SQ),
    (NUMBER_OF_PRIORS_REFERENCED, VR::US),
    (IMPLANT_NAME, VR::LO),
    (IMPLANT_PART_NUMBER, VR::LO),
    (IMPLANT_SIZE, VR::LO),
    (IMPLANT_ASSEMBLY_TEMPLATE_NAME, VR::LO),
    (IMPLANT_ASSEMBLY_TEMPLATE_ISSUER, VR::LO),
    (PROCEDURE_TYPE_CODE_SEQUENCE, VR::SQ),
    (IMPLANT_TEMPLATE_GROUP_NAME, VR::LO),
    (IMPLANT_TEMPLATE_GROUP_DESCRIPTION, VR::ST),
    (IMPLANT_TEMPLATE_GROUP_ISSUER, VR::LO),
];

/// Returns the value representation a directory record uses for `tag`
pub fn vr_of(tag: Tag) -> Option<VR> {
    TAG_VRS.iter().find(|(t, _)| *t == tag).map(|(_, vr)| *vr)
}

/// Returns the dictionary keyword of a tag, or its numeric form if unknown
pub fn tag_name(tag: Tag) -> String {
    StandardDataDictionary
        .by_tag(tag)
        .map(|entry| entry.alias().to_string())
        .unwrap_or_else(|| format!("({:04X},{:04X})", tag.group(), tag.element()))
}

/// Returns the keyword followed by the numeric tag, e.g. `PatientID (0010,0020)`
pub fn tag_label(tag: Tag) -> String {
    format!(
        "{} ({:04X},{:04X})",
        tag_name(tag),
        tag.group(),
        tag.element()
    )
}

/// Returns whether an element carries a non-empty value
pub fn element_has_value(elem: &InMemElement) -> bool {
    match elem.value() {
        Value::Primitive(PrimitiveValue::Empty) => false,
        Value::Primitive(v) => v.calculate_byte_len() > 0,
        Value::Sequence(seq) => !seq.items().is_empty(),
        Value::PixelSequence(_) => true,
    }
}

/// Returns whether the tag is present, with or without a value
pub fn exists(dcm: &InMemDicomObject, tag: Tag) -> bool {
    dcm.element(tag).is_ok()
}

/// Returns whether the tag is present with a non-empty value
pub fn exists_with_value(dcm: &InMemDicomObject, tag: Tag) -> bool {
    dcm.element(tag).map(element_has_value).unwrap_or(false)
}

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim_matches(|c: char| c == ' ' || c == '\0').to_string())
}

/// Helper to get integer value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to i32
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}

/// Helper to get multi-string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to Vec<String>
pub fn get_multi_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<String>> {
    dcm.element(tag).ok().and_then(|elem| {
        if let Ok(strs) = elem.to_multi_str() {
            Some(strs.iter().map(|s| s.trim().to_string()).collect())
        } else {
            elem.to_str()
                .ok()
                .map(|s| s.split('\\').map(|part| part.trim().to_string()).collect())
        }
    })
}

/// Returns one component of a multi-valued string attribute
pub fn get_string_component(dcm: &InMemDicomObject, tag: Tag, index: usize) -> Option<String> {
    get_multi_string_value(dcm, tag).and_then(|values| values.into_iter().nth(index))
}

/// Helper to get u16 value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to u16
pub fn get_u16_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u16> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u16>().ok())
}

/// Helper to get u32 value from DICOM tag
pub fn get_u32_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u32>().ok())
}

/// Returns the items of a sequence attribute, or an empty slice
pub fn sequence_items(dcm: &InMemDicomObject, tag: Tag) -> &[InMemDicomObject] {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.value().items())
        .unwrap_or(&[])
}

/// Returns item `index` of a sequence attribute
pub fn sequence_item(dcm: &InMemDicomObject, tag: Tag, index: usize) -> Option<&InMemDicomObject> {
    sequence_items(dcm, tag).get(index)
}

/// Stores a string value, using the record VR of the tag (LO if unknown)
pub fn put_string(dcm: &mut InMemDicomObject, tag: Tag, value: &str) {
    let vr = vr_of(tag).unwrap_or(VR::LO);
    put_string_with_vr(dcm, tag, vr, value);
}

/// Stores a string value with an explicit VR
///
/// Backslash separated values become a multi-valued attribute.
pub fn put_string_with_vr(dcm: &mut InMemDicomObject, tag: Tag, vr: VR, value: &str) {
    let value = if value.contains('\\') {
        PrimitiveValue::Strs(value.split('\\').map(str::to_string).collect())
    } else {
        PrimitiveValue::from(value)
    };
    dcm.put(InMemElement::new(tag, vr, value));
}

/// Stores an unsigned short value
pub fn put_u16(dcm: &mut InMemDicomObject, tag: Tag, value: u16) {
    dcm.put(InMemElement::new(tag, VR::US, PrimitiveValue::from(value)));
}

/// Stores an unsigned long value
pub fn put_u32(dcm: &mut InMemDicomObject, tag: Tag, value: u32) {
    dcm.put(InMemElement::new(tag, VR::UL, PrimitiveValue::from(value)));
}

/// Stores a sequence of undefined length
pub fn put_sequence(dcm: &mut InMemDicomObject, tag: Tag, items: Vec<InMemDicomObject>) {
    dcm.put(InMemElement::new(
        tag,
        VR::SQ,
        DataSetSequence::new(items, Length::UNDEFINED),
    ));
}

/// Inserts the tag without a value
pub fn insert_empty(dcm: &mut InMemDicomObject, tag: Tag) {
    let vr = vr_of(tag).unwrap_or(VR::UN);
    let elem = if vr == VR::SQ {
        InMemElement::new(
            tag,
            VR::SQ,
            DataSetSequence::new(Vec::<InMemDicomObject>::new(), Length::UNDEFINED),
        )
    } else {
        InMemElement::new(tag, vr, PrimitiveValue::Empty)
    };
    dcm.put(elem);
}

/// Returns the element of repeating group `group` (e.g. 0x6002) for an overlay tag
pub fn in_group(tag: Tag, group: u16) -> Tag {
    Tag(group, tag.element())
}

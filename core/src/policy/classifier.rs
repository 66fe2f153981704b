use dicom_dictionary_std::uids::*;
use crate::types::RecordKind;

/// Maps a SOP Class UID to the directory record kind that indexes it
///
/// Unknown SOP classes fall back to [`RecordKind::Image`].
///
/// # Example
///
/// ```
/// use dicomdir_core::policy::classify;
/// use dicomdir_core::RecordKind;
///
/// assert_eq!(classify("1.2.840.10008.5.1.4.1.1.2"), RecordKind::Image);
/// assert_eq!(classify("1.2.840.10008.5.1.4.1.1.88.33"), RecordKind::SrDocument);
/// assert_eq!(classify("1.2.3.4.5"), RecordKind::Image);
/// ```
#[allow(deprecated)]
pub fn classify(sop_class_uid: &str) -> RecordKind {
    match sop_class_uid.trim_end_matches(|c: char| c == '\0' || c == ' ') {
        STANDALONE_OVERLAY_STORAGE => RecordKind::Overlay,
        STANDALONE_MODALITY_LUT_STORAGE => RecordKind::ModalityLut,
        STANDALONE_VOILUT_STORAGE => RecordKind::VoiLut,
        STANDALONE_CURVE_STORAGE | STANDALONE_PET_CURVE_STORAGE => RecordKind::Curve,

        BASIC_TEXT_SR_STORAGE
        | ENHANCED_SR_STORAGE
        | COMPREHENSIVE_SR_STORAGE
        | PROCEDURE_LOG_STORAGE
        | MAMMOGRAPHY_CADSR_STORAGE
        | CHEST_CADSR_STORAGE
        | X_RAY_RADIATION_DOSE_SR_STORAGE
        | COLON_CADSR_STORAGE
        | IMPLANTATION_PLAN_SR_STORAGE
        | SPECTACLE_PRESCRIPTION_REPORT_STORAGE
        | MACULAR_GRID_THICKNESS_AND_VOLUME_REPORT_STORAGE => RecordKind::SrDocument,

        GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE
        | COLOR_SOFTCOPY_PRESENTATION_STATE_STORAGE
        | PSEUDO_COLOR_SOFTCOPY_PRESENTATION_STATE_STORAGE
        | BLENDING_SOFTCOPY_PRESENTATION_STATE_STORAGE
        | XAXRF_GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE
        | BASIC_STRUCTURED_DISPLAY_STORAGE => RecordKind::Presentation,

        TWELVE_LEAD_ECG_WAVEFORM_STORAGE
        | GENERAL_ECG_WAVEFORM_STORAGE
        | AMBULATORY_ECG_WAVEFORM_STORAGE
        | HEMODYNAMIC_WAVEFORM_STORAGE
        | CARDIAC_ELECTROPHYSIOLOGY_WAVEFORM_STORAGE
        | BASIC_VOICE_AUDIO_WAVEFORM_STORAGE
        | GENERAL_AUDIO_WAVEFORM_STORAGE
        | ARTERIAL_PULSE_WAVEFORM_STORAGE
        | RESPIRATORY_WAVEFORM_STORAGE => RecordKind::Waveform,

        RT_DOSE_STORAGE => RecordKind::RtDose,
        RT_STRUCTURE_SET_STORAGE => RecordKind::RtStructureSet,
        RT_PLAN_STORAGE | RT_ION_PLAN_STORAGE => RecordKind::RtPlan,
        RT_BEAMS_TREATMENT_RECORD_STORAGE
        | RT_BRACHY_TREATMENT_RECORD_STORAGE
        | RT_TREATMENT_SUMMARY_RECORD_STORAGE
        | RT_ION_BEAMS_TREATMENT_RECORD_STORAGE => RecordKind::RtTreatRecord,

        STORED_PRINT_STORAGE => RecordKind::StoredPrint,
        KEY_OBJECT_SELECTION_DOCUMENT_STORAGE => RecordKind::KeyObjectDoc,
        SPATIAL_REGISTRATION_STORAGE | DEFORMABLE_SPATIAL_REGISTRATION_STORAGE => {
            RecordKind::Registration
        }
        SPATIAL_FIDUCIALS_STORAGE => RecordKind::Fiducial,
        RAW_DATA_STORAGE => RecordKind::RawData,
        MR_SPECTROSCOPY_STORAGE => RecordKind::Spectroscopy,
        ENCAPSULATED_PDF_STORAGE | ENCAPSULATED_CDA_STORAGE => RecordKind::EncapDoc,
        REAL_WORLD_VALUE_MAPPING_STORAGE => RecordKind::ValueMap,
        HANGING_PROTOCOL_STORAGE => RecordKind::HangingProtocol,
        STEREOMETRIC_RELATIONSHIP_STORAGE => RecordKind::Stereometric,
        COLOR_PALETTE_STORAGE => RecordKind::Palette,
        SURFACE_SEGMENTATION_STORAGE => RecordKind::Surface,

        LENSOMETRY_MEASUREMENTS_STORAGE
        | AUTOREFRACTION_MEASUREMENTS_STORAGE
        | KERATOMETRY_MEASUREMENTS_STORAGE
        | SUBJECTIVE_REFRACTION_MEASUREMENTS_STORAGE
        | VISUAL_ACUITY_MEASUREMENTS_STORAGE
        | OPHTHALMIC_AXIAL_MEASUREMENTS_STORAGE
        | INTRAOCULAR_LENS_CALCULATIONS_STORAGE
        | OPHTHALMIC_VISUAL_FIELD_STATIC_PERIMETRY_MEASUREMENTS_STORAGE => {
            RecordKind::Measurement
        }

        GENERIC_IMPLANT_TEMPLATE_STORAGE => RecordKind::Implant,
        IMPLANT_TEMPLATE_GROUP_STORAGE => RecordKind::ImplantGroup,
        IMPLANT_ASSEMBLY_TEMPLATE_STORAGE => RecordKind::ImplantAssy,

        _ => RecordKind::Image,
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CT_IMAGE_STORAGE, RecordKind::Image)]
    #[case(SEGMENTATION_STORAGE, RecordKind::Image)]
    #[case(STANDALONE_OVERLAY_STORAGE, RecordKind::Overlay)]
    #[case(STANDALONE_PET_CURVE_STORAGE, RecordKind::Curve)]
    #[case(STANDALONE_VOILUT_STORAGE, RecordKind::VoiLut)]
    #[case(KEY_OBJECT_SELECTION_DOCUMENT_STORAGE, RecordKind::KeyObjectDoc)]
    #[case(BLENDING_SOFTCOPY_PRESENTATION_STATE_STORAGE, RecordKind::Presentation)]
    #[case(RT_ION_PLAN_STORAGE, RecordKind::RtPlan)]
    #[case(RT_BRACHY_TREATMENT_RECORD_STORAGE, RecordKind::RtTreatRecord)]
    #[case(ENCAPSULATED_CDA_STORAGE, RecordKind::EncapDoc)]
    #[case(HANGING_PROTOCOL_STORAGE, RecordKind::HangingProtocol)]
    #[case(IMPLANT_ASSEMBLY_TEMPLATE_STORAGE, RecordKind::ImplantAssy)]
    #[case(KERATOMETRY_MEASUREMENTS_STORAGE, RecordKind::Measurement)]
    fn test_classification(#[case] uid: &str, #[case] expected: RecordKind) {
        assert_eq!(classify(uid), expected);
    }

    #[test]
    fn test_padded_uid() {
        assert_eq!(classify("1.2.840.10008.5.1.4.1.1.66.2\0"), RecordKind::Fiducial);
    }

    #[test]
    fn test_unknown_uid_is_image() {
        assert_eq!(classify("1.2.826.0.1.3680043.2.1125.1"), RecordKind::Image);
        assert_eq!(classify(""), RecordKind::Image);
    }
}

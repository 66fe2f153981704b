use crate::dataset::uids::IMAGE_SOP_CLASSES;
use dicom_dictionary_std::uids::*;
use crate::types::{ApplicationProfile, DicomdirConfig};

/// Transfer syntaxes a profile accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSyntaxRule {
    /// Any transfer syntax
    Any,
    /// One of the listed transfer syntaxes
    OneOf(&'static [&'static str]),
}

impl TransferSyntaxRule {
    pub fn accepts(&self, transfer_syntax: &str) -> bool {
        match self {
            TransferSyntaxRule::Any => true,
            TransferSyntaxRule::OneOf(list) => list.iter().any(|uid| *uid == transfer_syntax),
        }
    }
}

/// Icon image requirement of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconPolicy {
    pub size: u32,
    pub required: bool,
}

const EXPLICIT_LE_ONLY: &[&str] = &[EXPLICIT_VR_LITTLE_ENDIAN];
const SV1_ONLY: &[&str] = &[JPEG_LOSSLESS_SV1];
const MPEG2_ONLY: &[&str] = &[MPEG2MPML];
const DVD_SYNTAXES: &[&str] = &[
    EXPLICIT_VR_LITTLE_ENDIAN,
    JPEG_LOSSLESS_SV1,
    JPEG_BASELINE8_BIT,
    JPEG_EXTENDED12_BIT,
    JPEG2000_LOSSLESS,
    JPEG2000,
];
const XA_DVD_SYNTAXES: &[&str] = &[JPEG_LOSSLESS_SV1, JPEG_BASELINE8_BIT, JPEG_EXTENDED12_BIT];
const CTMR_SYNTAXES: &[&str] = &[EXPLICIT_VR_LITTLE_ENDIAN, JPEG_LOSSLESS_SV1];
const US_SYNTAXES: &[&str] = &[EXPLICIT_VR_LITTLE_ENDIAN, RLE_LOSSLESS, JPEG_BASELINE8_BIT];

/// Non-image SOP classes accepted by the general purpose profiles
const GENERAL_NON_IMAGE_SOP_CLASSES: &[&str] = &[
    RT_DOSE_STORAGE,
    RT_STRUCTURE_SET_STORAGE,
    RT_BEAMS_TREATMENT_RECORD_STORAGE,
    RT_PLAN_STORAGE,
    RT_BRACHY_TREATMENT_RECORD_STORAGE,
    RT_TREATMENT_SUMMARY_RECORD_STORAGE,
    RT_ION_PLAN_STORAGE,
    RT_ION_BEAMS_TREATMENT_RECORD_STORAGE,
    BASIC_TEXT_SR_STORAGE,
    ENHANCED_SR_STORAGE,
    COMPREHENSIVE_SR_STORAGE,
    PROCEDURE_LOG_STORAGE,
    MAMMOGRAPHY_CADSR_STORAGE,
    CHEST_CADSR_STORAGE,
    X_RAY_RADIATION_DOSE_SR_STORAGE,
    COLON_CADSR_STORAGE,
    SPECTACLE_PRESCRIPTION_REPORT_STORAGE,
    MACULAR_GRID_THICKNESS_AND_VOLUME_REPORT_STORAGE,
    IMPLANTATION_PLAN_SR_STORAGE,
    TWELVE_LEAD_ECG_WAVEFORM_STORAGE,
    GENERAL_ECG_WAVEFORM_STORAGE,
    AMBULATORY_ECG_WAVEFORM_STORAGE,
    HEMODYNAMIC_WAVEFORM_STORAGE,
    CARDIAC_ELECTROPHYSIOLOGY_WAVEFORM_STORAGE,
    BASIC_VOICE_AUDIO_WAVEFORM_STORAGE,
    GENERAL_AUDIO_WAVEFORM_STORAGE,
    ARTERIAL_PULSE_WAVEFORM_STORAGE,
    RESPIRATORY_WAVEFORM_STORAGE,
    GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE,
    COLOR_SOFTCOPY_PRESENTATION_STATE_STORAGE,
    PSEUDO_COLOR_SOFTCOPY_PRESENTATION_STATE_STORAGE,
    BLENDING_SOFTCOPY_PRESENTATION_STATE_STORAGE,
    XAXRF_GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE,
    BASIC_STRUCTURED_DISPLAY_STORAGE,
    ENCAPSULATED_PDF_STORAGE,
    ENCAPSULATED_CDA_STORAGE,
    SPATIAL_REGISTRATION_STORAGE,
    SPATIAL_FIDUCIALS_STORAGE,
    DEFORMABLE_SPATIAL_REGISTRATION_STORAGE,
    SURFACE_SEGMENTATION_STORAGE,
    LENSOMETRY_MEASUREMENTS_STORAGE,
    AUTOREFRACTION_MEASUREMENTS_STORAGE,
    KERATOMETRY_MEASUREMENTS_STORAGE,
    SUBJECTIVE_REFRACTION_MEASUREMENTS_STORAGE,
    VISUAL_ACUITY_MEASUREMENTS_STORAGE,
    OPHTHALMIC_AXIAL_MEASUREMENTS_STORAGE,
    INTRAOCULAR_LENS_CALCULATIONS_STORAGE,
    OPHTHALMIC_VISUAL_FIELD_STATIC_PERIMETRY_MEASUREMENTS_STORAGE,
    GENERIC_IMPLANT_TEMPLATE_STORAGE,
    IMPLANT_TEMPLATE_GROUP_STORAGE,
    IMPLANT_ASSEMBLY_TEMPLATE_STORAGE,
    KEY_OBJECT_SELECTION_DOCUMENT_STORAGE,
    RAW_DATA_STORAGE,
    MR_SPECTROSCOPY_STORAGE,
    REAL_WORLD_VALUE_MAPPING_STORAGE,
    HANGING_PROTOCOL_STORAGE,
    STEREOMETRIC_RELATIONSHIP_STORAGE,
    COLOR_PALETTE_STORAGE,
];

#[allow(deprecated)]
const GENERAL_RETIRED_SOP_CLASSES: &[&str] = &[
    STORED_PRINT_STORAGE,
    STANDALONE_OVERLAY_STORAGE,
    STANDALONE_CURVE_STORAGE,
    STANDALONE_MODALITY_LUT_STORAGE,
    STANDALONE_VOILUT_STORAGE,
    STANDALONE_PET_CURVE_STORAGE,
];

/// Multi-frame SOP classes that may carry MPEG2 video
const MPEG2_SOP_CLASSES: &[&str] = &[
    BREAST_TOMOSYNTHESIS_IMAGE_STORAGE,
    ENHANCED_CT_IMAGE_STORAGE,
    ENHANCED_MR_COLOR_IMAGE_STORAGE,
    ENHANCED_MR_IMAGE_STORAGE,
    ENHANCED_PET_IMAGE_STORAGE,
    ENHANCED_US_VOLUME_STORAGE,
    ENHANCED_XA_IMAGE_STORAGE,
    ENHANCED_XRF_IMAGE_STORAGE,
    MULTI_FRAME_GRAYSCALE_BYTE_SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_GRAYSCALE_WORD_SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_SINGLE_BIT_SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_TRUE_COLOR_SECONDARY_CAPTURE_IMAGE_STORAGE,
    NUCLEAR_MEDICINE_IMAGE_STORAGE,
    OPHTHALMIC_PHOTOGRAPHY8_BIT_IMAGE_STORAGE,
    OPHTHALMIC_PHOTOGRAPHY16_BIT_IMAGE_STORAGE,
    OPHTHALMIC_TOMOGRAPHY_IMAGE_STORAGE,
    RT_DOSE_STORAGE,
    RT_IMAGE_STORAGE,
    ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE,
    VIDEO_ENDOSCOPIC_IMAGE_STORAGE,
    VIDEO_MICROSCOPIC_IMAGE_STORAGE,
    VIDEO_PHOTOGRAPHIC_IMAGE_STORAGE,
    X_RAY3_D_ANGIOGRAPHIC_IMAGE_STORAGE,
    X_RAY3_D_CRANIOFACIAL_IMAGE_STORAGE,
    X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE,
    X_RAY_RADIOFLUOROSCOPIC_IMAGE_STORAGE,
];

const XA_SOP_CLASSES: &[&str] = &[
    X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE,
    SECONDARY_CAPTURE_IMAGE_STORAGE,
    GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE,
];
#[allow(deprecated)]
const XA_RETIRED_SOP_CLASSES: &[&str] = &[STANDALONE_OVERLAY_STORAGE, STANDALONE_CURVE_STORAGE];

const DENTAL_SOP_CLASSES: &[&str] = &[
    DIGITAL_INTRA_ORAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    BASIC_STRUCTURED_DISPLAY_STORAGE,
    GRAYSCALE_SOFTCOPY_PRESENTATION_STATE_STORAGE,
];
const CTMR_SOP_CLASSES: &[&str] = &[
    CT_IMAGE_STORAGE,
    MR_IMAGE_STORAGE,
    SECONDARY_CAPTURE_IMAGE_STORAGE,
];
const US_SINGLE_FRAME_SOP_CLASSES: &[&str] = &[ULTRASOUND_IMAGE_STORAGE];
const US_MULTI_FRAME_SOP_CLASSES: &[&str] =
    &[ULTRASOUND_IMAGE_STORAGE, ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE];

/// Declarative policy of one application profile
///
/// Built once per session from the configuration and queried by
/// [`crate::policy::validate`] and the record builders.
#[derive(Debug, Clone)]
pub struct ProfilePolicy {
    pub profile: ApplicationProfile,
    sop_classes: Vec<&'static str>,
    transfer_syntaxes: TransferSyntaxRule,
    xa_transfer_syntaxes: Option<TransferSyntaxRule>,
    icon: Option<IconPolicy>,
    pub reject_transfer_syntax: bool,
    pub reject_encoding: bool,
    pub reject_resolution: bool,
}

impl ProfilePolicy {
    /// Builds the policy selected by `config`
    ///
    /// # Example
    ///
    /// ```
    /// use dicomdir_core::policy::ProfilePolicy;
    /// use dicomdir_core::{ApplicationProfile, DicomdirConfig};
    ///
    /// let config = DicomdirConfig::default().with_profile(ApplicationProfile::CtAndMr);
    /// let policy = ProfilePolicy::new(&config);
    /// assert!(policy.allows_sop_class("1.2.840.10008.5.1.4.1.1.2"));
    /// assert!(!policy.allows_sop_class("1.2.840.10008.5.1.4.1.1.1"));
    /// ```
    pub fn new(config: &DicomdirConfig) -> Self {
        let profile = config.profile;
        let retired = config.retired_sop_classes;

        let mut sop_classes: Vec<&'static str> = match profile {
            ApplicationProfile::GeneralPurpose
            | ApplicationProfile::GeneralPurposeDvd
            | ApplicationProfile::GeneralPurposeMime
            | ApplicationProfile::UsbAndFlash => {
                let mut list = IMAGE_SOP_CLASSES.to_vec();
                list.extend_from_slice(GENERAL_NON_IMAGE_SOP_CLASSES);
                if retired {
                    list.extend_from_slice(GENERAL_RETIRED_SOP_CLASSES);
                }
                list
            }
            ApplicationProfile::Mpeg2MpAtMlDvd => MPEG2_SOP_CLASSES.to_vec(),
            ApplicationProfile::BasicCardiac => vec![X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE],
            ApplicationProfile::XrayAngiographic | ApplicationProfile::XrayAngiographicDvd => {
                let mut list = XA_SOP_CLASSES.to_vec();
                if retired {
                    list.extend_from_slice(XA_RETIRED_SOP_CLASSES);
                }
                list
            }
            ApplicationProfile::DentalRadiograph => DENTAL_SOP_CLASSES.to_vec(),
            ApplicationProfile::CtAndMr => CTMR_SOP_CLASSES.to_vec(),
            ApplicationProfile::UltrasoundIdSf
            | ApplicationProfile::UltrasoundScSf
            | ApplicationProfile::UltrasoundCcSf => US_SINGLE_FRAME_SOP_CLASSES.to_vec(),
            ApplicationProfile::UltrasoundIdMf
            | ApplicationProfile::UltrasoundScMf
            | ApplicationProfile::UltrasoundCcMf => US_MULTI_FRAME_SOP_CLASSES.to_vec(),
            ApplicationProfile::TwelveLeadEcg => vec![TWELVE_LEAD_ECG_WAVEFORM_STORAGE],
            ApplicationProfile::HemodynamicWaveform => vec![HEMODYNAMIC_WAVEFORM_STORAGE],
        };
        sop_classes.sort_unstable();
        sop_classes.dedup();

        let transfer_syntaxes = match profile {
            ApplicationProfile::GeneralPurposeMime => TransferSyntaxRule::Any,
            ApplicationProfile::GeneralPurposeDvd | ApplicationProfile::UsbAndFlash => {
                TransferSyntaxRule::OneOf(DVD_SYNTAXES)
            }
            ApplicationProfile::Mpeg2MpAtMlDvd => TransferSyntaxRule::OneOf(MPEG2_ONLY),
            ApplicationProfile::BasicCardiac => TransferSyntaxRule::OneOf(SV1_ONLY),
            ApplicationProfile::CtAndMr => TransferSyntaxRule::OneOf(CTMR_SYNTAXES),
            p if p.is_ultrasound() => TransferSyntaxRule::OneOf(US_SYNTAXES),
            _ => TransferSyntaxRule::OneOf(EXPLICIT_LE_ONLY),
        };

        let xa_transfer_syntaxes = match profile {
            ApplicationProfile::XrayAngiographic => Some(TransferSyntaxRule::OneOf(SV1_ONLY)),
            ApplicationProfile::XrayAngiographicDvd => {
                Some(TransferSyntaxRule::OneOf(XA_DVD_SYNTAXES))
            }
            _ => None,
        };

        let icon = match profile {
            p if p.is_angiographic() => Some(IconPolicy {
                size: 128,
                required: true,
            }),
            ApplicationProfile::CtAndMr => Some(IconPolicy {
                size: 64,
                required: false,
            }),
            _ => None,
        };

        Self {
            profile,
            sop_classes,
            transfer_syntaxes,
            xa_transfer_syntaxes,
            icon,
            reject_transfer_syntax: config.check_transfer_syntax,
            reject_encoding: config.check_encoding,
            reject_resolution: config.check_resolution,
        }
    }

    /// Returns whether the profile admits the SOP class
    pub fn allows_sop_class(&self, sop_class_uid: &str) -> bool {
        self.sop_classes
            .binary_search_by(|uid| (*uid).cmp(sop_class_uid))
            .is_ok()
    }

    /// Returns the transfer syntax rule for files of the given SOP class
    pub fn transfer_syntax_rule(&self, sop_class_uid: &str) -> TransferSyntaxRule {
        match self.xa_transfer_syntaxes {
            Some(rule) if sop_class_uid == X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE => rule,
            _ => self.transfer_syntaxes,
        }
    }

    /// Returns the icon requirement of the profile, if it has one
    pub fn icon(&self) -> Option<IconPolicy> {
        self.icon
    }

    /// Number of SOP classes the profile admits
    pub fn sop_class_count(&self) -> usize {
        self.sop_classes.len()
    }
}

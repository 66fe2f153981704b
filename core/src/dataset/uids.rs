//! SOP class groupings and transfer syntax names used by the directory engine
//!
//! The UIDs themselves come from [`dicom_dictionary_std::uids`].
#![allow(deprecated)]

use dicom_dictionary_std::uids::*;

/// Image storage SOP classes accepted by the general purpose profiles
pub const IMAGE_SOP_CLASSES: &[&str] = &[
    COMPUTED_RADIOGRAPHY_IMAGE_STORAGE,
    DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PROCESSING,
    DIGITAL_MAMMOGRAPHY_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    DIGITAL_MAMMOGRAPHY_X_RAY_IMAGE_STORAGE_FOR_PROCESSING,
    DIGITAL_INTRA_ORAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    DIGITAL_INTRA_ORAL_X_RAY_IMAGE_STORAGE_FOR_PROCESSING,
    CT_IMAGE_STORAGE,
    ENHANCED_CT_IMAGE_STORAGE,
    ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE_RETIRED,
    ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE,
    MR_IMAGE_STORAGE,
    ENHANCED_MR_IMAGE_STORAGE,
    ENHANCED_MR_COLOR_IMAGE_STORAGE,
    NUCLEAR_MEDICINE_IMAGE_STORAGE_RETIRED,
    ULTRASOUND_IMAGE_STORAGE_RETIRED,
    ULTRASOUND_IMAGE_STORAGE,
    ENHANCED_US_VOLUME_STORAGE,
    SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_SINGLE_BIT_SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_GRAYSCALE_BYTE_SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_GRAYSCALE_WORD_SECONDARY_CAPTURE_IMAGE_STORAGE,
    MULTI_FRAME_TRUE_COLOR_SECONDARY_CAPTURE_IMAGE_STORAGE,
    X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE,
    ENHANCED_XA_IMAGE_STORAGE,
    X_RAY_RADIOFLUOROSCOPIC_IMAGE_STORAGE,
    ENHANCED_XRF_IMAGE_STORAGE,
    X_RAY_ANGIOGRAPHIC_BI_PLANE_IMAGE_STORAGE,
    X_RAY3_D_ANGIOGRAPHIC_IMAGE_STORAGE,
    X_RAY3_D_CRANIOFACIAL_IMAGE_STORAGE,
    BREAST_TOMOSYNTHESIS_IMAGE_STORAGE,
    NUCLEAR_MEDICINE_IMAGE_STORAGE,
    SEGMENTATION_STORAGE,
    VL_ENDOSCOPIC_IMAGE_STORAGE,
    VIDEO_ENDOSCOPIC_IMAGE_STORAGE,
    VL_MICROSCOPIC_IMAGE_STORAGE,
    VIDEO_MICROSCOPIC_IMAGE_STORAGE,
    VL_SLIDE_COORDINATES_MICROSCOPIC_IMAGE_STORAGE,
    VL_PHOTOGRAPHIC_IMAGE_STORAGE,
    VIDEO_PHOTOGRAPHIC_IMAGE_STORAGE,
    OPHTHALMIC_PHOTOGRAPHY8_BIT_IMAGE_STORAGE,
    OPHTHALMIC_PHOTOGRAPHY16_BIT_IMAGE_STORAGE,
    OPHTHALMIC_TOMOGRAPHY_IMAGE_STORAGE,
    POSITRON_EMISSION_TOMOGRAPHY_IMAGE_STORAGE,
    ENHANCED_PET_IMAGE_STORAGE,
    RT_IMAGE_STORAGE,
    HARDCOPY_GRAYSCALE_IMAGE_STORAGE,
    HARDCOPY_COLOR_IMAGE_STORAGE,
];

/// Returns a short display name for the transfer syntaxes named in diagnostics
pub fn transfer_syntax_name(uid: &str) -> &str {
    match uid {
        IMPLICIT_VR_LITTLE_ENDIAN => "Little Endian Implicit",
        EXPLICIT_VR_LITTLE_ENDIAN => "Little Endian Explicit",
        DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN => "Deflated Explicit VR Little Endian",
        EXPLICIT_VR_BIG_ENDIAN => "Big Endian Explicit",
        JPEG_BASELINE8_BIT => "JPEG Baseline",
        JPEG_EXTENDED12_BIT => "JPEG Extended",
        JPEG_LOSSLESS_SV1 => "JPEG Lossless, Non-hierarchical, First-Order Prediction",
        JPEG2000_LOSSLESS => "JPEG 2000 (Lossless only)",
        JPEG2000 => "JPEG 2000",
        MPEG2MPML => "MPEG2 Main Profile @ Main Level",
        RLE_LOSSLESS => "RLE Lossless",
        other => other,
    }
}

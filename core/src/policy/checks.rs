//! Pixel, resolution and calibration rules that profiles impose on images

use crate::dataset::tags::*;
use crate::dataset::uids::transfer_syntax_name;
use dicom_dictionary_std::uids::*;
use crate::types::{ApplicationProfile, PhotometricInterpretation};
use dicom_core::Tag;
use dicom_object::InMemDicomObject;

/// Which configuration switch governs a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationCategory {
    /// SOP class not admitted by the profile; always rejects
    SopClass,
    /// Governed by `check_transfer_syntax`
    TransferSyntax,
    /// Governed by `check_encoding`
    Encoding,
    /// Governed by `check_resolution`
    Resolution,
    /// Attribute the profile requires; always rejects
    Attribute,
}

/// One profile rule a file breaks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub category: ViolationCategory,
    pub message: String,
}

impl Violation {
    pub fn new(category: ViolationCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// Collects violations for one file
struct Checker<'a> {
    ds: &'a InMemDicomObject,
    file: &'a str,
    violations: Vec<Violation>,
}

impl<'a> Checker<'a> {
    fn new(ds: &'a InMemDicomObject, file: &'a str) -> Self {
        Self {
            ds,
            file,
            violations: Vec::new(),
        }
    }

    fn push(&mut self, category: ViolationCategory, message: String) {
        self.violations.push(Violation::new(category, message));
    }

    /// Tag must be present (value optional)
    fn exists(&mut self, tag: Tag, category: ViolationCategory) -> bool {
        if exists(self.ds, tag) {
            true
        } else {
            let msg = format!("required attribute {} missing in file: {}", tag_label(tag), self.file);
            self.push(category, msg);
            false
        }
    }

    /// Tag must be present with a value
    fn exists_with_value(&mut self, tag: Tag, category: ViolationCategory) -> bool {
        if !self.exists(tag, category) {
            return false;
        }
        if exists_with_value(self.ds, tag) {
            true
        } else {
            let msg = format!(
                "required attribute {} has no value in file: {}",
                tag_label(tag),
                self.file
            );
            self.push(category, msg);
            false
        }
    }

    fn string_value(&mut self, tag: Tag, expected: &str, category: ViolationCategory) -> bool {
        if !self.exists_with_value(tag, category) {
            return false;
        }
        let value = get_string_value(self.ds, tag).unwrap_or_default();
        if value == expected {
            true
        } else {
            let msg = format!(
                "attribute {} has other value ({}) than expected ({}) in file: {}",
                tag_label(tag),
                value,
                expected,
                self.file
            );
            self.push(category, msg);
            false
        }
    }

    fn int_value(&mut self, tag: Tag, allowed: &[i32], category: ViolationCategory) -> bool {
        if !self.exists_with_value(tag, category) {
            return false;
        }
        match get_int_value(self.ds, tag) {
            Some(v) if allowed.contains(&v) => true,
            value => {
                let allowed = allowed
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                let msg = format!(
                    "attribute {} has other value ({}) than expected ({}) in file: {}",
                    tag_label(tag),
                    value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string()),
                    allowed,
                    self.file
                );
                self.push(category, msg);
                false
            }
        }
    }

    fn int_range(&mut self, tag: Tag, min: i32, max: i32, category: ViolationCategory) -> bool {
        if !self.exists_with_value(tag, category) {
            return false;
        }
        match get_int_value(self.ds, tag) {
            Some(v) if (min..=max).contains(&v) => true,
            value => {
                let msg = format!(
                    "attribute {} value ({}) out of range [{}, {}] in file: {}",
                    tag_label(tag),
                    value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string()),
                    min,
                    max,
                    self.file
                );
                self.push(category, msg);
                false
            }
        }
    }

    fn photometric(&self) -> PhotometricInterpretation {
        get_string_value(self.ds, PHOTOMETRIC_INTERPRETATION)
            .map(|s| PhotometricInterpretation::from_str(&s))
            .unwrap_or(PhotometricInterpretation::Unknown)
    }

    /// HighBit must be BitsStored - 1
    fn high_bit_matches_bits_stored(&mut self) {
        if let Some(bits_stored) = get_int_value(self.ds, BITS_STORED) {
            self.int_value(HIGH_BIT, &[bits_stored - 1], ViolationCategory::Encoding);
        }
    }

    /// Reports overlay groups whose planes are described; with
    /// `embedded_only` only planes without separate OverlayData count
    fn overlays(&mut self, embedded_only: bool) {
        for group in (0x6000u16..=0x601E).step_by(2) {
            let described = [
                OVERLAY_ROWS,
                OVERLAY_COLUMNS,
                OVERLAY_BITS_ALLOCATED,
                OVERLAY_BIT_POSITION,
            ]
            .iter()
            .all(|tag| exists_with_value(self.ds, in_group(*tag, group)));
            if !described {
                continue;
            }
            let has_data = exists_with_value(self.ds, in_group(OVERLAY_DATA, group));
            if embedded_only && has_data {
                continue;
            }
            let kind = if embedded_only { "embedded " } else { "" };
            let msg = format!(
                "{}overlay data present in group 0x{:04x} in file: {}",
                kind, group, self.file
            );
            self.push(ViolationCategory::Attribute, msg);
        }
    }
}

/// Runs the image rules of `profile` against a dataset
///
/// Every broken rule is reported; later checks still run after a failure.
pub fn check_image(
    profile: ApplicationProfile,
    sop_class_uid: &str,
    transfer_syntax_uid: &str,
    ds: &InMemDicomObject,
    file: &str,
) -> Vec<Violation> {
    let mut checker = Checker::new(ds, file);
    match profile {
        ApplicationProfile::BasicCardiac => check_cardiac(&mut checker),
        ApplicationProfile::XrayAngiographic | ApplicationProfile::XrayAngiographicDvd => {
            check_xa(&mut checker, sop_class_uid)
        }
        ApplicationProfile::DentalRadiograph => check_dental(&mut checker),
        ApplicationProfile::CtAndMr => check_ctmr(&mut checker, sop_class_uid),
        p if p.is_ultrasound() => check_ultrasound(&mut checker, p, transfer_syntax_uid),
        _ => {}
    }
    checker.violations
}

fn check_cardiac(c: &mut Checker) {
    use ViolationCategory::*;
    c.string_value(MODALITY, "XA", Attribute);
    c.int_range(ROWS, 1, 512, Resolution);
    c.int_range(COLUMNS, 1, 512, Resolution);
    c.int_value(BITS_ALLOCATED, &[8], Encoding);
    c.int_value(BITS_STORED, &[8], Encoding);
    c.overlays(true);
}

fn check_xa(c: &mut Checker, sop_class_uid: &str) {
    use ViolationCategory::*;
    if sop_class_uid == X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE {
        c.string_value(MODALITY, "XA", Attribute);
        c.int_range(ROWS, 1, 1024, Resolution);
        c.int_range(COLUMNS, 1, 1024, Resolution);
        c.int_value(BITS_STORED, &[8, 10, 12], Encoding);
        c.overlays(true);
    } else if sop_class_uid == SECONDARY_CAPTURE_IMAGE_STORAGE {
        c.int_range(ROWS, 1, 1024, Resolution);
        c.int_range(COLUMNS, 1, 1024, Resolution);
        c.int_value(SAMPLES_PER_PIXEL, &[1], Encoding);
        c.string_value(PHOTOMETRIC_INTERPRETATION, "MONOCHROME2", Encoding);
        c.int_value(BITS_ALLOCATED, &[8], Encoding);
        c.int_value(BITS_STORED, &[8], Encoding);
        c.int_value(HIGH_BIT, &[7], Encoding);
        c.int_value(PIXEL_REPRESENTATION, &[0], Encoding);
        c.overlays(false);
    }
}

fn check_dental(c: &mut Checker) {
    use ViolationCategory::*;
    for tag in [
        INSTITUTION_NAME,
        MANUFACTURER_MODEL_NAME,
        DETECTOR_ID,
        DETECTOR_MANUFACTURER_NAME,
        DETECTOR_MANUFACTURER_MODEL_NAME,
    ] {
        c.exists(tag, Attribute);
    }
    let has_allocated = c.exists_with_value(BITS_ALLOCATED, Attribute);
    if c.int_value(BITS_STORED, &[8, 10, 12, 16], Encoding) && has_allocated {
        let expected = if get_int_value(c.ds, BITS_STORED) == Some(8) { 8 } else { 16 };
        c.int_value(BITS_ALLOCATED, &[expected], Encoding);
    }
}

fn check_ctmr(c: &mut Checker, sop_class_uid: &str) {
    use ViolationCategory::*;
    c.exists_with_value(ROWS, Attribute);
    c.exists_with_value(COLUMNS, Attribute);

    match sop_class_uid {
        CT_IMAGE_STORAGE => {
            c.string_value(MODALITY, "CT", Attribute);
            c.string_value(PHOTOMETRIC_INTERPRETATION, "MONOCHROME2", Encoding);
        }
        MR_IMAGE_STORAGE => {
            c.string_value(MODALITY, "MR", Attribute);
            c.string_value(PHOTOMETRIC_INTERPRETATION, "MONOCHROME2", Encoding);
            if c.int_value(BITS_STORED, &[8, 12, 16], Encoding) {
                c.high_bit_matches_bits_stored();
            }
        }
        SECONDARY_CAPTURE_IMAGE_STORAGE => {
            c.int_value(SAMPLES_PER_PIXEL, &[1], Encoding);
            match c.photometric() {
                PhotometricInterpretation::Monochrome2 => {
                    if c.int_value(BITS_ALLOCATED, &[8, 16], Encoding) {
                        if let Some(bits_allocated) = get_int_value(c.ds, BITS_ALLOCATED) {
                            if c.int_value(BITS_STORED, &[bits_allocated], Encoding) {
                                c.high_bit_matches_bits_stored();
                            }
                        }
                    }
                }
                PhotometricInterpretation::PaletteColor => {
                    c.int_value(BITS_ALLOCATED, &[8], Encoding);
                    c.int_value(BITS_STORED, &[8], Encoding);
                    c.int_value(HIGH_BIT, &[7], Encoding);
                }
                other => {
                    let msg = format!(
                        "attribute {} has other value ({}) than expected (MONOCHROME2 or PALETTE COLOR) in file: {}",
                        tag_label(PHOTOMETRIC_INTERPRETATION),
                        other,
                        c.file
                    );
                    c.push(Encoding, msg);
                }
            }
        }
        _ => {}
    }
}

/// Returns whether the transfer syntax stores pixel data uncompressed
#[allow(deprecated)]
fn is_uncompressed(transfer_syntax_uid: &str) -> bool {
    matches!(
        transfer_syntax_uid,
        IMPLICIT_VR_LITTLE_ENDIAN | EXPLICIT_VR_LITTLE_ENDIAN | EXPLICIT_VR_BIG_ENDIAN
    )
}

fn check_ultrasound(c: &mut Checker, profile: ApplicationProfile, transfer_syntax_uid: &str) {
    use ViolationCategory::*;

    let photometric = c.photometric();
    let allowed = match photometric {
        PhotometricInterpretation::Monochrome2
        | PhotometricInterpretation::Rgb
        | PhotometricInterpretation::PaletteColor => {
            is_uncompressed(transfer_syntax_uid) || transfer_syntax_uid == RLE_LOSSLESS
        }
        PhotometricInterpretation::YbrFull => transfer_syntax_uid == RLE_LOSSLESS,
        PhotometricInterpretation::YbrFull422 | PhotometricInterpretation::YbrPartial422 => {
            is_uncompressed(transfer_syntax_uid) || transfer_syntax_uid == JPEG_BASELINE8_BIT
        }
        PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Unknown => false,
    };
    if !allowed {
        let msg = format!(
            "photometric interpretation {} not allowed with transfer syntax {} in file: {}",
            photometric,
            transfer_syntax_name(transfer_syntax_uid),
            c.file
        );
        c.push(Encoding, msg);
    }

    if !profile.requires_region_calibration() {
        return;
    }

    let regions = sequence_items(c.ds, SEQUENCE_OF_ULTRASOUND_REGIONS);
    if regions.is_empty() {
        let msg = format!(
            "required attribute {} missing or empty in file: {}",
            tag_label(SEQUENCE_OF_ULTRASOUND_REGIONS),
            c.file
        );
        c.push(Attribute, msg);
        return;
    }

    for (index, item) in regions.iter().enumerate() {
        let mut region = Checker::new(item, c.file);
        for tag in [
            REGION_LOCATION_MIN_X0,
            REGION_LOCATION_MIN_Y0,
            REGION_LOCATION_MAX_X1,
            REGION_LOCATION_MAX_Y1,
            PHYSICAL_UNITS_X_DIRECTION,
            PHYSICAL_UNITS_Y_DIRECTION,
            PHYSICAL_DELTA_X,
            PHYSICAL_DELTA_Y,
            REGION_SPATIAL_FORMAT,
            REGION_DATA_TYPE,
            REGION_FLAGS,
        ] {
            region.exists_with_value(tag, Attribute);
        }

        if profile.requires_pixel_component_calibration() {
            check_pixel_component_calibration(&mut region);
        }

        for violation in region.violations {
            c.push(
                violation.category,
                format!("ultrasound region #{}: {}", index + 1, violation.message),
            );
        }
    }
}

fn check_pixel_component_calibration(region: &mut Checker) {
    use ViolationCategory::*;
    let has_organization = region.exists_with_value(PIXEL_COMPONENT_ORGANIZATION, Attribute);
    region.exists_with_value(PIXEL_COMPONENT_PHYSICAL_UNITS, Attribute);
    region.exists_with_value(PIXEL_COMPONENT_DATA_TYPE, Attribute);
    if !has_organization {
        return;
    }

    let required: &[Tag] = match get_int_value(region.ds, PIXEL_COMPONENT_ORGANIZATION) {
        Some(0) => &[
            PIXEL_COMPONENT_MASK,
            NUMBER_OF_TABLE_BREAK_POINTS,
            TABLE_OF_X_BREAK_POINTS,
            TABLE_OF_Y_BREAK_POINTS,
        ],
        Some(1) => &[
            PIXEL_COMPONENT_RANGE_START,
            PIXEL_COMPONENT_RANGE_STOP,
            NUMBER_OF_TABLE_BREAK_POINTS,
            TABLE_OF_X_BREAK_POINTS,
            TABLE_OF_Y_BREAK_POINTS,
        ],
        Some(2) => &[
            NUMBER_OF_TABLE_ENTRIES,
            TABLE_OF_PIXEL_VALUES,
            TABLE_OF_PARAMETER_VALUES,
        ],
        _ => {
            region.int_value(PIXEL_COMPONENT_ORGANIZATION, &[0, 1, 2], Attribute);
            return;
        }
    };
    for tag in required {
        region.exists_with_value(*tag, Attribute);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn image(modality: &str, photometric: &str, rows: u16, bits: u16) -> InMemDicomObject {
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, MODALITY, modality);
        put_string(&mut ds, PHOTOMETRIC_INTERPRETATION, photometric);
        put_u16(&mut ds, SAMPLES_PER_PIXEL, 1);
        put_u16(&mut ds, ROWS, rows);
        put_u16(&mut ds, COLUMNS, rows);
        put_u16(&mut ds, BITS_ALLOCATED, if bits > 8 { 16 } else { 8 });
        put_u16(&mut ds, BITS_STORED, bits);
        put_u16(&mut ds, HIGH_BIT, bits - 1);
        put_u16(&mut ds, PIXEL_REPRESENTATION, 0);
        ds
    }

    fn categories(violations: &[Violation]) -> Vec<ViolationCategory> {
        violations.iter().map(|v| v.category).collect()
    }

    #[test]
    fn test_ct_image_passes_ctmr() {
        let ds = image("CT", "MONOCHROME2", 512, 12);
        let v = check_image(
            ApplicationProfile::CtAndMr,
            CT_IMAGE_STORAGE,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert!(v.is_empty(), "{:?}", v);
    }

    #[rstest]
    #[case("YBR_FULL", 1)]
    #[case("RGB", 1)]
    #[case("MONOCHROME2", 0)]
    fn test_ctmr_secondary_capture_photometric(#[case] photometric: &str, #[case] expected: usize) {
        let ds = image("OT", photometric, 256, 8);
        let v = check_image(
            ApplicationProfile::CtAndMr,
            SECONDARY_CAPTURE_IMAGE_STORAGE,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert_eq!(v.len(), expected, "{:?}", v);
        assert!(v.iter().all(|v| v.category == ViolationCategory::Encoding));
    }

    #[test]
    fn test_mr_high_bit() {
        let mut ds = image("MR", "MONOCHROME2", 256, 12);
        put_u16(&mut ds, HIGH_BIT, 15);
        let v = check_image(
            ApplicationProfile::CtAndMr,
            MR_IMAGE_STORAGE,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert_eq!(categories(&v), vec![ViolationCategory::Encoding]);
        assert!(v[0].message.contains("HighBit"));
    }

    #[test]
    fn test_cardiac_reports_every_violation() {
        let ds = image("CT", "MONOCHROME2", 1024, 12);
        let v = check_image(
            ApplicationProfile::BasicCardiac,
            X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE,
            JPEG_LOSSLESS_SV1,
            &ds,
            "IMG1",
        );
        assert_eq!(
            categories(&v),
            vec![
                ViolationCategory::Attribute,
                ViolationCategory::Resolution,
                ViolationCategory::Resolution,
                ViolationCategory::Encoding,
                ViolationCategory::Encoding,
            ]
        );
    }

    #[test]
    fn test_cardiac_embedded_overlay() {
        let mut ds = image("XA", "MONOCHROME2", 512, 8);
        put_u16(&mut ds, in_group(OVERLAY_ROWS, 0x6002), 512);
        put_u16(&mut ds, in_group(OVERLAY_COLUMNS, 0x6002), 512);
        put_u16(&mut ds, in_group(OVERLAY_BITS_ALLOCATED, 0x6002), 8);
        put_u16(&mut ds, in_group(OVERLAY_BIT_POSITION, 0x6002), 7);
        let v = check_image(
            ApplicationProfile::BasicCardiac,
            X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE,
            JPEG_LOSSLESS_SV1,
            &ds,
            "IMG1",
        );
        assert_eq!(v.len(), 1);
        assert!(v[0].message.contains("0x6002"));
    }

    #[test]
    fn test_dental_bits() {
        let mut ds = image("IO", "MONOCHROME2", 256, 12);
        for tag in [
            INSTITUTION_NAME,
            MANUFACTURER_MODEL_NAME,
            DETECTOR_ID,
            DETECTOR_MANUFACTURER_NAME,
            DETECTOR_MANUFACTURER_MODEL_NAME,
        ] {
            put_string(&mut ds, tag, "X");
        }
        let ok = check_image(
            ApplicationProfile::DentalRadiograph,
            DIGITAL_INTRA_ORAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert!(ok.is_empty(), "{:?}", ok);

        put_u16(&mut ds, BITS_ALLOCATED, 8);
        let bad = check_image(
            ApplicationProfile::DentalRadiograph,
            DIGITAL_INTRA_ORAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert_eq!(categories(&bad), vec![ViolationCategory::Encoding]);
    }

    #[rstest]
    #[case("YBR_FULL", RLE_LOSSLESS, true)]
    #[case("YBR_FULL", EXPLICIT_VR_LITTLE_ENDIAN, false)]
    #[case("YBR_FULL_422", JPEG_BASELINE8_BIT, true)]
    #[case("RGB", JPEG_BASELINE8_BIT, false)]
    #[case("MONOCHROME2", EXPLICIT_VR_LITTLE_ENDIAN, true)]
    fn test_ultrasound_photometric_pairs(
        #[case] photometric: &str,
        #[case] transfer_syntax: &str,
        #[case] ok: bool,
    ) {
        let ds = image("US", photometric, 480, 8);
        let v = check_image(
            ApplicationProfile::UltrasoundIdSf,
            ULTRASOUND_IMAGE_STORAGE,
            transfer_syntax,
            &ds,
            "IMG1",
        );
        assert_eq!(v.is_empty(), ok);
    }

    #[test]
    fn test_ultrasound_regions() {
        let mut ds = image("US", "MONOCHROME2", 480, 8);
        let missing = check_image(
            ApplicationProfile::UltrasoundScSf,
            ULTRASOUND_IMAGE_STORAGE,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert_eq!(categories(&missing), vec![ViolationCategory::Attribute]);

        let mut region = InMemDicomObject::new_empty();
        for tag in [
            REGION_LOCATION_MIN_X0,
            REGION_LOCATION_MIN_Y0,
            REGION_LOCATION_MAX_X1,
            REGION_LOCATION_MAX_Y1,
            PHYSICAL_UNITS_X_DIRECTION,
            PHYSICAL_UNITS_Y_DIRECTION,
            REGION_SPATIAL_FORMAT,
            REGION_DATA_TYPE,
        ] {
            put_u16(&mut region, tag, 1);
        }
        put_u32(&mut region, REGION_FLAGS, 0);
        put_string_with_vr(&mut region, PHYSICAL_DELTA_X, dicom_core::VR::FD, "0.1");
        put_string_with_vr(&mut region, PHYSICAL_DELTA_Y, dicom_core::VR::FD, "0.1");
        put_sequence(&mut ds, SEQUENCE_OF_ULTRASOUND_REGIONS, vec![region]);

        let sc = check_image(
            ApplicationProfile::UltrasoundScSf,
            ULTRASOUND_IMAGE_STORAGE,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert!(sc.is_empty(), "{:?}", sc);

        let cc = check_image(
            ApplicationProfile::UltrasoundCcSf,
            ULTRASOUND_IMAGE_STORAGE,
            EXPLICIT_VR_LITTLE_ENDIAN,
            &ds,
            "IMG1",
        );
        assert_eq!(cc.len(), 3);
        assert!(cc[0].message.starts_with("ultrasound region #1"));
    }
}

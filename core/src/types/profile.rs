use std::fmt;

/// DICOM media application profile
///
/// Selected once per session; decides which SOP classes and transfer
/// syntaxes may go onto the media and which extra keys the Patient, Study,
/// Series and Image records carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "kebab-case"))]
pub enum ApplicationProfile {
    #[default]
    GeneralPurpose,
    GeneralPurposeDvd,
    GeneralPurposeMime,
    UsbAndFlash,
    Mpeg2MpAtMlDvd,
    BasicCardiac,
    XrayAngiographic,
    XrayAngiographicDvd,
    DentalRadiograph,
    CtAndMr,
    UltrasoundIdSf,
    UltrasoundScSf,
    UltrasoundCcSf,
    UltrasoundIdMf,
    UltrasoundScMf,
    UltrasoundCcMf,
    TwelveLeadEcg,
    HemodynamicWaveform,
}

impl ApplicationProfile {
    /// All profiles
    pub const ALL: [ApplicationProfile; 18] = [
        ApplicationProfile::GeneralPurpose,
        ApplicationProfile::GeneralPurposeDvd,
        ApplicationProfile::GeneralPurposeMime,
        ApplicationProfile::UsbAndFlash,
        ApplicationProfile::Mpeg2MpAtMlDvd,
        ApplicationProfile::BasicCardiac,
        ApplicationProfile::XrayAngiographic,
        ApplicationProfile::XrayAngiographicDvd,
        ApplicationProfile::DentalRadiograph,
        ApplicationProfile::CtAndMr,
        ApplicationProfile::UltrasoundIdSf,
        ApplicationProfile::UltrasoundScSf,
        ApplicationProfile::UltrasoundCcSf,
        ApplicationProfile::UltrasoundIdMf,
        ApplicationProfile::UltrasoundScMf,
        ApplicationProfile::UltrasoundCcMf,
        ApplicationProfile::TwelveLeadEcg,
        ApplicationProfile::HemodynamicWaveform,
    ];

    /// Returns the profile identifier as defined in DICOM PS3.11
    pub fn name(&self) -> &'static str {
        match self {
            ApplicationProfile::GeneralPurpose => "STD-GEN-CD/DVD-RAM",
            ApplicationProfile::GeneralPurposeDvd => "STD-GEN-DVD-JPEG/J2K",
            ApplicationProfile::GeneralPurposeMime => "STD-GEN-MIME",
            ApplicationProfile::UsbAndFlash => "STD-GEN-USB/MMC/CF/SD-JPEG/J2K",
            ApplicationProfile::Mpeg2MpAtMlDvd => "STD-DVD-MPEG2-MPML",
            ApplicationProfile::BasicCardiac => "STD-XABC-CD",
            ApplicationProfile::XrayAngiographic => "STD-XA1K-CD",
            ApplicationProfile::XrayAngiographicDvd => "STD-XA1K-DVD",
            ApplicationProfile::DentalRadiograph => "STD-DEN-CD",
            ApplicationProfile::CtAndMr => "STD-CTMR-xxxx",
            ApplicationProfile::UltrasoundIdSf => "STD-US-ID-SF-xxxx",
            ApplicationProfile::UltrasoundScSf => "STD-US-SC-SF-xxxx",
            ApplicationProfile::UltrasoundCcSf => "STD-US-CC-SF-xxxx",
            ApplicationProfile::UltrasoundIdMf => "STD-US-ID-MF-xxxx",
            ApplicationProfile::UltrasoundScMf => "STD-US-SC-MF-xxxx",
            ApplicationProfile::UltrasoundCcMf => "STD-US-CC-MF-xxxx",
            ApplicationProfile::TwelveLeadEcg => "STD-WVFM-ECG-FD",
            ApplicationProfile::HemodynamicWaveform => "STD-WVFM-HD-FD",
        }
    }

    /// Returns simple name for display and command line use
    pub fn simple_name(&self) -> &'static str {
        match self {
            ApplicationProfile::GeneralPurpose => "general",
            ApplicationProfile::GeneralPurposeDvd => "dvd",
            ApplicationProfile::GeneralPurposeMime => "mime",
            ApplicationProfile::UsbAndFlash => "usb",
            ApplicationProfile::Mpeg2MpAtMlDvd => "mpeg2-dvd",
            ApplicationProfile::BasicCardiac => "cardiac",
            ApplicationProfile::XrayAngiographic => "xa",
            ApplicationProfile::XrayAngiographicDvd => "xa-dvd",
            ApplicationProfile::DentalRadiograph => "dental",
            ApplicationProfile::CtAndMr => "ctmr",
            ApplicationProfile::UltrasoundIdSf => "us-id-sf",
            ApplicationProfile::UltrasoundScSf => "us-sc-sf",
            ApplicationProfile::UltrasoundCcSf => "us-cc-sf",
            ApplicationProfile::UltrasoundIdMf => "us-id-mf",
            ApplicationProfile::UltrasoundScMf => "us-sc-mf",
            ApplicationProfile::UltrasoundCcMf => "us-cc-mf",
            ApplicationProfile::TwelveLeadEcg => "ecg",
            ApplicationProfile::HemodynamicWaveform => "hemodynamic",
        }
    }

    /// Parses a profile from its simple name or its PS3.11 identifier
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        ApplicationProfile::ALL
            .iter()
            .find(|p| p.simple_name().eq_ignore_ascii_case(s) || p.name().eq_ignore_ascii_case(s))
            .copied()
    }

    /// DVD, USB and MPEG2 profiles carry additional type 1C keys
    pub fn has_extended_keys(&self) -> bool {
        matches!(
            self,
            ApplicationProfile::GeneralPurposeDvd
                | ApplicationProfile::UsbAndFlash
                | ApplicationProfile::Mpeg2MpAtMlDvd
        )
    }

    /// Cardiac and angiographic profiles carry additional type 2 keys
    pub fn is_angiographic(&self) -> bool {
        matches!(
            self,
            ApplicationProfile::BasicCardiac
                | ApplicationProfile::XrayAngiographic
                | ApplicationProfile::XrayAngiographicDvd
        )
    }

    /// Returns whether this is one of the six ultrasound profiles
    pub fn is_ultrasound(&self) -> bool {
        matches!(
            self,
            ApplicationProfile::UltrasoundIdSf
                | ApplicationProfile::UltrasoundScSf
                | ApplicationProfile::UltrasoundCcSf
                | ApplicationProfile::UltrasoundIdMf
                | ApplicationProfile::UltrasoundScMf
                | ApplicationProfile::UltrasoundCcMf
        )
    }

    /// Spatial calibration (SC) and combined calibration (CC) ultrasound profiles
    pub fn requires_region_calibration(&self) -> bool {
        matches!(
            self,
            ApplicationProfile::UltrasoundScSf
                | ApplicationProfile::UltrasoundCcSf
                | ApplicationProfile::UltrasoundScMf
                | ApplicationProfile::UltrasoundCcMf
        )
    }

    /// Combined calibration ultrasound profiles
    pub fn requires_pixel_component_calibration(&self) -> bool {
        matches!(
            self,
            ApplicationProfile::UltrasoundCcSf | ApplicationProfile::UltrasoundCcMf
        )
    }
}

impl fmt::Display for ApplicationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("general", ApplicationProfile::GeneralPurpose)]
    #[case("STD-GEN-CD/DVD-RAM", ApplicationProfile::GeneralPurpose)]
    #[case("std-ctmr-xxxx", ApplicationProfile::CtAndMr)]
    #[case("us-cc-mf", ApplicationProfile::UltrasoundCcMf)]
    #[case("STD-WVFM-HD-FD", ApplicationProfile::HemodynamicWaveform)]
    fn test_profile_parsing(#[case] input: &str, #[case] expected: ApplicationProfile) {
        assert_eq!(ApplicationProfile::from_str(input), Some(expected));
    }

    #[test]
    fn test_unknown_profile() {
        assert_eq!(ApplicationProfile::from_str("STD-NOPE"), None);
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in ApplicationProfile::ALL.iter().enumerate() {
            for b in &ApplicationProfile::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
                assert_ne!(a.simple_name(), b.simple_name());
            }
        }
    }

    #[test]
    fn test_profile_groups() {
        assert!(ApplicationProfile::UsbAndFlash.has_extended_keys());
        assert!(!ApplicationProfile::GeneralPurpose.has_extended_keys());
        assert!(ApplicationProfile::BasicCardiac.is_angiographic());
        assert!(ApplicationProfile::UltrasoundIdMf.is_ultrasound());
        assert!(!ApplicationProfile::UltrasoundIdMf.requires_region_calibration());
        assert!(ApplicationProfile::UltrasoundScSf.requires_region_calibration());
        assert!(!ApplicationProfile::UltrasoundScSf.requires_pixel_component_calibration());
        assert!(ApplicationProfile::UltrasoundCcSf.requires_pixel_component_calibration());
    }
}

use std::fmt;

/// Kind of a DICOMDIR directory record
///
/// `Root` is the implicit top of the hierarchy and is never written as a
/// record of its own. Every other kind maps onto one DirectoryRecordType.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordKind {
    Root,
    Patient,
    Study,
    Series,
    Image,
    Overlay,
    ModalityLut,
    VoiLut,
    Curve,
    SrDocument,
    Presentation,
    Waveform,
    RtDose,
    RtStructureSet,
    RtPlan,
    RtTreatRecord,
    StoredPrint,
    KeyObjectDoc,
    Registration,
    Fiducial,
    RawData,
    Spectroscopy,
    EncapDoc,
    ValueMap,
    HangingProtocol,
    Stereometric,
    Palette,
    Surface,
    Measurement,
    Implant,
    ImplantGroup,
    ImplantAssy,
}

impl RecordKind {
    /// All kinds, in declaration order
    pub const ALL: [RecordKind; 32] = [
        RecordKind::Root,
        RecordKind::Patient,
        RecordKind::Study,
        RecordKind::Series,
        RecordKind::Image,
        RecordKind::Overlay,
        RecordKind::ModalityLut,
        RecordKind::VoiLut,
        RecordKind::Curve,
        RecordKind::SrDocument,
        RecordKind::Presentation,
        RecordKind::Waveform,
        RecordKind::RtDose,
        RecordKind::RtStructureSet,
        RecordKind::RtPlan,
        RecordKind::RtTreatRecord,
        RecordKind::StoredPrint,
        RecordKind::KeyObjectDoc,
        RecordKind::Registration,
        RecordKind::Fiducial,
        RecordKind::RawData,
        RecordKind::Spectroscopy,
        RecordKind::EncapDoc,
        RecordKind::ValueMap,
        RecordKind::HangingProtocol,
        RecordKind::Stereometric,
        RecordKind::Palette,
        RecordKind::Surface,
        RecordKind::Measurement,
        RecordKind::Implant,
        RecordKind::ImplantGroup,
        RecordKind::ImplantAssy,
    ];

    /// Returns the value of DirectoryRecordType (0004,1430) for this kind
    pub fn record_type(&self) -> &'static str {
        match self {
            RecordKind::Root => "ROOT",
            RecordKind::Patient => "PATIENT",
            RecordKind::Study => "STUDY",
            RecordKind::Series => "SERIES",
            RecordKind::Image => "IMAGE",
            RecordKind::Overlay => "OVERLAY",
            RecordKind::ModalityLut => "MODALITY LUT",
            RecordKind::VoiLut => "VOI LUT",
            RecordKind::Curve => "CURVE",
            RecordKind::SrDocument => "SR DOCUMENT",
            RecordKind::Presentation => "PRESENTATION",
            RecordKind::Waveform => "WAVEFORM",
            RecordKind::RtDose => "RT DOSE",
            RecordKind::RtStructureSet => "RT STRUCTURE SET",
            RecordKind::RtPlan => "RT PLAN",
            RecordKind::RtTreatRecord => "RT TREAT RECORD",
            RecordKind::StoredPrint => "STORED PRINT",
            RecordKind::KeyObjectDoc => "KEY OBJECT DOC",
            RecordKind::Registration => "REGISTRATION",
            RecordKind::Fiducial => "FIDUCIAL",
            RecordKind::RawData => "RAW DATA",
            RecordKind::Spectroscopy => "SPECTROSCOPY",
            RecordKind::EncapDoc => "ENCAP DOC",
            RecordKind::ValueMap => "VALUE MAP",
            RecordKind::HangingProtocol => "HANGING PROTOCOL",
            RecordKind::Stereometric => "STEREOMETRIC",
            RecordKind::Palette => "PALETTE",
            RecordKind::Surface => "SURFACE",
            RecordKind::Measurement => "MEASUREMENT",
            RecordKind::Implant => "IMPLANT",
            RecordKind::ImplantGroup => "IMPLANT GROUP",
            RecordKind::ImplantAssy => "IMPLANT ASSY",
        }
    }

    /// Parses a DirectoryRecordType value
    ///
    /// Returns `None` for `ROOT` and for record types this engine does not
    /// model (e.g. `PRIVATE`).
    pub fn from_record_type(s: &str) -> Option<Self> {
        let s = s.trim();
        RecordKind::ALL
            .iter()
            .skip(1)
            .find(|kind| kind.record_type() == s)
            .copied()
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            RecordKind::Root => "Root",
            RecordKind::Patient => "Patient",
            RecordKind::Study => "Study",
            RecordKind::Series => "Series",
            RecordKind::Image => "Image",
            RecordKind::Overlay => "Overlay",
            RecordKind::ModalityLut => "ModalityLUT",
            RecordKind::VoiLut => "VOILUT",
            RecordKind::Curve => "Curve",
            RecordKind::SrDocument => "SRDocument",
            RecordKind::Presentation => "Presentation",
            RecordKind::Waveform => "Waveform",
            RecordKind::RtDose => "RTDose",
            RecordKind::RtStructureSet => "RTStructureSet",
            RecordKind::RtPlan => "RTPlan",
            RecordKind::RtTreatRecord => "RTTreatRecord",
            RecordKind::StoredPrint => "StoredPrint",
            RecordKind::KeyObjectDoc => "KeyObjectDoc",
            RecordKind::Registration => "Registration",
            RecordKind::Fiducial => "Fiducial",
            RecordKind::RawData => "RawData",
            RecordKind::Spectroscopy => "Spectroscopy",
            RecordKind::EncapDoc => "EncapDoc",
            RecordKind::ValueMap => "ValueMap",
            RecordKind::HangingProtocol => "HangingProtocol",
            RecordKind::Stereometric => "Stereometric",
            RecordKind::Palette => "Palette",
            RecordKind::Surface => "Surface",
            RecordKind::Measurement => "Measurement",
            RecordKind::Implant => "Implant",
            RecordKind::ImplantGroup => "ImplantGroup",
            RecordKind::ImplantAssy => "ImplantAssy",
        }
    }

    /// Returns whether records of this kind reference an instance file
    pub fn is_instance_level(&self) -> bool {
        !matches!(
            self,
            RecordKind::Root | RecordKind::Patient | RecordKind::Study | RecordKind::Series
        )
    }

    /// Returns whether records of this kind hang directly below the root
    /// instead of below a series
    pub fn is_root_level(&self) -> bool {
        matches!(
            self,
            RecordKind::Patient
                | RecordKind::HangingProtocol
                | RecordKind::Palette
                | RecordKind::Implant
                | RecordKind::ImplantGroup
                | RecordKind::ImplantAssy
        )
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// How an existing DICOMDIR is treated when a session opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase"))]
pub enum DirectoryMode {
    /// Start from an empty directory, replacing any existing file on write
    #[default]
    Create,
    /// Add new records to an existing directory
    Append,
    /// Add new records and update matching ones in place
    Update,
}

impl DirectoryMode {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            DirectoryMode::Create => "create",
            DirectoryMode::Append => "append",
            DirectoryMode::Update => "update",
        }
    }
}

impl fmt::Display for DirectoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Photometric interpretation enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotometricInterpretation {
    Unknown,
    Monochrome1,
    Monochrome2,
    PaletteColor,
    Rgb,
    YbrFull,
    YbrFull422,
    YbrPartial422,
}

impl PhotometricInterpretation {
    /// Returns whether this is a monochrome interpretation
    pub fn is_monochrome(&self) -> bool {
        matches!(
            self,
            PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Monochrome2
        )
    }

    /// Returns whether this is inverted (MONOCHROME1)
    pub fn is_inverted(&self) -> bool {
        matches!(self, PhotometricInterpretation::Monochrome1)
    }

    /// Parses photometric interpretation from string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "MONOCHROME1" => PhotometricInterpretation::Monochrome1,
            "MONOCHROME2" => PhotometricInterpretation::Monochrome2,
            "PALETTE COLOR" => PhotometricInterpretation::PaletteColor,
            "RGB" => PhotometricInterpretation::Rgb,
            "YBR_FULL" => PhotometricInterpretation::YbrFull,
            "YBR_FULL_422" => PhotometricInterpretation::YbrFull422,
            "YBR_PARTIAL_422" => PhotometricInterpretation::YbrPartial422,
            _ => PhotometricInterpretation::Unknown,
        }
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhotometricInterpretation::Unknown => "UNKNOWN",
            PhotometricInterpretation::Monochrome1 => "MONOCHROME1",
            PhotometricInterpretation::Monochrome2 => "MONOCHROME2",
            PhotometricInterpretation::PaletteColor => "PALETTE COLOR",
            PhotometricInterpretation::Rgb => "RGB",
            PhotometricInterpretation::YbrFull => "YBR_FULL",
            PhotometricInterpretation::YbrFull422 => "YBR_FULL_422",
            PhotometricInterpretation::YbrPartial422 => "YBR_PARTIAL_422",
        };
        write!(f, "{}", name)
    }
}

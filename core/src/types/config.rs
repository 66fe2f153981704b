use crate::types::{ApplicationProfile, DirectoryMode};
use std::path::PathBuf;

/// Smallest and largest accepted icon edge length in pixels
pub const MIN_ICON_SIZE: u32 = 1;
pub const MAX_ICON_SIZE: u32 = 256;

/// Icon image options
///
/// # Example
///
/// ```
/// use dicomdir_core::IconOptions;
///
/// let icons = IconOptions::default();
/// assert!(!icons.enabled);
/// assert_eq!(icons.size, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct IconOptions {
    /// Attach icon images to image records
    pub enabled: bool,

    /// Edge length of the square icon
    pub size: u32,

    /// Directory or file name prefix of external PGM icons
    pub prefix: Option<String>,

    /// PGM file used when no other icon source is usable
    pub default_icon: Option<PathBuf>,
}

impl Default for IconOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 64,
            prefix: None,
            default_icon: None,
        }
    }
}

/// File-set descriptor file and the character set it is written in
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
pub struct FilesetDescriptor {
    pub file_id: String,
    pub charset: Option<String>,
}

/// Configuration of a DICOMDIR session
///
/// The check switches decide whether a profile mismatch rejects the file
/// (`true`) or is only reported as a warning (`false`).
///
/// # Example
///
/// ```
/// use dicomdir_core::{ApplicationProfile, DicomdirConfig, DirectoryMode};
///
/// let config = DicomdirConfig::default()
///     .with_profile(ApplicationProfile::CtAndMr)
///     .with_mode(DirectoryMode::Append)
///     .invent(true);
///
/// assert_eq!(config.profile, ApplicationProfile::CtAndMr);
/// assert_eq!(config.mode, DirectoryMode::Append);
/// assert!(config.invent);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct DicomdirConfig {
    /// Media application profile
    pub profile: ApplicationProfile,

    /// Create a new directory or extend an existing one
    pub mode: DirectoryMode,

    /// Back-fill missing key attributes below the patient level
    pub invent: bool,

    /// Back-fill missing patient IDs only
    pub invent_patient_id: bool,

    /// Accept retired SOP classes (overlay, curve, LUT)
    pub retired_sop_classes: bool,

    /// Reject images exceeding the profile's resolution bounds
    pub check_resolution: bool,

    /// Reject images with a pixel encoding the profile does not allow
    pub check_encoding: bool,

    /// Reject files with a transfer syntax the profile does not allow
    pub check_transfer_syntax: bool,

    /// Compare re-added files against their existing records
    pub check_consistency: bool,

    /// Reject a file on the first inconsistency
    pub abort_on_inconsistency: bool,

    /// Reject files with missing or empty mandatory attributes
    pub reject_invalid: bool,

    /// Keep a `.BAK` copy of an existing DICOMDIR until the new one is written
    pub backup: bool,

    /// Accept lowercase file names and a trailing period
    pub map_filenames: bool,

    /// Icon image options
    pub icons: IconOptions,

    /// File-set ID (0004,1130)
    pub fileset_id: Option<String>,

    /// File-set descriptor (0004,1141) and its character set (0004,1142)
    pub descriptor: Option<FilesetDescriptor>,
}

impl Default for DicomdirConfig {
    fn default() -> Self {
        Self {
            profile: ApplicationProfile::default(),
            mode: DirectoryMode::default(),
            invent: false,
            invent_patient_id: false,
            retired_sop_classes: false,
            check_resolution: true,
            check_encoding: true,
            check_transfer_syntax: true,
            check_consistency: true,
            abort_on_inconsistency: false,
            reject_invalid: false,
            backup: true,
            map_filenames: false,
            icons: IconOptions::default(),
            fileset_id: None,
            descriptor: None,
        }
    }
}

impl DicomdirConfig {
    /// Creates a configuration with every reject switch disabled
    ///
    /// # Example
    ///
    /// ```
    /// use dicomdir_core::DicomdirConfig;
    ///
    /// let permissive = DicomdirConfig::permissive();
    /// assert!(!permissive.check_resolution);
    /// assert!(!permissive.check_encoding);
    /// assert!(!permissive.check_transfer_syntax);
    /// ```
    pub fn permissive() -> Self {
        Self {
            check_resolution: false,
            check_encoding: false,
            check_transfer_syntax: false,
            abort_on_inconsistency: false,
            reject_invalid: false,
            ..Self::default()
        }
    }

    /// Builder: Set the application profile
    pub fn with_profile(mut self, profile: ApplicationProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Builder: Set the directory mode
    pub fn with_mode(mut self, mode: DirectoryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: Invent missing key attributes
    ///
    /// # Example
    ///
    /// ```
    /// use dicomdir_core::DicomdirConfig;
    ///
    /// let config = DicomdirConfig::default().invent(true);
    /// assert!(config.invent);
    /// ```
    pub fn invent(mut self, enable: bool) -> Self {
        self.invent = enable;
        self
    }

    /// Builder: Invent missing patient IDs
    pub fn invent_patient_id(mut self, enable: bool) -> Self {
        self.invent_patient_id = enable;
        self
    }

    /// Builder: Accept retired SOP classes
    pub fn retired_sop_classes(mut self, enable: bool) -> Self {
        self.retired_sop_classes = enable;
        self
    }

    /// Builder: Reject or warn on resolution mismatches
    pub fn check_resolution(mut self, reject: bool) -> Self {
        self.check_resolution = reject;
        self
    }

    /// Builder: Reject or warn on encoding mismatches
    pub fn check_encoding(mut self, reject: bool) -> Self {
        self.check_encoding = reject;
        self
    }

    /// Builder: Reject or warn on transfer syntax mismatches
    ///
    /// # Example
    ///
    /// ```
    /// use dicomdir_core::DicomdirConfig;
    ///
    /// let config = DicomdirConfig::default().check_transfer_syntax(false);
    /// assert!(!config.check_transfer_syntax);
    /// ```
    pub fn check_transfer_syntax(mut self, reject: bool) -> Self {
        self.check_transfer_syntax = reject;
        self
    }

    /// Builder: Compare re-added files against existing records
    pub fn check_consistency(mut self, enable: bool) -> Self {
        self.check_consistency = enable;
        self
    }

    /// Builder: Reject files on the first inconsistency
    pub fn abort_on_inconsistency(mut self, enable: bool) -> Self {
        self.abort_on_inconsistency = enable;
        self
    }

    /// Builder: Reject files with missing mandatory attributes
    pub fn reject_invalid(mut self, enable: bool) -> Self {
        self.reject_invalid = enable;
        self
    }

    /// Builder: Keep a backup of the previous DICOMDIR while writing
    pub fn backup(mut self, enable: bool) -> Self {
        self.backup = enable;
        self
    }

    /// Builder: Map lowercase file names to DICOM file IDs
    pub fn map_filenames(mut self, enable: bool) -> Self {
        self.map_filenames = enable;
        self
    }

    /// Builder: Set icon options
    pub fn with_icons(mut self, icons: IconOptions) -> Self {
        self.icons = icons;
        self
    }

    /// Builder: Set the file-set ID
    pub fn with_fileset_id(mut self, id: impl Into<String>) -> Self {
        self.fileset_id = Some(id.into());
        self
    }

    /// Builder: Set the file-set descriptor
    pub fn with_descriptor(mut self, file_id: impl Into<String>, charset: Option<String>) -> Self {
        self.descriptor = Some(FilesetDescriptor {
            file_id: file_id.into(),
            charset,
        });
        self
    }

    /// Returns whether records are updated in place
    pub fn update_mode(&self) -> bool {
        self.mode == DirectoryMode::Update
    }

    /// Returns whether key attributes below the patient are back-filled
    pub fn inventing(&self) -> bool {
        self.invent
    }

    /// Returns whether patient IDs are back-filled
    pub fn inventing_patient_id(&self) -> bool {
        self.invent || self.invent_patient_id
    }
}

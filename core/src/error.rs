use crate::types::RecordKind;
use thiserror::Error;

/// Result type for DICOMDIR operations
pub type Result<T> = std::result::Result<T, DicomdirError>;

/// Error types for DICOMDIR operations
///
/// Every variant except [`DicomdirError::ResourceExhausted`] is scoped to a
/// single file: the session reports it and carries on with the next one.
#[derive(Error, Debug)]
pub enum DicomdirError {
    /// SOP class, transfer syntax, encoding or resolution not allowed by the profile
    #[error("{file}: application profile violated: {}", .reasons.join("; "))]
    ProfileViolation { file: String, reasons: Vec<String> },

    /// Mandatory attribute absent from the dataset
    #[error("required attribute {tag} missing in file: {file}")]
    MandatoryAttributeMissing { tag: String, file: String },

    /// Mandatory attribute present but without a value
    #[error("required attribute {tag} has no value in file: {file}")]
    MandatoryAttributeEmpty { tag: String, file: String },

    /// File conflicts with a record already in the directory
    #[error("file inconsistent with existing DICOMDIR record: {0}")]
    InconsistentWithExistingRecord(String),

    /// File could not be parsed as DICOM
    #[error("corrupted file {file}: {reason}")]
    CorruptedFile { file: String, reason: String },

    /// Referenced file ID does not follow the media naming rules
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    /// Record construction failed
    #[error("cannot {operation} {kind} record")]
    Build { kind: RecordKind, operation: String },

    /// Out of memory or arena capacity while mutating the tree
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Icon image could not be produced
    #[error("icon error: {0}")]
    Icon(String),

    /// Invalid tag or option value
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// DICOM reading or writing error
    #[error("DICOM error: {0}")]
    Dicom(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DicomdirError {
    /// Returns whether the error must end the whole session
    pub fn is_fatal(&self) -> bool {
        matches!(self, DicomdirError::ResourceExhausted(_))
    }
}

// Helper conversions
impl From<String> for DicomdirError {
    fn from(s: String) -> Self {
        DicomdirError::InvalidValue(s)
    }
}

impl From<&str> for DicomdirError {
    fn from(s: &str) -> Self {
        DicomdirError::InvalidValue(s.to_string())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for DicomdirError {
    fn from(e: dicom_object::ReadError) -> Self {
        DicomdirError::Dicom(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for DicomdirError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        DicomdirError::InvalidValue(format!("{}", e))
    }
}

//! Referenced File ID and file-set identification rules of PS3.10/PS3.12

use crate::error::{DicomdirError, Result};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Maximum number of path components in a referenced file ID
pub const MAX_FILE_ID_COMPONENTS: usize = 8;

/// Maximum length of one path component
pub const MAX_COMPONENT_LENGTH: usize = 8;

/// Maximum length of a file-set ID
pub const MAX_FILESET_ID_LENGTH: usize = 16;

/// Character sets accepted for the file-set descriptor file
pub const KNOWN_CHARACTER_SETS: &[&str] = &[
    "ISO_IR 100",
    "ISO_IR 101",
    "ISO_IR 109",
    "ISO_IR 110",
    "ISO_IR 144",
    "ISO_IR 127",
    "ISO_IR 126",
    "ISO_IR 138",
    "ISO_IR 148",
    "ISO_IR 166",
    "ISO_IR 13",
    "ISO_IR 192",
];

static COMPONENT_REGEX: OnceLock<Regex> = OnceLock::new();
static FILESET_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_component_regex() -> &'static Regex {
    COMPONENT_REGEX.get_or_init(|| Regex::new(r"^[A-Z0-9_]+$").expect("Failed to compile regex"))
}

fn get_fileset_id_regex() -> &'static Regex {
    FILESET_ID_REGEX.get_or_init(|| Regex::new(r"^[A-Z0-9_ ]*$").expect("Failed to compile regex"))
}

/// Converts a path relative to the file-set root into a DICOM file ID
///
/// Components are joined with `\`. With `map_filenames` lowercase letters
/// are mapped to uppercase and a trailing period is dropped.
///
/// # Example
///
/// ```
/// use dicomdir_core::dataset::filename::to_file_id;
///
/// assert_eq!(to_file_id("IMAGES/CT/IMG001", false).unwrap(), "IMAGES\\CT\\IMG001");
/// assert_eq!(to_file_id("images/img001.", true).unwrap(), "IMAGES\\IMG001");
/// assert!(to_file_id("images/img001.dcm", true).is_err());
/// ```
pub fn to_file_id(path: impl AsRef<Path>, map_filenames: bool) -> Result<String> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    DicomdirError::InvalidFilename(format!("not a valid UTF-8 name: {}", display))
                })?;
                components.push(check_component(part, map_filenames, &display)?);
            }
            Component::CurDir => {}
            _ => {
                return Err(DicomdirError::InvalidFilename(format!(
                    "file ID must be a relative path below the file-set root: {}",
                    display
                )))
            }
        }
    }

    if components.is_empty() {
        return Err(DicomdirError::InvalidFilename(format!(
            "empty file ID: {}",
            display
        )));
    }
    if components.len() > MAX_FILE_ID_COMPONENTS {
        return Err(DicomdirError::InvalidFilename(format!(
            "too many path components (max {}) in filename: {}",
            MAX_FILE_ID_COMPONENTS, display
        )));
    }
    Ok(components.join("\\"))
}

fn check_component(part: &str, map_filenames: bool, display: &str) -> Result<String> {
    let mapped = if map_filenames {
        part.strip_suffix('.').unwrap_or(part).to_ascii_uppercase()
    } else {
        part.to_string()
    };

    if mapped.len() > MAX_COMPONENT_LENGTH {
        return Err(DicomdirError::InvalidFilename(format!(
            "component {} too large (max {} characters) in filename: {}",
            part, MAX_COMPONENT_LENGTH, display
        )));
    }
    if !get_component_regex().is_match(&mapped) {
        return Err(DicomdirError::InvalidFilename(format!(
            "invalid character(s) in component {} of filename: {}",
            part, display
        )));
    }
    Ok(mapped)
}

/// Converts a DICOM file ID back into a host path relative to the file-set root
pub fn to_host_path(file_id: &str) -> PathBuf {
    file_id
        .split('\\')
        .filter(|part| !part.is_empty())
        .collect()
}

/// Validates a file-set ID (0004,1130)
pub fn validate_fileset_id(id: &str) -> Result<()> {
    if id.len() > MAX_FILESET_ID_LENGTH {
        return Err(DicomdirError::InvalidValue(format!(
            "file-set ID too long (max {} characters): {}",
            MAX_FILESET_ID_LENGTH, id
        )));
    }
    if !get_fileset_id_regex().is_match(id) {
        return Err(DicomdirError::InvalidValue(format!(
            "invalid character(s) in file-set ID: {}",
            id
        )));
    }
    Ok(())
}

/// Validates the character set of the file-set descriptor file
pub fn validate_charset(charset: &str) -> Result<()> {
    if KNOWN_CHARACTER_SETS.contains(&charset.trim()) {
        Ok(())
    } else {
        Err(DicomdirError::InvalidValue(format!(
            "unknown character set for file-set descriptor: {}",
            charset
        )))
    }
}

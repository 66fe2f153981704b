//! Core type definitions for DICOMDIR construction
//!
//! This module provides the fundamental types used throughout the library:
//! - [`RecordKind`]: Directory record types (Patient, Study, Series, Image, ...)
//! - [`ApplicationProfile`]: Media application profiles of DICOM PS3.11
//! - [`DirectoryMode`]: Create, append or update an index
//! - [`DicomdirConfig`]: Session configuration
//! - [`Diagnostic`]: Structured anomaly reports

mod config;
mod diagnostic;
mod enums;
mod profile;

pub use config::{DicomdirConfig, FilesetDescriptor, IconOptions, MAX_ICON_SIZE, MIN_ICON_SIZE};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use enums::{DirectoryMode, PhotometricInterpretation, RecordKind};
pub use profile::ApplicationProfile;

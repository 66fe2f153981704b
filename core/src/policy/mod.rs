//! Application profile policy
//!
//! A [`ProfilePolicy`] is built once per session from the configuration and
//! answers which SOP classes and transfer syntaxes the selected profile admits.
//! [`validate`] runs every profile rule against one file and decides, per
//! violation category, whether the file is rejected or only warned about.

pub mod checks;
pub mod classifier;
pub mod mandatory;
pub mod table;

pub use checks::{check_image, Violation, ViolationCategory};
pub use classifier::classify;
pub use mandatory::{check_mandatory, MissingAttribute};
pub use table::{IconPolicy, ProfilePolicy, TransferSyntaxRule};

use crate::dataset::uids::transfer_syntax_name;
use crate::error::{DicomdirError, Result};
use crate::types::RecordKind;
use dicom_object::InMemDicomObject;

/// A file the profile admits, with the violations that were only warned about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accepted {
    pub warnings: Vec<String>,
}

impl Accepted {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl ProfilePolicy {
    fn enforces(&self, category: ViolationCategory) -> bool {
        match category {
            ViolationCategory::SopClass | ViolationCategory::Attribute => true,
            ViolationCategory::TransferSyntax => self.reject_transfer_syntax,
            ViolationCategory::Encoding => self.reject_encoding,
            ViolationCategory::Resolution => self.reject_resolution,
        }
    }
}

/// Validates one file against the profile
///
/// All violations are collected in a single pass. The file is rejected with
/// [`DicomdirError::ProfileViolation`] listing every violation when at least
/// one of them belongs to an enforced category; otherwise it is accepted and
/// the violations are returned as warnings.
///
/// # Example
///
/// ```
/// use dicomdir_core::policy::{validate, ProfilePolicy};
/// use dicomdir_core::{ApplicationProfile, DicomdirConfig, DicomdirError};
/// use dicom_object::InMemDicomObject;
///
/// let config = DicomdirConfig::default().with_profile(ApplicationProfile::CtAndMr);
/// let policy = ProfilePolicy::new(&config);
/// let ds = InMemDicomObject::new_empty();
///
/// // Computed radiography is not part of the CT/MR profile
/// let result = validate(&policy, "1.2.840.10008.5.1.4.1.1.1", "1.2.840.10008.1.2.1", &ds, "IMG1");
/// assert!(matches!(result, Err(DicomdirError::ProfileViolation { .. })));
/// ```
pub fn validate(
    policy: &ProfilePolicy,
    sop_class_uid: &str,
    transfer_syntax_uid: &str,
    ds: &InMemDicomObject,
    file: &str,
) -> Result<Accepted> {
    let mut violations = Vec::new();

    if !policy.allows_sop_class(sop_class_uid) {
        violations.push(Violation::new(
            ViolationCategory::SopClass,
            format!(
                "invalid SOP class ({}) for {} profile: {}",
                sop_class_uid,
                policy.profile.simple_name(),
                file
            ),
        ));
    }

    if let TransferSyntaxRule::OneOf(expected) = policy.transfer_syntax_rule(sop_class_uid) {
        if !expected.iter().any(|uid| *uid == transfer_syntax_uid) {
            let names: Vec<&str> = expected.iter().map(|uid| transfer_syntax_name(uid)).collect();
            violations.push(Violation::new(
                ViolationCategory::TransferSyntax,
                format!("{} expected: {}", names.join(" or "), file),
            ));
        }
    }

    if classify(sop_class_uid) == RecordKind::Image {
        violations.extend(check_image(
            policy.profile,
            sop_class_uid,
            transfer_syntax_uid,
            ds,
            file,
        ));
    }

    let rejected = violations.iter().any(|v| policy.enforces(v.category));
    let messages: Vec<String> = violations.into_iter().map(|v| v.message).collect();

    if rejected {
        for message in &messages {
            log::error!("{}", message);
        }
        Err(DicomdirError::ProfileViolation {
            file: file.to_string(),
            reasons: messages,
        })
    } else {
        for message in &messages {
            log::warn!("{}", message);
        }
        Ok(Accepted { warnings: messages })
    }
}

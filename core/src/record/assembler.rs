//! Placement of a file's records in the directory hierarchy
//!
//! A file contributes up to four records (Patient, Study, Series and its
//! own instance record). Each level is either matched against an existing
//! child of the level above by its natural key or newly built and inserted
//! in key order.

use super::consistency::{check_consistency, Consistency};
use super::icon::IconGenerator;
use super::{DirectoryRecord, RecordBuilder, RecordId, RecordTree, SourceFile};
use crate::dataset::filename::to_host_path;
use crate::dataset::tags::*;
use crate::error::{DicomdirError, Result};
use crate::policy::IconPolicy;
use crate::types::{DiagnosticKind, DicomdirConfig, Diagnostics, RecordKind};
use dicom_object::{open_file, InMemDicomObject};
use log::{debug, warn};
use std::path::Path;

/// Where a record of the file ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: RecordId,
    /// `false` when an existing record was matched
    pub created: bool,
}

/// Inserts the records of one file into a [`RecordTree`]
pub struct HierarchyAssembler<'a> {
    config: &'a DicomdirConfig,
    icon_policy: Option<IconPolicy>,
    /// Directory the referenced file IDs are relative to
    fileset_root: &'a Path,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> HierarchyAssembler<'a> {
    pub fn new(
        config: &'a DicomdirConfig,
        icon_policy: Option<IconPolicy>,
        fileset_root: &'a Path,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            config,
            icon_policy,
            fileset_root,
            diagnostics,
        }
    }

    /// Adds every record level of `source` and returns the placement of its
    /// instance record
    ///
    /// Hanging protocols, palettes and implant templates go directly below
    /// the root; everything else below Patient, Study and Series.
    pub fn add(
        &mut self,
        tree: &mut RecordTree,
        kind: RecordKind,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) -> Result<Placement> {
        if self.config.update_mode() {
            self.check_update(tree, kind, ds, source)?;
        }
        if kind.is_root_level() {
            return self.add_record(tree, RecordTree::ROOT, kind, ds, source);
        }
        let patient = self.add_record(tree, RecordTree::ROOT, RecordKind::Patient, ds, source)?;
        let study = self.add_record(tree, patient.id, RecordKind::Study, ds, source)?;
        let series = self.add_record(tree, study.id, RecordKind::Series, ds, source)?;
        self.add_record(tree, series.id, kind, ds, source)
    }

    /// Matches or creates one record of `kind` below `parent`
    pub fn add_record(
        &mut self,
        tree: &mut RecordTree,
        parent: RecordId,
        kind: RecordKind,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) -> Result<Placement> {
        match self.find_match(tree, parent, kind, ds) {
            Some(id) if self.config.update_mode() => {
                self.update(tree, id, kind, ds, source)?;
                Ok(Placement { id, created: false })
            }
            Some(id) => {
                self.already_indexed(tree, id, ds, source)?;
                Ok(Placement { id, created: false })
            }
            None => {
                let mut record = RecordBuilder::new(self.config.profile, self.diagnostics)
                    .build(kind, None, ds, source)?;
                if kind == RecordKind::Image {
                    self.attach_icon(&mut record, ds, source);
                }
                let id = tree.insert_sorted(parent, record)?;
                debug!("created {} record for {}", kind, source.name());
                Ok(Placement { id, created: true })
            }
        }
    }

    /// Rejects an update of the instance record before any level above it
    /// is rewritten
    fn check_update(
        &self,
        tree: &RecordTree,
        kind: RecordKind,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) -> Result<()> {
        let mut parent = RecordTree::ROOT;
        if !kind.is_root_level() {
            for level in [RecordKind::Patient, RecordKind::Study, RecordKind::Series] {
                match self.find_match(tree, parent, level, ds) {
                    Some(id) => parent = id,
                    None => return Ok(()),
                }
            }
        }
        match self
            .find_match(tree, parent, kind, ds)
            .and_then(|id| tree.get(id))
        {
            Some(existing) => check_replaceable(existing, kind, ds, source),
            None => Ok(()),
        }
    }

    fn update(
        &mut self,
        tree: &mut RecordTree,
        id: RecordId,
        kind: RecordKind,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) -> Result<()> {
        let existing = tree
            .get(id)
            .cloned()
            .ok_or_else(|| DicomdirError::Build {
                kind,
                operation: "update".to_string(),
            })?;

        check_replaceable(&existing, kind, ds, source)?;

        let mut record = RecordBuilder::new(self.config.profile, self.diagnostics)
            .build(kind, Some(existing), ds, source)?;
        if kind == RecordKind::Image {
            self.attach_icon(&mut record, ds, source);
        }
        if let Some(slot) = tree.get_mut(id) {
            *slot = record;
        }
        debug!("updated {} record from {}", kind, source.name());
        Ok(())
    }

    /// Handles a file whose record already exists outside update mode
    fn already_indexed(
        &mut self,
        tree: &RecordTree,
        id: RecordId,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) -> Result<()> {
        let record = match tree.get(id) {
            Some(record) => record,
            None => return Ok(()),
        };
        let file = source.name();
        if record.kind.is_instance_level() {
            self.diagnostics.warning(
                DiagnosticKind::AlreadyIndexed,
                &file,
                format!(
                    "{} record for file {} already exists (origin: {})",
                    record.kind,
                    file,
                    record.origin_file.as_deref().unwrap_or("<unknown>")
                ),
            );
        }
        if !self.config.check_consistency {
            return Ok(());
        }

        let abort = self.config.abort_on_inconsistency;
        if let Consistency::Inconsistent(reasons) = check_consistency(record, ds, &file, abort) {
            if abort {
                for reason in &reasons {
                    log::error!("{}", reason);
                }
                return Err(DicomdirError::InconsistentWithExistingRecord(
                    reasons.join("; "),
                ));
            }
            for reason in reasons {
                warn!("{}", reason);
                self.diagnostics
                    .warning(DiagnosticKind::Inconsistent, &file, reason);
            }
        }
        Ok(())
    }

    fn find_match(
        &self,
        tree: &RecordTree,
        parent: RecordId,
        kind: RecordKind,
        ds: &InMemDicomObject,
    ) -> Option<RecordId> {
        let same_kind = |id: &RecordId| tree.get(*id).map(|r| r.kind == kind).unwrap_or(false);
        let candidates: Vec<RecordId> = tree
            .children(parent)
            .iter()
            .copied()
            .filter(same_kind)
            .collect();

        match kind {
            RecordKind::Patient => match non_empty(ds, PATIENT_ID) {
                Some(id) => self.first_with(tree, &candidates, PATIENT_ID, &id),
                None => {
                    let name = get_string_value(ds, PATIENT_NAME).unwrap_or_default();
                    self.first_with(tree, &candidates, PATIENT_NAME, &name)
                }
            },
            RecordKind::Study => {
                let uid = non_empty(ds, STUDY_INSTANCE_UID)?;
                candidates
                    .into_iter()
                    .find(|&id| self.study_uid(tree, id).as_deref() == Some(uid.as_str()))
            }
            RecordKind::Series => {
                let uid = non_empty(ds, SERIES_INSTANCE_UID)?;
                self.first_with(tree, &candidates, SERIES_INSTANCE_UID, &uid)
            }
            _ => {
                let uid = non_empty(ds, SOP_INSTANCE_UID)?;
                self.first_with(tree, &candidates, REFERENCED_SOP_INSTANCE_UID_IN_FILE, &uid)
            }
        }
    }

    fn first_with(
        &self,
        tree: &RecordTree,
        candidates: &[RecordId],
        tag: dicom_core::Tag,
        value: &str,
    ) -> Option<RecordId> {
        candidates.iter().copied().find(|&id| {
            tree.get(id)
                .map(|r| r.string_value(tag).unwrap_or_default() == value)
                .unwrap_or(false)
        })
    }

    /// StudyInstanceUID of a study record
    ///
    /// Records read from an index may lack the UID; it is then taken from the
    /// first file referenced below the study.
    fn study_uid(&self, tree: &RecordTree, study: RecordId) -> Option<String> {
        let record = tree.get(study)?;
        if let Some(uid) = record.string_value(STUDY_INSTANCE_UID).filter(|s| !s.is_empty()) {
            return Some(uid);
        }
        let file_id = record.referenced_file_id.clone().or_else(|| {
            let mut pending = tree.children(study).to_vec();
            while let Some(id) = pending.pop() {
                let child = tree.get(id)?;
                if let Some(file_id) = &child.referenced_file_id {
                    return Some(file_id.clone());
                }
                pending.extend(child.children().iter().rev());
            }
            None
        })?;

        let path = self.fileset_root.join(to_host_path(&file_id));
        match open_file(&path) {
            Ok(obj) => get_string_value(&obj, STUDY_INSTANCE_UID),
            Err(e) => {
                warn!("cannot read referenced file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn attach_icon(
        &mut self,
        record: &mut DirectoryRecord,
        ds: &InMemDicomObject,
        source: &SourceFile,
    ) {
        let options = &self.config.icons;
        if !options.enabled && self.icon_policy.is_none() {
            return;
        }
        let size = self.icon_policy.map(|p| p.size).unwrap_or(options.size);
        let required = self.icon_policy.map(|p| p.required).unwrap_or(false);
        let file = source.name();

        let host_path = self.fileset_root.join(&source.path);
        match IconGenerator::new(options).attach(
            record,
            ds,
            &host_path,
            &source.transfer_syntax_uid,
            size,
        ) {
            Ok(icon) if icon.is_real() => {}
            Ok(_) => {
                let message = format!("cannot create icon image from file: {}", file);
                if required {
                    self.diagnostics.error(DiagnosticKind::Icon, &file, message);
                } else {
                    self.diagnostics.warning(DiagnosticKind::Icon, &file, message);
                }
            }
            Err(e) => {
                self.diagnostics
                    .error(DiagnosticKind::Icon, &file, format!("{} in file: {}", e, file));
            }
        }
    }
}

/// An instance record may only be refreshed from the file it references
fn check_replaceable(
    existing: &DirectoryRecord,
    kind: RecordKind,
    ds: &InMemDicomObject,
    source: &SourceFile,
) -> Result<()> {
    if !kind.is_instance_level() {
        return Ok(());
    }
    let same_file = existing.referenced_file_id.as_deref() == Some(source.file_id.as_str());
    let sop_class = non_empty(ds, SOP_CLASS_UID).unwrap_or_else(|| source.sop_class_uid.clone());
    let same_class = existing.string_value(REFERENCED_SOP_CLASS_UID_IN_FILE).as_deref()
        == Some(sop_class.as_str());
    if same_file && same_class {
        return Ok(());
    }
    let reason = format!(
        "{} record (origin: {}) references file {} of another SOP class or path, cannot update from file: {}",
        kind,
        existing.origin_file.as_deref().unwrap_or("<unknown>"),
        existing.referenced_file_id.as_deref().unwrap_or(""),
        source.name()
    );
    log::error!("{}", reason);
    Err(DicomdirError::InconsistentWithExistingRecord(reason))
}

fn non_empty(ds: &InMemDicomObject, tag: dicom_core::Tag) -> Option<String> {
    get_string_value(ds, tag).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApplicationProfile, DirectoryMode};
    use dicom_dictionary_std::uids::{CT_IMAGE_STORAGE, EXPLICIT_VR_LITTLE_ENDIAN};
    use dicom_object::FileMetaTableBuilder;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ct(patient: &str, study: &str, series: &str, number: &str) -> InMemDicomObject {
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, SOP_CLASS_UID, CT_IMAGE_STORAGE);
        put_string(&mut ds, SOP_INSTANCE_UID, &format!("{}.{}", series, number));
        put_string(&mut ds, PATIENT_ID, patient);
        put_string(&mut ds, PATIENT_NAME, "Doe^Jane");
        put_string(&mut ds, STUDY_INSTANCE_UID, study);
        put_string(&mut ds, STUDY_DATE, "20240101");
        put_string(&mut ds, STUDY_TIME, "120000");
        put_string(&mut ds, STUDY_ID, "1");
        put_string(&mut ds, SERIES_INSTANCE_UID, series);
        put_string(&mut ds, SERIES_NUMBER, "1");
        put_string(&mut ds, MODALITY, "CT");
        put_string(&mut ds, INSTANCE_NUMBER, number);
        ds
    }

    fn source(name: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(name),
            file_id: name.to_uppercase(),
            sop_class_uid: CT_IMAGE_STORAGE.to_string(),
            transfer_syntax_uid: EXPLICIT_VR_LITTLE_ENDIAN.to_string(),
        }
    }

    fn add(
        config: &DicomdirConfig,
        tree: &mut RecordTree,
        diags: &mut Diagnostics,
        ds: &InMemDicomObject,
        name: &str,
    ) -> Result<Placement> {
        HierarchyAssembler::new(config, None, Path::new("."), diags).add(
            tree,
            RecordKind::Image,
            ds,
            &source(name),
        )
    }

    #[test]
    fn test_one_record_per_level() {
        let config = DicomdirConfig::default().with_profile(ApplicationProfile::CtAndMr);
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();

        add(&config, &mut tree, &mut diags, &ct("P1", "S1", "SE1", "1"), "img1").unwrap();
        add(&config, &mut tree, &mut diags, &ct("P1", "S1", "SE1", "2"), "img2").unwrap();
        add(&config, &mut tree, &mut diags, &ct("P1", "S1", "SE2", "1"), "img3").unwrap();
        add(&config, &mut tree, &mut diags, &ct("P2", "S2", "SE3", "1"), "img4").unwrap();

        assert_eq!(tree.count_kind(RecordKind::Patient), 2);
        assert_eq!(tree.count_kind(RecordKind::Study), 2);
        assert_eq!(tree.count_kind(RecordKind::Series), 3);
        assert_eq!(tree.count_kind(RecordKind::Image), 4);
        assert!(!diags.has_kind(DiagnosticKind::Inconsistent));
    }

    #[test]
    fn test_patient_matched_by_name_without_id() {
        let config = DicomdirConfig::default();
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let mut first = ct("", "S1", "SE1", "1");
        first.remove_element(PATIENT_ID);
        let mut second = ct("", "S1", "SE1", "2");
        second.remove_element(PATIENT_ID);

        add(&config, &mut tree, &mut diags, &first, "img1").unwrap();
        add(&config, &mut tree, &mut diags, &second, "img2").unwrap();
        assert_eq!(tree.count_kind(RecordKind::Patient), 1);
    }

    #[test]
    fn test_readd_is_already_indexed_and_consistent() {
        let config = DicomdirConfig::default();
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let ds = ct("P1", "S1", "SE1", "1");

        let first = add(&config, &mut tree, &mut diags, &ds, "img1").unwrap();
        let second = add(&config, &mut tree, &mut diags, &ds, "img1").unwrap();

        assert!(first.created);
        assert_eq!(second, Placement { id: first.id, created: false });
        assert_eq!(tree.record_count(), 4);
        assert!(diags.has_kind(DiagnosticKind::AlreadyIndexed));
        assert!(!diags.has_kind(DiagnosticKind::Inconsistent));
    }

    #[test]
    fn test_inconsistency_warns_or_aborts() {
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let config = DicomdirConfig::default();
        add(&config, &mut tree, &mut diags, &ct("P1", "S1", "SE1", "1"), "img1").unwrap();

        let mut renamed = ct("P1", "S1", "SE1", "2");
        put_string(&mut renamed, PATIENT_NAME, "Roe^Jane");
        add(&config, &mut tree, &mut diags, &renamed, "img2").unwrap();
        assert!(diags.has_kind(DiagnosticKind::Inconsistent));

        let strict = DicomdirConfig::default().abort_on_inconsistency(true);
        let err = add(&strict, &mut tree, &mut diags, &renamed, "img3").unwrap_err();
        assert!(matches!(err, DicomdirError::InconsistentWithExistingRecord(_)));
    }

    #[test]
    fn test_update_mode_refreshes_in_place() {
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let config = DicomdirConfig::default().with_mode(DirectoryMode::Update);
        let ds = ct("P1", "S1", "SE1", "1");
        let first = add(&config, &mut tree, &mut diags, &ds, "img1").unwrap();

        let mut renamed = ds.clone();
        put_string(&mut renamed, PATIENT_NAME, "Roe^Jane");
        let second = add(&config, &mut tree, &mut diags, &renamed, "img1").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(tree.record_count(), 4);
        let patient = tree.children(RecordTree::ROOT)[0];
        assert_eq!(
            tree.get(patient).unwrap().string_value(PATIENT_NAME).as_deref(),
            Some("Roe^Jane")
        );
        assert_eq!(tree.get(patient).unwrap().origin_file.as_deref(), Some("img1"));
        assert!(!diags.has_kind(DiagnosticKind::Inconsistent));
    }

    #[test]
    fn test_update_rejects_other_file_id() {
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let config = DicomdirConfig::default().with_mode(DirectoryMode::Update);
        let ds = ct("P1", "S1", "SE1", "1");
        add(&config, &mut tree, &mut diags, &ds, "img1").unwrap();

        let err = add(&config, &mut tree, &mut diags, &ds, "copy").unwrap_err();
        assert!(matches!(err, DicomdirError::InconsistentWithExistingRecord(_)));
    }

    #[test]
    fn test_rejected_update_leaves_tree_unchanged() {
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let config = DicomdirConfig::default().with_mode(DirectoryMode::Update);
        add(&config, &mut tree, &mut diags, &ct("P1", "S1", "SE1", "1"), "img1").unwrap();
        let before = format!("{:?}", tree);

        let mut renamed = ct("P1", "S1", "SE1", "1");
        put_string(&mut renamed, PATIENT_NAME, "Roe^Jane");
        put_string(&mut renamed, STUDY_DATE, "20250101");
        put_string(&mut renamed, SERIES_NUMBER, "7");
        let err = add(&config, &mut tree, &mut diags, &renamed, "copy").unwrap_err();

        assert!(matches!(err, DicomdirError::InconsistentWithExistingRecord(_)));
        assert_eq!(format!("{:?}", tree), before);
        let patient = tree.children(RecordTree::ROOT)[0];
        assert_eq!(
            tree.get(patient).unwrap().string_value(PATIENT_NAME).as_deref(),
            Some("Doe^Jane")
        );
    }

    #[test]
    fn test_series_children_sorted() {
        let config = DicomdirConfig::default();
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        for number in ["1", "3", "2"] {
            let name = format!("img{}", number);
            add(&config, &mut tree, &mut diags, &ct("P1", "S1", "SE1", number), &name).unwrap();
        }
        let series = tree.depth_first()[2];
        let numbers: Vec<String> = tree
            .children(series)
            .iter()
            .filter_map(|&id| tree.get(id).unwrap().string_value(INSTANCE_NUMBER))
            .collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_root_level_kinds_skip_patient() {
        let config = DicomdirConfig::default();
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, SOP_INSTANCE_UID, "1.2.9");
        put_string(&mut ds, CONTENT_LABEL, "HOT");

        HierarchyAssembler::new(&config, None, Path::new("."), &mut diags)
            .add(&mut tree, RecordKind::Palette, &ds, &source("pal1"))
            .unwrap();
        assert_eq!(tree.record_count(), 1);
        let palette = tree.children(RecordTree::ROOT)[0];
        assert_eq!(tree.get(palette).unwrap().kind, RecordKind::Palette);
    }

    #[test]
    fn test_study_uid_from_referenced_file() {
        let dir = TempDir::new().unwrap();
        let ds = ct("P1", "S1", "SE1", "1");
        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
            .media_storage_sop_instance_uid("SE1.1")
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
            .build()
            .unwrap();
        ds.clone()
            .with_exact_meta(meta)
            .write_to_file(dir.path().join("IMG1"))
            .unwrap();

        let config = DicomdirConfig::default();
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        HierarchyAssembler::new(&config, None, dir.path(), &mut diags)
            .add(&mut tree, RecordKind::Image, &ds, &source("img1"))
            .unwrap();

        // an index read from disk may carry study records without the UID
        let study = tree.depth_first()[1];
        tree.get_mut(study)
            .unwrap()
            .attributes
            .remove_element(STUDY_INSTANCE_UID);

        HierarchyAssembler::new(&config, None, dir.path(), &mut diags)
            .add(&mut tree, RecordKind::Image, &ct("P1", "S1", "SE1", "2"), &source("img2"))
            .unwrap();
        assert_eq!(tree.count_kind(RecordKind::Study), 1);
    }

    #[test]
    fn test_required_icon_without_source_is_an_error() {
        let config = DicomdirConfig::default();
        let mut tree = RecordTree::new();
        let mut diags = Diagnostics::new();
        let policy = IconPolicy {
            size: 64,
            required: true,
        };
        HierarchyAssembler::new(&config, Some(policy), Path::new("."), &mut diags)
            .add(&mut tree, RecordKind::Image, &ct("P1", "S1", "SE1", "1"), &source("img1"))
            .unwrap();

        let image = tree.depth_first()[3];
        assert!(exists(&tree.get(image).unwrap().attributes, ICON_IMAGE_SEQUENCE));
        assert!(diags
            .entries()
            .iter()
            .any(|d| d.kind == DiagnosticKind::Icon
                && d.severity == crate::types::Severity::Error));
    }
}

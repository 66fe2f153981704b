use crate::dataset::filename::{to_file_id, validate_charset, validate_fileset_id};
use crate::dataset::tags::{tag_label, MEDIA_STORAGE_SOP_CLASS_UID, TRANSFER_SYNTAX_UID};
use crate::error::{DicomdirError, Result};
use crate::policy::{check_mandatory, classify, validate, ProfilePolicy};
use crate::record::assembler::HierarchyAssembler;
use crate::record::{read_index, write_index, AttributeInventor, DirectoryIndex, RecordTree, SourceFile};
use crate::types::{
    DiagnosticKind, DicomdirConfig, Diagnostics, DirectoryMode, FilesetDescriptor, RecordKind,
};
use dicom_object::open_file;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

/// Builds, extends or updates one DICOMDIR file
///
/// A session owns the record tree from opening until [`DicomdirSession::write`].
/// Files are added one at a time; a failing file is reported and leaves the
/// rest of the tree untouched.
///
/// # Example
///
/// ```no_run
/// use dicomdir_core::{ApplicationProfile, DicomdirConfig, DicomdirSession};
///
/// let config = DicomdirConfig::default().with_profile(ApplicationProfile::CtAndMr);
/// let mut session = DicomdirSession::create("media/DICOMDIR", config).unwrap();
///
/// // file IDs are relative to the directory holding the DICOMDIR
/// session.add_file("CT/IMG001").unwrap();
/// session.write().unwrap();
/// ```
pub struct DicomdirSession {
    config: DicomdirConfig,
    policy: ProfilePolicy,
    output: PathBuf,
    fileset_root: PathBuf,
    index: DirectoryIndex,
    inventor: AttributeInventor,
    diagnostics: Diagnostics,
    files: Vec<FileStatus>,
}

/// Result of a successful [`DicomdirSession::add_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct AddOutcome {
    /// Kind of the file's own record
    pub kind: RecordKind,
    /// ReferencedFileID of the file
    pub file_id: String,
    /// `false` when the file was already indexed
    pub created: bool,
}

/// Pass/fail state of one added file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct FileStatus {
    pub file: String,
    /// Why the file was rejected, `None` if it was added
    pub error: Option<String>,
}

impl FileStatus {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

impl DicomdirSession {
    /// Starts a new, empty directory at `path`
    ///
    /// An existing file at `path` is replaced by [`DicomdirSession::write`].
    pub fn create(path: impl AsRef<Path>, config: DicomdirConfig) -> Result<Self> {
        let config = config.with_mode(DirectoryMode::Create);
        Self::open(path.as_ref(), config, DirectoryIndex::new())
    }

    /// Opens the directory at `path` to add new records
    pub fn append(path: impl AsRef<Path>, config: DicomdirConfig) -> Result<Self> {
        let path = path.as_ref();
        let index = load_existing(path)?;
        Self::open(path, config.with_mode(DirectoryMode::Append), index)
    }

    /// Opens the directory at `path` to add new records and refresh existing ones
    pub fn update(path: impl AsRef<Path>, config: DicomdirConfig) -> Result<Self> {
        let path = path.as_ref();
        let index = load_existing(path)?;
        Self::open(path, config.with_mode(DirectoryMode::Update), index)
    }

    fn open(path: &Path, config: DicomdirConfig, mut index: DirectoryIndex) -> Result<Self> {
        if let Some(id) = &config.fileset_id {
            validate_fileset_id(id)?;
            index.fileset_id = Some(id.clone());
        }
        if let Some(descriptor) = &config.descriptor {
            index.descriptor = Some(checked_descriptor(
                &descriptor.file_id,
                descriptor.charset.as_deref(),
                config.map_filenames,
            )?);
        }

        let fileset_root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        info!(
            "{} {} with {} profile",
            config.mode,
            path.display(),
            config.profile.name()
        );

        Ok(Self {
            policy: ProfilePolicy::new(&config),
            config,
            output: path.to_path_buf(),
            fileset_root,
            index,
            inventor: AttributeInventor::new(),
            diagnostics: Diagnostics::new(),
            files: Vec::new(),
        })
    }

    /// Adds one file, given relative to the directory holding the DICOMDIR
    ///
    /// # Errors
    ///
    /// Returns the error that rejected this file. Only
    /// [`DicomdirError::ResourceExhausted`] should end the session.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<AddOutcome> {
        let path = path.as_ref();
        let file = path.display().to_string();
        let result = self.try_add(path, &file);

        match &result {
            Ok(outcome) => {
                debug!("added {} as {} record", file, outcome.kind);
                self.files.push(FileStatus { file, error: None });
            }
            Err(e) => {
                error!("{}", e);
                self.diagnostics.error(error_kind(e), &file, e.to_string());
                self.files.push(FileStatus {
                    file,
                    error: Some(e.to_string()),
                });
            }
        }
        result
    }

    fn try_add(&mut self, path: &Path, file: &str) -> Result<AddOutcome> {
        let file_id = to_file_id(path, self.config.map_filenames)?;
        let host_path = self.fileset_root.join(path);
        let obj = open_file(&host_path).map_err(|e| DicomdirError::CorruptedFile {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

        let sop_class_uid = meta_uid(&obj.meta().media_storage_sop_class_uid);
        let transfer_syntax_uid = meta_uid(&obj.meta().transfer_syntax);
        for (tag, value) in [
            (MEDIA_STORAGE_SOP_CLASS_UID, &sop_class_uid),
            (TRANSFER_SYNTAX_UID, &transfer_syntax_uid),
        ] {
            if value.is_empty() {
                return Err(DicomdirError::MandatoryAttributeMissing {
                    tag: tag_label(tag),
                    file: file.to_string(),
                });
            }
        }
        let ds = obj.into_inner();

        let kind = classify(&sop_class_uid);
        let accepted = validate(&self.policy, &sop_class_uid, &transfer_syntax_uid, &ds, file)?;
        for warning in accepted.warnings {
            self.diagnostics
                .warning(DiagnosticKind::ProfileViolation, file, warning);
        }

        let missing = check_mandatory(
            kind,
            self.config.profile,
            &ds,
            self.config.inventing(),
            self.config.inventing_patient_id(),
        );
        if self.config.reject_invalid {
            if let Some(first) = missing.into_iter().next() {
                return Err(first.into_error(file));
            }
        } else {
            for attribute in missing {
                let e = attribute.into_error(file);
                warn!("{}", e);
                self.diagnostics.warning(error_kind(&e), file, e.to_string());
            }
        }

        let source = SourceFile {
            path: path.to_path_buf(),
            file_id: file_id.clone(),
            sop_class_uid,
            transfer_syntax_uid,
        };
        let placement = HierarchyAssembler::new(
            &self.config,
            self.policy.icon(),
            &self.fileset_root,
            &mut self.diagnostics,
        )
        .add(&mut self.index.tree, kind, &ds, &source)?;

        if self.config.inventing_patient_id() {
            self.inventor.invent_missing(
                &mut self.index.tree,
                self.config.inventing(),
                &mut self.diagnostics,
            );
        }

        Ok(AddOutcome {
            kind,
            file_id,
            created: placement.created,
        })
    }

    /// Sets the file-set descriptor file and its character set
    pub fn set_fileset_descriptor(
        &mut self,
        file_id: impl AsRef<Path>,
        charset: Option<&str>,
    ) -> Result<()> {
        let descriptor = checked_descriptor(file_id, charset, self.config.map_filenames)?;
        self.index.descriptor = Some(descriptor);
        Ok(())
    }

    /// Back-fills missing keys over the whole tree; returns how many values
    /// were invented
    ///
    /// Runs regardless of the invent switches, which only control the
    /// automatic pass after each file.
    pub fn invent_missing(&mut self) -> usize {
        self.inventor
            .invent_missing(&mut self.index.tree, true, &mut self.diagnostics)
    }

    /// Writes the directory, keeping a `.BAK` copy of any previous file until
    /// the new one is complete
    pub fn write(&mut self) -> Result<()> {
        let backup = if self.config.backup && self.output.exists() {
            let backup = backup_path(&self.output);
            std::fs::rename(&self.output, &backup)?;
            debug!("backed up {} to {}", self.output.display(), backup.display());
            Some(backup)
        } else {
            None
        };

        match write_index(&self.index, &self.output) {
            Ok(()) => {
                if let Some(backup) = backup {
                    if let Err(e) = std::fs::remove_file(&backup) {
                        warn!("cannot remove backup {}: {}", backup.display(), e);
                    }
                }
                info!(
                    "wrote {} records to {}",
                    self.index.tree.record_count(),
                    self.output.display()
                );
                Ok(())
            }
            Err(e) => {
                if let Some(backup) = backup {
                    let _ = std::fs::remove_file(&self.output);
                    if let Err(restore) = std::fs::rename(&backup, &self.output) {
                        error!(
                            "cannot restore {} from {}: {}",
                            self.output.display(),
                            backup.display(),
                            restore
                        );
                    }
                }
                Err(e)
            }
        }
    }

    pub fn tree(&self) -> &RecordTree {
        &self.index.tree
    }

    pub fn index(&self) -> &DirectoryIndex {
        &self.index
    }

    pub fn config(&self) -> &DicomdirConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Every file passed to [`DicomdirSession::add_file`], in order
    pub fn files(&self) -> &[FileStatus] {
        &self.files
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

fn load_existing(path: &Path) -> Result<DirectoryIndex> {
    if !path.exists() {
        return Err(DicomdirError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no DICOMDIR at {}", path.display()),
        )));
    }
    read_index(path)
}

fn checked_descriptor(
    file_id: impl AsRef<Path>,
    charset: Option<&str>,
    map_filenames: bool,
) -> Result<FilesetDescriptor> {
    let file_id = to_file_id(file_id, map_filenames)?;
    if let Some(charset) = charset {
        validate_charset(charset)?;
    }
    Ok(FilesetDescriptor {
        file_id,
        charset: charset.map(str::to_string),
    })
}

fn meta_uid(value: &str) -> String {
    value
        .trim_end_matches(|c: char| c == '\0' || c == ' ')
        .to_string()
}

fn backup_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "DICOMDIR".to_string());
    output.with_file_name(format!("{}.BAK", name))
}

/// Diagnostic kind under which a rejected file is reported
fn error_kind(e: &DicomdirError) -> DiagnosticKind {
    match e {
        DicomdirError::ProfileViolation { .. } => DiagnosticKind::ProfileViolation,
        DicomdirError::MandatoryAttributeMissing { .. } => DiagnosticKind::MandatoryAttributeMissing,
        DicomdirError::MandatoryAttributeEmpty { .. } => DiagnosticKind::MandatoryAttributeEmpty,
        DicomdirError::InconsistentWithExistingRecord(_) => DiagnosticKind::Inconsistent,
        DicomdirError::Icon(_) => DiagnosticKind::Icon,
        _ => DiagnosticKind::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tags::*;
    use crate::types::ApplicationProfile;
    use dicom_dictionary_std::uids::{
        CT_IMAGE_STORAGE, EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
        SECONDARY_CAPTURE_IMAGE_STORAGE,
    };
    use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
    use tempfile::TempDir;

    fn ct(patient: Option<&str>, number: &str) -> InMemDicomObject {
        let mut ds = InMemDicomObject::new_empty();
        put_string(&mut ds, SOP_CLASS_UID, CT_IMAGE_STORAGE);
        put_string(&mut ds, SOP_INSTANCE_UID, &format!("1.2.3.4.{}", number));
        if let Some(patient) = patient {
            put_string(&mut ds, PATIENT_ID, patient);
        }
        put_string(&mut ds, PATIENT_NAME, "Doe^Jane");
        put_string(&mut ds, STUDY_INSTANCE_UID, "1.2.3");
        put_string(&mut ds, STUDY_DATE, "20240101");
        put_string(&mut ds, STUDY_TIME, "120000");
        put_string(&mut ds, STUDY_ID, "S1");
        put_string(&mut ds, SERIES_INSTANCE_UID, "1.2.3.4");
        put_string(&mut ds, SERIES_NUMBER, "1");
        put_string(&mut ds, MODALITY, "CT");
        put_string(&mut ds, INSTANCE_NUMBER, number);
        put_string(&mut ds, PHOTOMETRIC_INTERPRETATION, "MONOCHROME2");
        put_u16(&mut ds, ROWS, 512);
        put_u16(&mut ds, COLUMNS, 512);
        ds
    }

    fn write_file(dir: &Path, name: &str, ds: &InMemDicomObject, transfer_syntax: &str) {
        let sop_class = get_string_value(ds, SOP_CLASS_UID).unwrap();
        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(sop_class)
            .media_storage_sop_instance_uid(get_string_value(ds, SOP_INSTANCE_UID).unwrap())
            .transfer_syntax(transfer_syntax)
            .build()
            .unwrap();
        ds.clone()
            .with_exact_meta(meta)
            .write_to_file(dir.join(name))
            .unwrap();
    }

    fn ctmr() -> DicomdirConfig {
        DicomdirConfig::default().with_profile(ApplicationProfile::CtAndMr)
    }

    fn kinds(tree: &RecordTree) -> Vec<RecordKind> {
        tree.depth_first()
            .into_iter()
            .map(|id| tree.get(id).unwrap().kind)
            .collect()
    }

    fn instance_numbers(tree: &RecordTree) -> Vec<String> {
        tree.depth_first()
            .into_iter()
            .filter_map(|id| tree.get(id))
            .filter(|r| r.kind == RecordKind::Image)
            .filter_map(|r| r.string_value(INSTANCE_NUMBER))
            .collect()
    }

    #[test]
    fn test_ct_image_builds_full_hierarchy() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "IMG1", &ct(Some("P1"), "1"), EXPLICIT_VR_LITTLE_ENDIAN);

        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        let outcome = session.add_file("IMG1").unwrap();

        assert_eq!(
            outcome,
            AddOutcome {
                kind: RecordKind::Image,
                file_id: "IMG1".to_string(),
                created: true
            }
        );
        let tree = session.tree();
        assert_eq!(
            kinds(tree),
            vec![
                RecordKind::Patient,
                RecordKind::Study,
                RecordKind::Series,
                RecordKind::Image
            ]
        );
        let records: Vec<_> = tree.depth_first().into_iter().map(|id| tree.get(id).unwrap()).collect();
        assert_eq!(records[0].string_value(PATIENT_ID).as_deref(), Some("P1"));
        assert_eq!(records[1].string_value(STUDY_INSTANCE_UID).as_deref(), Some("1.2.3"));
        assert_eq!(records[2].string_value(SERIES_INSTANCE_UID).as_deref(), Some("1.2.3.4"));
        assert_eq!(records[3].string_value(INSTANCE_NUMBER).as_deref(), Some("1"));
        assert!(!session.diagnostics().has_kind(DiagnosticKind::ProfileViolation));
        assert!(session.files()[0].passed());
    }

    #[test]
    fn test_images_ordered_by_instance_number() {
        let dir = TempDir::new().unwrap();
        for number in ["1", "3", "2"] {
            let name = format!("IMG{}", number);
            write_file(dir.path(), &name, &ct(Some("P1"), number), EXPLICIT_VR_LITTLE_ENDIAN);
        }

        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        for name in ["IMG1", "IMG3", "IMG2"] {
            session.add_file(name).unwrap();
        }
        assert_eq!(instance_numbers(session.tree()), vec!["1", "2", "3"]);
        assert_eq!(session.tree().count_kind(RecordKind::Series), 1);
    }

    #[test]
    fn test_missing_patient_id_gets_placeholder() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "IMG1", &ct(None, "1"), EXPLICIT_VR_LITTLE_ENDIAN);

        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        session.add_file("IMG1").unwrap();

        assert!(session
            .diagnostics()
            .has_kind(DiagnosticKind::MandatoryAttributeMissing));
        let patient = session.tree().children(RecordTree::ROOT)[0];
        let record = session.tree().get(patient).unwrap();
        assert!(exists(&record.attributes, PATIENT_ID));
        assert_eq!(record.string_value(PATIENT_ID).as_deref(), Some(""));
    }

    #[test]
    fn test_missing_patient_id_rejected_when_strict() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "IMG1", &ct(None, "1"), EXPLICIT_VR_LITTLE_ENDIAN);

        let config = ctmr().reject_invalid(true);
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), config).unwrap();
        let err = session.add_file("IMG1").unwrap_err();
        assert!(matches!(err, DicomdirError::MandatoryAttributeMissing { .. }));
        assert!(session.tree().is_empty());
        assert!(!session.files()[0].passed());
    }

    #[test]
    fn test_invent_patient_id() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "IMG1", &ct(None, "1"), EXPLICIT_VR_LITTLE_ENDIAN);

        let config = ctmr().invent_patient_id(true);
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), config).unwrap();
        session.add_file("IMG1").unwrap();

        let patient = session.tree().children(RecordTree::ROOT)[0];
        assert_eq!(
            session.tree().get(patient).unwrap().string_value(PATIENT_ID).as_deref(),
            Some("AUTOPAT_000000")
        );
        assert!(session.diagnostics().has_kind(DiagnosticKind::InventedValue));
    }

    #[test]
    fn test_invent_mode_across_files() {
        let dir = TempDir::new().unwrap();
        // (file, patient name, instance UID, instance number)
        let files = [
            ("IMG1", "Doe^Jane", "1.2.3.4.1", Some("10")),
            ("IMG2", "Doe^Jane", "1.2.3.4.2", None),
            ("IMG3", "Roe^John", "1.2.3.4.3", None),
            ("IMG4", "Doe^Jane", "1.2.3.4.4", None),
        ];
        for (name, patient, uid, number) in files {
            let mut ds = ct(None, "1");
            put_string(&mut ds, PATIENT_NAME, patient);
            put_string(&mut ds, SOP_INSTANCE_UID, uid);
            ds.remove_element(STUDY_ID);
            match number {
                Some(number) => put_string(&mut ds, INSTANCE_NUMBER, number),
                None => {
                    ds.remove_element(INSTANCE_NUMBER);
                }
            }
            write_file(dir.path(), name, &ds, EXPLICIT_VR_LITTLE_ENDIAN);
        }

        let config = ctmr().invent(true);
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), config).unwrap();
        for (name, ..) in files {
            session.add_file(name).unwrap();
        }
        let tree = session.tree();

        let values = |kind: RecordKind, tag| -> Vec<String> {
            tree.depth_first()
                .into_iter()
                .filter_map(|id| tree.get(id))
                .filter(|r| r.kind == kind)
                .filter_map(|r| r.string_value(tag))
                .collect()
        };
        assert_eq!(
            values(RecordKind::Patient, PATIENT_ID),
            vec!["AUTOPAT_000000", "AUTOPAT_000001"]
        );
        assert_eq!(
            values(RecordKind::Study, STUDY_ID),
            vec!["AUTOSTDY000000", "AUTOSTDY000001"]
        );
        assert_eq!(instance_numbers(tree), vec!["1", "3", "10", "2"]);

        let mut numbers = instance_numbers(tree);
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 4);

        for series in tree
            .depth_first()
            .into_iter()
            .filter(|&id| tree.get(id).unwrap().kind == RecordKind::Series)
        {
            let keys: Vec<i32> = tree
                .children(series)
                .iter()
                .filter_map(|&id| tree.get(id).unwrap().sort_key())
                .collect();
            assert_eq!(keys.len(), tree.children(series).len());
            assert!(keys.windows(2).all(|w| w[0] <= w[1]), "{:?}", keys);
        }
        assert!(session.files().iter().all(|status| status.passed()));
    }

    #[test]
    fn test_readd_same_file_is_consistent() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "IMG1", &ct(Some("P1"), "1"), EXPLICIT_VR_LITTLE_ENDIAN);

        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        session.add_file("IMG1").unwrap();
        let again = session.add_file("IMG1").unwrap();

        assert!(!again.created);
        assert_eq!(session.tree().record_count(), 4);
        assert!(!session.diagnostics().has_kind(DiagnosticKind::Inconsistent));
    }

    #[test]
    fn test_secondary_capture_ybr_rejected() {
        let dir = TempDir::new().unwrap();
        let mut ds = ct(Some("P1"), "1");
        put_string(&mut ds, SOP_CLASS_UID, SECONDARY_CAPTURE_IMAGE_STORAGE);
        put_string(&mut ds, MODALITY, "OT");
        put_string(&mut ds, PHOTOMETRIC_INTERPRETATION, "YBR_FULL");
        put_u16(&mut ds, SAMPLES_PER_PIXEL, 1);
        write_file(dir.path(), "SC1", &ds, EXPLICIT_VR_LITTLE_ENDIAN);

        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        let err = session.add_file("SC1").unwrap_err();

        match err {
            DicomdirError::ProfileViolation { reasons, .. } => {
                assert!(reasons.iter().any(|r| r.contains("MONOCHROME2 or PALETTE COLOR")))
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(session.tree().is_empty());
    }

    #[test]
    fn test_transfer_syntax_warning_mode() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "IMG1", &ct(Some("P1"), "1"), IMPLICIT_VR_LITTLE_ENDIAN);

        let strict = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr())
            .unwrap()
            .add_file("IMG1");
        assert!(matches!(strict, Err(DicomdirError::ProfileViolation { .. })));

        let config = ctmr().check_transfer_syntax(false);
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), config).unwrap();
        session.add_file("IMG1").unwrap();
        assert!(session.diagnostics().has_kind(DiagnosticKind::ProfileViolation));
    }

    #[test]
    fn test_invalid_file_id_rejected() {
        let dir = TempDir::new().unwrap();
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        let err = session.add_file("img-1.dcm").unwrap_err();
        assert!(matches!(err, DicomdirError::InvalidFilename(_)));
    }

    #[test]
    fn test_unreadable_file_is_corrupted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("JUNK"), b"not dicom at all").unwrap();
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        let err = session.add_file("JUNK").unwrap_err();
        assert!(matches!(err, DicomdirError::CorruptedFile { .. }));
        assert!(session.diagnostics().has_kind(DiagnosticKind::File));
    }

    #[test]
    fn test_write_then_append() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("DICOMDIR");
        write_file(dir.path(), "IMG1", &ct(Some("P1"), "1"), EXPLICIT_VR_LITTLE_ENDIAN);
        write_file(dir.path(), "IMG2", &ct(Some("P1"), "2"), EXPLICIT_VR_LITTLE_ENDIAN);

        let mut session = DicomdirSession::create(&output, ctmr().with_fileset_id("TESTSET")).unwrap();
        session.add_file("IMG1").unwrap();
        session.write().unwrap();

        let mut session = DicomdirSession::append(&output, ctmr()).unwrap();
        assert_eq!(session.tree().record_count(), 4);
        session.add_file("IMG2").unwrap();
        session.write().unwrap();

        assert!(!dir.path().join("DICOMDIR.BAK").exists());
        let index = read_index(&output).unwrap();
        assert_eq!(index.fileset_id.as_deref(), Some("TESTSET"));
        assert_eq!(instance_numbers(&index.tree), vec!["1", "2"]);
        assert_eq!(index.tree.count_kind(RecordKind::Patient), 1);
    }

    #[test]
    fn test_update_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("DICOMDIR");
        write_file(dir.path(), "IMG1", &ct(Some("P1"), "1"), EXPLICIT_VR_LITTLE_ENDIAN);

        let mut session = DicomdirSession::create(&output, ctmr()).unwrap();
        session.add_file("IMG1").unwrap();
        session.write().unwrap();

        let mut session = DicomdirSession::update(&output, ctmr()).unwrap();
        let outcome = session.add_file("IMG1").unwrap();
        assert!(!outcome.created);
        assert_eq!(session.tree().record_count(), 4);
        assert!(!session.diagnostics().has_kind(DiagnosticKind::Inconsistent));
    }

    #[test]
    fn test_append_requires_existing_directory() {
        let dir = TempDir::new().unwrap();
        let result = DicomdirSession::append(dir.path().join("DICOMDIR"), ctmr());
        assert!(matches!(result, Err(DicomdirError::Io(_))));
    }

    #[test]
    fn test_rewrite_leaves_no_backup() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("DICOMDIR");
        DicomdirSession::create(&output, ctmr()).unwrap().write().unwrap();
        DicomdirSession::create(&output, ctmr()).unwrap().write().unwrap();

        assert!(output.exists());
        assert!(!dir.path().join("DICOMDIR.BAK").exists());
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("MISSING").join("DICOMDIR");
        let mut session = DicomdirSession::create(&output, ctmr()).unwrap();
        assert!(session.write().is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_descriptor_is_validated() {
        let dir = TempDir::new().unwrap();
        let mut session = DicomdirSession::create(dir.path().join("DICOMDIR"), ctmr()).unwrap();
        assert!(session
            .set_fileset_descriptor("README", Some("ISO_IR 100"))
            .is_ok());
        assert!(session
            .set_fileset_descriptor("README", Some("KLINGON"))
            .is_err());
        assert!(session
            .set_fileset_descriptor("read.me.txt", None)
            .is_err());
    }
}

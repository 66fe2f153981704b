pub mod report;

use crate::types::{ApplicationProfile, DicomdirConfig, DirectoryMode, IconOptions};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for dcmmkdir
#[derive(Parser, Debug)]
#[command(name = "dcmmkdir")]
#[command(about = "Create, append to or update a DICOMDIR")]
#[command(version)]
pub struct Cli {
    /// DICOM files or directories, relative to the directory holding the DICOMDIR
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// DICOMDIR to write
    #[arg(short, long, default_value = "DICOMDIR")]
    pub output: PathBuf,

    /// Application profile (simple name such as "ctmr" or the PS3.11 identifier)
    #[arg(short, long, default_value = "general", value_parser = parse_profile)]
    pub profile: ApplicationProfile,

    /// Add records to an existing DICOMDIR
    #[arg(short, long, conflicts_with = "update")]
    pub append: bool,

    /// Add records to an existing DICOMDIR and refresh records of re-added files
    #[arg(short, long)]
    pub update: bool,

    /// Invent missing type 1 keys
    #[arg(long)]
    pub invent: bool,

    /// Invent missing patient IDs
    #[arg(long)]
    pub invent_patient_id: bool,

    /// Accept retired SOP classes
    #[arg(long)]
    pub retired: bool,

    /// Only warn about images exceeding the profile's resolution
    #[arg(long)]
    pub no_resolution_check: bool,

    /// Only warn about pixel encodings the profile does not admit
    #[arg(long)]
    pub no_encoding_check: bool,

    /// Only warn about transfer syntaxes the profile does not admit
    #[arg(long)]
    pub no_syntax_check: bool,

    /// Skip comparing re-added files against existing records
    #[arg(long)]
    pub no_consistency_check: bool,

    /// Reject files inconsistent with an existing record
    #[arg(long)]
    pub abort_inconsistent: bool,

    /// Reject files that lack mandatory attributes
    #[arg(long)]
    pub reject_invalid: bool,

    /// Attach icon images to image records
    #[arg(long)]
    pub icons: bool,

    /// Icon edge length in pixels
    #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u32).range(1..=256))]
    pub icon_size: u32,

    /// Prefix of external PGM icon files
    #[arg(long, value_name = "PREFIX")]
    pub icon_prefix: Option<String>,

    /// PGM icon used when no other source is usable
    #[arg(long, value_name = "FILE")]
    pub default_icon: Option<PathBuf>,

    /// File-set ID
    #[arg(long, value_name = "ID")]
    pub fileset_id: Option<String>,

    /// File-set descriptor file
    #[arg(long, value_name = "FILE")]
    pub descriptor: Option<String>,

    /// Character set of the file-set descriptor file
    #[arg(long, value_name = "CHARSET", requires = "descriptor")]
    pub descriptor_charset: Option<String>,

    /// Accept lowercase file names and a trailing dot
    #[arg(long)]
    pub map_filenames: bool,

    /// Do not keep a .BAK copy while rewriting an existing DICOMDIR
    #[arg(long)]
    pub no_backup: bool,

    /// Load the configuration from a JSON file (requires the json feature);
    /// other switches except --append and --update are ignored
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn mode(&self) -> DirectoryMode {
        if self.update {
            DirectoryMode::Update
        } else if self.append {
            DirectoryMode::Append
        } else {
            DirectoryMode::Create
        }
    }

    /// Session configuration selected by the switches
    pub fn to_config(&self) -> DicomdirConfig {
        let mut config = DicomdirConfig::default()
            .with_profile(self.profile)
            .with_mode(self.mode())
            .invent(self.invent)
            .invent_patient_id(self.invent_patient_id)
            .retired_sop_classes(self.retired)
            .check_resolution(!self.no_resolution_check)
            .check_encoding(!self.no_encoding_check)
            .check_transfer_syntax(!self.no_syntax_check)
            .check_consistency(!self.no_consistency_check)
            .abort_on_inconsistency(self.abort_inconsistent)
            .reject_invalid(self.reject_invalid)
            .backup(!self.no_backup)
            .map_filenames(self.map_filenames)
            .with_icons(IconOptions {
                enabled: self.icons,
                size: self.icon_size,
                prefix: self.icon_prefix.clone(),
                default_icon: self.default_icon.clone(),
            });
        if let Some(id) = &self.fileset_id {
            config = config.with_fileset_id(id.clone());
        }
        if let Some(descriptor) = &self.descriptor {
            config = config.with_descriptor(descriptor.clone(), self.descriptor_charset.clone());
        }
        config
    }
}

fn parse_profile(s: &str) -> Result<ApplicationProfile, String> {
    ApplicationProfile::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = ApplicationProfile::ALL.iter().map(|p| p.simple_name()).collect();
        format!("unknown profile '{}', expected one of: {}", s, names.join(", "))
    })
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

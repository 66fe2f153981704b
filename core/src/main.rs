use clap::Parser;
use dicomdir_core::cli::{Cli, OutputFormat};
use dicomdir_core::{DicomdirConfig, DicomdirSession, DirectoryMode, TextReport};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let root = match cli.output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let opened = match config.mode {
        DirectoryMode::Create => DicomdirSession::create(&cli.output, config),
        DirectoryMode::Append => DicomdirSession::append(&cli.output, config),
        DirectoryMode::Update => DicomdirSession::update(&cli.output, config),
    };
    let mut session = match opened {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to open {}: {}", cli.output.display(), e);
            eprintln!("Error: Failed to open {}: {}", cli.output.display(), e);
            process::exit(1);
        }
    };

    let mut files = Vec::new();
    for input in &cli.inputs {
        match collect_dicom_files(&root, input) {
            Ok(found) => files.extend(found),
            Err(e) => {
                error!("Failed to read {}: {}", input.display(), e);
                eprintln!("Error: Failed to read {}: {}", input.display(), e);
                process::exit(1);
            }
        }
    }

    if files.is_empty() {
        eprintln!("Error: No DICOM files found in the given inputs");
        process::exit(1);
    }

    info!("Found {} DICOM files", files.len());

    for file in &files {
        if let Err(e) = session.add_file(file) {
            warn!("Skipping {}: {}", file.display(), e);
            if e.is_fatal() {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = session.write() {
        error!("Failed to write {}: {}", cli.output.display(), e);
        eprintln!("Error: Failed to write {}: {}", cli.output.display(), e);
        process::exit(1);
    }

    output_report(&session, cli.format);

    if session.files().iter().any(|status| !status.passed()) {
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn load_config(cli: &Cli) -> Result<DicomdirConfig, String> {
    match &cli.config {
        None => Ok(cli.to_config()),
        Some(path) => {
            #[cfg(feature = "json")]
            {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
                let config: DicomdirConfig = serde_json::from_str(&text)
                    .map_err(|e| format!("invalid configuration {}: {}", path.display(), e))?;
                Ok(config.with_mode(cli.mode()))
            }
            #[cfg(not(feature = "json"))]
            {
                Err(format!(
                    "loading {} requires the 'json' feature (cargo build --features json)",
                    path.display()
                ))
            }
        }
    }
}

/// Collects DICOM files below `input`, returned relative to `root`
fn collect_dicom_files(root: &Path, input: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let host = root.join(input);

    if host.is_file() {
        files.push(input.to_path_buf());
        return Ok(files);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&host)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let relative = input.join(entry.file_name());

        if path.is_dir() {
            files.extend(collect_dicom_files(root, &relative)?);
        } else if path.is_file() {
            if is_directory_file(&path) {
                continue;
            }
            if let Some(ext) = path.extension() {
                // Accept .dcm and .dicom extensions
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(relative);
                }
            } else if is_dicom_file(&path) {
                files.push(relative);
            }
        }
    }

    Ok(files)
}

/// DICOMDIR files and their backups are never indexed
fn is_directory_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.eq_ignore_ascii_case("DICOMDIR") || name.eq_ignore_ascii_case("DICOMDIR.BAK")
        })
        .unwrap_or(false)
}

/// Checks if a file has a DICOM header
///
/// DICOM files have a 128-byte preamble followed by the "DICM" magic string.
fn is_dicom_file(path: &Path) -> bool {
    use std::fs::File;
    use std::io::Read;

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    // Read first 132 bytes (128-byte preamble + 4-byte "DICM" magic)
    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}

fn output_report(session: &DicomdirSession, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            let report = TextReport::new(session.index()).with_files(session.files());
            println!("{}", report);
            for diagnostic in session.diagnostics().entries() {
                println!("{}", diagnostic);
            }
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match output_json(session) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}

#[cfg(feature = "json")]
fn output_json(session: &DicomdirSession) -> Result<String, serde_json::Error> {
    use dicomdir_core::api::FileStatus;
    use dicomdir_core::cli::report::TreeSummary;
    use dicomdir_core::Diagnostic;
    use serde::Serialize;

    #[derive(Serialize)]
    struct SessionJson<'a> {
        output: String,
        profile: &'static str,
        summary: TreeSummary,
        files: &'a [FileStatus],
        diagnostics: &'a [Diagnostic],
    }

    let output = SessionJson {
        output: session.output().display().to_string(),
        profile: session.config().profile.name(),
        summary: TreeSummary::new(session.tree()),
        files: session.files(),
        diagnostics: session.diagnostics().entries(),
    };

    serde_json::to_string_pretty(&output)
}

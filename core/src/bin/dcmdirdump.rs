use clap::{Parser, ValueEnum};
use dicomdir_core::{read_index, TextReport};
use log::error;
use std::path::PathBuf;
use std::process;

/// CLI tool for printing the records of an existing DICOMDIR
#[derive(Parser, Debug)]
#[command(name = "dcmdirdump")]
#[command(about = "Print the record tree of a DICOMDIR")]
#[command(version)]
struct Cli {
    /// DICOMDIR file
    #[arg(value_name = "DICOMDIR")]
    file: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// Referenced file IDs only (one per line)
    Files,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if !cli.file.is_file() {
        eprintln!("Error: {} is not a file", cli.file.display());
        process::exit(1);
    }

    let index = match read_index(&cli.file) {
        Ok(index) => index,
        Err(e) => {
            error!("Failed to read {}: {}", cli.file.display(), e);
            eprintln!("Error: Failed to read {}: {}", cli.file.display(), e);
            process::exit(1);
        }
    };

    match cli.format {
        OutputFormat::Text => println!("{}", TextReport::new(&index)),
        OutputFormat::Files => {
            for id in index.tree.depth_first() {
                if let Some(file_id) = index.tree.get(id).and_then(|r| r.referenced_file_id.as_ref()) {
                    println!("{}", file_id);
                }
            }
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match output_json(&index) {
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

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }
}

#[cfg(feature = "json")]
fn output_json(index: &dicomdir_core::DirectoryIndex) -> Result<String, serde_json::Error> {
    use dicomdir_core::cli::report::TreeSummary;
    use dicomdir_core::RecordTree;
    use serde::Serialize;

    #[derive(Serialize)]
    struct RecordJson {
        kind: dicomdir_core::RecordKind,
        key: String,
        file_id: Option<String>,
        children: Vec<RecordJson>,
    }

    #[derive(Serialize)]
    struct IndexJson {
        fileset_id: Option<String>,
        summary: TreeSummary,
        records: Vec<RecordJson>,
    }

    fn record(tree: &RecordTree, id: usize) -> Option<RecordJson> {
        let r = tree.get(id)?;
        Some(RecordJson {
            kind: r.kind,
            key: r.display_key(),
            file_id: r.referenced_file_id.clone(),
            children: tree
                .children(id)
                .iter()
                .filter_map(|&child| record(tree, child))
                .collect(),
        })
    }

    let output = IndexJson {
        fileset_id: index.fileset_id.clone(),
        summary: TreeSummary::new(&index.tree),
        records: index
            .tree
            .children(RecordTree::ROOT)
            .iter()
            .filter_map(|&id| record(&index.tree, id))
            .collect(),
    };

    serde_json::to_string_pretty(&output)
}

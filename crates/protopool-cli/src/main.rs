//! protopool - Inspect serialized Protocol Buffer descriptors
//!
//! This tool registers serialized `FileDescriptorProto` / `FileDescriptorSet`
//! blobs into a shared descriptor pool and reports the registered types.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use protopool_core::{Cardinality, Descriptor, DescriptorPool, Error, FieldDescriptor};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Inspect serialized Protocol Buffer descriptors via a shared descriptor pool
#[derive(Parser, Debug)]
#[command(name = "protopool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Treat inputs as FileDescriptorSet blobs instead of single files
    #[arg(long)]
    descriptor_set: bool,

    /// Skip pre-loading well-known types (google/protobuf/timestamp.proto)
    #[arg(long)]
    no_well_known: bool,

    /// Only list registered fully-qualified type names
    #[arg(long)]
    list: bool,

    /// Describe the given fully-qualified type after registration (repeatable)
    #[arg(long, value_name = "FQN")]
    describe: Vec<String>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single serialized descriptor blob
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of descriptor blobs (.pb, .bin, .desc)
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Registration counters reported after a run
#[derive(Default)]
struct Stats {
    blobs_processed: usize,
    files_registered: usize,
    duplicates_skipped: usize,
    conflicts: usize,
    failed: usize,
}

impl Stats {
    fn print_summary(&self) {
        info!(
            "Summary: {} blobs processed, {} files registered, {} duplicates skipped, {} conflicts, {} failed",
            self.blobs_processed,
            self.files_registered,
            self.duplicates_skipped,
            self.conflicts,
            self.failed
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let pool = if cli.no_well_known {
        DescriptorPool::new()
    } else {
        DescriptorPool::with_well_known_types().context("failed to pre-load well-known types")?
    };

    let mut stats = Stats::default();

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &pool, file, &mut stats)?;
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &pool, directory, &mut stats)?;
    } else {
        bail!("Either --file or --directory must be specified");
    }

    stats.print_summary();

    if !cli.describe.is_empty() {
        for name in &cli.describe {
            describe_type(&pool, name)?;
        }
    } else if cli.list {
        for name in pool.type_names() {
            println!("{}", name);
        }
    } else {
        print_pool(&pool);
    }

    Ok(())
}

/// Process a single descriptor blob
fn process_single_file(cli: &Cli, pool: &DescriptorPool, file: &Path, stats: &mut Stats) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    register_blob(cli, pool, file, stats)
}

/// Process a directory of descriptor blobs recursively
fn process_directory(
    cli: &Cli,
    pool: &DescriptorPool,
    directory: &Path,
    stats: &mut Stats,
) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !has_descriptor_extension(path) {
            trace!("Skipping non-descriptor file: {}", path.display());
            continue;
        }

        debug!("Processing blob: {}", path.display());
        if let Err(e) = register_blob(cli, pool, path, stats) {
            // Log error but continue with other files
            warn!("Error processing {}: {}", path.display(), e);
        }
    }

    Ok(())
}

/// Register one blob into the pool, updating counters
fn register_blob(cli: &Cli, pool: &DescriptorPool, path: &Path, stats: &mut Stats) -> Result<()> {
    let data = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    stats.blobs_processed += 1;

    let before = pool.files().len();
    let result = if cli.descriptor_set {
        pool.add_file_set_bytes(&data).map(|_| ())
    } else {
        pool.add_file_bytes(&data).map(|_| ())
    };

    // A set blob can register several files before failing mid-set, so the
    // registered delta is counted on every branch
    let registered = pool.files().len() - before;
    stats.files_registered += registered;

    match result {
        Ok(()) => {
            if registered == 0 {
                debug!("{}: already registered, skipped", path.display());
                stats.duplicates_skipped += 1;
            }
            Ok(())
        }
        Err(e @ Error::AlreadyRegistered { .. }) => {
            warn!("{}: {}", path.display(), e);
            stats.conflicts += 1;
            Ok(())
        }
        Err(e) => {
            stats.failed += 1;
            Err(e.into())
        }
    }
}

/// Only files with descriptor-blob extensions are considered
fn has_descriptor_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pb") | Some("bin") | Some("desc")
    )
}

/// Print every registered file with its top-level types
fn print_pool(pool: &DescriptorPool) {
    for file in pool.files() {
        println!(
            "{} (package {}, {})",
            file.name(),
            file.package(),
            file.syntax().as_str()
        );
        for message in file.messages() {
            println!("  message {}", message.full_name());
        }
        for en in file.enums() {
            println!("  enum {}", en.full_name());
        }
    }
}

/// Print the declaration of one registered type
fn describe_type(pool: &DescriptorPool, name: &str) -> Result<()> {
    match pool
        .lookup(name)
        .with_context(|| format!("cannot describe '{}'", name))?
    {
        Descriptor::Message(message) => {
            println!("message {} {{", message.full_name());
            for field in message.fields() {
                println!("  {};", field_signature(field));
            }
            println!("}}");
        }
        Descriptor::Enum(en) => {
            println!("enum {} {{", en.full_name());
            for value in en.values() {
                println!("  {} = {};", value.name, value.number);
            }
            println!("}}");
        }
    }
    Ok(())
}

/// Render a field the way a .proto declaration would
fn field_signature(field: &FieldDescriptor) -> String {
    match field.cardinality() {
        Cardinality::Map => {
            if let Some((key, value)) = field.map_entry_fields() {
                format!(
                    "map<{}, {}> {} = {}",
                    key.kind(),
                    value.kind(),
                    field.name(),
                    field.number()
                )
            } else {
                format!("{} {} = {}", field.kind(), field.name(), field.number())
            }
        }
        Cardinality::Repeated => {
            format!("repeated {} {} = {}", field.kind(), field.name(), field.number())
        }
        Cardinality::Singular => {
            format!("{} {} = {}", field.kind(), field.name(), field.number())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_descriptor_extension() {
        assert!(has_descriptor_extension(Path::new("a/bundle.pb")));
        assert!(has_descriptor_extension(Path::new("set.desc")));
        assert!(!has_descriptor_extension(Path::new("readme.md")));
        assert!(!has_descriptor_extension(Path::new("binary")));
    }

    #[test]
    fn test_register_blob_from_disk() {
        use prost::Message as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timestamp.pb");
        let bytes = protopool_core::pool::well_known::timestamp_file().encode_to_vec();
        std::fs::write(&path, bytes).unwrap();

        let cli = Cli::parse_from(["protopool", "--file", path.to_str().unwrap()]);
        let pool = DescriptorPool::new();
        let mut stats = Stats::default();
        register_blob(&cli, &pool, &path, &mut stats).unwrap();

        assert_eq!(stats.files_registered, 1);
        assert!(pool.lookup("google.protobuf.Timestamp").is_ok());
    }

    #[test]
    fn test_descriptor_set_counts_files_registered_before_conflict() {
        use prost::Message as _;

        let mut fresh = protopool_core::pool::well_known::timestamp_file();
        fresh.name = Some("other/timestamp_copy.proto".to_string());
        fresh.package = Some("other".to_string());

        // Same file name as the pre-loaded well-known type, different content
        let mut conflicting = protopool_core::pool::well_known::timestamp_file();
        conflicting.package = Some("not.google".to_string());

        let set = prost_types::FileDescriptorSet {
            file: vec![fresh, conflicting],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.pb");
        std::fs::write(&path, set.encode_to_vec()).unwrap();

        let cli = Cli::parse_from([
            "protopool",
            "--descriptor-set",
            "--file",
            path.to_str().unwrap(),
        ]);
        let pool = DescriptorPool::with_well_known_types().unwrap();
        let mut stats = Stats::default();
        register_blob(&cli, &pool, &path, &mut stats).unwrap();

        // The file registered before the mid-set conflict still counts
        assert_eq!(stats.files_registered, 1);
        assert_eq!(stats.conflicts, 1);
        assert!(pool.lookup("other.Timestamp").is_ok());
    }
}

//! pngprompt - Recover image-generation prompts embedded in PNG metadata
//!
//! This tool reads PNG files produced by node-based image-generation
//! pipelines, extracts the prompt hidden in their text metadata chunks and
//! writes it out as a plain text file.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use pngprompt_core::{Extraction, Extractor, ExtractorConfig};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Recover image-generation prompts embedded in PNG metadata
#[derive(Parser, Debug)]
#[command(name = "pngprompt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output directory for extracted prompt files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Maximum number of text chunks to decode per file (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_chunks: usize,

    /// Dry run - don't write files, just show what would be extracted
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files without prompting
    #[arg(long)]
    force: bool,

    /// Only list files containing a prompt without extracting
    #[arg(long)]
    list_only: bool,

    /// Conflict resolution strategy for same-name different-prompt outputs
    #[arg(long, value_enum, default_value = "hash-suffix")]
    conflict_strategy: ConflictStrategy,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single PNG file to extract the prompt from
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of PNGs to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for extracted prompts
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Write one .txt file per input
    Text,
    /// Print the bare prompt to stdout
    Prompt,
    /// Print one JSON object per input with prompt and full metadata
    Json,
}

/// Strategy for resolving naming conflicts
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConflictStrategy {
    /// Append a short content hash: render~a1b2c3d4.txt
    HashSuffix,
    /// Append source PNG name: render~from-render2.txt
    SourceSuffix,
    /// Skip conflicting files (keep first occurrence only)
    SkipConflicts,
}

/// Tracks written prompt files for deduplication
#[derive(Default)]
struct PromptRegistry {
    /// Maps output filename -> (content_hash, output_path)
    seen: HashMap<String, Vec<(String, PathBuf)>>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    conflicts_renamed: usize,
    written: usize,
}

impl PromptRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &str) -> String {
        let hash = blake3::hash(content.as_bytes());
        hash.to_hex()[..8].to_string()
    }

    /// Check if this exact content was already seen for this filename
    fn is_duplicate(&self, filename: &str, content_hash: &str) -> bool {
        self.seen
            .get(filename)
            .map(|entries| entries.iter().any(|(h, _)| h == content_hash))
            .unwrap_or(false)
    }

    /// Get the number of variants we've seen for this filename
    fn variant_count(&self, filename: &str) -> usize {
        self.seen.get(filename).map(|e| e.len()).unwrap_or(0)
    }

    /// Register a prompt file and return the resolved output path
    fn register(
        &mut self,
        filename: &str,
        content_hash: &str,
        output_dir: &Path,
        source_png: Option<&Path>,
        strategy: ConflictStrategy,
    ) -> Option<PathBuf> {
        self.stats.total_found += 1;

        // Check for exact duplicate
        if self.is_duplicate(filename, content_hash) {
            debug!("Skipping duplicate: {} (hash: {})", filename, content_hash);
            self.stats.duplicates_skipped += 1;
            return None;
        }

        // Determine output path
        let output_path = if self.variant_count(filename) == 0 {
            // First occurrence - use canonical name
            output_dir.join(filename)
        } else {
            // Conflict - need to resolve
            match strategy {
                ConflictStrategy::SkipConflicts => {
                    debug!(
                        "Skipping conflict: {} (different prompt, hash: {})",
                        filename, content_hash
                    );
                    self.stats.duplicates_skipped += 1;
                    return None;
                }
                ConflictStrategy::HashSuffix => {
                    let new_name = Self::add_suffix(filename, &format!("~{}", content_hash));
                    info!(
                        "Conflict resolved: {} -> {} (prompt differs)",
                        filename, new_name
                    );
                    self.stats.conflicts_renamed += 1;
                    output_dir.join(new_name)
                }
                ConflictStrategy::SourceSuffix => {
                    let source_name = source_png
                        .and_then(|p| p.file_stem())
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown");
                    let new_name = Self::add_suffix(filename, &format!("~from-{}", source_name));
                    info!(
                        "Conflict resolved: {} -> {} (from {})",
                        filename, new_name, source_name
                    );
                    self.stats.conflicts_renamed += 1;
                    output_dir.join(new_name)
                }
            }
        };

        // Record this variant
        self.seen
            .entry(filename.to_string())
            .or_default()
            .push((content_hash.to_string(), output_path.clone()));

        Some(output_path)
    }

    /// Add a suffix before the .txt extension
    fn add_suffix(filename: &str, suffix: &str) -> String {
        if let Some(stem) = filename.strip_suffix(".txt") {
            format!("{}{}.txt", stem, suffix)
        } else {
            format!("{}{}", filename, suffix)
        }
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} prompts found, {} duplicates skipped, {} conflicts renamed, {} written",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.conflicts_renamed,
            self.stats.written
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

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Process a single PNG file
fn process_single_file(cli: &Cli, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let mut registry = PromptRegistry::new();
    process_png(cli, file, &mut registry)?;

    if !cli.list_only && !cli.dry_run {
        registry.print_summary();
    }

    Ok(())
}

/// Process a directory of PNGs recursively
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut registry = PromptRegistry::new();
    let mut pngs_processed = 0;

    // Walk the directory
    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Skip directories
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

        if !is_likely_png(path) {
            trace!("Skipping non-PNG: {}", path.display());
            continue;
        }

        debug!("Processing PNG: {}", path.display());
        match process_png(cli, path, &mut registry) {
            Ok(()) => {}
            // Files without usable metadata are expected in a render directory
            Err(e) => match e.downcast_ref::<pngprompt_core::Error>() {
                Some(core_err) if core_err.is_recoverable() => {
                    debug!("Skipping {}: {}", path.display(), core_err);
                }
                _ => {
                    warn!("Error processing {}: {}", path.display(), e);
                }
            },
        }
        pngs_processed += 1;
    }

    info!("Processed {} PNGs", pngs_processed);

    if !cli.list_only && !cli.dry_run {
        registry.print_summary();
    }

    Ok(())
}

/// Heuristic to decide whether a file is worth handing to the extractor
fn is_likely_png(path: &Path) -> bool {
    // Trust the extension when there is one; the extractor re-validates
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        return ext.eq_ignore_ascii_case("png");
    }

    // No extension: sniff the signature
    if let Ok(mut file) = fs::File::open(path) {
        use std::io::Read;
        let mut magic = [0u8; 8];
        if file.read_exact(&mut magic).is_ok() {
            return magic == pngprompt_core::PNG_SIGNATURE;
        }
    }

    false
}

/// Derive the output filename for a source PNG (stem + .txt)
fn prompt_filename(png_path: &Path) -> String {
    let stem = png_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("prompt");
    format!("{}.txt", stem)
}

/// Process a single PNG and emit its prompt
fn process_png(cli: &Cli, png_path: &Path, registry: &mut PromptRegistry) -> Result<()> {
    // Read the input file
    trace!("Reading {}", png_path.display());
    let data = fs::read(png_path)
        .with_context(|| format!("Failed to read input file: {}", png_path.display()))?;

    trace!("Read {} bytes from {}", data.len(), png_path.display());

    // Configure and run the extractor
    let config = ExtractorConfig::new().max_text_chunks(cli.max_chunks);
    let extractor = Extractor::with_config(config);
    let extraction = extractor.extract(&data)?;

    debug!(
        "Extracted prompt of {} chars from {}",
        extraction.prompt.chars().count(),
        png_path.display()
    );

    if cli.list_only {
        println!("{}", png_path.display());
        return Ok(());
    }

    match cli.format {
        OutputFormat::Prompt => {
            println!("{}", extraction.prompt);
        }
        OutputFormat::Json => {
            println!("{}", render_json(png_path, &extraction)?);
        }
        OutputFormat::Text => {
            let filename = prompt_filename(png_path);
            let content_hash = PromptRegistry::content_hash(&extraction.prompt);

            // Register and get output path
            let output_path = registry.register(
                &filename,
                &content_hash,
                &cli.output,
                Some(png_path),
                cli.conflict_strategy,
            );

            if let Some(output_path) = output_path {
                if cli.dry_run {
                    println!("Would write: {}", output_path.display());
                    if cli.verbose > 0 {
                        println!("---");
                        println!("{}", extraction.prompt);
                        println!("---");
                    }
                } else {
                    match write_prompt_file(&output_path, &extraction.prompt, cli.force) {
                        Ok(()) => {
                            println!("Wrote {}", output_path.display());
                            registry.stats.written += 1;
                        }
                        Err(e) => {
                            error!("Failed to write {}: {}", output_path.display(), e);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Render one extraction as a JSON object
fn render_json(png_path: &Path, extraction: &Extraction) -> Result<String> {
    let record = serde_json::json!({
        "file": png_path.display().to_string(),
        "prompt": &extraction.prompt,
        "metadata": &extraction.metadata,
    });
    serde_json::to_string(&record).context("Failed to serialize extraction")
}

/// Write a prompt file to disk
fn write_prompt_file(output_path: &Path, content: &str, force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Check if file exists
    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    // Write the file
    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}

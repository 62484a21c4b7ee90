//! Collage maker CLI
//!
//! One-shot mode imports everything given on the command line (or in a
//! manifest), renders once and writes `{name}_favorite.png`. `--interactive`
//! opens a shell for arranging layers before saving.

use super::config::CliConfigBuilder;
use super::progress::SpinnerProgressReporter;
use super::shell;
use crate::{
    compositor::Compositor,
    export::save_png,
    importer::{CollageImporter, ImportReport},
    manifest::CollageManifest,
    search::parse_keywords,
    services::{ProgressReporter, TracingProgressReporter},
    session::CollageSession,
    sticker::Sticker,
    tracing_config::{events, spans},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Favorite-things collage maker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "collage-maker")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Photo files or directories to add (JPEG, PNG, WebP)
    #[arg(value_name = "PHOTO")]
    pub inputs: Vec<String>,

    /// Your name; the collage is saved as NAME_favorite.png
    #[arg(short, long)]
    pub name: Option<String>,

    /// Comma separated search keywords (repeatable)
    #[arg(short, long, value_name = "KEYWORDS")]
    pub search: Vec<String>,

    /// Sticker name or emoji: heart, star, ribbon, clover, fire (repeatable)
    #[arg(long)]
    pub sticker: Vec<String>,

    /// JSON manifest describing the whole collage
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Canvas size as WIDTHxHEIGHT [default: 1200x800]
    #[arg(long)]
    pub canvas: Option<String>,

    /// How unplaced layers are positioned
    #[arg(long, value_enum)]
    pub layout: Option<CliLayout>,

    /// Layer width for the fixed layout
    #[arg(long, requires = "layout")]
    pub width: Option<u32>,

    /// Seed for the random layout (same seed, same picture)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Background remover: none, color-key, segmentation
    #[arg(short, long)]
    pub remover: Option<String>,

    /// Color distance treated as background by the color-key remover
    #[arg(long)]
    pub tolerance: Option<f32>,

    /// Segmentation model: .onnx file, model folder or HuggingFace URL
    /// (implies --remover segmentation)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Pause before each image search, in milliseconds
    #[arg(long, value_name = "MS")]
    pub search_delay_ms: Option<u64>,

    /// Sticker edge length in pixels
    #[arg(long)]
    pub sticker_size: Option<u32>,

    /// Output directory [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Search photo directories recursively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// File name pattern for photo directories (e.g., "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Arrange layers in an interactive shell before saving
    #[arg(short, long)]
    pub interactive: bool,

    /// List the available stickers and exit
    #[arg(long)]
    pub list_stickers: bool,

    /// Plain progress output instead of a spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file
    #[cfg(feature = "tracing-files")]
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Write logs only to --log-file, not to the terminal
    #[cfg(feature = "tracing-files")]
    #[arg(long, requires = "log_file")]
    pub log_file_only: bool,

    /// Emit logs as JSON lines
    #[cfg(feature = "tracing-json")]
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLayout {
    /// Random width and position for every unplaced layer
    Random,
    /// Unplaced layers are centred at a fixed width
    Fixed,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = CliConfigBuilder::tracing_config(&cli)
        .init()
        .context("Failed to initialize tracing")?;

    if cli.list_stickers {
        for sticker in Sticker::ALL {
            println!("{}", sticker);
        }
        return Ok(());
    }

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;

    let manifest = cli
        .manifest
        .as_ref()
        .map(CollageManifest::from_json_file)
        .transpose()
        .context("Failed to load manifest")?;
    let config = CliConfigBuilder::from_cli(&cli, manifest.as_ref())
        .context("Failed to build configuration")?;

    let named = cli
        .name
        .clone()
        .or_else(|| manifest.as_ref().map(|m| m.user_name.clone()));
    let user_name = match named {
        Some(name) => name,
        None => prompt_user_name()?,
    };
    let mut session = CollageSession::new(&user_name)?;

    let reporter: Arc<dyn ProgressReporter> = if cli.no_progress || cli.verbose > 0 {
        Arc::new(TracingProgressReporter)
    } else {
        Arc::new(SpinnerProgressReporter::new())
    };
    let mut importer = CollageImporter::from_config(&config)
        .await
        .context("Failed to prepare background remover")?
        .with_progress_reporter(reporter);

    let session_id = session.id().to_string();
    let _span =
        spans::session(&session_id, session.user_name(), importer.remover_name()).entered();
    info!("🎨 Building {}", session.title());
    let start = Instant::now();

    // Manifest sources come first so its layer numbers match the session
    let mut report = match &manifest {
        Some(manifest) => {
            let _batch = spans::import_batch("manifest", manifest.declared_layers()).entered();
            importer
                .import_manifest(&mut session, manifest, config.sticker_size)
                .await?
        },
        None => ImportReport::default(),
    };

    let photos = collect_photos(&cli)?;
    if !photos.is_empty() {
        let _batch = spans::import_batch("photos", photos.len()).entered();
        report.merge(importer.import_files(&mut session, &photos));
    }

    let keywords: Vec<String> = cli.search.iter().flat_map(|s| parse_keywords(s)).collect();
    if !keywords.is_empty() {
        info!("🔍 Searching {} keyword(s)", keywords.len());
        report.merge(importer.import_search(&mut session, &keywords).await);
    }

    for name in &cli.sticker {
        let sticker: Sticker = name.parse()?;
        report
            .added
            .push(CollageImporter::add_sticker(&mut session, sticker, config.sticker_size));
    }

    for failure in &report.failures {
        events::warning_with_recommendation(
            &format!("{}: {}", failure.source, failure.reason),
            "check the file or keyword and add it again",
        );
    }
    events::performance_metric("import", start.elapsed().as_millis() as u64);
    debug!(
        added = report.added.len(),
        failed = report.failures.len(),
        "Imports finished"
    );

    if cli.interactive {
        shell::print_layers(&session);
        return shell::run(&mut session, &mut importer, &config).await;
    }

    if session.is_empty() {
        anyhow::bail!(
            "Nothing to draw: every import failed or no photos, keywords or stickers were given"
        );
    }

    println!("📚 Layers:");
    shell::print_layers(&session);

    let canvas = {
        let canvas_size = (config.canvas.width, config.canvas.height);
        let _render = spans::render(session.len(), canvas_size).entered();
        let render_start = Instant::now();
        let canvas = Compositor::from_config(&config).render(&session)?;
        events::performance_metric("render", render_start.elapsed().as_millis() as u64);
        canvas
    };
    let path = {
        let _export = spans::export(&config.output_dir).entered();
        save_png(&canvas, &config.output_dir, session.user_name())?
    };

    println!(
        "💾 Saved {} ({} layers) in {:.1}s",
        path.display(),
        session.len(),
        start.elapsed().as_secs_f64()
    );
    if !report.is_complete() {
        println!(
            "⚠️  {} item(s) could not be added; run again to retry them",
            report.failures.len()
        );
    }
    Ok(())
}

fn prompt_user_name() -> Result<String> {
    loop {
        print!("Your name: ");
        io::stdout().flush().context("Failed to flush stdout")?;
        let mut line = String::new();
        if io::stdin().read_line(&mut line).context("Failed to read name")? == 0 {
            anyhow::bail!("A user name is required");
        }
        let name = line.trim();
        if !name.is_empty() {
            return Ok(name.to_string());
        }
        println!("Please enter a name.");
    }
}

/// Expand positional inputs into image files, sorted per directory
fn collect_photos(cli: &Cli) -> Result<Vec<PathBuf>> {
    let mut photos = Vec::new();
    for input in &cli.inputs {
        let path = PathBuf::from(input);
        if path.is_file() {
            photos.push(path);
        } else if path.is_dir() {
            let mut found = find_image_files(&path, cli.recursive, cli.pattern.as_deref())?;
            found.sort();
            if found.is_empty() {
                warn!("No images found in {}", path.display());
            }
            photos.extend(found);
        } else {
            anyhow::bail!("Input path does not exist or is not accessible: {}", path.display());
        }
    }
    Ok(photos)
}

fn find_image_files(dir: &Path, recursive: bool, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            let path = entry.path();
            let is_file = entry.file_type().is_file();
            if is_file && is_image_file(path) && matches_pattern(path, pattern) {
                files.push(path.to_path_buf());
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_file = entry.file_type()?.is_file();
            if is_file && is_image_file(&path) && matches_pattern(&path, pattern) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn matches_pattern(path: &Path, pattern: Option<&str>) -> bool {
    match pattern {
        Some(pat) => path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| glob::Pattern::new(pat).is_ok_and(|p| p.matches(name))),
        None => true,
    }
}

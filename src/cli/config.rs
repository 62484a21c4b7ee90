//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliLayout};
use crate::{
    config::{CollageConfig, CollageConfigBuilder, LayoutMode, RemoverKind},
    item::MAX_LAYER_SIDE,
    manifest::CollageManifest,
    sticker::Sticker,
    tracing_config::{TracingConfig, TracingFormat, TracingOutput},
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a validated `CollageConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Layer the sources: `--config` file, then manifest overrides, then flags
    pub(crate) fn from_cli(
        cli: &Cli,
        manifest: Option<&CollageManifest>,
    ) -> Result<CollageConfig> {
        let base = match (&cli.config, manifest.and_then(|m| m.config.clone())) {
            (_, Some(from_manifest)) => from_manifest,
            (Some(path), None) => CollageConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            (None, None) => CollageConfig::default(),
        };

        let mut builder = CollageConfigBuilder::from_config(base);

        if let Some(canvas) = &cli.canvas {
            let (width, height) = parse_canvas_size(canvas)?;
            builder = builder.canvas_size(width, height);
        }
        if let Some(layout) = cli.layout {
            builder = builder.layout(match layout {
                CliLayout::Random => LayoutMode::default(),
                CliLayout::Fixed => LayoutMode::Fixed {
                    default_width: cli.width.unwrap_or(400),
                },
            });
        }
        if let Some(seed) = cli.seed {
            builder = builder.seed(seed);
        }
        if let Some(remover) = &cli.remover {
            let kind: RemoverKind = remover.parse().context("Invalid --remover")?;
            builder = builder.remover(kind);
        }
        if let Some(tolerance) = cli.tolerance {
            builder = builder.tolerance(tolerance);
        }
        if let Some(model) = &cli.model {
            builder = builder.model(model.clone()).remover(RemoverKind::Segmentation);
        }
        if let Some(delay) = cli.search_delay_ms {
            builder = builder.search_delay_ms(delay);
        }
        if let Some(size) = cli.sticker_size {
            builder = builder.sticker_size(size);
        }
        if let Some(output) = &cli.output {
            builder = builder.output_dir(output.clone());
        }

        builder.build().context("Invalid configuration")
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if cli.name.is_none() && cli.manifest.is_none() && !cli.interactive {
            anyhow::bail!("A user name is required: pass --name, --manifest or --interactive");
        }
        if let Some(name) = &cli.name {
            if name.trim().is_empty() {
                anyhow::bail!("--name must not be empty");
            }
        }
        if let Some(canvas) = &cli.canvas {
            parse_canvas_size(canvas)?;
        }
        if let Some(remover) = &cli.remover {
            remover
                .parse::<RemoverKind>()
                .context("Invalid --remover")?;
        }
        for sticker in &cli.sticker {
            sticker
                .parse::<Sticker>()
                .with_context(|| format!("Invalid --sticker '{}'", sticker))?;
        }
        if let Some(pattern) = &cli.pattern {
            glob::Pattern::new(pattern).context("Invalid --pattern")?;
        }
        if let Some(width) = cli.width {
            if cli.layout != Some(CliLayout::Fixed) {
                anyhow::bail!("--width only applies to --layout fixed");
            }
            if width == 0 || width > MAX_LAYER_SIDE {
                anyhow::bail!("--width must be between 1 and {}", MAX_LAYER_SIDE);
            }
        }
        Ok(())
    }

    /// Log format and destination chosen by the logging flags
    pub(crate) fn tracing_config(cli: &Cli) -> TracingConfig {
        let format = if cli.no_progress {
            TracingFormat::Compact
        } else {
            TracingFormat::Console
        };
        #[cfg(feature = "tracing-json")]
        let format = if cli.log_json {
            TracingFormat::Json
        } else {
            format
        };

        #[allow(unused_mut)]
        let mut output = TracingOutput::Console;
        #[cfg(feature = "tracing-files")]
        {
            if let Some(path) = &cli.log_file {
                output = if cli.log_file_only {
                    TracingOutput::File(path.clone())
                } else {
                    TracingOutput::Both(path.clone())
                };
            }
        }

        TracingConfig::new()
            .with_verbosity(cli.verbose)
            .with_format(format)
            .with_output(output)
            .with_session_id(uuid::Uuid::new_v4().to_string())
    }
}

/// Parse `WIDTHxHEIGHT`
pub(crate) fn parse_canvas_size(value: &str) -> Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .with_context(|| format!("Canvas size '{}' must look like 1200x800", value))?;
    let width: u32 = width.trim().parse().context("Invalid canvas width")?;
    let height: u32 = height.trim().parse().context("Invalid canvas height")?;
    if width == 0 || height == 0 {
        anyhow::bail!("Canvas size must be positive, got {}x{}", width, height);
    }
    Ok((width, height))
}

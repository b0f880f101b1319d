//! Implementation of `autolink generate`.

use std::path::PathBuf;

use anyhow::Result;

use crate::generator::{write_artifact, GlueManifest, OutputFormat, RenderOptions, WriteStatus};
use crate::ops::events::{AutolinkEvent, EventSink};
use crate::ops::resolve::{resolve_modules, ResolveOptions};
use crate::sources::ScanWarning;
use crate::util::GlobalContext;

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Scan and resolution settings
    pub resolve: ResolveOptions,

    /// Artifact format (overrides config; default json)
    pub format: Option<OutputFormat>,

    /// Artifact path (overrides config), relative to the search root
    pub output: Option<PathBuf>,

    /// Render to memory only
    pub dry_run: bool,
}

/// Result of a generate run.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub manifest: GlueManifest,
    pub format: OutputFormat,
    /// Destination path (absolute)
    pub output: PathBuf,
    /// Rendered artifact text
    pub contents: String,
    /// `None` for dry runs
    pub status: Option<WriteStatus>,
    /// Packages skipped during the scan
    pub warnings: Vec<ScanWarning>,
}

/// Run the full pipeline: scan, resolve, generate and write the artifact.
pub fn autolink(
    ctx: &GlobalContext,
    opts: &GenerateOptions,
    events: EventSink<'_>,
) -> Result<GenerateResult> {
    let config = ctx.config();
    let format = opts
        .format
        .or(config.generate.format)
        .unwrap_or(OutputFormat::Json);
    let output = ctx.output_path(
        &opts
            .output
            .clone()
            .or_else(|| config.generate.output.clone())
            .unwrap_or_else(|| format.default_output()),
    );

    let resolution = resolve_modules(ctx, &opts.resolve, events)?;

    if let Some(platform) = format.platform() {
        if !opts.resolve.platforms().contains(&platform) {
            tracing::warn!(
                "{} output only lists {} modules, which were not selected",
                format,
                platform
            );
        }
    }

    let manifest = GlueManifest::from_resolved(&resolution.resolved, ctx.root());
    let mut render_opts = RenderOptions::default();
    if let Some(package) = &config.generate.kotlin_package {
        render_opts.kotlin_package = package.clone();
    }
    let contents = manifest.render(format, &render_opts);

    let status = if opts.dry_run {
        events(&AutolinkEvent::Rendered {
            format: format.to_string(),
            fingerprint: manifest.fingerprint().to_string(),
            contents: contents.clone(),
        });
        None
    } else {
        let status = write_artifact(&output, &contents)?;
        events(&AutolinkEvent::Artifact {
            path: output.clone(),
            format: format.to_string(),
            fingerprint: manifest.fingerprint().to_string(),
            fresh: status == WriteStatus::Written,
        });
        Some(status)
    };

    Ok(GenerateResult {
        manifest,
        format,
        output,
        contents,
        status,
        warnings: resolution.report.warnings,
    })
}

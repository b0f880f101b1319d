//! Scan-and-resolve operation shared by `generate` and `list`.

use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::core::{AbiTarget, Platform};
use crate::ops::events::{AutolinkEvent, EventSink};
use crate::resolver::{AbiResolver, ResolvedModuleSet};
use crate::sources::{ManifestScanner, ScanOptions, ScanReport};
use crate::util::GlobalContext;

/// Options for scanning and resolving.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Platforms to link (empty = all)
    pub platforms: Vec<Platform>,

    /// ABI to resolve for
    pub target: AbiTarget,

    /// Extra required modules, applied to every selected platform
    pub required: Vec<String>,

    /// Scan workers (overrides config)
    pub jobs: Option<usize>,

    /// Per-package timeout in milliseconds (overrides config)
    pub timeout_ms: Option<u64>,
}

impl ResolveOptions {
    /// Selected platforms, defaulting to all of them.
    pub fn platforms(&self) -> BTreeSet<Platform> {
        if self.platforms.is_empty() {
            Platform::ALL.into_iter().collect()
        } else {
            self.platforms.iter().copied().collect()
        }
    }
}

/// A successful scan and resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub report: ScanReport,
    pub resolved: ResolvedModuleSet,
}

/// Scan the context root and resolve modules for the requested target.
///
/// Scan warnings are reported through `events` and never fail the
/// operation. Resolution problems fail it with a
/// [`ResolveFailure`](crate::resolver::ResolveFailure) that callers can
/// downcast for diagnostics.
pub fn resolve_modules(
    ctx: &GlobalContext,
    opts: &ResolveOptions,
    events: EventSink<'_>,
) -> Result<Resolution> {
    if opts.jobs == Some(0) {
        bail!("`jobs` must be at least 1");
    }

    let platforms = opts.platforms();
    let mut scan_opts = ScanOptions::from_config(ctx.config(), platforms.iter().copied());
    if let Some(jobs) = opts.jobs {
        scan_opts.jobs = Some(jobs);
    }
    if let Some(ms) = opts.timeout_ms {
        scan_opts.timeout = Duration::from_millis(ms);
    }

    let scanner = ManifestScanner::new(ctx.root(), scan_opts);
    let discovery = scanner.discover();
    events(&AutolinkEvent::ScanStarted {
        root: ctx.root().to_path_buf(),
        candidates: discovery.candidates.len(),
    });

    let report = scanner.load(discovery, |path| {
        events(&AutolinkEvent::PackageLoaded {
            path: path.to_path_buf(),
        })
    });

    for warning in &report.warnings {
        events(&AutolinkEvent::warning(warning));
    }
    events(&AutolinkEvent::ScanFinished {
        packages: report.packages,
        descriptors: report.descriptors.len(),
        warnings: report.warnings.len(),
    });

    let mut resolver = AbiResolver::new(&report.descriptors, opts.target);
    for &platform in &platforms {
        let mut required = ctx.config().resolve.required_for(platform);
        required.extend(opts.required.iter().cloned());
        resolver = resolver.with_required(platform, required);
    }

    let resolved = resolver.resolve()?;
    events(&AutolinkEvent::Resolved {
        target: resolved.target().to_string(),
        modules: resolved.len(),
    });

    Ok(Resolution { report, resolved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::events::ignore_events;
    use crate::resolver::ResolveFailure;
    use crate::test_support::{PackageFixture, ProjectFixture};
    use crate::util::Config;
    use std::sync::Mutex;

    #[test]
    fn test_resolve_modules_reports_events() {
        let project = ProjectFixture::new();
        project.package("camera", PackageFixture::new("camera").ios(["CameraModule"]));
        project.package("broken", PackageFixture::raw("{"));

        let ctx = GlobalContext::with_config(project.root(), Config::default());
        let seen = Mutex::new(Vec::new());
        let sink = |event: &AutolinkEvent| {
            let name = match event {
                AutolinkEvent::ScanStarted { .. } => "started",
                AutolinkEvent::PackageLoaded { .. } => "loaded",
                AutolinkEvent::ScanWarning { .. } => "warning",
                AutolinkEvent::ScanFinished { .. } => "finished",
                AutolinkEvent::Resolved { .. } => "resolved",
                AutolinkEvent::Artifact { .. } => "artifact",
                AutolinkEvent::Rendered { .. } => "rendered",
            };
            seen.lock().unwrap().push(name);
        };

        let opts = ResolveOptions {
            platforms: vec![Platform::Ios],
            ..ResolveOptions::default()
        };
        let resolution = resolve_modules(&ctx, &opts, &sink).unwrap();

        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.report.warnings.len(), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["started", "loaded", "loaded", "warning", "finished", "resolved"]
        );
    }

    #[test]
    fn test_required_modules_from_config_and_options() {
        let project = ProjectFixture::new();
        project.package("camera", PackageFixture::new("camera").android(["a.B"]));

        let mut config = Config::default();
        config
            .resolve
            .required
            .insert("android".to_string(), vec!["camera".to_string()]);
        let ctx = GlobalContext::with_config(project.root(), config);

        let opts = ResolveOptions {
            platforms: vec![Platform::Android],
            ..ResolveOptions::default()
        };
        assert!(resolve_modules(&ctx, &opts, &ignore_events).is_ok());

        let opts = ResolveOptions {
            required: vec!["sensors".to_string()],
            ..opts
        };
        let err = resolve_modules(&ctx, &opts, &ignore_events).unwrap_err();
        let failure = err.downcast_ref::<ResolveFailure>().unwrap();
        assert_eq!(failure.missing().count(), 1);
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let project = ProjectFixture::new();
        let ctx = GlobalContext::with_config(project.root(), Config::default());
        let opts = ResolveOptions {
            jobs: Some(0),
            ..ResolveOptions::default()
        };
        assert!(resolve_modules(&ctx, &opts, &ignore_events).is_err());
    }
}

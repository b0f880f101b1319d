//! Manifest scanner.
//!
//! Loads every discovered package in parallel and turns its manifest into
//! one [`ModuleDescriptor`] per requested platform. Each package load runs
//! under a timeout; a package that does not finish in time is reported and
//! left out rather than stalling the scan.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use rayon::prelude::*;

use crate::core::abi::{split_name_tag, tag_from_path};
use crate::core::manifest::read_package_version;
use crate::core::{find_manifest, AbiVersion, ManifestError, ModuleDescriptor, ModuleManifest, Platform};
use crate::sources::path::{discover_packages, Discovery, PackageCandidate};
use crate::sources::{ScanWarning, ScanWarningKind};
use crate::util::config::{Config, DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT_MS};

/// Directory holding precompiled frameworks inside a package.
const XCFRAMEWORKS_DIR: &str = ".xcframeworks";

/// Options controlling a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Platforms to produce descriptors for
    pub platforms: BTreeSet<Platform>,

    /// Deepest package directory below the root
    pub max_depth: usize,

    /// Per-package load timeout, also the longest a top-level subtree walk
    /// may go without progress; zero disables both
    pub timeout: Duration,

    /// Root-relative glob patterns that are not descended into
    pub exclude: Vec<String>,

    /// Worker threads; `None` uses the rayon default
    pub jobs: Option<usize>,

    /// Precompiled flavor to look for, if detection is enabled
    pub precompiled_flavor: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            platforms: Platform::ALL.into_iter().collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            exclude: Vec::new(),
            jobs: None,
            precompiled_flavor: None,
        }
    }
}

impl ScanOptions {
    /// Build scan options from configuration.
    pub fn from_config(config: &Config, platforms: impl IntoIterator<Item = Platform>) -> Self {
        ScanOptions {
            platforms: platforms.into_iter().collect(),
            max_depth: config.scan.max_depth(),
            timeout: config.scan.timeout(),
            exclude: config.scan.exclude.clone(),
            jobs: config.scan.jobs,
            precompiled_flavor: config
                .precompiled
                .enabled()
                .then(|| config.precompiled.flavor().to_string()),
        }
    }
}

/// Everything a scan produced.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Descriptors sorted by (name, platform, ABI, path)
    pub descriptors: Vec<ModuleDescriptor>,

    /// Recovered failures sorted by path
    pub warnings: Vec<ScanWarning>,

    /// Number of package directories loaded successfully
    pub packages: usize,
}

/// Scans a search root for module manifests.
#[derive(Debug, Clone)]
pub struct ManifestScanner {
    root: PathBuf,
    options: ScanOptions,
}

impl ManifestScanner {
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        ManifestScanner {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Discover and load all packages.
    pub fn scan(&self) -> ScanReport {
        let discovery = self.discover();
        self.load(discovery, |_| {})
    }

    /// Walk the root for package directories without loading them.
    pub fn discover(&self) -> Discovery {
        tracing::info!("Discovering packages in {}", self.root.display());
        discover_packages(
            &self.root,
            self.options.max_depth,
            &self.options.exclude,
            self.options.timeout,
        )
    }

    /// Load discovered packages in parallel.
    ///
    /// `on_loaded` is called from worker threads once per candidate.
    pub fn load(&self, discovery: Discovery, on_loaded: impl Fn(&Path) + Sync) -> ScanReport {
        let Discovery {
            candidates,
            mut warnings,
        } = discovery;

        let run = || -> Vec<Result<Vec<ModuleDescriptor>, ScanWarning>> {
            candidates
                .par_iter()
                .map(|candidate| {
                    let outcome = self.load_with_timeout(candidate);
                    on_loaded(&candidate.path);
                    outcome
                })
                .collect()
        };

        let outcomes = match self.options.jobs {
            Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    tracing::warn!("cannot start {} scan workers ({}), using the default pool", jobs, e);
                    run()
                }
            },
            None => run(),
        };

        let mut descriptors = Vec::new();
        let mut packages = 0;
        for outcome in outcomes {
            match outcome {
                Ok(found) => {
                    packages += 1;
                    descriptors.extend(found);
                }
                Err(warning) => {
                    tracing::debug!("skipping {}", warning);
                    warnings.push(warning);
                }
            }
        }

        descriptors.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        warnings.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.kind.to_string().cmp(&b.kind.to_string()))
        });

        tracing::info!(
            "Loaded {} packages ({} descriptors, {} warnings)",
            packages,
            descriptors.len(),
            warnings.len()
        );

        ScanReport {
            descriptors,
            warnings,
            packages,
        }
    }

    fn load_with_timeout(
        &self,
        candidate: &PackageCandidate,
    ) -> Result<Vec<ModuleDescriptor>, ScanWarning> {
        let job = LoadJob {
            root: self.root.clone(),
            candidate: candidate.clone(),
            platforms: self.options.platforms.clone(),
            precompiled_flavor: self.options.precompiled_flavor.clone(),
        };

        let timeout = self.options.timeout;
        if timeout.is_zero() {
            return job.run();
        }

        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("autolink-load".to_string())
            .spawn(move || {
                let _ = tx.send(job.run());
            });

        if let Err(e) = spawned {
            return Err(ScanWarning::unreadable(
                &candidate.path,
                format!("cannot start loader thread: {}", e),
            ));
        }

        // A timed-out loader keeps running detached; its result is dropped.
        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(ScanWarning::new(
                &candidate.path,
                ScanWarningKind::Timeout(timeout),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(ScanWarning::unreadable(
                &candidate.path,
                "loader stopped without a result",
            )),
        }
    }
}

/// Owned inputs for loading one package on a worker thread.
struct LoadJob {
    root: PathBuf,
    candidate: PackageCandidate,
    platforms: BTreeSet<Platform>,
    precompiled_flavor: Option<String>,
}

impl LoadJob {
    fn run(&self) -> Result<Vec<ModuleDescriptor>, ScanWarning> {
        let dir = &self.candidate.real_path;
        tracing::debug!("Loading {}", self.candidate.path.display());

        let manifest_path = match find_manifest(dir) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return Err(ScanWarning::unreadable(
                    &self.candidate.path,
                    "manifest disappeared during the scan",
                ))
            }
            Err(e) => return Err(self.warning(e)),
        };

        let manifest = ModuleManifest::load(&manifest_path).map_err(|e| self.warning(e))?;
        let version = read_package_version(dir).map_err(|e| self.warning(e))?;
        let (name, abi) = self.abi_tag(&manifest)?;

        let descriptors = manifest
            .platforms
            .iter()
            .filter(|platform| self.platforms.contains(platform))
            .map(|&platform| {
                let classes = manifest.classes(platform);
                let prebuilt = platform == Platform::Ios && self.has_prebuilt_framework();
                ModuleDescriptor::new(&manifest.name, &name, platform, dir)
                    .with_version(version.clone())
                    .with_classes(classes.iter().cloned())
                    .with_abi(abi)
                    .with_prebuilt(prebuilt)
            })
            .collect();

        Ok(descriptors)
    }

    /// Work out the logical name and ABI tag of a package.
    ///
    /// The explicit `abiSuffix`, a tag in the package name and a tag
    /// directory on the path must all agree when present.
    fn abi_tag(
        &self,
        manifest: &ModuleManifest,
    ) -> Result<(String, Option<AbiVersion>), ScanWarning> {
        let (name, name_tag) = split_name_tag(&manifest.name);
        let path_tag = tag_from_path(&self.root, &self.candidate.real_path)
            .or_else(|| tag_from_path(&self.root, &self.candidate.path));

        let sources = [
            ("abiSuffix", manifest.abi_suffix),
            ("package name", name_tag),
            ("directory", path_tag),
        ];
        let mut present = sources
            .iter()
            .filter_map(|(source, tag)| tag.map(|t| (*source, t)));

        let Some((first_source, first)) = present.next() else {
            return Ok((name, None));
        };
        for (source, tag) in present {
            if tag != first {
                return Err(ScanWarning::malformed(
                    &self.candidate.path,
                    format!(
                        "ABI tag `{}` from the {} conflicts with `{}` from the {}",
                        first, first_source, tag, source
                    ),
                ));
            }
        }

        Ok((name, Some(first)))
    }

    fn has_prebuilt_framework(&self) -> bool {
        let Some(flavor) = &self.precompiled_flavor else {
            return false;
        };

        let dir = self.candidate.real_path.join(XCFRAMEWORKS_DIR).join(flavor);
        let pattern = format!(
            "{}/*.xcframework",
            glob::Pattern::escape(&dir.to_string_lossy())
        );
        match glob::glob(&pattern) {
            Ok(mut paths) => paths.any(|p| p.map(|p| p.is_dir()).unwrap_or(false)),
            Err(_) => false,
        }
    }

    fn warning(&self, err: ManifestError) -> ScanWarning {
        if err.is_io() {
            ScanWarning::unreadable(&self.candidate.path, err)
        } else {
            ScanWarning::malformed(&self.candidate.path, err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PackageFixture;
    use semver::Version;
    use tempfile::TempDir;

    fn scan(root: &Path) -> ScanReport {
        ManifestScanner::new(root.canonicalize().unwrap(), ScanOptions::default()).scan()
    }

    #[test]
    fn test_scan_produces_descriptor_per_platform() {
        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera")
            .version("14.0.1")
            .android(["expo.modules.camera.CameraModule"])
            .ios(["CameraModule"])
            .write_to(&tmp.path().join("packages/camera"));

        let report = scan(tmp.path());
        assert!(report.warnings.is_empty());
        assert_eq!(report.packages, 1);
        assert_eq!(report.descriptors.len(), 2);

        let android = &report.descriptors[0];
        assert_eq!(android.platform(), Platform::Android);
        assert_eq!(android.name(), "camera");
        assert_eq!(android.version(), &Version::new(14, 0, 1));
        assert_eq!(android.exported_classes(), ["expo.modules.camera.CameraModule"]);
        assert!(android.abi_suffix().is_none());
        assert_eq!(report.descriptors[1].platform(), Platform::Ios);
    }

    #[test]
    fn test_platform_filter() {
        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera")
            .android(["A"])
            .ios(["B"])
            .write_to(&tmp.path().join("camera"));

        let options = ScanOptions {
            platforms: [Platform::Ios].into_iter().collect(),
            ..ScanOptions::default()
        };
        let report = ManifestScanner::new(tmp.path().canonicalize().unwrap(), options).scan();
        assert_eq!(report.descriptors.len(), 1);
        assert_eq!(report.descriptors[0].platform(), Platform::Ios);
    }

    #[test]
    fn test_abi_tag_sources() {
        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera")
            .abi_suffix("abi46_0_0")
            .write_to(&tmp.path().join("a"));
        PackageFixture::new("abi47_0_0.camera").write_to(&tmp.path().join("b"));
        PackageFixture::new("camera").write_to(&tmp.path().join("versioned/abi48_0_0/camera"));

        let options = ScanOptions {
            platforms: [Platform::Android].into_iter().collect(),
            ..ScanOptions::default()
        };
        let report = ManifestScanner::new(tmp.path().canonicalize().unwrap(), options).scan();
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let tags: Vec<_> = report
            .descriptors
            .iter()
            .map(|d| (d.name().to_string(), d.abi_suffix().map(|a| a.to_string())))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("camera".to_string(), Some("abi46_0_0".to_string())),
                ("camera".to_string(), Some("abi47_0_0".to_string())),
                ("camera".to_string(), Some("abi48_0_0".to_string())),
            ]
        );
        assert_eq!(report.descriptors[1].package_name(), "abi47_0_0.camera");
    }

    #[test]
    fn test_conflicting_abi_tags_are_malformed() {
        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera")
            .abi_suffix("abi46_0_0")
            .write_to(&tmp.path().join("versioned/abi47_0_0/camera"));

        let report = scan(tmp.path());
        assert!(report.descriptors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].is_malformed());
    }

    #[test]
    fn test_unreadable_manifest_does_not_stop_scan() {
        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera").write_to(&tmp.path().join("packages/camera"));
        PackageFixture::new("sensors").write_to(&tmp.path().join("packages/sensors"));
        PackageFixture::raw("{ this is not json").write_to(&tmp.path().join("packages/broken"));

        let report = scan(tmp.path());
        let names: BTreeSet<_> = report.descriptors.iter().map(|d| d.name()).collect();
        assert_eq!(names, ["camera", "sensors"].into_iter().collect());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].path.ends_with("packages/broken"));
        assert!(report.warnings[0].is_malformed());
    }

    #[test]
    fn test_bad_package_json_version_is_malformed() {
        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera")
            .version("not-a-version")
            .write_to(&tmp.path().join("camera"));

        let report = scan(tmp.path());
        assert!(report.descriptors.is_empty());
        assert!(report.warnings[0].is_malformed());
    }

    #[test]
    fn test_scan_is_deterministic_across_worker_counts() {
        let tmp = TempDir::new().unwrap();
        for i in 0..20 {
            PackageFixture::new(format!("module-{:02}", i))
                .android([format!("com.example.Module{}", i)])
                .write_to(&tmp.path().join(format!("packages/module-{:02}", i)));
        }

        let root = tmp.path().canonicalize().unwrap();
        let single = ManifestScanner::new(
            &root,
            ScanOptions {
                jobs: Some(1),
                ..ScanOptions::default()
            },
        )
        .scan();
        let many = ManifestScanner::new(
            &root,
            ScanOptions {
                jobs: Some(8),
                ..ScanOptions::default()
            },
        )
        .scan();

        assert_eq!(single.descriptors, many.descriptors);
        assert_eq!(single.descriptors.len(), 40);
    }

    #[test]
    fn test_prebuilt_detection() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("camera");
        PackageFixture::new("camera")
            .android(["A"])
            .ios(["CameraModule"])
            .write_to(&dir);
        std::fs::create_dir_all(dir.join(".xcframeworks/release/ExpoCamera.xcframework")).unwrap();

        let root = tmp.path().canonicalize().unwrap();
        let disabled = ManifestScanner::new(&root, ScanOptions::default()).scan();
        assert!(disabled.descriptors.iter().all(|d| !d.is_prebuilt()));

        let enabled = ManifestScanner::new(
            &root,
            ScanOptions {
                precompiled_flavor: Some("release".to_string()),
                ..ScanOptions::default()
            },
        )
        .scan();
        let prebuilt: Vec<_> = enabled
            .descriptors
            .iter()
            .map(|d| (d.platform(), d.is_prebuilt()))
            .collect();
        assert_eq!(prebuilt, vec![(Platform::Android, false), (Platform::Ios, true)]);
    }

    #[cfg(unix)]
    #[test]
    fn test_blocking_manifest_times_out() {
        use std::process::Command;

        let tmp = TempDir::new().unwrap();
        PackageFixture::new("camera").write_to(&tmp.path().join("camera"));
        let slow = tmp.path().join("slow");
        std::fs::create_dir_all(&slow).unwrap();
        let fifo = slow.join("autolink.json");

        // Reading a FIFO with no writer blocks until a writer shows up.
        let made = Command::new("mkfifo").arg(&fifo).status();
        if !matches!(made, Ok(status) if status.success()) {
            return;
        }

        let options = ScanOptions {
            timeout: Duration::from_millis(200),
            ..ScanOptions::default()
        };
        let report = ManifestScanner::new(tmp.path().canonicalize().unwrap(), options).scan();

        assert_eq!(report.packages, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.warnings[0].kind,
            ScanWarningKind::Timeout(Duration::from_millis(200))
        );

        // Release the blocked loader.
        drop(std::fs::OpenOptions::new().write(true).open(&fifo));
    }
}

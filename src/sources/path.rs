//! Path discovery - finding package directories below a search root.
//!
//! Any directory holding a module manifest is a package candidate. The walk
//! follows symlinks, so one package can be reached through several
//! spellings; candidates are collapsed onto their real path here and each
//! real directory is loaded once.
//!
//! Each top-level subtree is walked on its own thread. A subtree that stops
//! producing entries for longer than the stall timeout (a hung network
//! mount, say) is reported and left behind while the rest of the walk
//! completes.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glob::Pattern;
use walkdir::WalkDir;

use crate::core::{MANIFEST_ALIAS, MANIFEST_NAME};
use crate::sources::{ScanWarning, ScanWarningKind};
use crate::util::fs::{compile_patterns, matches_any};

/// Directory names that never hold linkable packages.
const SKIPPED_DIRS: &[&str] = &["build", "Pods", "DerivedData"];

/// A package directory found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCandidate {
    /// Path as reached from the search root
    pub path: PathBuf,
    /// Canonical path with symlinks resolved
    pub real_path: PathBuf,
}

/// Result of walking a search root.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Unique package directories, sorted by path
    pub candidates: Vec<PackageCandidate>,
    /// Paths that could not be walked or resolved
    pub warnings: Vec<ScanWarning>,
}

/// What a subtree walker reports.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkItem {
    /// A directory holding a manifest
    Package(PathBuf),
    Failed(ScanWarning),
    /// Any entry; keeps the stall clock from running out
    Visited,
}

/// Walk `root` for package directories.
///
/// `max_depth` is the deepest package directory considered (the root itself
/// is depth 0). Directories matching an `exclude` pattern (relative to the
/// root), hidden directories and build output directories are not
/// descended into. A top-level subtree that goes `stall_timeout` without
/// yielding an entry becomes a [`ScanWarningKind::Timeout`] warning; a zero
/// timeout walks everything on the calling thread with no bound.
pub fn discover_packages(
    root: &Path,
    max_depth: usize,
    exclude: &[String],
    stall_timeout: Duration,
) -> Discovery {
    let patterns = compile_patterns(exclude);
    let mut discovery = Discovery::default();
    let mut found = BTreeSet::new();

    // The root's own manifest and the subtrees below it.
    let mut subtrees = Vec::new();
    let top = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in top {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_dir() {
                    if max_depth > 0 && !is_skipped(root, entry.path(), &patterns) {
                        subtrees.push(entry.into_path());
                    }
                } else if is_manifest(entry.file_name()) {
                    found.insert(root.to_path_buf());
                }
            }
            Err(e) => discovery.warnings.push(walk_warning(root, e)),
        }
    }

    let items = if stall_timeout.is_zero() {
        let mut items = Vec::new();
        for dir in &subtrees {
            walk_subtree(root, dir, max_depth, &patterns, &mut |item: WalkItem| {
                items.push(item)
            });
        }
        items
    } else {
        let root_dir = root.to_path_buf();
        walk_bounded(
            subtrees,
            stall_timeout,
            move |dir: &Path, emit: &mut dyn FnMut(WalkItem)| {
                walk_subtree(&root_dir, dir, max_depth, &patterns, emit)
            },
        )
    };

    for item in items {
        match item {
            WalkItem::Package(dir) => {
                found.insert(dir);
            }
            WalkItem::Failed(warning) => discovery.warnings.push(warning),
            WalkItem::Visited => {}
        }
    }

    // First spelling in path order wins for each real directory.
    let mut by_real_path: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    for path in found {
        match path.canonicalize() {
            Ok(real_path) => {
                if let Some(first) = by_real_path.get(&real_path) {
                    tracing::debug!(
                        "{} is the same package as {}, skipping",
                        path.display(),
                        first.display()
                    );
                    continue;
                }
                by_real_path.insert(real_path.clone(), path.clone());
                discovery.candidates.push(PackageCandidate { path, real_path });
            }
            Err(e) => {
                tracing::debug!("cannot resolve {}: {}", path.display(), e);
                discovery.warnings.push(ScanWarning::unreadable(path, e));
            }
        }
    }

    discovery
}

/// Walk one top-level directory. `dir` sits at depth 1 below `root`.
fn walk_subtree(
    root: &Path,
    dir: &Path,
    max_depth: usize,
    patterns: &[Pattern],
    emit: &mut dyn FnMut(WalkItem),
) {
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_skipped(root, entry.path(), patterns)
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                emit(WalkItem::Visited);
                if entry.file_type().is_dir() || !is_manifest(entry.file_name()) {
                    continue;
                }
                if let Some(parent) = entry.path().parent() {
                    emit(WalkItem::Package(parent.to_path_buf()));
                }
            }
            Err(e) => emit(WalkItem::Failed(walk_warning(dir, e))),
        }
    }
}

/// Run `walk` over every subtree in parallel, abandoning subtrees that stall.
///
/// Items a stalled subtree reported before it stopped are kept. Its thread
/// keeps running detached and anything it sends later is dropped.
fn walk_bounded<W>(subtrees: Vec<PathBuf>, stall_timeout: Duration, walk: W) -> Vec<WalkItem>
where
    W: Fn(&Path, &mut dyn FnMut(WalkItem)) + Send + Sync + 'static,
{
    let walk = Arc::new(walk);
    let (tx, rx) = mpsc::channel::<(usize, Option<WalkItem>)>();
    let mut items = Vec::new();
    let mut pending: BTreeMap<usize, Instant> = BTreeMap::new();

    for (index, dir) in subtrees.iter().enumerate() {
        let tx = tx.clone();
        let walk = Arc::clone(&walk);
        let thread_dir = dir.clone();
        let spawned = thread::Builder::new()
            .name("autolink-walk".to_string())
            .spawn(move || {
                walk(&thread_dir, &mut |item: WalkItem| {
                    let _ = tx.send((index, Some(item)));
                });
                let _ = tx.send((index, None));
            });

        match spawned {
            Ok(_) => {
                pending.insert(index, Instant::now());
            }
            Err(e) => items.push(WalkItem::Failed(ScanWarning::unreadable(
                dir,
                format!("cannot start walker thread: {}", e),
            ))),
        }
    }
    drop(tx);

    while !pending.is_empty() {
        match rx.recv_timeout(stall_timeout) {
            Ok((index, item)) => {
                let Some(last_seen) = pending.get_mut(&index) else {
                    continue;
                };
                *last_seen = Instant::now();
                match item {
                    Some(item) => items.push(item),
                    None => {
                        pending.remove(&index);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        let stalled: Vec<usize> = pending
            .iter()
            .filter(|(_, last_seen)| now.duration_since(**last_seen) >= stall_timeout)
            .map(|(index, _)| *index)
            .collect();
        for index in stalled {
            pending.remove(&index);
            tracing::debug!("walk of {} stalled, skipping", subtrees[index].display());
            items.push(WalkItem::Failed(ScanWarning::new(
                &subtrees[index],
                ScanWarningKind::Timeout(stall_timeout),
            )));
        }
    }

    // Walkers that died without finishing.
    for index in pending.into_keys() {
        items.push(WalkItem::Failed(ScanWarning::unreadable(
            &subtrees[index],
            "walker stopped before finishing",
        )));
    }

    items
}

fn is_manifest(name: &OsStr) -> bool {
    name == OsStr::new(MANIFEST_NAME) || name == OsStr::new(MANIFEST_ALIAS)
}

fn walk_warning(fallback: &Path, e: walkdir::Error) -> ScanWarning {
    let path = e
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    tracing::debug!("cannot read {}: {}", path.display(), e);
    ScanWarning::unreadable(path, e)
}

fn is_skipped(root: &Path, dir: &Path, patterns: &[Pattern]) -> bool {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
        return true;
    }

    match dir.strip_prefix(root) {
        Ok(relative) => matches_any(relative, patterns),
        Err(_) => false,
    }
}

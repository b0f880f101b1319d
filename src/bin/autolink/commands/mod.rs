//! Command implementations

pub mod completions;
pub mod generate;
pub mod list;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use autolink::ops::AutolinkEvent;
use autolink::util::fs::portable_relative;
use autolink::util::shell::{Progress, Status};
use autolink::util::Shell;

use crate::cli::MessageFormat;

/// Renders pipeline events for the terminal.
///
/// Called from scan worker threads, so all state is behind a lock.
pub struct Reporter {
    shell: Arc<Shell>,
    root: PathBuf,
    format: MessageFormat,
    progress: Mutex<Option<Progress>>,
}

impl Reporter {
    pub fn new(shell: &Arc<Shell>, root: &Path, format: MessageFormat) -> Self {
        Reporter {
            shell: Arc::clone(shell),
            root: root.to_path_buf(),
            format,
            progress: Mutex::new(None),
        }
    }

    pub fn event(&self, event: &AutolinkEvent) {
        if self.format == MessageFormat::Json {
            println!("{}", event.to_json_line());
            return;
        }

        match event {
            AutolinkEvent::ScanStarted { root, candidates } => {
                self.shell.status(
                    Status::Scanning,
                    format!("{} ({} packages)", root.display(), candidates),
                );
                let progress = self.shell.progress(*candidates as u64, "Loading");
                if let Ok(mut slot) = self.progress.lock() {
                    *slot = Some(progress);
                }
            }
            AutolinkEvent::PackageLoaded { path } => {
                if let Ok(slot) = self.progress.lock() {
                    if let Some(progress) = slot.as_ref() {
                        progress.tick(self.relative(path));
                    }
                }
            }
            AutolinkEvent::ScanWarning { path, warning, .. } => {
                self.finish_progress();
                self.shell
                    .diagnostic(&warning.to_diagnostic().with_location(self.relative(path)));
            }
            AutolinkEvent::ScanFinished {
                packages,
                descriptors,
                ..
            } => {
                self.finish_progress();
                self.shell.status(
                    Status::Resolving,
                    format!("{} descriptors from {} packages", descriptors, packages),
                );
            }
            AutolinkEvent::Resolved { target, modules } => {
                self.shell
                    .note(format!("{} modules selected for {}", modules, target));
            }
            AutolinkEvent::Artifact {
                path,
                format,
                fresh,
                ..
            } => {
                let status = if *fresh {
                    Status::Generated
                } else {
                    Status::Unchanged
                };
                self.shell
                    .status(status, format!("{} ({})", self.relative(path), format));
            }
            AutolinkEvent::Rendered { contents, .. } => {
                print!("{}", contents);
            }
        }
    }

    fn finish_progress(&self) {
        if let Ok(mut slot) = self.progress.lock() {
            if let Some(progress) = slot.take() {
                progress.finish();
            }
        }
    }

    fn relative(&self, path: &Path) -> String {
        portable_relative(&self.root, path)
    }
}

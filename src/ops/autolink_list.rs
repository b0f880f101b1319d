//! Implementation of `autolink list`.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;

use crate::ops::events::EventSink;
use crate::ops::resolve::{resolve_modules, Resolution, ResolveOptions};
use crate::resolver::ResolvedModuleSet;
use crate::util::fs::portable_relative;
use crate::util::GlobalContext;

/// Resolve modules without generating anything.
pub fn list(
    ctx: &GlobalContext,
    opts: &ResolveOptions,
    events: EventSink<'_>,
) -> Result<Resolution> {
    resolve_modules(ctx, opts, events)
}

/// Render a resolved set as an aligned table.
pub fn format_table(resolved: &ResolvedModuleSet, root: &Path) -> String {
    let rows: Vec<[String; 5]> = resolved
        .iter()
        .map(|d| {
            [
                d.name().to_string(),
                d.platform().to_string(),
                d.version().to_string(),
                d.abi_suffix()
                    .map(|abi| abi.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                portable_relative(root, d.path()),
            ]
        })
        .collect();

    let header = ["MODULE", "PLATFORM", "VERSION", "ABI", "PATH"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 5]| {
        let mut text = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 == cells.len() {
                text.push_str(cell);
            } else {
                let _ = write!(text, "{:<width$}  ", cell, width = widths[i]);
            }
        }
        out.push_str(text.trim_end());
        out.push('\n');
    };

    line(header);
    for row in &rows {
        line(row.each_ref().map(String::as_str));
    }
    out
}

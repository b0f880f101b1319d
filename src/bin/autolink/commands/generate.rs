//! `autolink generate` command

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::cli::GenerateArgs;
use crate::commands::Reporter;
use autolink::ops::{autolink, AutolinkEvent, GenerateOptions};
use autolink::util::shell::{format_duration, Status};
use autolink::util::{GlobalContext, Shell};

pub fn execute(args: GenerateArgs, shell: &Arc<Shell>) -> Result<()> {
    let start = Instant::now();
    let ctx = GlobalContext::new(args.select.root.as_deref())?;

    let opts = GenerateOptions {
        resolve: args.select.to_options(),
        format: args.format,
        output: args.output,
        dry_run: args.dry_run,
    };

    let reporter = Reporter::new(shell, ctx.root(), args.message_format);
    let result = autolink(&ctx, &opts, &|event: &AutolinkEvent| reporter.event(event))?;

    let skipped = if result.warnings.is_empty() {
        String::new()
    } else {
        format!(", {} package(s) skipped", result.warnings.len())
    };
    shell.status(
        Status::Finished,
        format!(
            "{} module registration(s){} in {}",
            result.manifest.len(),
            skipped,
            format_duration(start.elapsed())
        ),
    );

    Ok(())
}

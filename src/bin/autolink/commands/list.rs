//! `autolink list` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::{ListArgs, MessageFormat};
use crate::commands::Reporter;
use autolink::ops::{format_table, list, AutolinkEvent};
use autolink::util::{GlobalContext, Shell};

pub fn execute(args: ListArgs, shell: &Arc<Shell>) -> Result<()> {
    let ctx = GlobalContext::new(args.select.root.as_deref())?;

    let reporter = Reporter::new(shell, ctx.root(), MessageFormat::Human);
    let resolution = list(
        &ctx,
        &args.select.to_options(),
        &|event: &AutolinkEvent| reporter.event(event),
    )?;

    if resolution.resolved.is_empty() {
        shell.note("no modules found");
    } else {
        print!("{}", format_table(&resolution.resolved, ctx.root()));
    }

    Ok(())
}

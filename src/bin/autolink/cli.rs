//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use autolink::core::{AbiTarget, Platform};
use autolink::generator::OutputFormat;
use autolink::ops::ResolveOptions;
use autolink::util::shell::ColorChoice;

/// Autolink - discover, version and register native modules for mobile builds
#[derive(Parser)]
#[command(name = "autolink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan, resolve and write the module registration artifact
    Generate(GenerateArgs),

    /// Show which module implementations would be linked
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments shared by every command that scans and resolves.
#[derive(Args, Clone)]
pub struct SelectArgs {
    /// Search root (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Platform to link (repeatable; defaults to all)
    #[arg(short, long, value_name = "PLATFORM")]
    pub platform: Vec<Platform>,

    /// Target ABI: `unversioned` or a tag like `abi46_0_0`
    #[arg(long, value_name = "ABI", default_value = "unversioned")]
    pub abi: AbiTarget,

    /// Fail unless this module resolves on every selected platform
    #[arg(long = "require", value_name = "MODULE")]
    pub required: Vec<String>,

    /// Number of parallel scan workers
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-package load timeout in milliseconds (0 disables)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl SelectArgs {
    pub fn to_options(&self) -> ResolveOptions {
        ResolveOptions {
            platforms: self.platform.clone(),
            target: self.abi,
            required: self.required.clone(),
            jobs: self.jobs,
            timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Artifact format: json, kotlin, swift
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Artifact path, relative to the search root
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the artifact instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Progress output format
    #[arg(long, value_enum, default_value = "human")]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub select: SelectArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// How pipeline events are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Status lines on stderr
    Human,
    /// One JSON object per line on stdout
    Json,
}

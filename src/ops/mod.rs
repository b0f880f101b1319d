//! High-level operations.
//!
//! This module contains the implementation of autolink commands.

pub mod autolink_generate;
pub mod autolink_list;
pub mod events;
pub mod resolve;

pub use autolink_generate::{autolink, GenerateOptions, GenerateResult};
pub use autolink_list::{format_table, list};
pub use events::{ignore_events, AutolinkEvent, EventSink};
pub use resolve::{resolve_modules, Resolution, ResolveOptions};

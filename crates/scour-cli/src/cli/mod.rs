//! CLI surface: argument parsing, the REST backend, and output rendering.
//!
//! Everything here is thin glue over the engine: subcommands assemble a
//! [`Fetcher`](scour::Fetcher) over the REST backend, consume its stream,
//! and format what arrives. No fetch logic lives at this layer.
//!
//! ## Structure
//!
//! - [`config`] - clap arguments, env fallbacks, validated settings.
//! - [`rest`] - the reqwest-backed [`Directory`](scour::Directory) impl.
//! - [`commands`] - subcommand execution.
//! - [`output`] - table/json/raw rendering.

pub mod commands;
pub mod config;
pub mod output;
pub mod rest;

//! CLI module for the appspec tool.
//!
//! This module provides the command-line interface for encoding,
//! decoding, validating, fingerprinting and diffing app specs.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;

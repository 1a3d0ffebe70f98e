//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::Encoder;

/// appspec - Convert declarative app configuration to deployment specs and back.
#[derive(Parser, Debug)]
#[command(name = "appspec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration tree (YAML or JSON).
    #[arg(short, long, global = true, env = "APPSPEC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Reject mutually exclusive fields set together instead of using the first.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode the configuration tree into a deployment spec.
    Encode,

    /// Decode a deployment spec back into a configuration tree.
    Decode {
        /// Spec document to decode (YAML or JSON).
        spec: PathBuf,

        /// Previously stored tree, used to keep its domain layout.
        #[arg(long)]
        prior: Option<PathBuf>,
    },

    /// Validate the configuration tree.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Print fingerprints of the app and its components.
    Hash {
        /// Only hash the named component.
        #[arg(long)]
        component: Option<String>,
    },

    /// Compare the configuration tree against an observed one.
    Diff {
        /// Observed configuration tree (YAML or JSON).
        observed: PathBuf,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output. Documents are written as YAML.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Returns the encoder selected by `--strict`.
    #[must_use]
    pub const fn encoder(&self) -> Encoder {
        if self.strict {
            Encoder::strict()
        } else {
            Encoder::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusivePolicy;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["appspec", "--strict", "--output", "json", "-c", "app.yaml", "encode"]);
        assert!(cli.strict);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("app.yaml")));
        assert_eq!(cli.encoder().policy(), ExclusivePolicy::Reject);
        assert!(matches!(cli.command, Commands::Encode));
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::parse_from(["appspec", "decode", "spec.json", "--prior", "app.yaml"]);
        assert_eq!(cli.encoder().policy(), ExclusivePolicy::FirstPresent);
        let Commands::Decode { spec, prior } = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(spec, PathBuf::from("spec.json"));
        assert_eq!(prior, Some(PathBuf::from("app.yaml")));
    }
}

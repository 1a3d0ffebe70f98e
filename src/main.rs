//! appspec CLI entrypoint.
//!
//! This is the main entrypoint for the appspec command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use appspec_codec::cli::{Cli, Commands, OutputFormatter};
use appspec_codec::codec::{DecodeContext, Decoder, Encoder, SpecHasher};
use appspec_codec::config::{ConfigFormat, ConfigMap, ConfigParser, ConfigValidator, find_config_file};
use appspec_codec::diff::DiffEngine;
use appspec_codec::error::{AppSpecError, ConfigError, Result};
use appspec_codec::spec::AppSpec;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let encoder = cli.encoder();

    match &cli.command {
        Commands::Encode => cmd_encode(cli.config.as_ref(), encoder, &formatter),
        Commands::Decode { spec, prior } => cmd_decode(spec, prior.as_deref(), &formatter),
        Commands::Validate { warnings } => {
            cmd_validate(cli.config.as_ref(), encoder, *warnings, &formatter)
        }
        Commands::Hash { component } => {
            cmd_hash(cli.config.as_ref(), encoder, component.as_deref(), &formatter)
        }
        Commands::Diff { observed } => cmd_diff(cli.config.as_ref(), observed, encoder, &formatter),
    }
}

/// Encode the configuration tree and print the spec.
fn cmd_encode(config_path: Option<&PathBuf>, encoder: Encoder, formatter: &OutputFormatter) -> Result<()> {
    let tree = load_tree(config_path)?;
    let app = encoder.encode(&tree)?;
    write_stdout(&formatter.format_document(&app)?)
}

/// Decode a spec document and print the tree.
fn cmd_decode(spec_path: &Path, prior: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    info!("Decoding spec: {}", spec_path.display());
    let app = load_spec(spec_path)?;

    let prior_tree = prior
        .map(|path| ConfigParser::new().load_file(path))
        .transpose()?;
    let context = DecodeContext::from_prior_state(prior_tree.as_ref());
    debug!(?context, "Decode context");

    let tree = Decoder::new(context).decode(&app);
    write_stdout(&formatter.format_document(&tree)?)
}

/// Validate the configuration tree.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    encoder: Encoder,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let tree = load_tree(config_path)?;
    let (app, result) = ConfigValidator::new(encoder).check(&tree);

    eprint!("{}", formatter.format_validation(&result, show_warnings));

    if let Some(app) = app {
        // Show summary
        eprintln!("\nConfiguration summary:");
        eprintln!("  App: {}", app.name);
        eprintln!("  Region: {}", app.region.as_deref().unwrap_or("default"));
        eprintln!("  Components: {}", app.components.len());
        eprintln!("  Databases: {}", app.databases.len());
    }

    match result.errors.first() {
        None => Ok(()),
        Some(first) => Err(ConfigError::validation(
            format!("{} error(s), first: {}", result.error_count(), first.message),
            first.field.clone(),
        )
        .into()),
    }
}

/// Print app and component fingerprints.
fn cmd_hash(
    config_path: Option<&PathBuf>,
    encoder: Encoder,
    component: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let tree = load_tree(config_path)?;
    let app = encoder.encode(&tree)?;

    if let Some(name) = component {
        if app.component(name).is_none() {
            return Err(AppSpecError::internal(format!("no component named '{name}'")));
        }
    }

    write_stdout(&formatter.format_hashes(&app, &SpecHasher::new(), component))
}

/// Compare the configuration tree against an observed tree.
fn cmd_diff(
    config_path: Option<&PathBuf>,
    observed_path: &Path,
    encoder: Encoder,
    formatter: &OutputFormatter,
) -> Result<()> {
    let desired = encoder.encode(&load_tree(config_path)?)?;

    info!("Loading observed tree: {}", observed_path.display());
    let observed_tree = ConfigParser::new().load_file(observed_path)?;
    let observed = encoder.encode(&observed_tree)?;

    let diff = DiffEngine::new().compute_diff(&desired, &observed);
    write_stdout(&formatter.format_diff(&diff))
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

/// Loads the configuration tree with `.env` and environment overrides.
fn load_tree(config_path: Option<&PathBuf>) -> Result<ConfigMap> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let parser = ConfigParser::new().with_base_path(
        config_file
            .parent()
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;
    parser.load_with_env(&config_file)
}

/// Reads a spec document in YAML or JSON.
fn load_spec(path: &Path) -> Result<AppSpec> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)?;
    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => {
            serde_json::from_str(&content).map_err(|e| AppSpecError::serialization(e.to_string()))
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(&content).map_err(|e| AppSpecError::serialization(e.to_string()))
        }
    }
}

fn write_stdout(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

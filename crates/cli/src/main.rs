#![allow(clippy::result_large_err)]

mod load;
mod summary;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use adef_core::pass5_check::LimitWarning;
use adef_core::{build_app, App, BuildContext, EnvVarSubstitution, HostFileSystem, ModelledApp};
use clap::{Parser, Subcommand, ValueEnum};
use load::CliError;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Application definition modeller.
#[derive(Parser)]
#[command(name = "adef", version, about = "Application definition modeller")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Log each modelling step to stderr
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the application model from a JSON section tree
    Model {
        /// Path to the JSON section tree of the definition file
        tree: PathBuf,
        /// Path to the JSON component catalog
        #[arg(long)]
        components: PathBuf,
        /// Variable used for `$NAME` substitution, overriding the environment
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = load::parse_var)]
        vars: Vec<(String, String)>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Model {
            tree,
            components,
            vars,
        } => {
            if let Err(e) = cmd_model(&tree, &components, vars, cli.output) {
                report_error(&e, cli.output);
                process::exit(1);
            }
        }
    }
}

#[derive(Serialize)]
struct ModelOutput<'a> {
    app: &'a App,
    warnings: &'a [LimitWarning],
}

fn cmd_model(
    tree: &Path,
    components: &Path,
    vars: Vec<(String, String)>,
    output: OutputFormat,
) -> Result<(), CliError> {
    let adef = load::load_tree(tree)?;
    let catalog = load::load_catalog(components)?;
    let vars = vars
        .into_iter()
        .fold(EnvVarSubstitution::new(), |subst, (name, value)| {
            subst.with_var(name, value)
        });
    debug!(tree = %tree.display(), sections = adef.sections.len(), "loaded section tree");

    let fs = HostFileSystem;
    let mut cx = BuildContext::new(&catalog, &fs, &vars);
    let modelled = build_app(&adef, &mut cx)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match output {
        OutputFormat::Text => summary::write_summary(&mut out, &modelled)?,
        OutputFormat::Json => write_json(&mut out, &modelled)?,
    }
    out.flush()?;
    Ok(())
}

fn write_json(out: &mut impl Write, modelled: &ModelledApp) -> Result<(), CliError> {
    let value = ModelOutput {
        app: &modelled.app,
        warnings: &modelled.warnings,
    };
    let pretty = serde_json::to_string_pretty(&value).map_err(CliError::Serialize)?;
    writeln!(out, "{}", pretty)?;
    Ok(())
}

fn report_error(e: &CliError, output: OutputFormat) {
    match output {
        OutputFormat::Text => eprintln!("{}", e),
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
    }
}

//! AppCluster CLI

use appcluster_composer::{AppCluster, AppClusterSpec, Error};
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Flag for verbose output
const VERBOSE_FLAG: &str = "verbose";

const COMPOSE_CMD: &str = "compose";
const PLAN_CMD: &str = "plan";

const FORMAT_YAML: &str = "yaml";
const FORMAT_JSON: &str = "json";

/// Load the spec at `path` and compose it.
fn load(path: &Path) -> Result<AppCluster, Error> {
    let spec = AppClusterSpec::load(path)?;
    info!(name = spec.name.as_str(), region = %spec.region, "loaded spec");
    AppCluster::new(&spec)
}

/// Print every declaration of the composed graph.
fn compose(path: &Path, format: &str) -> Result<(), Error> {
    let app = load(path)?;
    let rendered = match format {
        FORMAT_JSON => app.to_json()?,
        _ => app.to_yaml()?,
    };
    println!("{rendered}");
    Ok(())
}

/// Log the waves in which resources can be created.
fn plan(path: &Path) -> Result<(), Error> {
    let app = load(path)?;
    let plan = app.plan();
    for (wave, declaration) in &plan {
        info!(
            wave,
            kind = ?declaration.kind,
            name = declaration.name.as_str(),
            "planned resource"
        );
    }
    info!(
        resources = plan.len(),
        waves = plan.last().map_or(0, |(wave, _)| wave + 1),
        "planned app cluster"
    );
    Ok(())
}

/// Entrypoint for the AppCluster CLI
fn main() -> std::process::ExitCode {
    // Define application
    let config_arg = Arg::new("config")
        .long("config")
        .required(true)
        .help("Path to YAML spec file")
        .value_parser(clap::value_parser!(PathBuf));
    let matches = Command::new("appcluster")
        .version(crate_version())
        .about("Compose the resources of a load-balanced container cluster.")
        .arg(
            Arg::new(VERBOSE_FLAG)
                .short('v')
                .long(VERBOSE_FLAG)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new(COMPOSE_CMD)
                .about("Print every resource declared for a spec.")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value(FORMAT_YAML)
                        .help("Output format")
                        .value_parser([FORMAT_YAML, FORMAT_JSON]),
                ),
        )
        .subcommand(
            Command::new(PLAN_CMD)
                .about("Show the order in which resources can be created.")
                .arg(config_arg),
        )
        .get_matches();

    // Create logger
    let level = if matches.get_flag(VERBOSE_FLAG) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Parse subcommands
    let result = match matches.subcommand() {
        Some((COMPOSE_CMD, matches)) => {
            let config_path = matches.get_one::<PathBuf>("config").unwrap();
            let format = matches.get_one::<String>("format").unwrap();
            compose(config_path, format)
        }
        Some((PLAN_CMD, matches)) => {
            let config_path = matches.get_one::<PathBuf>("config").unwrap();
            plan(config_path)
        }
        Some((cmd, _)) => {
            error!(cmd, "invalid subcommand");
            return std::process::ExitCode::FAILURE;
        }
        None => {
            error!("no subcommand provided");
            return std::process::ExitCode::FAILURE;
        }
    };
    if let Err(e) = result {
        error!(error = ?e, "failed to compose app cluster");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

//! Graph Attributes command line
//!
//! Loads a JSON seed into fresh attribute stores and checks every formula.

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use graph_attrs::{check, init_logging, seed::Seed, AppConfig, AppContext, Error};
use tracing::info;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let matches = Command::new("graph-attrs")
        .version(graph_attrs::VERSION)
        .about("Typed attribute store and formula engine for graph entities.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file path")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Log level (trace, debug, info, warn, error)")
        )
        .subcommand(
            Command::new("check")
                .about("Load a seed file and evaluate every formula")
                .arg(
                    Arg::new("seed")
                        .value_name("SEED")
                        .required(true)
                        .help("JSON seed file")
                )
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    init_logging(&config.logging)?;

    match matches.subcommand() {
        Some(("check", sub)) => run_check(config, sub),
        _ => Err(Error::invalid_input("Unknown command").into()),
    }
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut AppConfig, matches: &ArgMatches) -> graph_attrs::Result<()> {
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }
    Ok(())
}

/// Seed a fresh context and print the formula report
fn run_check(config: AppConfig, matches: &ArgMatches) -> anyhow::Result<()> {
    let path = matches
        .get_one::<String>("seed")
        .ok_or_else(|| Error::invalid_input("Missing seed file"))?;

    let context = AppContext::new(config);
    let seed = Seed::from_file(path).with_context(|| format!("Failed to load seed {}", path))?;
    let written = seed.apply(&context)?;
    info!("Applied {} attribute values", written);

    let report = check::run(&context);
    println!("{}", report);

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

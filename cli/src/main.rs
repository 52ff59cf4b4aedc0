// Use modules from the library crate
use sca_cli::{commands, config, logging};

use anyhow::{Context, Result};
use clap::Parser;
use commands::build::{BuildSettings, parse_base_uri};
use sca_cli::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sca",
    about = "Resolve SCA contributions into fully wired assemblies",
    version
)]
struct Cli {
    /// Also print log output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Build a contribution descriptor and print the resolved composite
    ///
    /// The descriptor is a .toml or .json file naming the deployable
    /// composite, every composite it uses, and the policy definitions.
    ///
    /// Examples:
    ///   sca build store.toml
    ///   sca build store.json --format json
    ///   sca build store.toml --base-uri binding.ws=http://localhost:8080
    Build {
        /// Contribution descriptor (.toml or .json)
        descriptor: PathBuf,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Fail when any problem is reported
        #[arg(long)]
        strict: bool,

        /// Base URI for a binding type, e.g. binding.ws=http://localhost:8080
        #[arg(long = "base-uri", value_name = "TYPE=URI", value_parser = parse_base_uri)]
        base_uris: Vec<(String, String)>,
    },

    /// Build a contribution descriptor and only report problems
    Check {
        /// Contribution descriptor (.toml or .json)
        descriptor: PathBuf,

        /// Fail when any problem is reported
        #[arg(long)]
        strict: bool,

        /// Base URI for a binding type, e.g. binding.ws=http://localhost:8080
        #[arg(long = "base-uri", value_name = "TYPE=URI", value_parser = parse_base_uri)]
        base_uris: Vec<(String, String)>,
    },

    /// Manage the CLI configuration file
    ///
    /// The file lives at ~/.config/sca/config.toml unless SCA_CONFIG is set.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Parser)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose).context("Failed to initialize logging")?;

    match cli.command {
        Command::Build {
            descriptor,
            format,
            strict,
            base_uris,
        } => {
            let cfg = config::load_config().context("Failed to load config")?;
            let settings = BuildSettings::merge(&cfg, strict, base_uris);
            commands::build::run_build(&descriptor, format, &settings)
        }

        Command::Check {
            descriptor,
            strict,
            base_uris,
        } => {
            let cfg = config::load_config().context("Failed to load config")?;
            let settings = BuildSettings::merge(&cfg, strict, base_uris);
            commands::build::run_check(&descriptor, &settings)
        }

        Command::Config { command } => match command {
            ConfigCommand::Show => commands::config::show(),
            ConfigCommand::Path => commands::config::path(),
            ConfigCommand::Init { force } => commands::config::init(force),
        },
    }
}

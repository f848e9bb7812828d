use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ELSEPA CLI - validate settings, write input decks, run elscata and read its output tables.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run elscata for the settings in a configuration file and summarize its outputs.
    Run(RunArgs),
    /// Render the elscata input deck without running the program.
    Input(InputArgs),
    /// Validate the settings and print them with every default filled in.
    Check(CheckArgs),
    /// List the fields elscata accepts, with their defaults and descriptions.
    Model,
    /// Parse one elscata output table.
    Parse(ParseArgs),
}

/// Where the settings come from.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Set a settings value, overriding the config file.
    /// Can be used multiple times. Example: -S EV='["100 eV", "1 keV"]'
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Directory receiving a copy of the raw output files.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    // --- Local backend ---
    /// Directory containing the elscata binary. Searched on PATH when omitted.
    #[arg(long, value_name = "DIR")]
    pub elsepa_dir: Option<PathBuf>,

    /// ELSEPA data directory. Defaults to $ELSEPA_DATA.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    // --- Container backend ---
    /// Run inside a container created from this image instead of locally.
    #[arg(long, value_name = "NAME")]
    pub image: Option<String>,
}

/// Arguments for the `input` subcommand.
#[derive(Args, Debug)]
pub struct InputArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Write the deck to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Arguments for the `parse` subcommand.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Output file written by elscata (e.g. dcs_1p000e03.dat).
    #[arg(required = true, value_name = "PATH")]
    pub file: PathBuf,

    /// Export the table as CSV to this path.
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,
}

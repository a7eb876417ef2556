use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Highlight log lines with regular-expression filters and print focus views
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project file with filter groups (.json, .json5 or .toml)
    #[arg(short, long, global = true, env = "LOG_FOCUS_PROJECT")]
    pub project: Option<PathBuf>,

    /// Project to select from the project file (defaults to the file's selection)
    #[arg(long, global = true)]
    pub project_name: Option<String>,

    /// Extra include filter, may be repeated
    #[arg(short, long = "include", global = true)]
    pub include: Vec<String>,

    /// Extra exclude filter, may be repeated
    #[arg(short = 'x', long = "exclude", global = true)]
    pub exclude: Vec<String>,

    /// Engine config file (TOML) with cache and large-file settings
    #[arg(long, global = true, env = "LOG_FOCUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to a file as well as stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print only the lines that survive the active filters
    Focus {
        /// Log file to filter
        file: PathBuf,
    },
    /// Print the whole file, coloring lines matched by highlighted filters
    Highlight {
        /// Log file to decorate
        file: PathBuf,
    },
    /// Show per-filter match counts for a file
    Stats {
        /// Log file to analyze
        file: PathBuf,
    },
    /// Validate every filter pattern of the project file
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}

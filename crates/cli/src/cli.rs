use clap::{Args, Parser, Subcommand};
use infrastructure::config::{LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "fortiflat",
    about = "FortiGate policy flattening and lookup toolkit",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to the YAML settings file
    #[arg(short, long)]
    pub settings: Option<String>,

    /// Log level override (takes precedence over the settings file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Log format: text (default) or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Input/output paths shared by every subcommand.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path to the FortiGate configuration dump
    #[arg(short, long)]
    pub config: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display version information
    Version,

    /// List address and service objects as CSV
    List {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Emit normalized policy rows (groups unexpanded)
    Normalize {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Emit expanded policy rows
    Flatten {
        #[command(flatten)]
        input: InputArgs,

        /// Expand address columns to leaf values
        #[arg(long)]
        addresses: bool,

        /// Expand the service column to protocol/port tokens
        #[arg(long)]
        services: bool,
    },

    /// Match a list of source/destination addresses against the policies
    Lookup {
        #[command(flatten)]
        input: InputArgs,

        /// Path to the lookup list (SRC,DST[,comment] per line)
        #[arg(long)]
        list: String,

        /// Suppress rows shadowed by an earlier catch-all deny
        #[arg(long)]
        without_ineffectual: bool,

        /// Treat FQDN/geography values as matching IP queries and vice versa
        #[arg(long)]
        fqdn_geo_match_all: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

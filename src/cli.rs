use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::logging::LogArgs;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Hexadecimal (lowercase)
    Hex,
    /// Uppercase hexadecimal
    HexUpper,
    /// Contiguous bit string, 8 bits per byte
    Binary,
    /// Base64 (standard, with padding)
    Base64,
    /// Raw binary bytes
    Raw,
}

/// Threshold overrides layered over the config file. The run-length bucket
/// table is configurable via TOML only.
#[derive(Debug, Args)]
pub struct ThresholdArgs {
    /// Monobit lower bound, exclusive
    #[arg(long)]
    pub monobit_min: Option<u64>,

    /// Monobit upper bound, exclusive
    #[arg(long)]
    pub monobit_max: Option<u64>,

    /// Longest tolerated run of identical bits
    #[arg(long)]
    pub series_max: Option<u32>,

    /// Poker-4 statistic lower bound, exclusive
    #[arg(long)]
    pub poker_min: Option<f64>,

    /// Poker-4 statistic upper bound, exclusive
    #[arg(long)]
    pub poker_max: Option<f64>,

    /// Also check the trailing (unclosed) run of the bit stream
    #[arg(long)]
    pub check_final_run: bool,
}

#[derive(Debug, Parser)]
#[command(name = "keyrand", about = "FIPS 140 style randomness tests for cryptographic keys")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Number of random key bytes to generate
    #[arg(short = 'n', long = "bytes", default_value_t = 2500)]
    pub bytes: usize,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Hex)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the four-test battery against a key read from a file or stdin
    Test(TestArgs),
    /// Generate many keys and report per-test pass rates
    Check(CheckArgs),
}

#[derive(Debug, Parser)]
pub struct TestArgs {
    /// Key file (reads stdin when omitted)
    pub key_file: Option<PathBuf>,

    /// Render the key in the given format before testing
    #[arg(long = "dump", value_enum)]
    pub dump_format: Option<OutputFormat>,

    /// Configuration file path (default: /etc/keyrand.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Number of keys to generate and test
    #[arg(short = 't', long, default_value_t = 1000)]
    pub trials: u64,

    /// Bytes per key (default thresholds are calibrated for 2500)
    #[arg(short = 's', long, default_value_t = 2500)]
    pub key_size: usize,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value_t = 10)]
    pub report_interval: u64,

    /// Configuration file path (default: /etc/keyrand.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

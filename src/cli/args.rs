//! Command-line argument parsing
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "memnetstat")]
#[command(about = "Reconstruct network sockets from a Linux memory image", long_about = None)]
pub struct Cli {
    /// Path to the memory dump (LiME or raw)
    #[arg(value_name = "MEMORY_DUMP")]
    pub memory_dump: std::path::PathBuf,

    /// Plugin to run (default: netstat)
    #[command(subcommand)]
    pub plugin: Option<PluginCommand>,

    /// Kernel profile (dwarf2json ISF)
    #[arg(short, long, value_name = "FILE")]
    pub profile: std::path::PathBuf,

    /// System.map whose addresses override the profile's symbols
    #[arg(short, long, value_name = "FILE")]
    pub system_map: Option<std::path::PathBuf>,

    /// KASLR slide added to every symbol address, in hex (e.g. 0x1e000000)
    #[arg(long, value_name = "HEX", value_parser = parse_shift, allow_hyphen_values = true)]
    pub kaslr_shift: Option<i64>,

    /// Physical load address of the kernel image, in hex
    #[arg(long, value_name = "HEX", value_parser = parse_hex)]
    pub phys_base: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormatArg,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<std::path::PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Enable verbose output (status messages)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Task selection shared by every plugin.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Filter by PID
    #[arg(long)]
    pub pid: Option<i32>,

    /// Filter by process name (regex)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// TCP and UDP sockets held open by each process
    Netstat(FilterArgs),

    /// List running processes
    Pslist(FilterArgs),

    /// Open file handles
    #[command(alias = "lsof")]
    Files(FilterArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Table,
    Csv,
    Json,
    Jsonl,
}

pub fn parse_hex(value: &str) -> Result<u64, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex value '{}': {}", value, e))
}

/// Hex with an optional leading sign.
pub fn parse_shift(value: &str) -> Result<i64, String> {
    let (negative, magnitude) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let magnitude = parse_hex(magnitude)?;
    let shift = i64::try_from(magnitude).map_err(|_| format!("shift '{}' out of range", value))?;
    Ok(if negative { -shift } else { shift })
}

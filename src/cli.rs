//! Command-line interface for the `manage` binary.
use std::{path::PathBuf, str::FromStr};

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use crate::constants::DEFAULT_CONTAINER_PORT;

/// Wrapper around `LevelFilter` so clap can parse log levels from either
/// string names ("info", "debug", etc.) or numeric shorthands (0-5).
#[derive(Clone, Copy, Debug)]
pub struct LogLevelArg(LevelFilter);

impl LogLevelArg {
    /// String representation suitable for `RUST_LOG`.
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            LevelFilter::OFF => "off",
            LevelFilter::ERROR => "error",
            LevelFilter::WARN => "warn",
            LevelFilter::INFO => "info",
            LevelFilter::DEBUG => "debug",
            LevelFilter::TRACE => "trace",
        }
    }
}

impl FromStr for LogLevelArg {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("log level cannot be empty".into());
        }

        if let Ok(number) = trimmed.parse::<u8>() {
            let level = match number {
                0 => LevelFilter::OFF,
                1 => LevelFilter::ERROR,
                2 => LevelFilter::WARN,
                3 => LevelFilter::INFO,
                4 => LevelFilter::DEBUG,
                5 => LevelFilter::TRACE,
                _ => {
                    return Err(format!(
                        "unsupported log level number '{number}' (expected 0-5)"
                    ));
                }
            };

            return Ok(LogLevelArg(level));
        }

        let level = match trimmed.to_ascii_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" | "err" => LevelFilter::ERROR,
            "warn" | "warning" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => return Err(format!("invalid log level '{trimmed}'")),
        };

        Ok(LogLevelArg(level))
    }
}

/// Command-line interface for `manage`.
#[derive(Parser)]
#[command(name = "manage", version)]
#[command(about = "Manage nginx hosts and services inside the container box", long_about = None)]
pub struct Cli {
    /// Override the logging verbosity for this invocation only.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Settings file (defaults to /etc/manage/manage.yaml when present).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage hosts.
    Host {
        #[command(subcommand)]
        command: HostCommands,
    },

    /// Restart services through the process supervisor.
    Restart {
        /// Services to restart, in order.
        #[arg(value_name = "SERVICES", required = true)]
        services: Vec<String>,
    },
}

/// Host lifecycle commands.
#[derive(Subcommand)]
pub enum HostCommands {
    /// Add an nginx vhost, then issue and install its TLS certificate.
    Add(AddArgs),

    /// Remove an nginx vhost, then revoke and remove its TLS certificate.
    Del {
        /// Domain name.
        #[arg(short, long)]
        domain: String,
    },

    /// List hosts with an issued certificate.
    Ls {
        /// Also print the container each host proxies to.
        #[arg(short, long)]
        long: bool,
    },

    /// Manage vhost config files.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Arguments of `host add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Domain name.
    #[arg(short, long)]
    pub domain: String,

    /// Container name to forward requests to.
    #[arg(short, long)]
    pub container: String,

    /// Container port.
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_CONTAINER_PORT,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,
}

/// Vhost config commands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Regenerate vhost files from the built-in templates.
    Recreate {
        /// Recreate the config of every host with a certificate.
        #[arg(long, conflicts_with = "domains")]
        all: bool,

        /// Domains whose config should be recreated.
        #[arg(required_unless_present = "all")]
        domains: Vec<String>,
    },
}

/// Parses command-line arguments and returns a `Cli` struct.
pub fn parse_args() -> Cli {
    Cli::parse()
}

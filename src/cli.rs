//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// sigrpc - RPC over a size-limited broadcast bus
#[derive(Parser, Debug)]
#[command(name = "sigrpc")]
#[command(version)]
#[command(about = "Remote procedure calls over a size-limited, one-way broadcast channel")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve `echo` and `sum` on a loopback bus and call them
    Demo {
        /// Characters of text sent through `echo`
        #[arg(short, long, default_value_t = 4096)]
        payload_size: usize,

        /// Call timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Stage payloads on a blackboard instead of chunking them
        #[arg(long, default_value_t = false)]
        blackboard: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_demo_arguments() {
        let cli = Cli::try_parse_from([
            "sigrpc",
            "demo",
            "--payload-size",
            "10",
            "--timeout",
            "5",
            "--blackboard",
        ])
        .unwrap();

        match cli.command {
            Commands::Demo {
                payload_size,
                timeout,
                blackboard,
            } => {
                assert_eq!(payload_size, 10);
                assert_eq!(timeout, Some(5));
                assert!(blackboard);
            }
            Commands::Config => unreachable!("parsed the wrong subcommand"),
        }
    }

    #[test]
    fn should_accept_global_config_flag() {
        let cli = Cli::try_parse_from(["sigrpc", "config", "--config", "rpc.toml"]).unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("rpc.toml")));
        assert!(matches!(cli.command, Commands::Config));
    }
}

//! Command-line interface for Scaffold
//!
//! Uses clap with derive for type-safe CLI parsing

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use scaffold::network::SubnetOrder;
use std::path::PathBuf;

/// Scaffold - CIDR address planning for VPC templates
#[derive(Parser)]
#[command(name = "scaffold")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path (repeat to merge several files)
    #[arg(short, long, global = true)]
    pub config: Vec<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Plan public and private subnets for a VPC
    Plan {
        /// VPC name, used as subnet name prefix
        #[arg(short, long)]
        name: Option<String>,

        /// VPC range in CIDR notation (e.g., 172.16.0.0/16)
        #[arg(long)]
        cidr: Option<String>,

        /// Region used to qualify zone suffixes
        #[arg(short, long)]
        region: Option<String>,

        /// Availability zones (suffixes or full names)
        #[arg(long = "az", value_delimiter = ',')]
        availability_zones: Option<Vec<String>>,

        /// Addresses per public subnet
        #[arg(long)]
        public_size: Option<u32>,

        /// Addresses per private subnet
        #[arg(long)]
        private_size: Option<u32>,

        /// Allocation order
        #[arg(long, value_enum)]
        order: Option<SubnetOrder>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Allocate blocks of the given sizes, in order, from one range
    Alloc {
        /// Range to allocate from (e.g., 10.0.0.0/8)
        cidr: String,

        /// Requested address counts
        #[arg(required = true)]
        sizes: Vec<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show address, netmask and size of CIDR blocks
    Inspect {
        /// Blocks in CIDR notation
        #[arg(required = true)]
        cidrs: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Generate shell completion scripts
    pub fn generate_completion(shell: Shell) {
        let mut cmd = Self::command();
        clap_complete::generate(shell, &mut cmd, "scaffold", &mut std::io::stdout());
    }

    /// Log level for the verbosity flags
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

//! CLI interface for ccmap

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Remap MIDI CC, aftertouch and pitch bend into NRPN, RPN, CC or pitch bend
#[derive(Parser)]
#[command(name = "ccmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the mapping table comes from
#[derive(Args, Debug, Clone, Default)]
pub struct MappingArgs {
    /// Configuration file path (default: ccmap.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Extra mapping, e.g. cc1=nrpn2 or at=pb:-8192:0 (repeatable)
    #[arg(short, long = "map", value_name = "SPEC")]
    pub map: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remap between MIDI ports
    Run {
        #[command(flatten)]
        mapping: MappingArgs,

        /// Input port name substring (default: virtual port)
        #[arg(short, long)]
        input: Option<String>,

        /// Output port name substring (default: virtual port)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Remap a raw MIDI byte stream
    Pipe {
        #[command(flatten)]
        mapping: MappingArgs,

        /// Input file or device (default: stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file or device (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration and print the mapping table
    Check {
        #[command(flatten)]
        mapping: MappingArgs,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available MIDI ports
    Ports,

    /// Generate an example configuration file
    Init,
}

//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Map viewer layer tree toolbox: inspect forests, build WMS parameters, encode/decode permalinks
#[derive(Parser, Debug)]
#[command(name = "maplayers")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (repeat for more verbosity)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Display a layer forest as a tree
    Show {
        /// Layer forest JSON file
        tree: PathBuf,
    },

    /// Print the permalink parameters (l and bl) for a layer forest
    Encode {
        /// Layer forest JSON file
        tree: PathBuf,

        /// Emit entries in reversed (display) order
        #[arg(short, long)]
        reverse: bool,
    },

    /// Decode a layer permalink parameter into layer configs
    Decode {
        /// The l parameter value
        param: String,
    },

    /// Print WMS request parameters for every WMS root
    Params {
        /// Layer forest JSON file
        tree: PathBuf,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

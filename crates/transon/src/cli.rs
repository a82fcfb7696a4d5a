//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "transon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with a [transform] table
    #[arg(long, global = true, env = "TRANSON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Key that marks a JSON map as a rule (overrides the config file)
    #[arg(long, global = true)]
    pub marker: Option<String>,

    /// Maximum include nesting (overrides the config file)
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a template to a JSON document
    Transform {
        /// Template file
        template: PathBuf,

        /// Input document; reads stdin when omitted or "-"
        data: Option<PathBuf>,

        /// Directory of named templates (<name>.json) for include
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Print compact JSON instead of indented
        #[arg(long)]
        compact: bool,

        /// Print null when the template produces no content
        #[arg(long)]
        null_on_empty: bool,
    },

    /// Compile a template and resolve the templates it always includes
    Check {
        /// Template file
        template: PathBuf,

        /// Directory of named templates (<name>.json) for include
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the rule vocabulary
    Rules {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

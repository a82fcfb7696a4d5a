//! Global context for CLI commands

use crate::cli::Cli;
use anyhow::{Context as _, Result};
use log::debug;
use transon_core::TransformOptions;

/// Options shared by every command
pub struct Context {
    pub options: TransformOptions,
    pub verbose: bool,
}

impl Context {
    /// Build the context from global flags
    ///
    /// Options come from `--config` when given, then `--marker` and
    /// `--max-depth` override single fields.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The resulting options are invalid
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut options = match &cli.config {
            Some(path) => {
                debug!("loading options from {}", path.display());
                TransformOptions::from_file(path)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => TransformOptions::default(),
        };

        if let Some(marker) = &cli.marker {
            options.marker = marker.clone();
        }
        if let Some(max_depth) = cli.max_depth {
            options.max_depth = max_depth;
        }
        options.validate()?;

        debug!(
            "options: marker={:?} max_depth={}",
            options.marker, options.max_depth
        );
        Ok(Self {
            options,
            verbose: cli.verbose,
        })
    }
}

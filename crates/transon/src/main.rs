mod cli;
mod commands;
mod context;
mod loader;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::Context;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = Context::new(&cli).and_then(|ctx| match cli.command {
        Commands::Transform {
            template,
            data,
            templates,
            compact,
            null_on_empty,
        } => commands::transform::run(
            &ctx,
            commands::transform::TransformArgs {
                template,
                data,
                templates,
                compact,
                null_on_empty,
            },
        ),
        Commands::Check {
            template,
            templates,
            json,
        } => commands::check::run(&ctx, template, templates, json),
        Commands::Rules { json } => commands::rules::run(json),
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

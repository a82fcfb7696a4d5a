//! Transform command - apply a template to one document

use super::{build_transformer, read_document};
use crate::context::Context;
use crate::output::print_output;
use anyhow::Result;
use log::info;
use std::path::PathBuf;

pub struct TransformArgs {
    pub template: PathBuf,
    pub data: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub compact: bool,
    pub null_on_empty: bool,
}

/// Execute `transon transform` command
pub fn run(ctx: &Context, args: TransformArgs) -> Result<()> {
    let transformer = build_transformer(ctx, &args.template, args.templates)?;
    let data = read_document(args.data.as_deref(), "input")?;

    let output = transformer.transform(&data)?;
    if ctx.verbose {
        info!(
            "transformed with {} named template(s)",
            transformer.registry().cached_names().len()
        );
    }
    if output.is_no_content() {
        info!("template produced no content");
    }

    print_output(&output, args.compact, args.null_on_empty)?;
    Ok(())
}

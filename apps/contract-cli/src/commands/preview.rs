use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use contract_export::standalone_html;
use contract_generator::{render::to_html, render_with_context};

use super::{build_tree, load_context, load_document};

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Contract document JSON
    pub document: PathBuf,

    /// JSON object of merge-field values for conditional blocks
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Emit a complete HTML page with the stylesheet inlined
    #[arg(long)]
    pub standalone: bool,
}

/// Print the preview markup to stdout
pub fn preview(args: PreviewArgs) -> Result<()> {
    let document = load_document(&args.document)?;
    let context = load_context(args.context.as_deref())?;

    let markup = if args.standalone {
        standalone_html(&build_tree(&document, &context))
    } else if document.customization.is_some() {
        to_html(&build_tree(&document, &context))
    } else {
        // Stored documents without customization keep the loading state
        render_with_context(&document.blocks, &document.metadata, None, &context)
    };

    println!("{}", markup);
    Ok(())
}

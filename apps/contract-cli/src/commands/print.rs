use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use contract_export::{print_document, SystemPrinter};

use super::{build_tree, load_context, load_document};

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Contract document JSON
    pub document: PathBuf,

    /// JSON object of merge-field values for conditional blocks
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Seconds the print file is kept for the viewer to load it
    #[arg(long, default_value = "5")]
    pub grace_secs: u64,
}

/// Open the print-ready document in the system viewer
pub fn print(args: PrintArgs) -> Result<()> {
    let document = load_document(&args.document)?;
    let context = load_context(args.context.as_deref())?;

    let printer = SystemPrinter::new().with_grace(Duration::from_secs(args.grace_secs));
    print_document(&build_tree(&document, &context), &printer)?;
    Ok(())
}

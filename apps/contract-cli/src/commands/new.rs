use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;
use contract_generator::{find_template, DocumentStore};

use super::save_document;

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Start from a built-in template (see `contractgen templates`)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Create a fresh document session and emit it as JSON
pub fn new(args: NewArgs) -> Result<()> {
    let mut store = DocumentStore::new();
    if let Some(id) = &args.template {
        let template = find_template(id).ok_or_else(|| anyhow!("Unknown template: {}", id))?;
        store.apply_template(&template);
    }

    let document = store.to_document();
    match &args.output {
        Some(path) => {
            save_document(path, &document)?;
            tracing::info!(
                path = %path.display(),
                blocks = document.blocks.len(),
                "Created document"
            );
        }
        None => println!("{}", document.to_json_pretty()?),
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use contract_generator::DocumentStore;

use super::load_document;

#[derive(Args, Debug)]
pub struct DraftArgs {
    /// Contract document JSON
    pub document: PathBuf,
}

/// Print the contract-record payload for `document` as JSON
pub fn draft(args: DraftArgs) -> Result<()> {
    let store = DocumentStore::from_document(load_document(&args.document)?);
    let draft = store.record_draft();
    tracing::debug!(number = %draft.contract_number, "Built record draft");
    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}

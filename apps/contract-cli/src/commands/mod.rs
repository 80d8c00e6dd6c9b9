pub mod check;
pub mod clauses;
pub mod compose;
pub mod csv;
pub mod draft;
pub mod export;
pub mod new;
pub mod preview;
pub mod print;
pub mod templates;

pub use check::{check, CheckArgs};
pub use clauses::{clauses, ClausesArgs};
pub use compose::{compose, ComposeArgs};
pub use csv::{csv, CsvArgs};
pub use draft::{draft, DraftArgs};
pub use export::{export, ExportArgs};
pub use new::{new, NewArgs};
pub use preview::{preview, PreviewArgs};
pub use print::{print, PrintArgs};
pub use templates::{templates, TemplatesArgs};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use contract_generator::{EvalContext, RenderTree};
use contract_model::{ContractCustomization, ContractDocument};

/// Read a stored `ContractDocument` JSON file
pub fn load_document(path: &Path) -> Result<ContractDocument> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    ContractDocument::from_json(&json)
        .with_context(|| format!("Invalid contract document: {}", path.display()))
}

pub fn save_document(path: &Path, document: &ContractDocument) -> Result<()> {
    let json = document.to_json_pretty()?;
    fs::write(path, json).with_context(|| format!("Failed to write document: {}", path.display()))
}

/// Merge-field values for conditional blocks; a JSON object
pub fn load_context(path: Option<&Path>) -> Result<EvalContext> {
    let Some(path) = path else {
        return Ok(EvalContext::new());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read context: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Context must be a JSON object: {}", path.display()))
}

/// Tree for `document`, with conditional blocks evaluated against `context`
pub fn build_tree(document: &ContractDocument, context: &EvalContext) -> RenderTree {
    let fallback = ContractCustomization::default();
    RenderTree::build(
        &document.blocks,
        &document.metadata,
        document.customization.as_ref().unwrap_or(&fallback),
        context,
    )
}

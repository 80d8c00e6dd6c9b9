use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use contract_generator::{check_compliance, is_exportable};
use contract_model::{ComplianceIssue, IssueSeverity};

use super::load_document;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Contract document JSON
    pub document: PathBuf,

    /// Print the issues as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the completeness checks. Returns false when any issue is an error.
pub fn check(args: CheckArgs) -> Result<bool> {
    let document = load_document(&args.document)?;
    let issues = check_compliance(&document.blocks, &document.metadata);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!("No issues found");
    } else {
        for issue in &issues {
            println!("{}", describe(issue));
        }
    }

    let exportable = is_exportable(&issues);
    tracing::info!(issues = issues.len(), exportable, "Compliance check complete");
    Ok(exportable)
}

fn describe(issue: &ComplianceIssue) -> String {
    let severity = match issue.severity {
        IssueSeverity::Error => "error",
        IssueSeverity::Warning => "warning",
        IssueSeverity::Info => "info",
    };
    match &issue.field {
        Some(field) => format!("[{}] {} ({})", severity, issue.message, field),
        None => format!("[{}] {}", severity, issue.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe() {
        let issue =
            ComplianceIssue::new(IssueSeverity::Error, "Party A is required").on_field("partyA");
        assert_eq!(describe(&issue), "[error] Party A is required (partyA)");

        let issue = ComplianceIssue::new(IssueSeverity::Info, "Consider a jurisdiction");
        assert_eq!(describe(&issue), "[info] Consider a jurisdiction");
    }

    #[test]
    fn test_fresh_document_is_not_exportable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        super::super::save_document(&path, &contract_generator::DocumentStore::new().to_document())
            .unwrap();

        let exportable = check(CheckArgs {
            document: path,
            json: true,
        })
        .unwrap();
        assert!(!exportable);
    }
}

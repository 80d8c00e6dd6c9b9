//! Completeness checks run before a contract is saved or exported

use contract_model::{
    BlockType, ComplianceIssue, ContractBlock, ContractMetadata, IssueSeverity,
};

/// Check a document for missing parties, dates, signatures and jurisdiction.
///
/// Issues come back in a fixed order: party A, party B, effective date,
/// signature, jurisdiction.
pub fn check_compliance(
    blocks: &[ContractBlock],
    metadata: &ContractMetadata,
) -> Vec<ComplianceIssue> {
    let mut issues = Vec::new();

    if metadata.party_a.trim().is_empty() {
        issues.push(
            ComplianceIssue::new(IssueSeverity::Error, "Party A is required").on_field("partyA"),
        );
    }
    if metadata.party_b.trim().is_empty() {
        issues.push(
            ComplianceIssue::new(IssueSeverity::Error, "Party B is required").on_field("partyB"),
        );
    }
    if metadata.effective_date.trim().is_empty() {
        issues.push(
            ComplianceIssue::new(IssueSeverity::Warning, "Effective date should be specified")
                .on_field("effectiveDate"),
        );
    }

    let has_signature = blocks
        .iter()
        .any(|b| b.block_type() == BlockType::Signature);
    if !has_signature {
        issues.push(ComplianceIssue::new(
            IssueSeverity::Warning,
            "Consider adding signature blocks",
        ));
    }

    if metadata.jurisdiction.trim().is_empty() {
        issues.push(
            ComplianceIssue::new(IssueSeverity::Info, "Specify jurisdiction for legal clarity")
                .on_field("jurisdiction"),
        );
    }

    issues
}

/// True when none of the issues is an error
pub fn is_exportable(issues: &[ComplianceIssue]) -> bool {
    !issues.iter().any(|i| i.severity == IssueSeverity::Error)
}

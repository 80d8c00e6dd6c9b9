//! Built-in templates and the clause library

use contract_model::{BlockKind, Clause, ContractBlock, MetadataPatch, Template};
use tracing::debug;
use uuid::Uuid;

fn text(id: &str, label: &str, value: &str) -> ContractBlock {
    ContractBlock::new(
        id,
        BlockKind::Text {
            value: Some(value.to_string()),
        },
    )
    .with_label(label)
}

fn template_metadata(template_id: &str) -> MetadataPatch {
    MetadataPatch {
        template_id: Some(template_id.to_string()),
        jurisdiction: Some("US".to_string()),
        ..MetadataPatch::default()
    }
}

/// Templates shipped with the generator
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "service-agreement".to_string(),
            name: "Service Agreement".to_string(),
            description: "Standard service contract template".to_string(),
            category: "Business".to_string(),
            blocks: vec![
                ContractBlock::new("title", BlockKind::Heading).with_label("Service Agreement"),
                text(
                    "parties",
                    "Parties",
                    "This agreement is between {{PartyA}} and {{PartyB}}",
                ),
                text(
                    "services",
                    "Services",
                    "The following services will be provided:",
                ),
                ContractBlock::new("payment", BlockKind::Number { value: Some(0.0) })
                    .with_label("Payment Amount"),
                ContractBlock::new("signature", BlockKind::Signature).with_label("Signature"),
            ],
            metadata: template_metadata("SA-001"),
            customization: None,
        },
        Template {
            id: "nda".to_string(),
            name: "Non-Disclosure Agreement".to_string(),
            description: "Confidentiality agreement template".to_string(),
            category: "Legal".to_string(),
            blocks: vec![
                ContractBlock::new("title", BlockKind::Heading)
                    .with_label("Non-Disclosure Agreement"),
                text("purpose", "Purpose", "This NDA is for the purpose of..."),
                text(
                    "confidential-info",
                    "Confidential Information",
                    "Confidential information includes...",
                ),
                ContractBlock::new(
                    "term",
                    BlockKind::Date {
                        value: Some(String::new()),
                    },
                )
                .with_label("Term"),
                ContractBlock::new("signature", BlockKind::Signature).with_label("Signature"),
            ],
            metadata: template_metadata("NDA-001"),
            customization: None,
        },
    ]
}

/// Look up a built-in template by id
pub fn find_template(id: &str) -> Option<Template> {
    builtin_templates().into_iter().find(|t| t.id == id)
}

/// Searchable collection of reusable clauses
#[derive(Debug, Clone)]
pub struct ClauseLibrary {
    clauses: Vec<Clause>,
}

impl Default for ClauseLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseLibrary {
    /// Library seeded with the standard clauses
    pub fn new() -> Self {
        let clauses = vec![
            Clause {
                id: "1".to_string(),
                ..Clause::new(
                    "Payment Terms",
                    "Payment shall be due within thirty (30) days of invoice date. Late payments may incur a service charge of 1.5% per month.",
                )
                .with_tags(["payment", "invoice", "terms"])
                .with_category("Financial")
            },
            Clause {
                id: "2".to_string(),
                ..Clause::new(
                    "Confidentiality",
                    "Both parties agree to maintain confidentiality of all proprietary information shared during the course of this agreement.",
                )
                .with_tags(["confidential", "nda", "proprietary"])
                .with_category("Legal")
            },
            Clause {
                id: "3".to_string(),
                ..Clause::new(
                    "Termination Clause",
                    "Either party may terminate this agreement with thirty (30) days written notice to the other party.",
                )
                .with_tags(["termination", "notice", "end"])
                .with_category("Legal")
            },
        ];
        Self { clauses }
    }

    pub fn empty() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Add a clause, assigning `clause-<uuid>` when its id is blank. Returns the id.
    pub fn add_clause(&mut self, mut clause: Clause) -> String {
        if clause.id.trim().is_empty() {
            clause.id = format!("clause-{}", Uuid::new_v4());
        }
        debug!(clause_id = %clause.id, title = %clause.title, "Clause added");
        let id = clause.id.clone();
        self.clauses.push(clause);
        id
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn get(&self, id: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.id == id)
    }

    /// Clauses matching `query` in title, content, tags or category
    pub fn search(&self, query: &str) -> Vec<&Clause> {
        self.clauses.iter().filter(|c| c.matches(query)).collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Clause> {
        self.clauses
            .iter()
            .filter(|c| c.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Distinct categories in insertion order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for clause in &self.clauses {
            if !clause.category.is_empty() && !seen.contains(&clause.category.as_str()) {
                seen.push(&clause.category);
            }
        }
        seen
    }
}

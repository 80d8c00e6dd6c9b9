//! Reusable content: templates and clauses

use serde::{Deserialize, Serialize};

use crate::block::ContractBlock;
use crate::document::{CustomizationPatch, MetadataPatch};

/// A named, immutable bundle used to replace a document's blocks wholesale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub blocks: Vec<ContractBlock>,
    #[serde(default)]
    pub metadata: MetadataPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<CustomizationPatch>,
}

/// A titled text snippet, inserted as a heading + text pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: String,
}

impl Clause {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            content: content.into(),
            tags: Vec::new(),
            category: String::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Case-insensitive match against title, content, tags or category
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_matches_any_field() {
        let clause = Clause::new("Payment Terms", "Due within thirty days")
            .with_tags(["invoice"])
            .with_category("Financial");

        assert!(clause.matches("payment"));
        assert!(clause.matches("THIRTY"));
        assert!(clause.matches("invoice"));
        assert!(clause.matches("financial"));
        assert!(clause.matches("  "));
        assert!(!clause.matches("termination"));
    }

    #[test]
    fn test_template_metadata_is_partial() {
        let json = r#"{
            "id": "nda",
            "name": "Non-Disclosure Agreement",
            "blocks": [{"id": "title", "type": "heading", "label": "NDA"}],
            "metadata": {"templateId": "NDA-001"}
        }"#;
        let template: Template = serde_json::from_str(json).unwrap();

        assert_eq!(template.blocks.len(), 1);
        assert_eq!(template.metadata.template_id.as_deref(), Some("NDA-001"));
        assert!(template.metadata.party_a.is_none());
        assert!(template.customization.is_none());
    }
}

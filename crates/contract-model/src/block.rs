//! Document blocks: the unit a generated contract is composed from.

use serde::{Deserialize, Serialize};

use crate::lenient;

/// Block discriminant, used when creating blocks from a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Heading,
    Text,
    Date,
    Number,
    List,
    Table,
    Signature,
    Conditional,
    Divider,
}

impl BlockType {
    pub const ALL: [BlockType; 9] = [
        BlockType::Heading,
        BlockType::Text,
        BlockType::Date,
        BlockType::Number,
        BlockType::List,
        BlockType::Table,
        BlockType::Signature,
        BlockType::Conditional,
        BlockType::Divider,
    ];

    /// Label given to a freshly added block of this type
    pub fn default_label(&self) -> &'static str {
        match self {
            BlockType::Heading => "New Heading",
            BlockType::Text => "Text Block",
            BlockType::Date => "Date",
            BlockType::Number => "Number",
            BlockType::List => "List",
            BlockType::Table => "Table",
            BlockType::Signature => "Signature",
            BlockType::Conditional => "Conditional Text",
            BlockType::Divider => "Divider",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Heading => "heading",
            BlockType::Text => "text",
            BlockType::Date => "date",
            BlockType::Number => "number",
            BlockType::List => "list",
            BlockType::Table => "table",
            BlockType::Signature => "signature",
            BlockType::Conditional => "conditional",
            BlockType::Divider => "divider",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        BlockType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("Unknown block type: {}", s))
    }
}

/// Per-block presentation overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<f64>,
}

/// Comparison applied by a conditional block.
///
/// Unrecognised operators are kept verbatim so a stored document survives a
/// round trip; they evaluate as "visible".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    Other(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::Other(raw) => raw,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "equals" => ConditionOperator::Equals,
            "not_equals" => ConditionOperator::NotEquals,
            "contains" => ConditionOperator::Contains,
            "greater_than" => ConditionOperator::GreaterThan,
            _ => ConditionOperator::Other(raw),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        match op {
            ConditionOperator::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility rule of a conditional block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub field: String,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub value: String,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// An unconfigured condition has no field to look at
    pub fn is_configured(&self) -> bool {
        !self.field.is_empty()
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Type-specific payload of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Heading,
    Text {
        #[serde(
            default,
            deserialize_with = "lenient::text",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<String>,
    },
    Date {
        /// ISO date (or date-time) string
        #[serde(
            default,
            deserialize_with = "lenient::text",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<String>,
    },
    Number {
        #[serde(
            default,
            deserialize_with = "lenient::number",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<f64>,
    },
    List {
        #[serde(default, deserialize_with = "lenient::text_list")]
        items: Vec<String>,
    },
    /// Rows are expected to be as wide as `headers`; nothing enforces it.
    Table {
        #[serde(default, deserialize_with = "lenient::text_list")]
        headers: Vec<String>,
        #[serde(default, deserialize_with = "lenient::text_grid")]
        rows: Vec<Vec<String>>,
    },
    Signature,
    Conditional {
        #[serde(default)]
        conditional: Condition,
        #[serde(
            default,
            deserialize_with = "lenient::text",
            skip_serializing_if = "Option::is_none"
        )]
        value: Option<String>,
    },
    Divider,
}

impl BlockKind {
    /// Payload a new block of `block_type` starts with
    pub fn default_for(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Heading => BlockKind::Heading,
            BlockType::Text => BlockKind::Text { value: None },
            BlockType::Date => BlockKind::Date { value: None },
            BlockType::Number => BlockKind::Number { value: None },
            BlockType::List => BlockKind::List {
                items: vec!["Item 1".to_string()],
            },
            BlockType::Table => BlockKind::Table {
                headers: vec!["Column 1".to_string(), "Column 2".to_string()],
                rows: vec![vec!["Cell 1".to_string(), "Cell 2".to_string()]],
            },
            BlockType::Signature => BlockKind::Signature,
            BlockType::Conditional => BlockKind::Conditional {
                conditional: Condition::default(),
                value: None,
            },
            BlockType::Divider => BlockKind::Divider,
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Heading => BlockType::Heading,
            BlockKind::Text { .. } => BlockType::Text,
            BlockKind::Date { .. } => BlockType::Date,
            BlockKind::Number { .. } => BlockType::Number,
            BlockKind::List { .. } => BlockType::List,
            BlockKind::Table { .. } => BlockType::Table,
            BlockKind::Signature => BlockType::Signature,
            BlockKind::Conditional { .. } => BlockType::Conditional,
            BlockKind::Divider => BlockType::Divider,
        }
    }
}

/// One content unit of a generated document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractBlock {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl ContractBlock {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            label: None,
            required: false,
            style: None,
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_style(mut self, style: BlockStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    /// Label if it carries any text
    pub fn label_text(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }

    /// Shallow-merge `patch` into this block.
    ///
    /// Payload fields that do not belong to this block's type are ignored.
    pub fn apply_patch(&mut self, patch: BlockPatch) {
        if let Some(label) = patch.label {
            self.label = Some(label);
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(style) = patch.style {
            self.style = Some(style);
        }

        match &mut self.kind {
            BlockKind::Text { value } | BlockKind::Date { value } => {
                if let Some(v) = patch.value {
                    *value = Some(v.into_text());
                }
            }
            BlockKind::Number { value } => {
                if let Some(v) = patch.value {
                    *value = v.into_number();
                }
            }
            BlockKind::List { items } => {
                if let Some(new_items) = patch.items {
                    *items = new_items;
                }
            }
            BlockKind::Table { headers, rows } => {
                if let Some(new_headers) = patch.headers {
                    *headers = new_headers;
                }
                if let Some(new_rows) = patch.rows {
                    *rows = new_rows;
                }
            }
            BlockKind::Conditional { conditional, value } => {
                if let Some(c) = patch.conditional {
                    *conditional = c;
                }
                if let Some(v) = patch.value {
                    *value = Some(v.into_text());
                }
            }
            BlockKind::Heading | BlockKind::Signature | BlockKind::Divider => {}
        }
    }
}

/// Scalar payload carried by a patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockValue {
    Number(f64),
    Text(String),
}

impl BlockValue {
    pub fn into_text(self) -> String {
        match self {
            BlockValue::Number(n) => n.to_string(),
            BlockValue::Text(s) => s,
        }
    }

    pub fn into_number(self) -> Option<f64> {
        match self {
            BlockValue::Number(n) => Some(n),
            BlockValue::Text(s) => lenient::parse_number(&s),
        }
    }
}

impl From<&str> for BlockValue {
    fn from(s: &str) -> Self {
        BlockValue::Text(s.to_string())
    }
}

impl From<String> for BlockValue {
    fn from(s: String) -> Self {
        BlockValue::Text(s)
    }
}

impl From<f64> for BlockValue {
    fn from(n: f64) -> Self {
        BlockValue::Number(n)
    }
}

/// Partial update for [`ContractBlock::apply_patch`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BlockValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Condition>,
}

impl BlockPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn value(value: impl Into<BlockValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserializes_text_block() {
        let json = r#"{"id":"parties","type":"text","label":"Parties","value":"A and B"}"#;
        let block: ContractBlock = serde_json::from_str(json).unwrap();

        assert_eq!(block.id, "parties");
        assert_eq!(block.label_text(), Some("Parties"));
        assert_eq!(
            block.kind,
            BlockKind::Text {
                value: Some("A and B".to_string())
            }
        );
    }

    #[test]
    fn test_number_value_accepts_string_and_number() {
        let from_num: ContractBlock =
            serde_json::from_str(r#"{"id":"n","type":"number","value":0}"#).unwrap();
        let from_str: ContractBlock =
            serde_json::from_str(r#"{"id":"n","type":"number","value":"12.5"}"#).unwrap();
        let blank: ContractBlock =
            serde_json::from_str(r#"{"id":"n","type":"number","value":""}"#).unwrap();

        assert_eq!(from_num.kind, BlockKind::Number { value: Some(0.0) });
        assert_eq!(from_str.kind, BlockKind::Number { value: Some(12.5) });
        assert_eq!(blank.kind, BlockKind::Number { value: None });
    }

    #[test]
    fn test_unit_variant_ignores_stray_fields() {
        let json = r#"{"id":"t","type":"heading","label":"Title","value":"ignored"}"#;
        let block: ContractBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind, BlockKind::Heading);
    }

    #[test]
    fn test_table_cells_accept_numbers() {
        let json = r#"{"id":"t","type":"table","headers":["A","B"],"rows":[[1,"x"],["3"]]}"#;
        let block: ContractBlock = serde_json::from_str(json).unwrap();
        assert_eq!(
            block.kind,
            BlockKind::Table {
                headers: vec!["A".to_string(), "B".to_string()],
                rows: vec![
                    vec!["1".to_string(), "x".to_string()],
                    vec!["3".to_string()]
                ],
            }
        );
    }

    #[test]
    fn test_missing_payload_defaults() {
        let block: ContractBlock = serde_json::from_str(r#"{"id":"l","type":"list"}"#).unwrap();
        assert_eq!(block.kind, BlockKind::List { items: vec![] });
    }

    #[test]
    fn test_unknown_operator_round_trips() {
        let json = r#"{"field":"status","operator":"matches","value":"x"}"#;
        let condition: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(
            condition.operator,
            ConditionOperator::Other("matches".to_string())
        );

        let back = serde_json::to_value(&condition).unwrap();
        assert_eq!(back["operator"], "matches");
    }

    #[test]
    fn test_block_round_trip_keeps_shape() {
        let block = ContractBlock::new(
            "c1",
            BlockKind::Conditional {
                conditional: Condition::new("status", ConditionOperator::NotEquals, "Draft"),
                value: Some("Shown when final".to_string()),
            },
        )
        .with_label("Finality")
        .required(true);

        let json = serde_json::to_string(&block).unwrap();
        let parsed: ContractBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, block);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "conditional");
        assert_eq!(value["conditional"]["operator"], "not_equals");
    }

    #[test]
    fn test_patch_ignores_foreign_payload() {
        let mut block = ContractBlock::new("h", BlockKind::Heading).with_label("Old");
        block.apply_patch(BlockPatch {
            label: Some("New".to_string()),
            items: Some(vec!["x".to_string()]),
            ..BlockPatch::default()
        });

        assert_eq!(block.label.as_deref(), Some("New"));
        assert_eq!(block.kind, BlockKind::Heading);
    }

    #[test]
    fn test_patch_coerces_number_value() {
        let mut block = ContractBlock::new("n", BlockKind::Number { value: None });
        block.apply_patch(BlockPatch::value("42"));
        assert_eq!(block.kind, BlockKind::Number { value: Some(42.0) });

        let mut text = ContractBlock::new("t", BlockKind::Text { value: None });
        text.apply_patch(BlockPatch::value(7.5));
        assert_eq!(
            text.kind,
            BlockKind::Text {
                value: Some("7.5".to_string())
            }
        );
    }

    #[test]
    fn test_block_type_parsing() {
        assert_eq!("Table".parse::<BlockType>().unwrap(), BlockType::Table);
        assert!("paragraph".parse::<BlockType>().is_err());
    }

    #[test]
    fn test_default_table_is_two_by_one() {
        let BlockKind::Table { headers, rows } = BlockKind::default_for(BlockType::Table) else {
            panic!("expected table payload");
        };
        assert_eq!(headers.len(), 2);
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|r| r.len() == headers.len()));
    }
}

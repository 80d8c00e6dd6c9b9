//! Document state store.
//!
//! Owns the block sequence, metadata and customization of one generator
//! session. Every mutation is synchronous and notifies subscribers before
//! returning; mutations that change nothing notify nobody.

use contract_model::{
    BlockKind, BlockPatch, BlockStyle, BlockType, Clause, ComplianceIssue, ContractBlock,
    ContractCustomization, ContractDocument, ContractMetadata, CustomizationPatch,
    MetadataPatch, Template,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::compliance::check_compliance;

/// What part of the document a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    BlocksChanged,
    MetadataChanged,
    CustomizationChanged,
}

/// Handle returned by [`DocumentStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Read-only view handed to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentState {
    pub blocks: Vec<ContractBlock>,
    pub metadata: ContractMetadata,
    pub customization: ContractCustomization,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self {
            blocks: vec![
                ContractBlock::new("default-heading", BlockKind::Heading)
                    .with_label("Service Agreement"),
            ],
            metadata: ContractMetadata::default(),
            customization: ContractCustomization::default(),
        }
    }
}

type Observer = Box<dyn FnMut(StoreEvent, &DocumentState)>;

/// Payload handed to the external contract-record service when saving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecordDraft {
    pub contract_number: String,
    pub contract_title: String,
    pub contract_value: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    pub description: String,
    pub risk_level: String,
}

/// Single-writer owner of a generator session
pub struct DocumentStore {
    state: DocumentState,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl DocumentStore {
    /// Fresh session: one "Service Agreement" heading and default records
    pub fn new() -> Self {
        Self::with_state(DocumentState::default())
    }

    pub fn with_state(state: DocumentState) -> Self {
        Self {
            state,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Resume a stored document; missing customization falls back to defaults
    pub fn from_document(document: ContractDocument) -> Self {
        Self::with_state(DocumentState {
            blocks: document.blocks,
            metadata: document.metadata,
            customization: document.customization.unwrap_or_default(),
        })
    }

    pub fn to_document(&self) -> ContractDocument {
        ContractDocument {
            blocks: self.state.blocks.clone(),
            metadata: self.state.metadata.clone(),
            customization: Some(self.state.customization.clone()),
        }
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn blocks(&self) -> &[ContractBlock] {
        &self.state.blocks
    }

    pub fn block(&self, id: &str) -> Option<&ContractBlock> {
        self.state.blocks.iter().find(|b| b.id == id)
    }

    pub fn metadata(&self) -> &ContractMetadata {
        &self.state.metadata
    }

    pub fn customization(&self) -> &ContractCustomization {
        &self.state.customization
    }

    /// Register an observer, called synchronously after every change
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(StoreEvent, &DocumentState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        let state = &self.state;
        for (_, observer) in self.observers.iter_mut() {
            observer(event, state);
        }
    }

    /// Replace the whole block sequence
    pub fn set_blocks(&mut self, blocks: Vec<ContractBlock>) {
        self.state.blocks = blocks;
        debug!(count = self.state.blocks.len(), "Blocks replaced");
        self.notify(StoreEvent::BlocksChanged);
    }

    /// Append a block of `block_type` with its default label, style and payload
    pub fn add_block(&mut self, block_type: BlockType) -> String {
        let id = format!("block-{}", Uuid::new_v4());
        let block = ContractBlock::new(id.clone(), BlockKind::default_for(block_type))
            .with_label(block_type.default_label())
            .with_style(self.default_style(block_type))
            .required(false);

        self.state.blocks.push(block);
        debug!(block_id = %id, block_type = %block_type, "Block added");
        self.notify(StoreEvent::BlocksChanged);
        id
    }

    /// Style a new block starts with. Headings leave size and color to the
    /// heading defaults so they keep the heading scale and primary color.
    fn default_style(&self, block_type: BlockType) -> BlockStyle {
        let custom = &self.state.customization;
        let heading = block_type == BlockType::Heading;
        BlockStyle {
            font_size: (!heading).then_some(custom.typography.font_size),
            font_weight: Some(if heading { "bold" } else { "normal" }.to_string()),
            color: (!heading).then(|| custom.theme.text_color.clone()),
            alignment: Some("left".to_string()),
            spacing: Some(custom.layout.spacing),
        }
    }

    /// Delete a block; absent ids are a silent no-op
    pub fn remove_block(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.state.blocks.remove(pos);
        debug!(block_id = id, "Block removed");
        self.notify(StoreEvent::BlocksChanged);
        true
    }

    /// Merge `patch` into the block with `id`
    pub fn update_block(&mut self, id: &str, patch: BlockPatch) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.state.blocks[pos].apply_patch(patch);
        debug!(block_id = id, "Block updated");
        self.notify(StoreEvent::BlocksChanged);
        true
    }

    /// Move the block at `from` so it ends up at `to`.
    ///
    /// `from == to` and an out-of-range `from` change nothing; a `to` past
    /// the end moves the block to the end.
    pub fn reorder_blocks(&mut self, from: usize, to: usize) -> bool {
        let len = self.state.blocks.len();
        if from == to || from >= len {
            return false;
        }
        let target = to.min(len - 1);
        if target == from {
            return false;
        }
        let block = self.state.blocks.remove(from);
        self.state.blocks.insert(target, block);
        debug!(from, to = target, "Block moved");
        self.notify(StoreEvent::BlocksChanged);
        true
    }

    /// Append a copy of a block under a fresh id
    pub fn duplicate_block(&mut self, id: &str) -> Option<String> {
        let source = self.block(id)?;
        let new_id = format!("block-{}", Uuid::new_v4());
        let copy = ContractBlock {
            id: new_id.clone(),
            ..source.clone()
        };
        self.state.blocks.push(copy);
        debug!(block_id = id, copy_id = %new_id, "Block duplicated");
        self.notify(StoreEvent::BlocksChanged);
        Some(new_id)
    }

    pub fn add_list_item(&mut self, id: &str, item: impl Into<String>) -> bool {
        let item = item.into();
        self.edit_block(id, |kind| match kind {
            BlockKind::List { items } => {
                items.push(item);
                true
            }
            _ => false,
        })
    }

    pub fn set_list_item(&mut self, id: &str, index: usize, item: impl Into<String>) -> bool {
        let item = item.into();
        self.edit_block(id, |kind| match kind {
            BlockKind::List { items } if index < items.len() => {
                items[index] = item;
                true
            }
            _ => false,
        })
    }

    pub fn remove_list_item(&mut self, id: &str, index: usize) -> bool {
        self.edit_block(id, |kind| match kind {
            BlockKind::List { items } if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        })
    }

    /// Append a column; every row gains an empty cell, and short rows are
    /// padded out to the new header width. Cells are never dropped.
    pub fn add_table_column(&mut self, id: &str, header: impl Into<String>) -> bool {
        let header = header.into();
        self.edit_block(id, |kind| match kind {
            BlockKind::Table { headers, rows } => {
                headers.push(header);
                let width = headers.len();
                for row in rows.iter_mut() {
                    if row.len() < width {
                        row.resize(width, String::new());
                    } else {
                        row.push(String::new());
                    }
                }
                true
            }
            _ => false,
        })
    }

    /// Drop a column and the matching cell of every row
    pub fn remove_table_column(&mut self, id: &str, index: usize) -> bool {
        self.edit_block(id, |kind| match kind {
            BlockKind::Table { headers, rows } if index < headers.len() => {
                headers.remove(index);
                for row in rows.iter_mut() {
                    if index < row.len() {
                        row.remove(index);
                    }
                }
                true
            }
            _ => false,
        })
    }

    /// Append an empty row as wide as the header
    pub fn add_table_row(&mut self, id: &str) -> bool {
        self.edit_block(id, |kind| match kind {
            BlockKind::Table { headers, rows } => {
                rows.push(vec![String::new(); headers.len()]);
                true
            }
            _ => false,
        })
    }

    pub fn remove_table_row(&mut self, id: &str, index: usize) -> bool {
        self.edit_block(id, |kind| match kind {
            BlockKind::Table { rows, .. } if index < rows.len() => {
                rows.remove(index);
                true
            }
            _ => false,
        })
    }

    pub fn set_table_cell(
        &mut self,
        id: &str,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> bool {
        let value = value.into();
        self.edit_block(id, |kind| match kind {
            BlockKind::Table { rows, .. } => {
                match rows.get_mut(row).and_then(|r| r.get_mut(column)) {
                    Some(cell) => {
                        *cell = value;
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        })
    }

    /// Run `edit` on a block's payload; notify only if it reports a change
    fn edit_block<F>(&mut self, id: &str, edit: F) -> bool
    where
        F: FnOnce(&mut BlockKind) -> bool,
    {
        let Some(pos) = self.position(id) else {
            return false;
        };
        if !edit(&mut self.state.blocks[pos].kind) {
            return false;
        }
        debug!(block_id = id, "Block payload edited");
        self.notify(StoreEvent::BlocksChanged);
        true
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.state.blocks.iter().position(|b| b.id == id)
    }

    pub fn update_metadata(&mut self, patch: MetadataPatch) {
        self.state.metadata.merge(patch);
        debug!("Metadata updated");
        self.notify(StoreEvent::MetadataChanged);
    }

    /// Merge per-section partials one level deep
    pub fn update_customization(&mut self, patch: CustomizationPatch) {
        self.state.customization.merge(patch);
        debug!("Customization updated");
        self.notify(StoreEvent::CustomizationChanged);
    }

    /// Replace the blocks with the template's and merge its partials
    pub fn apply_template(&mut self, template: &Template) {
        debug!(template_id = %template.id, "Applying template");
        self.set_blocks(template.blocks.clone());
        self.update_metadata(template.metadata.clone());
        if let Some(customization) = &template.customization {
            self.update_customization(customization.clone());
        }
    }

    /// Append the clause as a heading followed by its text.
    /// Returns the ids of the two new blocks.
    pub fn insert_clause(&mut self, clause: &Clause) -> (String, String) {
        let suffix = Uuid::new_v4();
        let heading_id = format!("clause-heading-{}", suffix);
        let text_id = format!("clause-text-{}", suffix);

        self.state.blocks.push(
            ContractBlock::new(heading_id.clone(), BlockKind::Heading).with_label(&clause.title),
        );
        self.state.blocks.push(ContractBlock::new(
            text_id.clone(),
            BlockKind::Text {
                value: Some(clause.content.clone()),
            },
        ));
        debug!(title = %clause.title, "Clause inserted");
        self.notify(StoreEvent::BlocksChanged);
        (heading_id, text_id)
    }

    pub fn check_compliance(&self) -> Vec<ComplianceIssue> {
        check_compliance(&self.state.blocks, &self.state.metadata)
    }

    /// Record payload for the contract-record service
    pub fn record_draft(&self) -> ContractRecordDraft {
        let meta = &self.state.metadata;
        let or = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };
        ContractRecordDraft {
            contract_number: if meta.template_id.is_empty() {
                format!("CNT-{}", chrono::Utc::now().timestamp_millis())
            } else {
                meta.template_id.clone()
            },
            contract_title: format!(
                "{} - {} Contract",
                or(meta.party_a.as_str(), "Party A"),
                or(meta.party_b.as_str(), "Party B")
            ),
            contract_value: meta.contract_value,
            currency: meta.currency.clone(),
            start_date: Some(meta.effective_date.clone()).filter(|d| !d.is_empty()),
            description: "Generated via Contract Generator".to_string(),
            risk_level: meta
                .risk_level
                .clone()
                .unwrap_or_else(|| "Low".to_string()),
        }
    }
}

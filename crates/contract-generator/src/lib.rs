//! Contract generator core
//!
//! This crate holds everything between the data model and the exporters:
//! - `store`: the single-writer document session with change notifications
//! - `condition`: visibility rules of conditional blocks
//! - `render`: the format-neutral render tree, its HTML serialization and
//!   the standalone stylesheet
//! - `library`: built-in templates and the clause library
//! - `compliance`: completeness checks
//! - `format`: dates, money and numbers for display

pub mod compliance;
pub mod condition;
pub mod format;
pub mod library;
pub mod render;
pub mod store;

pub use compliance::{check_compliance, is_exportable};
pub use condition::{evaluate, EvalContext};
pub use library::{builtin_templates, find_template, ClauseLibrary};
pub use render::{render, render_with_context, RenderTree};
pub use store::{
    ContractRecordDraft, DocumentState, DocumentStore, StoreEvent, SubscriptionId,
};

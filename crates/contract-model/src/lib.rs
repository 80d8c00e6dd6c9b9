//! Contract document model
//!
//! Types shared by the generator, the renderer and the exporters:
//! - Blocks (`ContractBlock`) as a closed sum over the supported block types
//! - Document metadata and customization, plus their partial updates
//! - Templates, clauses and compliance issues

pub mod block;
pub mod compliance;
pub mod document;
pub mod error;
pub mod library;

mod lenient;

pub use block::{
    BlockKind, BlockPatch, BlockStyle, BlockType, BlockValue, Condition, ConditionOperator,
    ContractBlock,
};
pub use compliance::{ComplianceIssue, IssueSeverity};
pub use document::{
    Branding, BrandingPatch, ContractCustomization, ContractDocument, ContractMetadata,
    CustomizationPatch, Features, FeaturesPatch, Layout, LayoutPatch, MetadataPatch, Theme,
    ThemePatch, Typography, TypographyPatch,
};
pub use error::ModelError;
pub use lenient::parse_number;
pub use library::{Clause, Template};

//! Markup rendering.
//!
//! `render` is the preview entry point: blocks, metadata and customization
//! in, HTML fragment out. Exporters build a [`RenderTree`] directly and
//! serialize it to their own format.

pub mod html;
pub mod stylesheet;
pub mod tree;

use contract_model::{ContractBlock, ContractCustomization, ContractMetadata};

use crate::condition::EvalContext;

pub use html::{loading_markup, to_html};
pub use stylesheet::{stylesheet, StyleTarget};
pub use tree::{
    Alignment, BlockNode, BrandingHeader, Caption, ConditionalOutcome, Content, FontWeight,
    Header, LabeledValue, PageSetup, PageSize, Palette, RenderTree, RenderedBlock,
    StyleOverrides, TypeScale,
};

/// Render the preview markup.
///
/// Conditional blocks are evaluated against an empty context. Without
/// customization the loading placeholder is returned.
pub fn render(
    blocks: &[ContractBlock],
    metadata: &ContractMetadata,
    customization: Option<&ContractCustomization>,
) -> String {
    render_with_context(blocks, metadata, customization, &EvalContext::new())
}

/// [`render`] with merge-field data for conditional blocks
pub fn render_with_context(
    blocks: &[ContractBlock],
    metadata: &ContractMetadata,
    customization: Option<&ContractCustomization>,
    context: &EvalContext,
) -> String {
    match customization {
        Some(custom) => to_html(&RenderTree::build(blocks, metadata, custom, context)),
        None => loading_markup(),
    }
}

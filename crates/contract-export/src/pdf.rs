//! PDF and PNG export through Typst
//!
//! Each call compiles in its own in-memory world; nothing is shared between
//! concurrent exports except the read-only font cache.

use contract_generator::RenderTree;
use contract_typst::{
    compile_document, compile_document_sync, rasterize_pages_sync, OutputFormat, DEFAULT_PPI,
};

use crate::error::Result;
use crate::snapshot::{compose_pdf_from_pngs, ComposeOptions, FitMode};
use crate::typst_source::to_typst;

/// Default bound on one Typst compilation
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Raster density for PNG output
    pub ppi: u32,
    /// Compilation bound for the async entry points
    pub timeout_ms: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ppi: DEFAULT_PPI,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Vector PDF honouring the page size, orientation and margins of the tree
pub fn export_pdf(tree: &RenderTree, options: &RenderOptions) -> Result<Vec<u8>> {
    let request = to_typst(tree).into_request(OutputFormat::Pdf, Some(options.ppi));
    let rendered = compile_document_sync(&request)?;
    tracing::debug!(pages = rendered.page_count, "Compiled contract PDF");
    Ok(rendered.bytes)
}

/// [`export_pdf`] on the blocking pool, bounded by `options.timeout_ms`
pub async fn export_pdf_async(tree: &RenderTree, options: &RenderOptions) -> Result<Vec<u8>> {
    let request = to_typst(tree).into_request(OutputFormat::Pdf, Some(options.ppi));
    let rendered = compile_document(request, options.timeout_ms).await?;
    tracing::debug!(pages = rendered.page_count, "Compiled contract PDF");
    Ok(rendered.bytes)
}

/// First page as PNG
pub fn export_png(tree: &RenderTree, options: &RenderOptions) -> Result<Vec<u8>> {
    let request = to_typst(tree).into_request(OutputFormat::Png, Some(options.ppi));
    Ok(compile_document_sync(&request)?.bytes)
}

/// [`export_png`] on the blocking pool, bounded by `options.timeout_ms`
pub async fn export_png_async(tree: &RenderTree, options: &RenderOptions) -> Result<Vec<u8>> {
    let request = to_typst(tree).into_request(OutputFormat::Png, Some(options.ppi));
    Ok(compile_document(request, options.timeout_ms).await?.bytes)
}

/// PDF whose pages are images of the typeset pages, for viewers that must
/// not reflow or select text
pub fn export_raster_pdf(tree: &RenderTree, options: &RenderOptions) -> Result<Vec<u8>> {
    let request = to_typst(tree).into_request(OutputFormat::Png, Some(options.ppi));
    let pages = rasterize_pages_sync(&request)?;
    compose_pdf_from_pngs(
        &pages,
        &ComposeOptions {
            page_size: tree.page.size,
            landscape: tree.page.landscape,
            mode: FitMode::FitWidth,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_generator::EvalContext;
    use contract_model::{BlockKind, ContractBlock, ContractCustomization, ContractMetadata};
    use lopdf::Document;

    fn tree(custom: &ContractCustomization) -> RenderTree {
        let blocks = vec![
            ContractBlock::new("h", BlockKind::Heading).with_label("Agreement"),
            ContractBlock::new(
                "t",
                BlockKind::Text {
                    value: Some("First line\nSecond \"quoted\" line".into()),
                },
            ),
        ];
        RenderTree::build(&blocks, &ContractMetadata::default(), custom, &EvalContext::new())
    }

    fn media_box(pdf: &[u8]) -> (f32, f32) {
        let doc = Document::load_mem(pdf).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let value = |o: &lopdf::Object| o.as_float().unwrap();
        (value(&media_box[2]), value(&media_box[3]))
    }

    #[test]
    fn test_pdf_export_reloads() {
        let pdf = export_pdf(&tree(&ContractCustomization::default()), &RenderOptions::default())
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let (w, h) = media_box(&pdf);
        assert!((w - 595.28).abs() < 1.0);
        assert!((h - 841.89).abs() < 1.0);
    }

    #[test]
    fn test_landscape_letter() {
        let mut custom = ContractCustomization::default();
        custom.layout.page_size = "Letter".into();
        custom.layout.orientation = "landscape".into();

        let pdf = export_pdf(&tree(&custom), &RenderOptions::default()).unwrap();
        let (w, h) = media_box(&pdf);
        assert!((w - 792.0).abs() < 1.0);
        assert!((h - 612.0).abs() < 1.0);
    }

    #[test]
    fn test_png_export() {
        let options = RenderOptions {
            ppi: 36,
            ..RenderOptions::default()
        };
        let png = export_png(&tree(&ContractCustomization::default()), &options).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_raster_pdf_one_page_per_typeset_page() {
        let options = RenderOptions {
            ppi: 18,
            ..RenderOptions::default()
        };
        let pdf = export_raster_pdf(&tree(&ContractCustomization::default()), &options).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn test_async_export() {
        let custom = ContractCustomization::default();
        let pdf = export_pdf_async(&tree(&custom), &RenderOptions::default())
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_corrupt_logo_does_not_fail_export() {
        let mut custom = ContractCustomization::default();
        custom.branding.company_name = "Acme".into();
        custom.branding.logo = "data:image/png;base64,!!!!".into();
        let pdf = export_pdf(&tree(&custom), &RenderOptions::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        // decodable base64 that is not a PNG
        custom.branding.logo = "data:image/png;base64,AAAABBBB".into();
        let pdf = export_pdf(&tree(&custom), &RenderOptions::default()).unwrap();
        assert_eq!(Document::load_mem(&pdf).unwrap().get_pages().len(), 1);
    }
}

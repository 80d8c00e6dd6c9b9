//! Core rendering logic
//!
//! Every call builds its own `VirtualWorld`, so concurrent compilations
//! share nothing but the read-only font cache.

use std::collections::HashMap;

use base64::Engine;
use typst::foundations::Bytes;
use typst::model::Document;
use typst::syntax::Source;

use super::errors::{categorize_diagnostics, CompileError, EngineError};
use super::output::OutputFormat;
use super::{RenderRequest, RenderedDocument};
use crate::world::VirtualWorld;

/// Raster density used when a request does not set one
pub const DEFAULT_PPI: u32 = 144;

/// Compile and export on the current thread
pub fn compile_document_sync(request: &RenderRequest) -> Result<RenderedDocument, EngineError> {
    let world = build_world(request)?;
    compile_world(&world, request.format, request.ppi)
}

/// Compile and export on the blocking pool, bounded by `timeout_ms`
#[cfg(feature = "server")]
pub async fn compile_document(
    request: RenderRequest,
    timeout_ms: u64,
) -> Result<RenderedDocument, EngineError> {
    use std::time::Duration;

    let world = build_world(&request)?;
    let format = request.format;
    let ppi = request.ppi;

    let result = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(move || compile_world(&world, format, ppi)),
    )
    .await;

    match result {
        Ok(Ok(rendered)) => rendered,
        Ok(Err(join_error)) => Err(EngineError::TaskFailed(join_error.to_string())),
        Err(_elapsed) => Err(EngineError::Timeout(timeout_ms)),
    }
}

/// Compile once and rasterize every page to PNG
pub fn rasterize_pages_sync(request: &RenderRequest) -> Result<Vec<Vec<u8>>, EngineError> {
    let world = build_world(request)?;
    let (document, _warnings) = compile(&world)?;
    let pixel_per_pt = pixel_per_pt(request.ppi);

    document
        .pages
        .iter()
        .map(|page| encode_png(page, pixel_per_pt))
        .collect()
}

/// Parse-only check of Typst markup
pub fn validate_syntax(source: &str) -> Vec<CompileError> {
    let source = Source::detached(source);

    source
        .root()
        .errors()
        .into_iter()
        .map(|error| {
            let mut compile_error = CompileError::new(error.message.to_string());
            if let Some(range) = source.range(error.span) {
                if let (Some(line), Some(column)) = (
                    source.byte_to_line(range.start),
                    source.byte_to_column(range.start),
                ) {
                    compile_error = compile_error.with_location(line + 1, column + 1);
                }
            }
            if !error.hints.is_empty() {
                let hint = error
                    .hints
                    .iter()
                    .map(|h| h.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                compile_error = compile_error.with_hint(hint);
            }
            compile_error
        })
        .collect()
}

fn build_world(request: &RenderRequest) -> Result<VirtualWorld, EngineError> {
    let assets = decode_assets(&request.assets)?;
    VirtualWorld::new(request.source.clone(), assets)
}

fn decode_assets(assets: &HashMap<String, String>) -> Result<HashMap<String, Bytes>, EngineError> {
    let engine = base64::engine::general_purpose::STANDARD;

    assets
        .iter()
        .map(|(path, data)| {
            let bytes = engine
                .decode(data.trim())
                .map_err(|e| EngineError::Asset(path.clone(), e.to_string()))?;
            Ok((path.clone(), Bytes::from(bytes)))
        })
        .collect()
}

fn compile(world: &VirtualWorld) -> Result<(Document, Vec<CompileError>), EngineError> {
    let source = world.main_source();
    let warned = typst::compile(world);
    let (_, warnings) = categorize_diagnostics(&warned.warnings, source.as_ref());

    match warned.output {
        Ok(document) => {
            if document.pages.is_empty() {
                return Err(EngineError::EmptyDocument);
            }
            Ok((document, warnings))
        }
        Err(diagnostics) => {
            let (mut errors, _) = categorize_diagnostics(&diagnostics, source.as_ref());
            if errors.is_empty() {
                errors.push(CompileError::new("Compilation failed with unknown error"));
            }
            tracing::debug!(errors = errors.len(), "typst compilation failed");
            Err(EngineError::Compile(errors))
        }
    }
}

fn compile_world(
    world: &VirtualWorld,
    format: OutputFormat,
    ppi: Option<u32>,
) -> Result<RenderedDocument, EngineError> {
    let (document, warnings) = compile(world)?;
    for warning in &warnings {
        tracing::warn!("typst: {}", warning);
    }

    let bytes = match format {
        OutputFormat::Pdf => typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default())
            .map_err(|diagnostics| {
                let (errors, _) = categorize_diagnostics(&diagnostics, None);
                EngineError::Export(format!("PDF export failed: {}", summarize(&errors)))
            })?,
        OutputFormat::Png => {
            let page = document.pages.first().ok_or(EngineError::EmptyDocument)?;
            encode_png(page, pixel_per_pt(ppi))?
        }
    };

    Ok(RenderedDocument {
        bytes,
        mime_type: format.mime_type(),
        page_count: document.pages.len(),
        warnings,
    })
}

fn pixel_per_pt(ppi: Option<u32>) -> f32 {
    ppi.unwrap_or(DEFAULT_PPI).max(1) as f32 / 72.0
}

fn encode_png(page: &typst::layout::Page, pixel_per_pt: f32) -> Result<Vec<u8>, EngineError> {
    typst_render::render(page, pixel_per_pt)
        .encode_png()
        .map_err(|e| EngineError::Export(format!("PNG encoding failed: {}", e)))
}

fn summarize(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_compile_simple_pdf() {
        let request = RenderRequest::new("Hello, *World*!", OutputFormat::Pdf);
        let rendered = compile_document_sync(&request).unwrap();

        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.mime_type, "application/pdf");
        assert_eq!(rendered.page_count, 1);
    }

    #[test]
    fn test_compile_png_first_page() {
        let request = RenderRequest::new("One #pagebreak() Two", OutputFormat::Png).with_ppi(36);
        let rendered = compile_document_sync(&request).unwrap();

        assert!(rendered.bytes.starts_with(&PNG_SIGNATURE));
        assert_eq!(rendered.page_count, 2);
    }

    #[test]
    fn test_rasterize_every_page() {
        let source = "One #pagebreak() Two #pagebreak() Three";
        let request = RenderRequest::new(source, OutputFormat::Png).with_ppi(18);
        let pages = rasterize_pages_sync(&request).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|p| p.starts_with(&PNG_SIGNATURE)));
    }

    #[test]
    fn test_compile_error_has_location() {
        let request = RenderRequest::new("Line one\n#undefined_thing", OutputFormat::Pdf);
        let err = compile_document_sync(&request).unwrap_err();

        match err {
            EngineError::Compile(errors) => {
                assert!(!errors.is_empty());
                assert_eq!(errors[0].line, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_asset_encoding() {
        let request = RenderRequest::new("x", OutputFormat::Pdf).with_asset("logo.png", "***");
        assert!(matches!(
            compile_document_sync(&request),
            Err(EngineError::Asset(path, _)) if path == "logo.png"
        ));
    }

    #[test]
    fn test_image_asset_is_resolved() {
        // 1x1 transparent PNG
        let pixel = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
        let source = r#"#image("assets/logo.png", width: 1cm)"#;
        let request =
            RenderRequest::new(source, OutputFormat::Pdf).with_asset("assets/logo.png", pixel);

        assert!(compile_document_sync(&request).is_ok());
    }

    #[cfg(feature = "server")]
    #[tokio::test]
    async fn test_async_compile() {
        let request = RenderRequest::new("= Agreement", OutputFormat::Pdf);
        let rendered = compile_document(request, 30_000).await.unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_validate_syntax_valid() {
        assert!(validate_syntax("Hello, World!").is_empty());
    }

    #[test]
    fn test_validate_syntax_invalid() {
        let errors = validate_syntax("ok\n#let x = ");
        assert!(!errors.is_empty());
        assert_eq!(errors[0].line, Some(2));
    }
}

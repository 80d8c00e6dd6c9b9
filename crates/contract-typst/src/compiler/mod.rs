//! Typst compilation wrapper with timeout and error handling

pub mod errors;
pub mod output;
pub mod render;

pub use errors::{CompileError, EngineError, ErrorSeverity};
pub use output::OutputFormat;
#[cfg(feature = "server")]
pub use render::compile_document;
pub use render::{compile_document_sync, rasterize_pages_sync, validate_syntax, DEFAULT_PPI};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request to compile one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Typst markup
    pub source: String,
    /// Binary assets as base64 strings, keyed by virtual path
    #[serde(default)]
    pub assets: HashMap<String, String>,
    #[serde(default)]
    pub format: OutputFormat,
    /// Pixels per inch for PNG output
    pub ppi: Option<u32>,
}

impl RenderRequest {
    pub fn new(source: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            source: source.into(),
            format,
            ..Self::default()
        }
    }

    pub fn with_asset(mut self, path: impl Into<String>, base64: impl Into<String>) -> Self {
        self.assets.insert(path.into(), base64.into());
        self
    }

    pub fn with_ppi(mut self, ppi: u32) -> Self {
        self.ppi = Some(ppi);
        self
    }
}

/// A successfully compiled and exported document
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub page_count: usize,
    pub warnings: Vec<CompileError>,
}

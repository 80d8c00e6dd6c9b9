//! In-memory Typst compilation for contract exports
//!
//! Documents are compiled inside a sealed world (source, mounted assets,
//! embedded fonts) and exported to PDF bytes or a PNG raster.
//!
//! # Feature Flags
//!
//! - `server` (default): enables async `compile_document` with timeout (requires tokio)

pub mod compiler;
pub mod world;

pub use compiler::{
    compile_document_sync, rasterize_pages_sync, validate_syntax, CompileError, EngineError,
    ErrorSeverity, OutputFormat, RenderRequest, RenderedDocument, DEFAULT_PPI,
};
pub use world::{global_font_cache, FALLBACK_FAMILIES};

#[cfg(feature = "server")]
pub use compiler::compile_document;

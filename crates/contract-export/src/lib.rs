//! Contract exporters
//!
//! Every exporter consumes a [`RenderTree`] built from the document, so
//! block semantics are decided once in `contract-generator`:
//! - PDF and PNG: the tree serialized to Typst and compiled in memory
//! - HTML: a standalone page with an inline stylesheet
//! - DOCX: a Word package assembled with `docx-rs`
//! - Print: the HTML page with print rules, handed to a [`PrintBackend`]
//!
//! Plus helpers that do not touch the document model: CSV writers and
//! PNG-to-PDF page composition for dashboard snapshots.

pub mod csv;
pub mod docx;
pub mod error;
pub mod html;
pub mod pdf;
pub mod print;
pub mod sink;
pub mod snapshot;
pub mod typst_source;

use std::str::FromStr;

use contract_generator::RenderTree;
use contract_model::ContractDocument;

pub use csv::{records_to_csv, table_to_csv};
pub use docx::export_docx;
pub use error::{ExportError, Result};
pub use html::{print_html, standalone_html};
pub use pdf::{
    export_pdf, export_pdf_async, export_png, export_png_async, export_raster_pdf, RenderOptions,
};
pub use print::{print_document, PrintBackend, SystemPrinter};
pub use sink::ExportSink;
pub use snapshot::{compose_pdf_from_png, compose_pdf_from_pngs, ComposeOptions, FitMode};
pub use typst_source::{to_typst, TypstSource};

/// Document export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Html,
    Docx,
    Png,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Pdf,
        ExportFormat::Html,
        ExportFormat::Docx,
        ExportFormat::Png,
    ];

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "contract.pdf",
            ExportFormat::Html => "contract.html",
            ExportFormat::Docx => "contract.docx",
            ExportFormat::Png => "contract.png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html => "text/html",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Png => "image/png",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
            ExportFormat::Docx => "docx",
            ExportFormat::Png => "png",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "html" | "htm" => Ok(ExportFormat::Html),
            "docx" => Ok(ExportFormat::Docx),
            "png" => Ok(ExportFormat::Png),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// Export `document` to `format`
pub fn export(
    document: &ContractDocument,
    format: ExportFormat,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    export_tree(&RenderTree::from_document(document), format, options)
}

/// Export an already built tree, e.g. one evaluated against merge-field data
pub fn export_tree(
    tree: &RenderTree,
    format: ExportFormat,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let result = match format {
        ExportFormat::Pdf => export_pdf(tree, options),
        ExportFormat::Html => Ok(standalone_html(tree).into_bytes()),
        ExportFormat::Docx => export_docx(tree),
        ExportFormat::Png => export_png(tree, options),
    };
    log_outcome(format, &result);
    result
}

/// [`export`] with Typst compilation bounded by `options.timeout_ms`
pub async fn export_async(
    document: &ContractDocument,
    format: ExportFormat,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    export_tree_async(&RenderTree::from_document(document), format, options).await
}

/// [`export_tree`] with Typst compilation bounded by `options.timeout_ms`
pub async fn export_tree_async(
    tree: &RenderTree,
    format: ExportFormat,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let result = match format {
        ExportFormat::Pdf => export_pdf_async(tree, options).await,
        ExportFormat::Png => export_png_async(tree, options).await,
        ExportFormat::Html => Ok(standalone_html(tree).into_bytes()),
        ExportFormat::Docx => export_docx(tree),
    };
    log_outcome(format, &result);
    result
}

fn log_outcome(format: ExportFormat, result: &Result<Vec<u8>>) {
    match result {
        Ok(bytes) => tracing::info!(format = %format, bytes = bytes.len(), "Export complete"),
        Err(e) => tracing::error!(format = %format, "Export failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_names() {
        for format in ExportFormat::ALL {
            assert_eq!(format.as_str().parse::<ExportFormat>(), Ok(format));
            assert!(format.default_file_name().ends_with(format.as_str()));
        }
        assert!("rtf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_html_export_without_customization() {
        let bytes = export(
            &ContractDocument::default(),
            ExportFormat::Html,
            &RenderOptions::default(),
        )
        .unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("Your contract preview will appear here"));
    }
}

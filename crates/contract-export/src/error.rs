use contract_typst::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Typst compilation failed: {0}")]
    Compile(#[from] EngineError),

    #[error("DOCX packaging failed: {0}")]
    Docx(String),

    #[error("Failed to decode image: {0}")]
    Image(String),

    #[error("PDF composition failed: {0}")]
    Compose(String),

    #[error("Invalid output name: {0}")]
    InvalidName(String),

    #[error("Print failed: {0}")]
    Print(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

//! Printing through the platform's HTML viewer

use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use contract_generator::RenderTree;

use crate::error::{ExportError, Result};
use crate::html::print_html;

/// Something that can put a print-ready HTML document in front of a printer
pub trait PrintBackend {
    /// Backend identifier
    fn name(&self) -> &'static str;

    fn print(&self, html: &str) -> Result<()>;
}

/// Build the print document for `tree` and hand it to `backend`
pub fn print_document(tree: &RenderTree, backend: &dyn PrintBackend) -> Result<()> {
    let html = print_html(tree);
    backend.print(&html).map_err(|e| {
        tracing::error!(backend = backend.name(), "Print failed: {}", e);
        e
    })?;
    tracing::info!(backend = backend.name(), bytes = html.len(), "Sent document to printer");
    Ok(())
}

/// Writes the document to a temporary `.html` file, opens it with the
/// platform opener and removes the file after `grace`
#[derive(Debug, Clone)]
pub struct SystemPrinter {
    grace: Duration,
}

impl SystemPrinter {
    pub fn new() -> Self {
        Self {
            grace: Duration::from_secs(5),
        }
    }

    /// How long the file is kept for the viewer to load it
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl Default for SystemPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintBackend for SystemPrinter {
    fn name(&self) -> &'static str {
        "system"
    }

    fn print(&self, html: &str) -> Result<()> {
        let mut file = tempfile::Builder::new()
            .prefix("contract-print-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        file.flush()?;

        let status = opener(file.path()).status().map_err(|e| {
            ExportError::Print(format!("could not launch the system opener: {}", e))
        })?;
        if !status.success() {
            return Err(ExportError::Print(format!(
                "system opener exited with {}",
                status
            )));
        }

        std::thread::sleep(self.grace);
        // Dropping the handle deletes the file
        file.close()?;
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn opener(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn opener(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_model::ContractDocument;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingPrinter {
        printed: RefCell<Vec<String>>,
    }

    impl PrintBackend for RecordingPrinter {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn print(&self, html: &str) -> Result<()> {
            self.printed.borrow_mut().push(html.to_string());
            Ok(())
        }
    }

    struct BrokenPrinter;

    impl PrintBackend for BrokenPrinter {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn print(&self, _html: &str) -> Result<()> {
            Err(ExportError::Print("no printer".into()))
        }
    }

    #[test]
    fn test_backend_receives_print_document() {
        let tree = RenderTree::from_document(&ContractDocument::default());
        let printer = RecordingPrinter::default();

        print_document(&tree, &printer).unwrap();

        let printed = printer.printed.borrow();
        assert_eq!(printed.len(), 1);
        assert!(printed[0].contains("page-break-inside: avoid"));
        assert!(printed[0].contains("Your contract preview will appear here"));
    }

    #[test]
    fn test_backend_error_propagates() {
        let tree = RenderTree::from_document(&ContractDocument::default());
        let err = print_document(&tree, &BrokenPrinter).unwrap_err();
        assert!(matches!(err, ExportError::Print(_)));
    }
}

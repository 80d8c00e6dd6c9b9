//! Standalone HTML documents

use contract_generator::render::{stylesheet, to_html, RenderTree, StyleTarget};

const TITLE: &str = "Contract";

/// A complete HTML page: inline stylesheet, no external resources
pub fn standalone_html(tree: &RenderTree) -> String {
    document(tree, StyleTarget::Screen, "")
}

/// The standalone page with print rules and a script that opens the print
/// dialog once loaded
pub fn print_html(tree: &RenderTree) -> String {
    document(
        tree,
        StyleTarget::Print,
        "<script>window.addEventListener(\"load\", function () { window.focus(); window.print(); });</script>\n",
    )
}

fn document(tree: &RenderTree, target: StyleTarget, extra_head: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n<style>\n{}</style>\n{}</head>\n<body>\n{}\n</body>\n</html>\n",
        TITLE,
        stylesheet(tree, target),
        extra_head,
        to_html(tree)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_model::{BlockKind, ContractBlock, ContractDocument};

    fn tree() -> RenderTree {
        let document = ContractDocument {
            blocks: vec![ContractBlock::new(
                "t",
                BlockKind::Text {
                    value: Some("Body <b>text</b>".into()),
                },
            )],
            ..ContractDocument::default()
        };
        RenderTree::from_document(&document)
    }

    #[test]
    fn test_standalone_document_shape() {
        let html = standalone_html(&tree());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert!(html.contains("<title>Contract</title>"));
        assert!(html.contains("Body &lt;b&gt;text&lt;/b&gt;"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_no_external_resources() {
        let html = standalone_html(&tree());
        assert!(!html.contains("@import"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("http://"));
        assert!(!html.contains("https://"));
    }

    #[test]
    fn test_print_document_adds_print_rules() {
        let html = print_html(&tree());
        assert!(html.contains("break-inside: avoid"));
        assert!(html.contains("window.print()"));
    }
}

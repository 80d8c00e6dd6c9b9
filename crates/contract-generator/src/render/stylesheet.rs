//! Self-contained CSS for standalone and print documents

use std::fmt::Write;

use super::tree::{Palette, RenderTree};

/// Which standalone flavour the stylesheet is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTarget {
    Screen,
    Print,
}

/// Build the stylesheet embedded in a standalone document.
///
/// Contains no `@import` or `url()` references.
pub fn stylesheet(tree: &RenderTree, target: StyleTarget) -> String {
    let palette = &tree.palette;
    let scale = &tree.type_scale;
    let orientation = if tree.page.landscape {
        "landscape"
    } else {
        "portrait"
    };
    // CSS px to mm at 96 dpi
    let margin_mm = tree.page.margins * 25.4 / 96.0;

    let mut css = String::with_capacity(2048);
    let _ = writeln!(css, "* {{ box-sizing: border-box; }}");
    let _ = writeln!(
        css,
        "body {{ margin: 0; padding: 24px; font-family: {}, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; font-size: {}px; line-height: {}; color: {}; background: {}; }}",
        scale.font_family, scale.font_size, scale.line_height, palette.text, palette.background
    );
    let _ = writeln!(
        css,
        ".contract-document {{ max-width: 800px; margin: 0 auto; position: relative; }}"
    );
    let _ = writeln!(
        css,
        ".contract-header {{ border-left: 4px solid {}; }}",
        palette.primary
    );
    let _ = writeln!(
        css,
        ".block-heading {{ color: {}; font-size: {}px; }}",
        palette.primary, scale.heading_size
    );
    let _ = writeln!(css, ".block-value {{ white-space: pre-wrap; }}");
    let _ = writeln!(css, ".placeholder {{ opacity: 0.6; font-style: italic; }}");
    let _ = writeln!(
        css,
        "table {{ width: 100%; border-collapse: collapse; }} th, td {{ border: 1px solid {}; padding: 12px; text-align: left; }}",
        Palette::tint(&palette.primary, "40")
    );
    let _ = writeln!(
        css,
        ".watermark {{ position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%) rotate(-45deg); font-size: 96px; opacity: 0.08; pointer-events: none; }}"
    );
    let _ = writeln!(
        css,
        "@page {{ size: {} {}; margin: {:.1}mm; }}",
        tree.page.size.css_name(),
        orientation,
        margin_mm
    );

    match target {
        StyleTarget::Screen => {
            let _ = writeln!(
                css,
                "@media print {{ .contract-header, .block-container {{ break-inside: avoid; page-break-inside: avoid; }} }}"
            );
        }
        StyleTarget::Print => {
            let _ = writeln!(css, "body {{ background: #ffffff; padding: 0; }}");
            let _ = writeln!(
                css,
                ".contract-document {{ max-width: none; background: #ffffff !important; }}"
            );
            let _ = writeln!(
                css,
                ".contract-header, .block-container {{ break-inside: avoid; page-break-inside: avoid; }}"
            );
        }
    }

    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::EvalContext;
    use contract_model::{ContractCustomization, ContractMetadata};

    fn tree(custom: &ContractCustomization) -> RenderTree {
        RenderTree::build(&[], &ContractMetadata::default(), custom, &EvalContext::new())
    }

    #[test]
    fn test_no_external_references() {
        let css = stylesheet(&tree(&ContractCustomization::default()), StyleTarget::Screen);
        assert!(!css.contains("@import"));
        assert!(!css.contains("url("));
        assert!(css.contains("@page { size: A4 portrait;"));
    }

    #[test]
    fn test_print_rules() {
        let mut custom = ContractCustomization::default();
        custom.layout.page_size = "Letter".into();
        custom.layout.orientation = "landscape".into();
        let css = stylesheet(&tree(&custom), StyleTarget::Print);

        assert!(css.contains(".contract-header, .block-container { break-inside: avoid;"));
        assert!(css.contains("background: #ffffff"));
        assert!(css.contains("size: letter landscape"));
    }
}

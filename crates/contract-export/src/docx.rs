//! Word document export
//!
//! Walks the same render tree as the HTML and PDF exporters, so labels,
//! placeholders and conditional visibility match the other formats.

use std::io::Cursor;

use contract_generator::render::tree::{
    CONDITIONAL_BADGE, EMPTY_DOCUMENT, REQUIRED_MARKER, SIGNATURE_DATE_LINE, SIGNATURE_PROMPT,
    WATERMARK_TEXT,
};
use contract_generator::render::{
    Alignment, BlockNode, Caption, ConditionalOutcome, Content, Header, PageSize, RenderTree,
    RenderedBlock, StyleOverrides,
};
use docx_rs::{
    AlignmentType, BreakType, Docx, PageMargin, Paragraph, Run, RunFonts, Table, TableCell,
    TableRow,
};

use crate::error::{ExportError, Result};

const PLACEHOLDER_COLOR: &str = "94a3b8";
const REQUIRED_COLOR: &str = "ef4444";
const MUTED_COLOR: &str = "64748b";
const DIVIDER_RULE: &str = "────────────────────────────────────────";

/// CSS pixels to Word half-points
fn half_points(px: f64) -> usize {
    (px * 0.75 * 2.0).round().max(1.0) as usize
}

/// CSS pixels to twentieths of a point
fn twips(px: f64) -> i32 {
    (px * 0.75 * 20.0).round() as i32
}

/// `#rrggbb` to the bare hex Word expects
fn word_color(hex: &str) -> String {
    hex.trim_start_matches('#').to_string()
}

/// Build the `.docx` package for `tree`
pub fn export_docx(tree: &RenderTree) -> Result<Vec<u8>> {
    let scale = &tree.type_scale;
    let (width, height) = page_twips(tree.page.size, tree.page.landscape);
    let margin = twips(tree.page.margins);

    let mut docx = Docx::new()
        .page_size(width, height)
        .page_margin(
            PageMargin::new()
                .top(margin)
                .bottom(margin)
                .left(margin)
                .right(margin),
        )
        .default_fonts(RunFonts::new().ascii(&scale.font_family))
        .default_size(half_points(scale.font_size));

    if tree.watermark {
        docx = docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(
                    Run::new()
                        .add_text(WATERMARK_TEXT)
                        .bold()
                        .size(28)
                        .color(PLACEHOLDER_COLOR),
                ),
        );
    }

    if let Some(header) = &tree.header {
        for paragraph in header_paragraphs(tree, header) {
            docx = docx.add_paragraph(paragraph);
        }
    }

    if tree.blocks.is_empty() {
        docx = docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(EMPTY_DOCUMENT).color(MUTED_COLOR)),
        );
    }

    for block in &tree.blocks {
        for element in block_elements(tree, block) {
            docx = match element {
                Element::Paragraph(p) => docx.add_paragraph(p),
                Element::Table(t) => docx.add_table(t),
            };
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ExportError::Docx(e.to_string()))?;
    Ok(buffer.into_inner())
}

enum Element {
    Paragraph(Paragraph),
    Table(Table),
}

fn header_paragraphs(tree: &RenderTree, header: &Header) -> Vec<Paragraph> {
    let primary = word_color(&tree.palette.primary);
    let mut paragraphs = Vec::new();

    if let Some(branding) = &header.branding {
        if let Some(name) = &branding.company_name {
            paragraphs.push(Paragraph::new().add_run(
                Run::new()
                    .add_text(name)
                    .bold()
                    .size(half_points(tree.type_scale.heading_size))
                    .color(&primary),
            ));
        }
        if let Some(address) = &branding.address {
            paragraphs.push(
                Paragraph::new().add_run(Run::new().add_text(address).color(MUTED_COLOR)),
            );
        }
        if !branding.contacts.is_empty() {
            let line = branding
                .contacts
                .iter()
                .map(|c| format!("{}: {}", c.label, c.value))
                .collect::<Vec<_>>()
                .join("    ");
            paragraphs
                .push(Paragraph::new().add_run(Run::new().add_text(&line).color(MUTED_COLOR)));
        }
    }

    for fact in &header.facts {
        paragraphs.push(
            Paragraph::new()
                .add_run(Run::new().add_text(&format!("{}: ", fact.label)).bold())
                .add_run(Run::new().add_text(&fact.value)),
        );
    }

    // Gap between header and body
    paragraphs.push(Paragraph::new());
    paragraphs
}

/// A run carrying the block's style overrides
fn styled_run(text: &str, overrides: &StyleOverrides) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    if let Some(size) = overrides.font_size {
        run = run.size(half_points(size));
    }
    if overrides.font_weight.is_some_and(|w| w.is_bold()) {
        run = run.bold();
    }
    if let Some(color) = &overrides.color {
        run = run.color(word_color(color));
    }
    run
}

fn content_run(content: &Content, overrides: &StyleOverrides) -> Run {
    match content {
        Content::Value(v) => styled_run(v, overrides),
        Content::Placeholder(p) => Run::new().add_text(*p).italic().color(PLACEHOLDER_COLOR),
    }
}

fn caption_runs(paragraph: Paragraph, caption: &Caption, color: &str) -> Paragraph {
    let paragraph = paragraph.add_run(
        Run::new()
            .add_text(&caption.display())
            .bold()
            .color(color),
    );
    if caption.required {
        paragraph.add_run(
            Run::new()
                .add_text(&format!(" {}", REQUIRED_MARKER))
                .color(REQUIRED_COLOR),
        )
    } else {
        paragraph
    }
}

fn aligned(paragraph: Paragraph, alignment: Option<Alignment>) -> Paragraph {
    match alignment {
        None => paragraph,
        Some(Alignment::Left) => paragraph.align(AlignmentType::Left),
        Some(Alignment::Center) => paragraph.align(AlignmentType::Center),
        Some(Alignment::Right) => paragraph.align(AlignmentType::Right),
        Some(Alignment::Justify) => paragraph.align(AlignmentType::Both),
    }
}

fn block_elements(tree: &RenderTree, block: &RenderedBlock) -> Vec<Element> {
    let primary = word_color(&tree.palette.primary);
    let overrides = &block.overrides;
    let align = |p: Paragraph| aligned(p, overrides.alignment);
    let label_paragraph =
        |caption: &Caption| align(caption_runs(Paragraph::new(), caption, &primary));

    let mut elements = Vec::new();
    if tree.line_numbers {
        elements.push(Element::Paragraph(Paragraph::new().add_run(
            Run::new()
                .add_text(&block.number.to_string())
                .size(18)
                .color(PLACEHOLDER_COLOR),
        )));
    }

    match &block.node {
        BlockNode::Heading { caption } => {
            let size = overrides.font_size.unwrap_or(tree.type_scale.heading_size);
            let color = overrides
                .color
                .as_deref()
                .map(word_color)
                .unwrap_or_else(|| primary.clone());
            let mut run = Run::new()
                .add_text(&caption.display())
                .size(half_points(size))
                .color(&color);
            if overrides.font_weight.map_or(true, |w| w.is_bold()) {
                run = run.bold();
            }
            let mut paragraph = Paragraph::new().add_run(run);
            if caption.required {
                paragraph = paragraph.add_run(
                    Run::new()
                        .add_text(&format!(" {}", REQUIRED_MARKER))
                        .size(half_points(size))
                        .color(REQUIRED_COLOR),
                );
            }
            elements.push(Element::Paragraph(align(paragraph)));
        }
        BlockNode::Paragraph { caption, body } => {
            if let Some(caption) = caption {
                elements.push(Element::Paragraph(label_paragraph(caption)));
            }
            elements.push(Element::Paragraph(align(
                Paragraph::new().add_run(content_run(body, overrides)),
            )));
        }
        BlockNode::Field { caption, value } => {
            let paragraph = caption_runs(Paragraph::new(), caption, &primary)
                .add_run(Run::new().add_text(" "))
                .add_run(content_run(value, overrides));
            elements.push(Element::Paragraph(align(paragraph)));
        }
        BlockNode::List { caption, items } => {
            if let Some(caption) = caption {
                elements.push(Element::Paragraph(label_paragraph(caption)));
            }
            for item in items {
                elements.push(Element::Paragraph(align(
                    Paragraph::new()
                        .add_run(Run::new().add_text("• "))
                        .add_run(styled_run(item, overrides)),
                )));
            }
        }
        BlockNode::Table {
            caption,
            headers,
            rows,
        } => {
            if let Some(caption) = caption {
                elements.push(Element::Paragraph(label_paragraph(caption)));
            }
            if let Some(table) = table(headers, rows, &primary, overrides) {
                elements.push(Element::Table(table));
            }
        }
        BlockNode::Signature { caption } => {
            elements.push(Element::Paragraph(label_paragraph(caption)));
            elements.push(Element::Paragraph(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_text(SIGNATURE_PROMPT).color(MUTED_COLOR)),
            ));
            elements.push(Element::Paragraph(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_text(SIGNATURE_DATE_LINE).color(MUTED_COLOR)),
            ));
        }
        BlockNode::Conditional {
            label,
            rule,
            outcome,
        } => match outcome {
            ConditionalOutcome::Shown(body) => {
                let accent = word_color(&tree.palette.accent);
                let mut badge = Paragraph::new().add_run(
                    Run::new()
                        .add_text(CONDITIONAL_BADGE)
                        .bold()
                        .size(18)
                        .color(&accent),
                );
                if let Some(label) = label {
                    badge = badge.add_run(
                        Run::new()
                            .add_text(&format!(" {}", label))
                            .bold()
                            .size(18),
                    );
                }
                badge = badge.add_run(
                    Run::new()
                        .add_text(&format!(" When {}", rule))
                        .size(18)
                        .color(MUTED_COLOR),
                );
                elements.push(Element::Paragraph(badge));
                elements.push(Element::Paragraph(align(
                    Paragraph::new().add_run(content_run(body, overrides)),
                )));
            }
            ConditionalOutcome::Hidden => {
                elements.push(Element::Paragraph(Paragraph::new().add_run(
                    Run::new()
                        .add_text(&format!("[Conditional content hidden: {}]", rule))
                        .italic()
                        .size(18)
                        .color(PLACEHOLDER_COLOR),
                )));
            }
        },
        BlockNode::Divider { .. } => {
            elements.push(Element::Paragraph(
                Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_text(DIVIDER_RULE).color(PLACEHOLDER_COLOR)),
            ));
        }
    }

    // Block spacing
    elements.push(Element::Paragraph(Paragraph::new()));
    elements
}

/// Rows keep their stored width; Word tolerates ragged rows. An empty row
/// still takes a line, as one blank cell per header.
fn table(
    headers: &[String],
    rows: &[Vec<String>],
    primary: &str,
    overrides: &StyleOverrides,
) -> Option<Table> {
    let mut table_rows = Vec::new();

    if !headers.is_empty() {
        table_rows.push(TableRow::new(
            headers
                .iter()
                .map(|h| {
                    TableCell::new().add_paragraph(
                        Paragraph::new().add_run(Run::new().add_text(h).bold().color(primary)),
                    )
                })
                .collect(),
        ));
    }
    for row in rows {
        let cells = if row.is_empty() {
            (0..headers.len().max(1))
                .map(|_| TableCell::new().add_paragraph(Paragraph::new()))
                .collect()
        } else {
            row.iter()
                .map(|cell| {
                    TableCell::new()
                        .add_paragraph(Paragraph::new().add_run(styled_run(cell, overrides)))
                })
                .collect()
        };
        table_rows.push(TableRow::new(cells));
    }

    if table_rows.is_empty() {
        None
    } else {
        Some(Table::new(table_rows))
    }
}

/// Page size in twips for a page setup, portrait first
pub fn page_twips(size: PageSize, landscape: bool) -> (u32, u32) {
    let (w, h) = size.dimensions_pt();
    let (w, h) = ((w * 20.0).round() as u32, (h * 20.0).round() as u32);
    if landscape {
        (h, w)
    } else {
        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_generator::EvalContext;
    use contract_model::{
        BlockKind, Condition, ConditionOperator, ContractBlock, ContractCustomization,
        ContractMetadata,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Read;

    fn u16_at(bytes: &[u8], at: usize) -> usize {
        u16::from_le_bytes([bytes[at], bytes[at + 1]]) as usize
    }

    fn u32_at(bytes: &[u8], at: usize) -> usize {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
    }

    /// Inflate one member of a zip package, located through the central directory
    fn unzip_entry(bytes: &[u8], name: &str) -> Option<String> {
        const CENTRAL_ENTRY: &[u8] = b"PK\x01\x02";
        // end-of-central-directory record, scanned for from the back
        let end = (0..bytes.len().saturating_sub(21))
            .rev()
            .find(|&i| &bytes[i..i + 4] == b"PK\x05\x06")?;
        let mut at = u32_at(bytes, end + 16);
        while bytes.get(at..at + 4) == Some(CENTRAL_ENTRY) {
            let method = u16_at(bytes, at + 10);
            let compressed = u32_at(bytes, at + 20);
            let name_len = u16_at(bytes, at + 28);
            let extra_len = u16_at(bytes, at + 30);
            let comment_len = u16_at(bytes, at + 32);
            let offset = u32_at(bytes, at + 42);
            let entry_name = &bytes[at + 46..at + 46 + name_len];

            if entry_name == name.as_bytes() {
                let data_at =
                    offset + 30 + u16_at(bytes, offset + 26) + u16_at(bytes, offset + 28);
                let data = &bytes[data_at..data_at + compressed];
                let mut text = String::new();
                match method {
                    0 => text = String::from_utf8(data.to_vec()).ok()?,
                    8 => {
                        flate2::read::DeflateDecoder::new(data)
                            .read_to_string(&mut text)
                            .ok()?;
                    }
                    _ => return None,
                }
                return Some(text);
            }
            at += 46 + name_len + extra_len + comment_len;
        }
        None
    }

    fn document_xml(blocks: &[ContractBlock], context: &EvalContext) -> String {
        let tree = RenderTree::build(
            blocks,
            &ContractMetadata::default(),
            &ContractCustomization::default(),
            context,
        );
        let bytes = export_docx(&tree).unwrap();
        assert!(bytes.starts_with(b"PK"));
        unzip_entry(&bytes, "word/document.xml").unwrap()
    }

    fn has_text(xml: &str, text: &str) -> bool {
        xml.contains(&format!(">{}</w:t>", text))
    }

    fn status_rule() -> BlockKind {
        BlockKind::Conditional {
            conditional: Condition::new("status", ConditionOperator::Equals, "Active"),
            value: Some("Only when active".into()),
        }
    }

    #[test]
    fn test_document_text_follows_the_tree() {
        let blocks = vec![
            ContractBlock::new("h", BlockKind::Heading).with_label("Agreement"),
            ContractBlock::new("t", BlockKind::Text { value: None }),
            ContractBlock::new("d", BlockKind::Date { value: None })
                .with_label("Effective Date")
                .required(true),
            ContractBlock::new("s", BlockKind::Signature),
            ContractBlock::new("r", BlockKind::Divider),
        ];
        let xml = document_xml(&blocks, &EvalContext::new());

        assert!(has_text(&xml, "Agreement"));
        assert!(has_text(&xml, "Enter your text content..."));
        assert!(has_text(&xml, "Effective Date:"));
        assert!(has_text(&xml, "Select date"));
        assert!(has_text(&xml, " *"));
        assert!(has_text(&xml, "Signature will appear here"));
        assert!(has_text(&xml, DIVIDER_RULE));
    }

    #[test]
    fn test_conditional_visibility() {
        let blocks = vec![ContractBlock::new("c", status_rule())];

        let hidden = document_xml(&blocks, &EvalContext::new());
        assert!(has_text(
            &hidden,
            "[Conditional content hidden: status equals Active]"
        ));
        assert!(!hidden.contains("Only when active"));

        let mut context = EvalContext::new();
        context.insert("status".into(), json!("Active"));
        let shown = document_xml(&blocks, &context);
        assert!(has_text(&shown, "Conditional"));
        assert!(has_text(&shown, " When status equals Active"));
        assert!(has_text(&shown, "Only when active"));
        assert!(!shown.contains("Conditional content hidden"));
    }

    #[test]
    fn test_table_headers_and_rows() {
        let blocks = vec![ContractBlock::new(
            "t",
            BlockKind::Table {
                headers: vec!["Item".into(), "Cost".into()],
                rows: vec![
                    vec!["Design".into(), "100".into()],
                    vec![],
                    vec!["Build".into()],
                ],
            },
        )];
        let xml = document_xml(&blocks, &EvalContext::new());

        for cell in ["Item", "Cost", "Design", "100", "Build"] {
            assert!(has_text(&xml, cell), "missing cell {}", cell);
        }
        // header plus three rows, the empty one included
        assert_eq!(xml.matches("</w:tr>").count(), 4);
        // 2 + 2 + 2 blank + 1
        assert_eq!(xml.matches("</w:tc>").count(), 7);
    }

    #[test]
    fn test_empty_document_still_packages() {
        let xml = document_xml(&[], &EvalContext::new());
        assert!(has_text(&xml, EMPTY_DOCUMENT));
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(half_points(14.0), 21);
        assert_eq!(twips(40.0), 600);
        assert_eq!(word_color("#2563eb"), "2563eb");
        assert_eq!(page_twips(PageSize::Letter, false), (12240, 15840));
        assert_eq!(page_twips(PageSize::Letter, true), (15840, 12240));
    }
}

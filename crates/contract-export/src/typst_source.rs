//! Typst serialization of a [`RenderTree`].
//!
//! All user text is emitted as Typst string literals (`#"..."`), so nothing
//! a contract contains can be interpreted as markup or code.

use std::collections::HashMap;
use std::fmt::Write;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use contract_generator::render::tree::{
    CONDITIONAL_BADGE, EMPTY_DOCUMENT, REQUIRED_MARKER, SIGNATURE_DATE_LINE, SIGNATURE_PROMPT,
    WATERMARK_TEXT,
};
use contract_generator::render::{
    Alignment, BlockNode, BrandingHeader, Caption, ConditionalOutcome, Content, Header, Palette,
    RenderTree, RenderedBlock, StyleOverrides,
};
use contract_typst::{global_font_cache, OutputFormat, RenderRequest, FALLBACK_FAMILIES};
use tracing::warn;

/// CSS pixel to PDF point
const PX_TO_PT: f64 = 0.75;
const PLACEHOLDER_COLOR: &str = "#94a3b8";
const REQUIRED_COLOR: &str = "#ef4444";
const MUTED_COLOR: &str = "#64748b";

/// Generated markup plus the assets it references
#[derive(Debug, Clone, PartialEq)]
pub struct TypstSource {
    pub markup: String,
    /// Virtual path to base64 payload
    pub assets: HashMap<String, String>,
}

impl TypstSource {
    pub fn into_request(self, format: OutputFormat, ppi: Option<u32>) -> RenderRequest {
        RenderRequest {
            source: self.markup,
            assets: self.assets,
            format,
            ppi,
        }
    }
}

/// Serialize the tree to a complete Typst document
pub fn to_typst(tree: &RenderTree) -> TypstSource {
    let mut out = String::with_capacity(4096);
    let mut assets = HashMap::new();

    write_page_setup(&mut out, tree);

    if let Some(header) = &tree.header {
        write_header(&mut out, tree, header, &mut assets);
    }

    if tree.blocks.is_empty() {
        let _ = writeln!(
            out,
            "#align(center)[#pad(y: 45pt)[#text(fill: {})[#{}]]]",
            rgb(MUTED_COLOR),
            string(EMPTY_DOCUMENT)
        );
    }
    for block in &tree.blocks {
        write_block_container(&mut out, tree, block);
    }

    TypstSource {
        markup: out,
        assets,
    }
}

/// Quote `text` as a Typst string literal
pub(crate) fn string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => {}
            c if c.is_control() => {}
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn rgb(hex: &str) -> String {
    format!("rgb(\"{}\")", hex)
}

fn pt(px: f64) -> String {
    format!("{:.2}pt", px * PX_TO_PT)
}

fn font_list(family: &str) -> String {
    let cache = global_font_cache();
    let mut families: Vec<&str> = Vec::new();
    if cache.has_family(family) {
        families.push(family);
    } else {
        tracing::debug!(family, "Font family not embedded, using fallbacks");
    }
    families.extend(FALLBACK_FAMILIES.iter().copied());

    let quoted: Vec<String> = families.iter().map(|f| string(f)).collect();
    format!("({},)", quoted.join(", "))
}

fn write_page_setup(out: &mut String, tree: &RenderTree) {
    let paper = match tree.page.size {
        contract_generator::render::PageSize::A4 => "a4",
        contract_generator::render::PageSize::Letter => "us-letter",
    };
    let background = if tree.watermark {
        format!(
            ", background: rotate(-45deg, text(size: 72pt, weight: \"bold\", fill: {})[#{}])",
            rgb("#00000014"),
            string(WATERMARK_TEXT)
        )
    } else {
        String::new()
    };

    let _ = writeln!(
        out,
        "#set page(paper: \"{}\", flipped: {}, margin: {}, fill: {}{})",
        paper,
        tree.page.landscape,
        pt(tree.page.margins),
        rgb(&tree.palette.background),
        background
    );

    let scale = &tree.type_scale;
    let _ = writeln!(
        out,
        "#set text(font: {}, size: {}, fill: {})",
        font_list(&scale.font_family),
        pt(scale.font_size),
        rgb(&tree.palette.text)
    );
    let _ = writeln!(
        out,
        "#set par(leading: {:.2}em)",
        (scale.line_height - 1.0).max(0.2)
    );
    out.push('\n');
}

fn write_header(
    out: &mut String,
    tree: &RenderTree,
    header: &Header,
    assets: &mut HashMap<String, String>,
) {
    let primary = &tree.palette.primary;
    let _ = writeln!(
        out,
        "#block(width: 100%, breakable: false, inset: 12pt, radius: 3pt, below: 18pt, fill: {}, stroke: (left: 3pt + {}))[",
        rgb(&Palette::tint(primary, "10")),
        rgb(primary)
    );

    if let Some(branding) = &header.branding {
        write_branding(out, tree, branding, assets);
    }

    for fact in &header.facts {
        let _ = writeln!(
            out,
            "  #text(size: 10.5pt)[#text(weight: \"bold\")[#{}] #{}] \\",
            string(&format!("{}:", fact.label)),
            string(&fact.value)
        );
    }

    out.push_str("]\n\n");
}

fn write_branding(
    out: &mut String,
    tree: &RenderTree,
    branding: &BrandingHeader,
    assets: &mut HashMap<String, String>,
) {
    let primary = &tree.palette.primary;
    let _ = writeln!(
        out,
        "  #block(width: 100%, inset: (bottom: 9pt), below: 12pt, stroke: (bottom: 0.75pt + {}))[",
        rgb(&Palette::tint(primary, "20"))
    );

    if let Some(path) = branding.logo.as_deref().and_then(|uri| mount_logo(uri, assets)) {
        let _ = writeln!(out, "    #image({}, height: 48pt) \\", string(&path));
    }
    if let Some(name) = &branding.company_name {
        let _ = writeln!(
            out,
            "    #text(size: {}, weight: \"bold\", fill: {})[#{}] \\",
            pt(tree.type_scale.heading_size),
            rgb(primary),
            string(name)
        );
    }
    if let Some(address) = &branding.address {
        let _ = writeln!(
            out,
            "    #text(size: 10.5pt, fill: {})[#{}] \\",
            rgb(MUTED_COLOR),
            string(address)
        );
    }
    if !branding.contacts.is_empty() {
        let contacts: Vec<String> = branding
            .contacts
            .iter()
            .map(|c| format!("#{}", string(&format!("{}: {}", c.label, c.value))))
            .collect();
        let _ = writeln!(
            out,
            "    #text(size: 10.5pt, fill: {})[{}]",
            rgb(MUTED_COLOR),
            contacts.join(" #h(12pt) ")
        );
    }

    out.push_str("  ]\n");
}

/// Register a base64 `data:` URI logo as an asset and return its path
fn mount_logo(uri: &str, assets: &mut HashMap<String, String>) -> Option<String> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mut parts = meta.split(';');
    let mime = parts.next().unwrap_or_default().to_lowercase();
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

    let extension = match mime.as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => {
            warn!(mime = %mime, "Logo format not supported in PDF output, skipping");
            return None;
        }
    };
    if !is_base64 {
        warn!("Logo data URI is not base64 encoded, skipping");
        return None;
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = match STANDARD.decode(&payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Logo data URI is not valid base64, skipping");
            return None;
        }
    };
    if !image_header_matches(extension, &bytes) {
        warn!(mime = %mime, "Logo data does not match its declared format, skipping");
        return None;
    }

    let path = format!("assets/logo.{}", extension);
    assets.insert(path.clone(), STANDARD.encode(&bytes));
    Some(path)
}

/// Typst fails the whole compilation on an undecodable image, so the bytes
/// must at least carry the header of the declared format
fn image_header_matches(extension: &str, bytes: &[u8]) -> bool {
    match extension {
        "png" => png::Decoder::new(Cursor::new(bytes)).read_info().is_ok(),
        "jpg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "gif" => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
        "svg" => std::str::from_utf8(bytes).is_ok_and(|text| text.contains("<svg")),
        _ => false,
    }
}

fn write_block_container(out: &mut String, tree: &RenderTree, block: &RenderedBlock) {
    let breakable = !matches!(
        block.node,
        BlockNode::Signature { .. } | BlockNode::Conditional { .. } | BlockNode::Heading { .. }
    );
    let _ = writeln!(
        out,
        "// block {}\n#block(width: 100%, below: {}, breakable: {})[",
        block.number,
        pt(tree.spacing),
        breakable
    );

    let mut body = String::new();
    write_overrides(&mut body, &block.overrides);
    write_block(&mut body, tree, block);
    let body = wrap_alignment(body, block.overrides.alignment);

    if tree.line_numbers {
        let _ = writeln!(
            out,
            "  #grid(columns: (18pt, 1fr), column-gutter: 4pt, text(size: 9pt, fill: {})[{}], [\n{}  ])",
            rgb(PLACEHOLDER_COLOR),
            block.number,
            body
        );
    } else {
        out.push_str(&body);
    }
    out.push_str("]\n\n");
}

/// Set rules scoped to the block; explicit colors on labels still win
fn write_overrides(out: &mut String, overrides: &StyleOverrides) {
    if let Some(size) = overrides.font_size {
        let _ = writeln!(out, "  #set text(size: {})", pt(size));
    }
    if let Some(weight) = overrides.font_weight {
        let _ = writeln!(out, "  #set text(weight: {})", weight.0);
    }
    if let Some(color) = &overrides.color {
        let _ = writeln!(out, "  #set text(fill: {})", rgb(color));
    }
}

fn wrap_alignment(body: String, alignment: Option<Alignment>) -> String {
    match alignment {
        None | Some(Alignment::Left) => body,
        Some(Alignment::Justify) => format!("  #set par(justify: true)\n{}", body),
        Some(Alignment::Center) => format!("  #align(center)[\n{}  ]\n", body),
        Some(Alignment::Right) => format!("  #align(right)[\n{}  ]\n", body),
    }
}

fn required_marker(required: bool) -> String {
    if required {
        format!(
            "#h(3pt)#text(fill: {})[#{}]",
            rgb(REQUIRED_COLOR),
            string(REQUIRED_MARKER)
        )
    } else {
        String::new()
    }
}

fn caption_markup(caption: &Caption) -> String {
    format!(
        "#{}{}",
        string(&caption.display()),
        required_marker(caption.required)
    )
}

fn label_line(out: &mut String, tree: &RenderTree, caption: &Caption) {
    let _ = writeln!(
        out,
        "  #text(weight: \"semibold\", fill: {})[{}] \\",
        rgb(&tree.palette.primary),
        caption_markup(caption)
    );
}

fn content_markup(content: &Content) -> String {
    match content {
        Content::Value(v) => format!("#{}", string(v)),
        Content::Placeholder(p) => format!(
            "#text(style: \"italic\", fill: {})[#{}]",
            rgb(PLACEHOLDER_COLOR),
            string(p)
        ),
    }
}

fn write_block(out: &mut String, tree: &RenderTree, block: &RenderedBlock) {
    let palette = &tree.palette;

    match &block.node {
        BlockNode::Heading { caption } => {
            let overrides = &block.overrides;
            let size = overrides
                .font_size
                .unwrap_or(tree.type_scale.heading_size);
            let weight = overrides
                .font_weight
                .map(|w| w.0.to_string())
                .unwrap_or_else(|| "\"bold\"".to_string());
            let color = overrides.color.as_deref().unwrap_or(&palette.primary);
            let _ = writeln!(
                out,
                "  #v(6pt)#text(size: {}, weight: {}, fill: {})[{}]",
                pt(size),
                weight,
                rgb(color),
                caption_markup(caption)
            );
        }
        BlockNode::Paragraph { caption, body } => {
            if let Some(caption) = caption {
                label_line(out, tree, caption);
            }
            let _ = writeln!(out, "  {}", content_markup(body));
        }
        BlockNode::Field { caption, value } => {
            let _ = writeln!(
                out,
                "  #text(weight: \"semibold\", fill: {})[{}] {}",
                rgb(&palette.primary),
                caption_markup(caption),
                content_markup(value)
            );
        }
        BlockNode::List { caption, items } => {
            if let Some(caption) = caption {
                label_line(out, tree, caption);
            }
            let items: Vec<String> = items.iter().map(|i| format!("[#{}]", string(i))).collect();
            let _ = writeln!(out, "  #list({})", items.join(", "));
        }
        BlockNode::Table {
            caption,
            headers,
            rows,
        } => {
            if let Some(caption) = caption {
                label_line(out, tree, caption);
            }
            write_table(out, palette, headers, rows);
        }
        BlockNode::Signature { caption } => {
            label_line(out, tree, caption);
            let _ = writeln!(
                out,
                "  #block(width: 100%, inset: 18pt, radius: 6pt, fill: {}, stroke: (paint: {}, thickness: 1.5pt, dash: \"dashed\"))[\n    #align(center)[#text(fill: {})[#{}]]\n    #line(length: 100%, stroke: (paint: {}, dash: \"dashed\"))\n    #align(center)[#text(size: 10.5pt, fill: {})[#{}]]\n  ]",
                rgb(&Palette::tint(&palette.primary, "05")),
                rgb(&Palette::tint(&palette.primary, "40")),
                rgb(MUTED_COLOR),
                string(SIGNATURE_PROMPT),
                rgb(&Palette::tint(&palette.primary, "20")),
                rgb(MUTED_COLOR),
                string(SIGNATURE_DATE_LINE)
            );
        }
        BlockNode::Conditional {
            label,
            rule,
            outcome,
        } => match outcome {
            ConditionalOutcome::Shown(body) => {
                let accent = &palette.accent;
                let label = label
                    .as_deref()
                    .map(|l| format!(" #text(size: 9pt, weight: \"semibold\")[#{}]", string(l)))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "  #block(width: 100%, inset: 9pt, radius: 3pt, fill: {}, stroke: (left: 3pt + {}))[\n    #box(fill: {}, inset: (x: 4pt, y: 2pt), radius: 3pt)[#text(size: 9pt, weight: \"bold\", fill: {})[#{}]]{} #text(size: 9pt, fill: {})[#{}] \\\n    {}\n  ]",
                    rgb(&Palette::tint(accent, "05")),
                    rgb(accent),
                    rgb(&Palette::tint(accent, "20")),
                    rgb(accent),
                    string(CONDITIONAL_BADGE),
                    label,
                    rgb(MUTED_COLOR),
                    string(&format!("When {}", rule)),
                    content_markup(body)
                );
            }
            ConditionalOutcome::Hidden => {
                let _ = writeln!(
                    out,
                    "  #text(size: 9pt, style: \"italic\", fill: {})[#{}]",
                    rgb(PLACEHOLDER_COLOR),
                    string(&format!("[Conditional content hidden: {}]", rule))
                );
            }
        },
        BlockNode::Divider { .. } => {
            let _ = writeln!(
                out,
                "  #v(12pt)#line(length: 100%, stroke: 0.75pt + {})#v(12pt)",
                rgb(&Palette::tint(&palette.primary, "20"))
            );
        }
    }
}

/// Typst lays table cells out in one flat sequence, wrapping every
/// `columns` cells, so it has no notion of a short row: the cells of the
/// next row would slide up to fill the gap. Each row is therefore padded
/// with blank cells to the widest of header and rows. The HTML and DOCX
/// exports keep the stored row widths.
fn write_table(out: &mut String, palette: &Palette, headers: &[String], rows: &[Vec<String>]) {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return;
    }

    let border = rgb(&Palette::tint(&palette.primary, "40"));
    let _ = writeln!(
        out,
        "  #table(columns: {}, inset: 9pt, stroke: 0.75pt + {},",
        columns, border
    );

    if !headers.is_empty() {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                let text = headers.get(i).map(String::as_str).unwrap_or("");
                format!(
                    "table.cell(fill: {})[#text(weight: \"semibold\", fill: {})[#{}]]",
                    rgb(&Palette::tint(&palette.primary, "10")),
                    rgb(&palette.primary),
                    string(text)
                )
            })
            .collect();
        let _ = writeln!(out, "    table.header({}),", cells.join(", "));
    }

    for row in rows {
        let cells: Vec<String> = (0..columns)
            .map(|i| format!("[#{}]", string(row.get(i).map(String::as_str).unwrap_or(""))))
            .collect();
        let _ = writeln!(out, "    {},", cells.join(", "));
    }
    out.push_str("  )\n");
}

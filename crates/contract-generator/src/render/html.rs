//! HTML serialization of a [`RenderTree`].
//!
//! Output carries class names for the standalone stylesheet plus inline
//! styles, so a fragment looks right when dropped into any page.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::tree::{
    BlockNode, BrandingHeader, Caption, ConditionalOutcome, Content, Header, Palette,
    RenderTree, RenderedBlock, StyleOverrides, CONDITIONAL_BADGE, EMPTY_DOCUMENT, LOADING,
    REQUIRED_MARKER, SIGNATURE_DATE_LINE, SIGNATURE_PROMPT, WATERMARK_TEXT,
};

/// Markup shown while essential customization is missing
pub fn loading_markup() -> String {
    format!(r#"<div class="loading">{}</div>"#, LOADING)
}

/// Serialize the whole document as an HTML fragment
pub fn to_html(tree: &RenderTree) -> String {
    let mut out = String::with_capacity(4096);
    let scale = &tree.type_scale;

    let _ = write!(
        out,
        r#"<div class="contract-document" style="{}">"#,
        attr(&format!(
            "position: relative; background-color: {}; color: {}; font-family: {}; font-size: {}px; line-height: {}; padding: {}px;",
            tree.palette.background,
            tree.palette.text,
            scale.font_family,
            scale.font_size,
            scale.line_height,
            tree.page.margins,
        ))
    );

    if let Some(header) = &tree.header {
        write_header(&mut out, tree, header);
    }

    let _ = write!(
        out,
        r#"<div class="contract-body" style="margin-top: {}px;">"#,
        tree.spacing
    );
    if tree.blocks.is_empty() {
        let _ = write!(
            out,
            r#"<div class="empty-state" style="text-align: center; padding: 60px; color: #64748b;">{}</div>"#,
            EMPTY_DOCUMENT
        );
    }
    for block in &tree.blocks {
        write_block_container(&mut out, tree, block);
    }
    out.push_str("</div>");

    if tree.watermark {
        let _ = write!(
            out,
            r#"<div class="watermark" style="position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%) rotate(-45deg); font-size: 96px; font-weight: bold; opacity: 0.08; pointer-events: none;">{}</div>"#,
            WATERMARK_TEXT
        );
    }

    out.push_str("</div>");
    out
}

fn esc(text: &str) -> std::borrow::Cow<'_, str> {
    encode_text(text)
}

fn attr(text: &str) -> std::borrow::Cow<'_, str> {
    encode_double_quoted_attribute(text)
}

fn write_header(out: &mut String, tree: &RenderTree, header: &Header) {
    let primary = &tree.palette.primary;
    let _ = write!(
        out,
        r#"<div class="contract-header" style="background: {}; border-left: 4px solid {}; padding: 16px; margin-bottom: 24px; border-radius: 4px;">"#,
        Palette::tint(primary, "10"),
        primary
    );

    if let Some(branding) = &header.branding {
        write_branding(out, tree, branding);
    }

    if !header.facts.is_empty() {
        out.push_str(r#"<div class="metadata" style="font-size: 14px;">"#);
        for fact in &header.facts {
            let _ = write!(
                out,
                r#"<p style="margin: 4px 0;"><strong>{}:</strong> {}</p>"#,
                fact.label,
                esc(&fact.value)
            );
        }
        out.push_str("</div>");
    }

    out.push_str("</div>");
}

fn write_branding(out: &mut String, tree: &RenderTree, branding: &BrandingHeader) {
    let primary = &tree.palette.primary;
    let _ = write!(
        out,
        r#"<div class="branding" style="margin-bottom: 16px; padding-bottom: 12px; border-bottom: 1px solid {};">"#,
        Palette::tint(primary, "20")
    );

    if let Some(logo) = &branding.logo {
        let _ = write!(
            out,
            r#"<img class="logo" src="{}" alt="Company logo" style="max-height: 64px; margin-bottom: 8px;">"#,
            attr(logo)
        );
    }
    if let Some(name) = &branding.company_name {
        let _ = write!(
            out,
            r#"<h1 style="color: {}; font-size: {}px; margin: 0 0 8px 0; font-weight: bold;">{}</h1>"#,
            primary,
            tree.type_scale.heading_size,
            esc(name)
        );
    }
    if let Some(address) = &branding.address {
        let _ = write!(
            out,
            r#"<p style="margin: 0; opacity: 0.75; font-size: 14px;">{}</p>"#,
            esc(address)
        );
    }
    if !branding.contacts.is_empty() {
        out.push_str(
            r#"<div class="contacts" style="display: flex; gap: 16px; margin-top: 4px; font-size: 14px; opacity: 0.75;">"#,
        );
        for contact in &branding.contacts {
            let _ = write!(out, "<span>{}: {}</span>", contact.label, esc(&contact.value));
        }
        out.push_str("</div>");
    }

    out.push_str("</div>");
}

fn write_block_container(out: &mut String, tree: &RenderTree, block: &RenderedBlock) {
    let _ = write!(
        out,
        r#"<div class="block-container" data-block-id="{}" style="position: relative; margin-bottom: {}px;">"#,
        attr(&block.id),
        tree.spacing
    );
    if tree.line_numbers {
        let _ = write!(
            out,
            r#"<span class="line-number" style="position: absolute; left: -30px; font-size: 12px; opacity: 0.3;">{}</span>"#,
            block.number
        );
    }
    write_block(out, tree, block);
    out.push_str("</div>");
}

/// Inline CSS for a block's style overrides, appended after the type defaults
fn override_css(overrides: &StyleOverrides) -> String {
    let mut css = String::new();
    if let Some(size) = overrides.font_size {
        let _ = write!(css, " font-size: {}px;", size);
    }
    if let Some(weight) = overrides.font_weight {
        let _ = write!(css, " font-weight: {};", weight.0);
    }
    if let Some(color) = &overrides.color {
        let _ = write!(css, " color: {};", color);
    }
    if let Some(alignment) = overrides.alignment {
        let _ = write!(css, " text-align: {};", alignment.as_css());
    }
    css
}

fn required_marker(required: bool) -> String {
    if required {
        format!(
            r#"<span class="required-marker" style="color: #ef4444; margin-left: 4px;">{}</span>"#,
            REQUIRED_MARKER
        )
    } else {
        String::new()
    }
}

fn caption_html(caption: &Caption) -> String {
    format!(
        "{}{}",
        esc(&caption.display()),
        required_marker(caption.required)
    )
}

fn label_line(out: &mut String, tree: &RenderTree, caption: &Caption, margin_bottom: u32) {
    let _ = write!(
        out,
        r#"<p class="block-label" style="font-weight: 600; margin: 0 0 {}px 0; color: {};">{}</p>"#,
        margin_bottom,
        tree.palette.primary,
        caption_html(caption)
    );
}

fn content_html(content: &Content) -> String {
    match content {
        Content::Value(v) => esc(v).into_owned(),
        Content::Placeholder(p) => format!(r#"<span class="placeholder">{}</span>"#, p),
    }
}

fn write_block(out: &mut String, tree: &RenderTree, block: &RenderedBlock) {
    let palette = &tree.palette;
    let overrides = override_css(&block.overrides);
    let line_height = tree.type_scale.line_height;

    match &block.node {
        BlockNode::Heading { caption } => {
            let _ = write!(
                out,
                r#"<h2 class="block-heading" style="font-size: {}px; color: {}; font-weight: bold; margin: 16px 0 8px 0;{}">{}</h2>"#,
                tree.type_scale.heading_size,
                palette.primary,
                overrides,
                caption_html(caption)
            );
        }
        BlockNode::Paragraph { caption, body } => {
            let _ = write!(
                out,
                r#"<div class="block-text" style="margin-bottom: 16px;{}">"#,
                overrides
            );
            if let Some(caption) = caption {
                label_line(out, tree, caption, 4);
            }
            let _ = write!(
                out,
                r#"<p class="block-value" style="margin: 0; line-height: {}; white-space: pre-wrap;">{}</p>"#,
                line_height,
                content_html(body)
            );
            out.push_str("</div>");
        }
        BlockNode::Field { caption, value } => {
            let _ = write!(
                out,
                r#"<p class="block-field" style="margin-bottom: 16px;{}"><span class="block-label" style="font-weight: 600; color: {};">{}</span> {}</p>"#,
                overrides,
                palette.primary,
                caption_html(caption),
                content_html(value)
            );
        }
        BlockNode::List { caption, items } => {
            let _ = write!(
                out,
                r#"<div class="block-list" style="margin-bottom: 16px;{}">"#,
                overrides
            );
            if let Some(caption) = caption {
                label_line(out, tree, caption, 8);
            }
            out.push_str(r#"<ul style="margin: 0; padding-left: 20px; line-height: 1.6;">"#);
            for item in items {
                let _ = write!(out, "<li>{}</li>", esc(item));
            }
            out.push_str("</ul></div>");
        }
        BlockNode::Table {
            caption,
            headers,
            rows,
        } => {
            let border = Palette::tint(&palette.primary, "40");
            let _ = write!(
                out,
                r#"<div class="block-table" style="margin-bottom: 16px;{}">"#,
                overrides
            );
            if let Some(caption) = caption {
                label_line(out, tree, caption, 8);
            }
            out.push_str(r#"<table style="width: 100%; border-collapse: collapse; margin: 0;"><thead><tr>"#);
            for header in headers {
                let _ = write!(
                    out,
                    r#"<th style="border: 1px solid {}; padding: 12px; text-align: left; font-weight: 600; background: {}; color: {};">{}</th>"#,
                    border,
                    Palette::tint(&palette.primary, "10"),
                    palette.primary,
                    esc(header)
                );
            }
            out.push_str("</tr></thead><tbody>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    let _ = write!(
                        out,
                        r#"<td style="border: 1px solid {}; padding: 12px;">{}</td>"#,
                        border,
                        esc(cell)
                    );
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table></div>");
        }
        BlockNode::Signature { caption } => {
            let _ = write!(
                out,
                r#"<div class="block-signature" style="margin-bottom: 24px;{}">"#,
                overrides
            );
            label_line(out, tree, caption, 12);
            let _ = write!(
                out,
                r#"<div class="signature-box" style="border: 2px dashed {}; border-radius: 8px; padding: 24px; text-align: center; background: {};"><p style="margin: 0; opacity: 0.6;">{}</p><div style="margin-top: 16px; padding-top: 8px; border-top: 1px dashed {};"><p style="margin: 0; font-size: 14px; opacity: 0.5;">{}</p></div></div></div>"#,
                Palette::tint(&palette.primary, "40"),
                Palette::tint(&palette.primary, "05"),
                SIGNATURE_PROMPT,
                Palette::tint(&palette.primary, "20"),
                SIGNATURE_DATE_LINE
            );
        }
        BlockNode::Conditional {
            label,
            rule,
            outcome,
        } => match outcome {
            ConditionalOutcome::Shown(body) => {
                let accent = &palette.accent;
                let _ = write!(
                    out,
                    r#"<div class="block-conditional" style="margin-bottom: 16px; padding: 12px; border-radius: 4px; border-left: 4px solid {}; background: {};{}">"#,
                    accent,
                    Palette::tint(accent, "05"),
                    overrides
                );
                let _ = write!(
                    out,
                    r#"<div style="display: flex; align-items: center; gap: 8px; margin-bottom: 8px;"><span class="conditional-badge" style="background: {}; color: {}; padding: 2px 6px; border-radius: 4px; font-size: 12px; font-weight: 600;">{}</span>"#,
                    Palette::tint(accent, "20"),
                    accent,
                    CONDITIONAL_BADGE
                );
                if let Some(label) = label {
                    let _ = write!(
                        out,
                        r#"<span class="block-label" style="font-size: 12px; font-weight: 600;">{}</span>"#,
                        esc(label)
                    );
                }
                let _ = write!(
                    out,
                    r#"<span style="font-size: 12px; opacity: 0.6;">When {}</span></div>"#,
                    esc(rule)
                );
                let _ = write!(
                    out,
                    r#"<p class="block-value" style="margin: 0; line-height: {}; white-space: pre-wrap;">{}</p></div>"#,
                    line_height,
                    content_html(body)
                );
            }
            ConditionalOutcome::Hidden => {
                let title = label
                    .as_deref()
                    .map(|l| format!(r#" title="{}""#, attr(l)))
                    .unwrap_or_default();
                let _ = write!(
                    out,
                    r#"<div class="conditional-hidden"{} style="margin-bottom: 8px; font-size: 12px; opacity: 0.4; font-style: italic;">[Conditional content hidden: {}]</div>"#,
                    title,
                    esc(rule)
                );
            }
        },
        BlockNode::Divider { label } => {
            let aria = label
                .as_deref()
                .map(|l| format!(r#" aria-label="{}""#, attr(l)))
                .unwrap_or_default();
            let _ = write!(
                out,
                r#"<div class="block-divider" style="margin: 24px 0;"><hr{} style="border: none; height: 1px; background: {}; margin: 0;"></div>"#,
                aria,
                Palette::tint(&palette.primary, "20")
            );
        }
    }
}

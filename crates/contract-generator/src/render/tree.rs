//! Format-neutral render tree.
//!
//! Every output format (HTML preview, standalone HTML, Typst/PDF, DOCX) is a
//! serialization of this tree, so per-block rules such as placeholders,
//! required markers and conditional visibility are decided here once.

use contract_model::{
    BlockKind, BlockStyle, ContractBlock, ContractCustomization, ContractDocument,
    ContractMetadata,
};
use tracing::warn;

use crate::condition::{evaluate, EvalContext};
use crate::format;

pub const PLACEHOLDER_HEADING: &str = "Untitled Heading";
pub const PLACEHOLDER_TEXT: &str = "Enter your text content...";
pub const PLACEHOLDER_DATE: &str = "Select date";
pub const PLACEHOLDER_NUMBER: &str = "Enter number";
pub const PLACEHOLDER_CONDITIONAL: &str = "Conditional content...";
pub const PLACEHOLDER_TABLE: &str = "Empty table";
pub const EMPTY_DOCUMENT: &str = "Your contract preview will appear here";
pub const LOADING: &str = "Loading preview...";
pub const SIGNATURE_PROMPT: &str = "Signature will appear here";
pub const SIGNATURE_DATE_LINE: &str = "Date: _______________";
pub const CONDITIONAL_BADGE: &str = "Conditional";
pub const WATERMARK_TEXT: &str = "DRAFT";
pub const REQUIRED_MARKER: &str = "*";

const DEFAULT_SPACING: f64 = 16.0;

/// Text that is either user content or a stand-in for a missing value
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Value(String),
    Placeholder(&'static str),
}

impl Content {
    fn or_placeholder(value: Option<&str>, placeholder: &'static str) -> Self {
        match value {
            Some(v) if !v.is_empty() => Content::Value(v.to_string()),
            _ => Content::Placeholder(placeholder),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Content::Value(v) => v,
            Content::Placeholder(p) => p,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Content::Placeholder(_))
    }
}

/// Label line of a block
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    /// Punctuation written between the label and the required marker
    pub suffix: &'static str,
    pub required: bool,
}

impl Caption {
    fn new(text: impl Into<String>, suffix: &'static str, required: bool) -> Self {
        Self {
            text: text.into(),
            suffix,
            required,
        }
    }

    /// Label and suffix, without the required marker
    pub fn display(&self) -> String {
        format!("{}{}", self.text, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionalOutcome {
    Shown(Content),
    Hidden,
}

/// Per-type content of a rendered block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockNode {
    Heading {
        caption: Caption,
    },
    /// Free text, written whitespace-preserving
    Paragraph {
        caption: Option<Caption>,
        body: Content,
    },
    /// A labelled scalar (date or number) on one line
    Field {
        caption: Caption,
        value: Content,
    },
    List {
        caption: Option<Caption>,
        items: Vec<String>,
    },
    /// Rows keep whatever width they were stored with
    Table {
        caption: Option<Caption>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Signature {
        caption: Caption,
    },
    Conditional {
        label: Option<String>,
        /// `field operator value`
        rule: String,
        outcome: ConditionalOutcome,
    },
    Divider {
        label: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" | "centre" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

/// Numeric font weight, 100..=900
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "normal" | "regular" => Some(Self::NORMAL),
            "bold" | "bolder" => Some(Self::BOLD),
            "lighter" => Some(FontWeight(300)),
            n => n
                .parse::<u16>()
                .ok()
                .filter(|w| (100..=900).contains(w))
                .map(FontWeight),
        }
    }

    pub fn is_bold(&self) -> bool {
        self.0 >= 600
    }
}

/// Validated inline overrides from `block.style`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOverrides {
    pub font_size: Option<f64>,
    pub font_weight: Option<FontWeight>,
    pub color: Option<String>,
    pub alignment: Option<Alignment>,
}

impl StyleOverrides {
    fn from_style(block_id: &str, style: Option<&BlockStyle>) -> Self {
        let Some(style) = style else {
            return Self::default();
        };

        let color = style.color.as_deref().and_then(|raw| {
            let normalized = normalize_hex(raw);
            if normalized.is_none() && !raw.is_empty() {
                warn!(block_id, color = raw, "Ignoring non-hex block color");
            }
            normalized
        });

        Self {
            font_size: style.font_size.filter(|s| s.is_finite() && *s > 0.0),
            font_weight: style.font_weight.as_deref().and_then(FontWeight::parse),
            color,
            alignment: style.alignment.as_deref().and_then(Alignment::parse),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBlock {
    pub id: String,
    /// 1-based position in the sequence
    pub number: usize,
    pub overrides: StyleOverrides,
    pub node: BlockNode,
}

/// Theme colors, each normalized to `#rrggbb`
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub text: String,
    pub accent: String,
}

impl Palette {
    fn from_customization(custom: &ContractCustomization) -> Self {
        let defaults = contract_model::Theme::default();
        let theme = &custom.theme;
        let pick = |value: &str, fallback: &str| {
            normalize_hex(value).unwrap_or_else(|| fallback.to_string())
        };
        Self {
            primary: pick(theme.primary_color.as_str(), defaults.primary_color.as_str()),
            secondary: pick(theme.secondary_color.as_str(), defaults.secondary_color.as_str()),
            background: pick(theme.background_color.as_str(), defaults.background_color.as_str()),
            text: pick(theme.text_color.as_str(), defaults.text_color.as_str()),
            accent: pick(theme.accent_color.as_str(), defaults.accent_color.as_str()),
        }
    }

    /// `color` with a two-digit hex alpha appended, e.g. `#2563eb10`
    pub fn tint(color: &str, alpha: &str) -> String {
        format!("{}{}", color, alpha)
    }
}

/// Expand `#rgb` to `#rrggbb` and lowercase; `None` for anything that is not a hex color
pub fn normalize_hex(raw: &str) -> Option<String> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some(format!("#{}", hex.to_lowercase())),
        3 => Some(format!(
            "#{}",
            hex.chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_lowercase()
        )),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeScale {
    pub font_family: String,
    pub font_size: f64,
    pub line_height: f64,
    pub heading_size: f64,
}

impl TypeScale {
    fn from_customization(custom: &ContractCustomization) -> Self {
        let defaults = contract_model::Typography::default();
        let t = &custom.typography;
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };

        let font_size = positive(t.font_size, defaults.font_size);
        let heading_scale = positive(t.heading_scale, defaults.heading_scale);
        let family: String = t
            .font_family
            .chars()
            .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\\'))
            .collect();

        Self {
            font_family: if family.trim().is_empty() {
                defaults.font_family
            } else {
                family.trim().to_string()
            },
            font_size,
            line_height: positive(t.line_height, defaults.line_height),
            heading_size: font_size * heading_scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "letter" | "us-letter" | "us letter" => PageSize::Letter,
            _ => PageSize::A4,
        }
    }

    /// Portrait width and height in PDF points
    pub fn dimensions_pt(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }

    /// Name understood by CSS `@page { size }`
    pub fn css_name(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "letter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub size: PageSize,
    pub landscape: bool,
    /// Page margin in CSS pixels
    pub margins: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledValue {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandingHeader {
    /// Always a `data:` URI
    pub logo: Option<String>,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub contacts: Vec<LabeledValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub branding: Option<BrandingHeader>,
    pub facts: Vec<LabeledValue>,
}

/// A document resolved for output
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    pub palette: Palette,
    pub type_scale: TypeScale,
    pub page: PageSetup,
    /// Gap between blocks in CSS pixels
    pub spacing: f64,
    pub header: Option<Header>,
    /// Empty means the empty-document placeholder is shown
    pub blocks: Vec<RenderedBlock>,
    pub line_numbers: bool,
    pub watermark: bool,
}

impl RenderTree {
    pub fn build(
        blocks: &[ContractBlock],
        metadata: &ContractMetadata,
        customization: &ContractCustomization,
        context: &EvalContext,
    ) -> Self {
        let layout = &customization.layout;
        let spacing = if layout.spacing.is_finite() && layout.spacing > 0.0 {
            layout.spacing
        } else {
            DEFAULT_SPACING
        };

        Self {
            palette: Palette::from_customization(customization),
            type_scale: TypeScale::from_customization(customization),
            page: PageSetup {
                size: PageSize::from_name(&layout.page_size),
                landscape: layout.is_landscape(),
                margins: if layout.margins.is_finite() {
                    layout.margins.max(0.0)
                } else {
                    0.0
                },
            },
            spacing,
            header: build_header(metadata, customization),
            blocks: blocks
                .iter()
                .enumerate()
                .map(|(i, block)| RenderedBlock {
                    id: block.id.clone(),
                    number: i + 1,
                    overrides: StyleOverrides::from_style(&block.id, block.style.as_ref()),
                    node: block_node(block, context),
                })
                .collect(),
            line_numbers: customization.features.show_line_numbers,
            watermark: customization.features.show_watermark,
        }
    }

    /// Tree for a stored document, using default customization when the
    /// stored one is missing and an empty evaluation context.
    pub fn from_document(document: &ContractDocument) -> Self {
        let fallback;
        let customization = match &document.customization {
            Some(c) => c,
            None => {
                fallback = ContractCustomization::default();
                &fallback
            }
        };
        Self::build(
            &document.blocks,
            &document.metadata,
            customization,
            &EvalContext::new(),
        )
    }
}

fn build_header(metadata: &ContractMetadata, custom: &ContractCustomization) -> Option<Header> {
    let branding = build_branding(custom);

    let mut facts = Vec::new();
    if !metadata.template_id.is_empty() {
        facts.push(LabeledValue {
            label: "Template ID",
            value: metadata.template_id.clone(),
        });
    }
    if !metadata.party_a.is_empty() && !metadata.party_b.is_empty() {
        facts.push(LabeledValue {
            label: "Parties",
            value: format!("{} and {}", metadata.party_a, metadata.party_b),
        });
    }
    if !metadata.effective_date.is_empty() {
        facts.push(LabeledValue {
            label: "Effective Date",
            value: display_date(&metadata.effective_date),
        });
    }
    if metadata.contract_value > 0.0 {
        facts.push(LabeledValue {
            label: "Contract Value",
            value: format::currency(metadata.contract_value, &metadata.currency),
        });
    }
    if !metadata.jurisdiction.is_empty() {
        facts.push(LabeledValue {
            label: "Jurisdiction",
            value: metadata.jurisdiction.clone(),
        });
    }

    if branding.is_none() && !metadata.has_header_content() {
        return None;
    }
    Some(Header { branding, facts })
}

fn build_branding(custom: &ContractCustomization) -> Option<BrandingHeader> {
    let b = &custom.branding;
    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

    let logo = non_empty(b.logo.as_str()).and_then(|logo| {
        if logo.starts_with("data:image/") {
            Some(logo)
        } else {
            warn!("Dropping branding logo that is not an embedded data URI");
            None
        }
    });
    let company_name = non_empty(b.company_name.as_str());
    if company_name.is_none() && logo.is_none() {
        return None;
    }

    let contacts = [("Tel", &b.phone), ("Email", &b.email), ("Web", &b.website)]
        .into_iter()
        .filter_map(|(label, value)| {
            non_empty(value.as_str()).map(|value| LabeledValue { label, value })
        })
        .collect();

    Some(BrandingHeader {
        logo,
        company_name,
        address: non_empty(b.address.as_str()),
        contacts,
    })
}

fn display_date(raw: &str) -> String {
    format::long_date(raw).unwrap_or_else(|| {
        warn!(date = raw, "Unparseable date rendered verbatim");
        raw.to_string()
    })
}

fn block_node(block: &ContractBlock, context: &EvalContext) -> BlockNode {
    let required = block.required;
    let label = block.label_text();
    let optional_caption =
        |suffix: &'static str| label.map(|l| Caption::new(l, suffix, required));

    match &block.kind {
        BlockKind::Heading => BlockNode::Heading {
            caption: Caption::new(label.unwrap_or(PLACEHOLDER_HEADING), "", required),
        },
        BlockKind::Text { value } => BlockNode::Paragraph {
            caption: optional_caption(":"),
            body: Content::or_placeholder(value.as_deref(), PLACEHOLDER_TEXT),
        },
        BlockKind::Date { value } => BlockNode::Field {
            caption: Caption::new(label.unwrap_or("Date"), ":", required),
            value: match value.as_deref().filter(|v| !v.trim().is_empty()) {
                Some(raw) => Content::Value(display_date(raw)),
                None => Content::Placeholder(PLACEHOLDER_DATE),
            },
        },
        BlockKind::Number { value } => BlockNode::Field {
            caption: Caption::new(label.unwrap_or("Number"), ":", required),
            value: match value {
                Some(n) => Content::Value(format::number(*n)),
                None => Content::Placeholder(PLACEHOLDER_NUMBER),
            },
        },
        BlockKind::List { items } => BlockNode::List {
            caption: optional_caption(""),
            items: items.clone(),
        },
        BlockKind::Table { headers, rows } if headers.is_empty() && rows.is_empty() => {
            BlockNode::Paragraph {
                caption: optional_caption(""),
                body: Content::Placeholder(PLACEHOLDER_TABLE),
            }
        }
        BlockKind::Table { headers, rows } => BlockNode::Table {
            caption: optional_caption(""),
            headers: headers.clone(),
            rows: rows.clone(),
        },
        BlockKind::Signature => BlockNode::Signature {
            caption: Caption::new(label.unwrap_or("Signature"), "", required),
        },
        BlockKind::Conditional { conditional, value } => BlockNode::Conditional {
            label: label.map(str::to_string),
            rule: conditional.to_string(),
            outcome: if evaluate(conditional, context) {
                ConditionalOutcome::Shown(Content::or_placeholder(
                    value.as_deref(),
                    PLACEHOLDER_CONDITIONAL,
                ))
            } else {
                ConditionalOutcome::Hidden
            },
        },
        BlockKind::Divider => BlockNode::Divider {
            label: label.map(str::to_string),
        },
    }
}

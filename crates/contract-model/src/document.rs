//! Document-level records: metadata, customization and the persisted envelope.

use serde::{Deserialize, Deserializer, Serialize};

use crate::block::ContractBlock;
use crate::error::ModelError;
use crate::lenient;

/// Descriptive fields of a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractMetadata {
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub template_id: String,
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub party_a: String,
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub party_b: String,
    /// ISO date string, empty when unset
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub effective_date: String,
    #[serde(deserialize_with = "lenient::number_or_zero")]
    pub contract_value: f64,
    pub currency: String,
    pub jurisdiction: String,
    pub language: String,
    #[serde(deserialize_with = "lenient::text_or_empty")]
    pub version: String,
    #[serde(
        rename = "contractTypeID",
        alias = "contractTypeId",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub contract_type_id: Option<String>,
    #[serde(
        rename = "categoryID",
        alias = "categoryId",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
    #[serde(
        rename = "vendorID",
        alias = "vendorId",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    /// Term length in months
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl Default for ContractMetadata {
    fn default() -> Self {
        Self {
            template_id: String::new(),
            party_a: String::new(),
            party_b: String::new(),
            effective_date: String::new(),
            contract_value: 0.0,
            currency: "USD".to_string(),
            jurisdiction: String::new(),
            language: "en".to_string(),
            version: "1.0".to_string(),
            contract_type_id: None,
            category_id: None,
            vendor_id: None,
            risk_level: None,
            duration: None,
        }
    }
}

impl ContractMetadata {
    /// Whether any field shown in the document header is filled in
    pub fn has_header_content(&self) -> bool {
        !self.template_id.is_empty()
            || !self.party_a.is_empty()
            || !self.party_b.is_empty()
            || !self.effective_date.is_empty()
            || self.contract_value > 0.0
            || !self.jurisdiction.is_empty()
    }

    /// Shallow-merge a partial update
    pub fn merge(&mut self, patch: MetadataPatch) {
        set(&mut self.template_id, patch.template_id);
        set(&mut self.party_a, patch.party_a);
        set(&mut self.party_b, patch.party_b);
        set(&mut self.effective_date, patch.effective_date);
        set(&mut self.contract_value, patch.contract_value);
        set(&mut self.currency, patch.currency);
        set(&mut self.jurisdiction, patch.jurisdiction);
        set(&mut self.language, patch.language);
        set(&mut self.version, patch.version);
        set_some(&mut self.contract_type_id, patch.contract_type_id);
        set_some(&mut self.category_id, patch.category_id);
        set_some(&mut self.vendor_id, patch.vendor_id);
        set_some(&mut self.risk_level, patch.risk_level);
        set_some(&mut self.duration, patch.duration);
    }
}

/// Partial metadata, as carried by templates and form edits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub contract_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(
        rename = "contractTypeID",
        alias = "contractTypeId",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub contract_type_id: Option<String>,
    #[serde(
        rename = "categoryID",
        alias = "categoryId",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
    #[serde(
        rename = "vendorID",
        alias = "vendorId",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            secondary_color: "#64748b".to_string(),
            background_color: "#ffffff".to_string(),
            text_color: "#1e293b".to_string(),
            accent_color: "#0ea5e9".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub font_family: String,
    pub font_size: f64,
    pub line_height: f64,
    pub heading_scale: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 14.0,
            line_height: 1.6,
            heading_scale: 1.25,
        }
    }
}

impl Typography {
    /// Size of block headings
    pub fn heading_size(&self) -> f64 {
        self.font_size * self.heading_scale
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Layout {
    pub margins: f64,
    pub spacing: f64,
    pub columns: u32,
    pub page_size: String,
    pub orientation: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            margins: 40.0,
            spacing: 16.0,
            columns: 1,
            page_size: "A4".to_string(),
            orientation: "portrait".to_string(),
        }
    }
}

impl Layout {
    pub fn is_landscape(&self) -> bool {
        self.orientation.eq_ignore_ascii_case("landscape")
    }
}

/// Display-only company details shown in the document header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branding {
    pub logo: String,
    pub company_name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Features {
    pub show_line_numbers: bool,
    pub show_watermark: bool,
    pub enable_comments: bool,
    pub track_changes: bool,
    pub require_signatures: bool,
    pub auto_save: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            show_line_numbers: false,
            show_watermark: false,
            enable_comments: true,
            track_changes: false,
            require_signatures: true,
            auto_save: true,
        }
    }
}

/// Presentation configuration.
///
/// `theme` and `typography` are required when decoding: a payload without
/// them cannot be rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCustomization {
    pub theme: Theme,
    pub typography: Typography,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub features: Features,
}

impl ContractCustomization {
    /// Merge a partial update one level deep.
    ///
    /// Each section present in the patch is merged field by field into the
    /// current section; sections absent from the patch are left untouched.
    /// Non-positive typography sizes are ignored.
    pub fn merge(&mut self, patch: CustomizationPatch) {
        if let Some(theme) = patch.theme {
            let t = &mut self.theme;
            set(&mut t.primary_color, theme.primary_color);
            set(&mut t.secondary_color, theme.secondary_color);
            set(&mut t.background_color, theme.background_color);
            set(&mut t.text_color, theme.text_color);
            set(&mut t.accent_color, theme.accent_color);
        }
        if let Some(typography) = patch.typography {
            let t = &mut self.typography;
            set(&mut t.font_family, typography.font_family);
            set(&mut t.font_size, typography.font_size.filter(|v| positive(*v)));
            set(
                &mut t.line_height,
                typography.line_height.filter(|v| positive(*v)),
            );
            set(
                &mut t.heading_scale,
                typography.heading_scale.filter(|v| positive(*v)),
            );
        }
        if let Some(layout) = patch.layout {
            let l = &mut self.layout;
            set(&mut l.margins, layout.margins);
            set(&mut l.spacing, layout.spacing);
            set(&mut l.columns, layout.columns);
            set(&mut l.page_size, layout.page_size);
            set(&mut l.orientation, layout.orientation);
        }
        if let Some(branding) = patch.branding {
            let b = &mut self.branding;
            set(&mut b.logo, branding.logo);
            set(&mut b.company_name, branding.company_name);
            set(&mut b.address, branding.address);
            set(&mut b.phone, branding.phone);
            set(&mut b.email, branding.email);
            set(&mut b.website, branding.website);
        }
        if let Some(features) = patch.features {
            let f = &mut self.features;
            set(&mut f.show_line_numbers, features.show_line_numbers);
            set(&mut f.show_watermark, features.show_watermark);
            set(&mut f.enable_comments, features.enable_comments);
            set(&mut f.track_changes, features.track_changes);
            set(&mut f.require_signatures, features.require_signatures);
            set(&mut f.auto_save, features.auto_save);
        }
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemePatch {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypographyPatch {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub line_height: Option<f64>,
    pub heading_scale: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutPatch {
    pub margins: Option<f64>,
    pub spacing: Option<f64>,
    pub columns: Option<u32>,
    pub page_size: Option<String>,
    pub orientation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandingPatch {
    pub logo: Option<String>,
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturesPatch {
    pub show_line_numbers: Option<bool>,
    pub show_watermark: Option<bool>,
    pub enable_comments: Option<bool>,
    pub track_changes: Option<bool>,
    pub require_signatures: Option<bool>,
    pub auto_save: Option<bool>,
}

/// Partial customization with per-section partials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typography: Option<TypographyPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding: Option<BrandingPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeaturesPatch>,
}

/// A complete generated document as persisted by the contract record store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDocument {
    #[serde(default)]
    pub blocks: Vec<ContractBlock>,
    #[serde(default)]
    pub metadata: ContractMetadata,
    /// `None` when the stored customization lacks its essential sections
    #[serde(
        default,
        deserialize_with = "renderable_customization",
        skip_serializing_if = "Option::is_none"
    )]
    pub customization: Option<ContractCustomization>,
}

impl ContractDocument {
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn renderable_customization<'de, D>(
    deserializer: D,
) -> Result<Option<ContractCustomization>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

//! Embedded font cache
//!
//! Contract documents are compiled with the fonts bundled by `typst-assets`
//! only, so output does not depend on what the host has installed.

use std::sync::OnceLock;

use typst::foundations::Bytes;
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;

static FONT_CACHE: OnceLock<FontCache> = OnceLock::new();

/// Shared cache, loaded on first use
pub fn global_font_cache() -> &'static FontCache {
    FONT_CACHE.get_or_init(FontCache::new)
}

/// Families used when the requested one is not embedded
pub const FALLBACK_FAMILIES: [&str; 2] = ["Libertinus Serif", "New Computer Modern"];

#[derive(Debug)]
pub struct FontCache {
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
}

impl FontCache {
    pub fn new() -> Self {
        let mut book = FontBook::new();
        let mut fonts = Vec::new();

        for data in typst_assets::fonts() {
            let buffer = Bytes::from_static(data);
            for font in Font::iter(buffer) {
                book.push(font.info().clone());
                fonts.push(font);
            }
        }

        tracing::info!("Font cache initialized with {} fonts", fonts.len());

        Self {
            book: LazyHash::new(book),
            fonts,
        }
    }

    pub fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    pub fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Sorted, deduplicated family names
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .book
            .families()
            .map(|(name, _)| name.to_string())
            .collect();
        families.sort();
        families.dedup();
        families
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.fonts
            .iter()
            .any(|font| font.info().family.eq_ignore_ascii_case(family))
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_fonts_loaded() {
        let cache = global_font_cache();
        assert!(!cache.is_empty());
        assert!(!cache.families().is_empty());
    }

    #[test]
    fn test_fallback_families_are_embedded() {
        let cache = global_font_cache();
        for family in FALLBACK_FAMILIES {
            assert!(cache.has_family(family), "{} missing", family);
        }
        assert!(!cache.has_family("Definitely Not A Font"));
    }

    #[test]
    fn test_global_cache_singleton() {
        assert!(std::ptr::eq(global_font_cache(), global_font_cache()));
    }
}

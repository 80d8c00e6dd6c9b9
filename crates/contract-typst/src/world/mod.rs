//! Sealed Typst compilation environment

pub mod fonts;
pub mod virtual_fs;
pub mod virtual_world;

pub use fonts::{global_font_cache, FontCache, FALLBACK_FAMILIES};
pub use virtual_fs::VirtualFilesystem;
pub use virtual_world::VirtualWorld;

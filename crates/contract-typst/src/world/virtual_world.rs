//! In-memory implementation of the Typst `World` trait

use std::collections::HashMap;

use chrono::{Datelike, Timelike, Utc};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::{global_font_cache, FontCache};
use super::virtual_fs::VirtualFilesystem;
use crate::compiler::errors::EngineError;

/// A sealed compilation environment: one source, its assets and the
/// embedded fonts
pub struct VirtualWorld {
    filesystem: VirtualFilesystem,
    main: FileId,
    font_cache: &'static FontCache,
    time: chrono::DateTime<Utc>,
    library: LazyHash<Library>,
}

impl VirtualWorld {
    pub fn new(source: String, assets: HashMap<String, Bytes>) -> Result<Self, EngineError> {
        let mut filesystem = VirtualFilesystem::new();
        let main = filesystem.mount_main(source);

        for (path, content) in assets {
            filesystem.mount_file(&path, content)?;
        }

        Ok(Self {
            filesystem,
            main,
            font_cache: global_font_cache(),
            time: Utc::now(),
            library: LazyHash::new(Library::builder().build()),
        })
    }

    pub fn filesystem(&self) -> &VirtualFilesystem {
        &self.filesystem
    }

    /// The parsed main source, used to map diagnostic spans to lines
    pub fn main_source(&self) -> Option<Source> {
        self.filesystem.source(self.main)
    }
}

impl World for VirtualWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        self.font_cache.book()
    }

    fn main(&self) -> FileId {
        self.main
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        self.filesystem
            .source(id)
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.filesystem
            .file(id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.font_cache.font(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let adjusted = self.time + chrono::Duration::hours(offset.unwrap_or(0));

        Datetime::from_ymd_hms(
            adjusted.year(),
            adjusted.month() as u8,
            adjusted.day() as u8,
            adjusted.hour() as u8,
            adjusted.minute() as u8,
            adjusted.second() as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_world_creation() {
        let world = VirtualWorld::new("Hello".to_string(), HashMap::new()).unwrap();

        let source = world.source(world.main()).unwrap();
        assert_eq!(source.text(), "Hello");
        assert_eq!(world.filesystem().len(), 1);
    }

    #[test]
    fn test_assets_are_readable() {
        let mut assets = HashMap::new();
        assets.insert("logo.png".to_string(), Bytes::from(vec![1u8, 2, 3]));
        let world = VirtualWorld::new("x".to_string(), assets).unwrap();

        let id = world.filesystem().lookup("logo.png").unwrap();
        assert_eq!(world.file(id).unwrap().as_ref(), &[1u8, 2, 3][..]);
    }

    #[test]
    fn test_unsafe_asset_rejected() {
        let mut assets = HashMap::new();
        assets.insert("../secret".to_string(), Bytes::from(vec![0u8]));
        assert!(matches!(
            VirtualWorld::new("x".to_string(), assets),
            Err(EngineError::PathSecurity(_))
        ));
    }

    #[test]
    fn test_book_matches_font_count() {
        let world = VirtualWorld::new(String::new(), HashMap::new()).unwrap();
        assert!(world.font(0).is_some());
        assert!(world.book().families().next().is_some());
    }

    #[test]
    fn test_today_function() {
        let world = VirtualWorld::new("test".to_string(), HashMap::new()).unwrap();
        assert!(world.today(None).is_some());
    }
}

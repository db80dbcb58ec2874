//! Reading-position persistence.
//!
//! A flat key-to-string store kept in `.cache/positions.toml`: one
//! `scroll_<book>` key per book, value is the raw scroll offset as a decimal
//! string. Storage trouble of any kind is a silent no-op: the position
//! simply is not restored or saved, and the reader never hears about it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CACHE_DIR: &str = ".cache";

#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn open_default() -> Self {
        Self::new(Path::new(CACHE_DIR).join("positions.toml"))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Saved offset for `book`, if any.
    pub fn load_offset(&self, book: &str) -> Option<f32> {
        let table = self.read_table()?;
        let value = table.get(&Self::key(book))?.trim().parse().ok()?;
        debug!(book, offset = value, "Loaded saved reading position");
        Some(value)
    }

    /// Persist the raw offset for `book`. Errors are swallowed to keep the
    /// scroll path responsive.
    pub fn save_offset(&self, book: &str, offset: f32) {
        let mut table = self.read_table().unwrap_or_default();
        table.insert(Self::key(book), format!("{}", offset.max(0.0)));

        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(contents) = toml::to_string(&table) {
            let _ = fs::write(&self.path, contents);
        }
    }

    fn read_table(&self) -> Option<BTreeMap<String, String>> {
        let data = fs::read_to_string(&self.path).ok()?;
        toml::from_str(&data).ok()
    }

    fn key(book: &str) -> String {
        format!("scroll_{book}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store(label: &str) -> PositionStore {
        let path = std::env::temp_dir().join(format!(
            "booklens-positions-{}-{label}.toml",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        PositionStore::new(path)
    }

    #[test]
    fn saves_and_restores_per_book() {
        let store = scratch_store("roundtrip");
        store.save_offset("Moby-Dick.epub", 4200.0);

        // A fresh handle over the same file sees the persisted value.
        let reopened = PositionStore::new(store.path.clone());
        assert_eq!(reopened.load_offset("Moby-Dick.epub"), Some(4200.0));
        assert_eq!(reopened.load_offset("Dune.epub"), None);
    }

    #[test]
    fn later_saves_overwrite_without_clobbering_other_books() {
        let store = scratch_store("overwrite");
        store.save_offset("a.epub", 100.0);
        store.save_offset("b.epub", 250.0);
        store.save_offset("a.epub", 175.5);

        assert_eq!(store.load_offset("a.epub"), Some(175.5));
        assert_eq!(store.load_offset("b.epub"), Some(250.0));
    }

    #[test]
    fn negative_offsets_clamp_to_zero() {
        let store = scratch_store("clamp");
        store.save_offset("a.epub", -20.0);
        assert_eq!(store.load_offset("a.epub"), Some(0.0));
    }

    #[test]
    fn unavailable_storage_is_a_silent_noop() {
        let store = PositionStore::new("/proc/booklens-definitely-unwritable/positions.toml");
        store.save_offset("a.epub", 10.0);
        assert_eq!(store.load_offset("a.epub"), None);
    }

    #[test]
    fn corrupt_store_reads_as_empty() {
        let store = scratch_store("corrupt");
        if let Some(parent) = store.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        fs::write(&store.path, "not = [valid toml").expect("write scratch file");
        assert_eq!(store.load_offset("a.epub"), None);

        // And saving over it recovers the store.
        store.save_offset("a.epub", 12.0);
        assert_eq!(store.load_offset("a.epub"), Some(12.0));
    }
}

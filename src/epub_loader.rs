//! Archive loading.
//!
//! Opens an EPUB package, reads every markup entry as text, and concatenates
//! them into one raw blob for the segmentation pipeline. The archive itself
//! is a black box behind the `epub` crate; spine ordering, metadata, and the
//! table of contents are ignored. Entries are taken in sorted path order so
//! loads are deterministic.

use anyhow::{Context, Result};
use epub::doc::EpubDoc;
use std::path::Path;
use tracing::{debug, info};

/// Determinate progress checkpoints for the load pipeline. Extraction cannot
/// report byte-level progress, so the indicator advances through these fixed
/// stops instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Started,
    EntriesEnumerated,
    EntriesConcatenated,
    TreeBuilt,
    ObserversAttached,
    Done,
}

impl LoadStage {
    pub fn percent(self) -> f32 {
        match self {
            LoadStage::Started => 0.0,
            LoadStage::EntriesEnumerated => 30.0,
            LoadStage::EntriesConcatenated => 50.0,
            LoadStage::TreeBuilt => 70.0,
            LoadStage::ObserversAttached => 90.0,
            LoadStage::Done => 100.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoadStage::Started => "Opening package",
            LoadStage::EntriesEnumerated => "Listing entries",
            LoadStage::EntriesConcatenated => "Reading entries",
            LoadStage::TreeBuilt => "Building sections",
            LoadStage::ObserversAttached => "Preparing text",
            LoadStage::Done => "Done",
        }
    }
}

/// A freshly extracted book: its identity plus the concatenated markup blob.
#[derive(Debug, Clone)]
pub struct RawBook {
    pub name: String,
    pub markup: String,
}

/// Extract all markup entries from the package at `path`.
///
/// Any open or read failure is terminal for the whole load; there is no
/// partial rendering of a half-readable archive.
pub fn load_book_markup(
    path: &Path,
    mut on_stage: impl FnMut(LoadStage),
) -> Result<RawBook> {
    on_stage(LoadStage::Started);
    info!(path = %path.display(), "Loading EPUB package");

    let mut doc = EpubDoc::new(path)
        .with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

    let mut entries: Vec<String> = doc
        .resources
        .values()
        .filter(|item| is_markup_entry(&item.path, &item.mime))
        .map(|item| item.path.to_string_lossy().into_owned())
        .collect();
    entries.sort();
    on_stage(LoadStage::EntriesEnumerated);
    info!(entries = entries.len(), "Enumerated markup entries");

    let mut markup = String::new();
    for entry in &entries {
        match doc.get_resource_str_by_path(entry) {
            Some(text) => {
                debug!(entry = %entry, chars = text.len(), "Read markup entry");
                markup.push_str(&text);
                markup.push('\n');
            }
            None => debug!(entry = %entry, "Entry could not be read as text; skipped"),
        }
    }
    on_stage(LoadStage::EntriesConcatenated);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());

    info!(
        name = %name,
        total_chars = markup.len(),
        "Finished extracting package"
    );
    Ok(RawBook { name, markup })
}

fn is_markup_entry(path: &Path, mime: &str) -> bool {
    if mime.contains("html") {
        return true;
    }
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase()),
        Some(ext) if ext == "html" || ext == "xhtml" || ext == "htm"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn markup_entries_match_on_mime_or_extension() {
        assert!(is_markup_entry(
            &PathBuf::from("ch1.xhtml"),
            "application/xhtml+xml"
        ));
        assert!(is_markup_entry(&PathBuf::from("ch2.HTML"), "text/plain"));
        assert!(is_markup_entry(&PathBuf::from("notes"), "text/html"));
        assert!(!is_markup_entry(&PathBuf::from("cover.jpg"), "image/jpeg"));
        assert!(!is_markup_entry(&PathBuf::from("style.css"), "text/css"));
    }

    #[test]
    fn stage_checkpoints_are_the_fixed_percentages() {
        let stages = [
            (LoadStage::Started, 0.0),
            (LoadStage::EntriesEnumerated, 30.0),
            (LoadStage::EntriesConcatenated, 50.0),
            (LoadStage::TreeBuilt, 70.0),
            (LoadStage::ObserversAttached, 90.0),
            (LoadStage::Done, 100.0),
        ];
        for (stage, expected) in stages {
            assert_eq!(stage.percent(), expected);
            assert!(!stage.label().is_empty());
        }
    }

    #[test]
    fn missing_package_is_a_load_failure() {
        let missing = PathBuf::from("/nonexistent/definitely-missing.epub");
        let result = load_book_markup(&missing, |_| {});
        assert!(result.is_err());
    }
}

use super::Effect;
use super::super::state::{App, ReadingSession};
use crate::epub_loader::{LoadStage, RawBook};
use crate::sectionizer::SectionedBook;
use iced::widget::scrollable::RelativeOffset;
use std::path::PathBuf;
use tracing::{info, warn};

impl App {
    pub(super) fn handle_archive_extracted(
        &mut self,
        path: PathBuf,
        book: RawBook,
        effects: &mut Vec<Effect>,
    ) {
        self.load_stage = Some(LoadStage::EntriesConcatenated);
        effects.push(Effect::AssembleBook { path, book });
    }

    /// The annotated tree is ready: build the session, attach the block
    /// registry, and restore any saved reading position for this book.
    pub(super) fn handle_book_assembled(
        &mut self,
        path: PathBuf,
        name: String,
        book: SectionedBook,
        effects: &mut Vec<Effect>,
    ) {
        self.load_stage = Some(LoadStage::TreeBuilt);

        let mut session = ReadingSession::new(name, book);
        Self::rebuild_geometry_for(&self.config, &mut session);
        self.load_stage = Some(LoadStage::ObserversAttached);

        let saved_offset = self.positions.load_offset(&session.book_name);
        if let Some(px) = saved_offset {
            // Snap from estimated geometry now; the first real scroll report
            // corrects the landing spot once content height is known.
            session.scroll.last_offset_px = px;
            session.pending_restore_px = Some(px);
        }
        let est_content_height = session.scroll.est_content_height;
        let book_name = session.book_name.clone();
        let sections = session.book.sections.len();
        let blocks = session.items.len();

        self.session = Some(session);
        self.wrap_blocks_near_viewport();

        let target = match saved_offset {
            Some(px) => {
                let est_scrollable =
                    (est_content_height - self.config.window_height).max(1.0);
                RelativeOffset {
                    x: 0.0,
                    y: (px / est_scrollable).clamp(0.0, 1.0),
                }
            }
            None => RelativeOffset::START,
        };
        effects.push(Effect::ScrollTo(target));

        self.book_loading = false;
        self.load_stage = Some(LoadStage::Done);
        self.header_hidden = false;
        info!(
            book = %book_name,
            path = %path.display(),
            sections,
            blocks,
            restored_offset = ?saved_offset,
            "Book ready"
        );
    }

    pub(super) fn handle_book_load_failed(&mut self, path: PathBuf, error: String) {
        self.book_loading = false;
        self.load_stage = None;
        self.load_error = Some(format!("Failed to open {}: {error}", path.display()));
        warn!(path = %path.display(), "Failed to load book: {error}");
    }
}

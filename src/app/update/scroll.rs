use super::Effect;
use super::super::state::{
    App, BLOCK_SPACING_PX, EST_GLYPH_WIDTH_RATIO, EST_TRIGGER_HEIGHT_PX,
    HEADER_HIDE_THRESHOLD_PX, ReadingSession, RenderItem, WRAP_MARGIN_PX,
};
use crate::config::AppConfig;
use crate::word_wrap::wrap_words;
use iced::widget::scrollable::RelativeOffset;
use tracing::debug;

impl App {
    /// Scroll tick: update viewport tracking, drive header auto-hide, persist
    /// the raw offset, and wrap any blocks that moved near the viewport.
    /// Does nothing until a book has loaded.
    pub(super) fn handle_scrolled(
        &mut self,
        offset: RelativeOffset,
        viewport_width: f32,
        viewport_height: f32,
        _content_width: f32,
        content_height: f32,
        effects: &mut Vec<Effect>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.scroll.viewport_width = sanitize_dim(viewport_width);
        session.scroll.viewport_height = sanitize_dim(viewport_height);
        session.scroll.content_height = sanitize_dim(content_height);

        let scrollable =
            (session.scroll.content_height - session.scroll.viewport_height).max(0.0);
        let y = sanitize_fraction(offset.y) * scrollable;

        // One-time correction of a restored position: the initial snap used
        // estimated geometry, the scrollable now reports real pixels.
        if scrollable > 0.0
            && let Some(px) = session.pending_restore_px.take()
        {
            let target = (px / scrollable).clamp(0.0, 1.0);
            if (target - sanitize_fraction(offset.y)).abs() > 0.002 {
                effects.push(Effect::ScrollTo(RelativeOffset { x: 0.0, y: target }));
            }
            session.scroll.last_offset_px = px.min(scrollable);
            self.wrap_blocks_near_viewport();
            return;
        }

        let increased = y > session.scroll.last_offset_px;
        session.scroll.last_offset_px = y;
        self.header_hidden = increased && y > HEADER_HIDE_THRESHOLD_PX;

        effects.push(Effect::SavePosition);
        self.wrap_blocks_near_viewport();
    }

    pub(super) fn persist_position(&self) {
        if let Some(session) = &self.session {
            self.positions
                .save_offset(&session.book_name, session.scroll.last_offset_px);
        }
    }

    pub(super) fn rebuild_block_geometry(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        Self::rebuild_geometry_for(&self.config, session);
    }

    /// Estimate per-item pixel geometry from character counts, the font
    /// metrics, and the available width. Real layout is unknown until render;
    /// estimates get rescaled against the reported content height when used.
    pub(super) fn rebuild_geometry_for(config: &AppConfig, session: &mut ReadingSession) {
        let font_size = config.font_size as f32;
        let line_height = font_size * config.line_spacing.max(0.8);
        let width = if session.scroll.viewport_width > 0.0 {
            session.scroll.viewport_width
        } else {
            config.window_width
        };
        let text_width = (width - config.margin_horizontal as f32 * 2.0).max(120.0);
        let glyph_width = (font_size * EST_GLYPH_WIDTH_RATIO).max(1.0);
        let chars_per_line = (text_width / glyph_width).max(8.0);

        let mut top = config.margin_vertical as f32;
        for (item, geometry) in session.items.iter().zip(session.geometry.iter_mut()) {
            let height = match item {
                RenderItem::Trigger(_) => EST_TRIGGER_HEIGHT_PX,
                RenderItem::Block(node) => {
                    let chars = session.book.tree.text_content(*node).chars().count();
                    let lines = (chars as f32 / chars_per_line).ceil().max(1.0);
                    lines * line_height
                }
            };
            geometry.est_top = top;
            geometry.est_height = height;
            top += height + BLOCK_SPACING_PX;
        }
        session.scroll.est_content_height = top + config.margin_vertical as f32;
    }

    /// Wrap every observed block within [`WRAP_MARGIN_PX`] of the viewport.
    /// Each block wraps at most once; re-sweeping already wrapped regions is
    /// free. Returns how many blocks were transformed this pass.
    pub(super) fn wrap_blocks_near_viewport(&mut self) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        let scroll = session.scroll;
        let viewport_height = if scroll.viewport_height > 0.0 {
            scroll.viewport_height
        } else {
            self.config.window_height
        };
        let scale = if scroll.est_content_height > 0.0 && scroll.content_height > 0.0 {
            scroll.content_height / scroll.est_content_height
        } else {
            1.0
        };
        let top = scroll.last_offset_px - WRAP_MARGIN_PX;
        let bottom = scroll.last_offset_px + viewport_height + WRAP_MARGIN_PX;

        let mut wrapped = 0usize;
        for (item, geometry) in session.items.iter().zip(session.geometry.iter()) {
            if let RenderItem::Block(node) = item {
                let block_top = geometry.est_top * scale;
                let block_bottom = block_top + geometry.est_height * scale;
                if block_bottom >= top
                    && block_top <= bottom
                    && wrap_words(&mut session.book.tree, *node)
                {
                    wrapped += 1;
                }
            }
        }
        if wrapped > 0 {
            debug!(wrapped, offset = scroll.last_offset_px, "Wrapped blocks near viewport");
        }
        wrapped
    }
}

fn sanitize_dim(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn sanitize_fraction(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::super::Effect;
    use super::super::super::messages::Message;
    use super::super::super::state::App;
    use crate::cache::PositionStore;
    use crate::config::AppConfig;
    use crate::markup::parse_markup;
    use crate::sectionizer::segment;
    use crate::word_wrap::wrap_words;
    use iced::widget::scrollable::RelativeOffset;
    use std::path::PathBuf;

    fn store_path(label: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "booklens-scroll-test-{}-{label}.toml",
            std::process::id()
        ))
    }

    /// App over an empty position store.
    fn build_test_app(label: &str) -> App {
        let _ = std::fs::remove_file(store_path(label));
        reopen_test_app(label)
    }

    /// App sharing whatever the store for `label` already holds.
    fn reopen_test_app(label: &str) -> App {
        let (mut app, _task) = App::bootstrap(AppConfig::default(), None);
        app.positions = PositionStore::new(store_path(label));
        app
    }

    fn assemble_book(app: &mut App, raw: &str, name: &str) -> Vec<Effect> {
        let (tree, root) = parse_markup(raw);
        let book = segment(&tree, root);
        let mut effects = Vec::new();
        app.handle_book_assembled(
            PathBuf::from(format!("/tmp/{name}")),
            name.to_string(),
            book,
            &mut effects,
        );
        effects
    }

    fn long_book(paragraphs: usize) -> String {
        (0..paragraphs)
            .map(|i| format!("<p>paragraph {i} {}</p>", "lorem ipsum dolor ".repeat(20)))
            .collect()
    }

    fn scrolled(app: &mut App, y_px: f32, viewport: f32, content: f32) -> Vec<Effect> {
        let scrollable = (content - viewport).max(1.0);
        let mut effects = Vec::new();
        app.handle_scrolled(
            RelativeOffset {
                x: 0.0,
                y: y_px / scrollable,
            },
            900.0,
            viewport,
            900.0,
            content,
            &mut effects,
        );
        effects
    }

    #[test]
    fn scrolling_is_a_noop_before_a_book_loads() {
        let mut app = build_test_app("noop");
        let effects = scrolled(&mut app, 300.0, 500.0, 2000.0);
        assert!(effects.is_empty());
        assert!(!app.header_hidden);
    }

    #[test]
    fn header_hides_past_the_threshold_and_returns_on_scroll_up() {
        let mut app = build_test_app("header");
        assemble_book(&mut app, &long_book(30), "header.epub");

        scrolled(&mut app, 50.0, 500.0, 4000.0);
        assert!(!app.header_hidden, "50px is under the floor");

        scrolled(&mut app, 150.0, 500.0, 4000.0);
        assert!(app.header_hidden, "increase past 100px hides the header");

        scrolled(&mut app, 120.0, 500.0, 4000.0);
        assert!(!app.header_hidden, "any decrease shows the header again");
    }

    #[test]
    fn every_scroll_tick_persists_the_offset() {
        let mut app = build_test_app("persist");
        assemble_book(&mut app, &long_book(30), "persist.epub");

        let effects = scrolled(&mut app, 777.0, 500.0, 4000.0);
        assert!(
            effects
                .iter()
                .any(|effect| matches!(effect, Effect::SavePosition))
        );
        app.persist_position();
        let saved = app.positions.load_offset("persist.epub").expect("offset saved");
        assert!((saved - 777.0).abs() < 1.0);
    }

    #[test]
    fn saved_position_restores_for_the_same_book_only() {
        let mut app = build_test_app("restore");
        assemble_book(&mut app, &long_book(60), "Moby-Dick.epub");
        scrolled(&mut app, 4200.0, 500.0, 20_000.0);
        app.persist_position();

        // Same book in a fresh app restores the offset and schedules a snap.
        let mut reopened = reopen_test_app("restore");
        let effects = assemble_book(&mut reopened, &long_book(60), "Moby-Dick.epub");
        let session = reopened.session.as_ref().expect("session installed");
        assert_eq!(session.pending_restore_px, Some(4200.0));
        assert!((session.scroll.last_offset_px - 4200.0).abs() < f32::EPSILON);
        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::ScrollTo(offset) if offset.y > 0.0
        )));

        // A different book with nothing saved starts at the top.
        let mut other = reopen_test_app("restore");
        let effects = assemble_book(&mut other, &long_book(60), "Dune.epub");
        let session = other.session.as_ref().expect("session installed");
        assert_eq!(session.pending_restore_px, None);
        assert_eq!(session.scroll.last_offset_px, 0.0);
        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::ScrollTo(offset) if offset.y == 0.0
        )));
    }

    #[test]
    fn restore_correction_fires_once_on_the_first_real_scroll() {
        let mut app = build_test_app("correction");
        assemble_book(&mut app, &long_book(60), "Correction.epub");
        scrolled(&mut app, 4200.0, 500.0, 20_000.0);
        app.persist_position();

        let mut reopened = reopen_test_app("correction");
        assemble_book(&mut reopened, &long_book(60), "Correction.epub");

        // First scroll report lands somewhere off-target; a corrective snap
        // is issued against the real scrollable height.
        let effects = scrolled(&mut reopened, 100.0, 500.0, 18_000.0);
        let snap = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::ScrollTo(offset) => Some(*offset),
                _ => None,
            })
            .expect("corrective snap scheduled");
        assert!((snap.y - 4200.0 / 17_500.0).abs() < 0.001);

        // The correction is one-shot.
        let session = reopened.session.as_ref().expect("session");
        assert_eq!(session.pending_restore_px, None);
        let effects = scrolled(&mut reopened, 4200.0, 500.0, 18_000.0);
        assert!(
            !effects
                .iter()
                .any(|effect| matches!(effect, Effect::ScrollTo(_)))
        );
    }

    #[test]
    fn blocks_near_the_viewport_wrap_once_and_only_near_ones() {
        let mut app = build_test_app("wrap");
        assemble_book(&mut app, &long_book(200), "wrap.epub");

        let session = app.session.as_ref().expect("session");
        let wrapped_blocks = session
            .items
            .iter()
            .filter_map(|item| match item {
                super::RenderItem::Block(node) => {
                    session.book.tree.get(*node).wrapped.then_some(*node)
                }
                _ => None,
            })
            .count();
        let total_blocks = session.items.len();
        // The initial sweep covers the top of the document, not all of it.
        assert!(wrapped_blocks > 0, "initial sweep wraps the visible top");
        assert!(
            wrapped_blocks < total_blocks,
            "far-away blocks stay unwrapped until scrolled near"
        );

        // Scrolling to the bottom wraps the tail; sweeping again is a no-op.
        let est = app
            .session
            .as_ref()
            .expect("session")
            .scroll
            .est_content_height;
        scrolled(&mut app, est - 600.0, 600.0, est);
        let again = app.wrap_blocks_near_viewport();
        assert_eq!(again, 0, "second sweep over the same region wraps nothing");
    }

    #[test]
    fn wrapped_state_survives_only_within_a_session() {
        let mut app = build_test_app("fresh");
        assemble_book(&mut app, &long_book(10), "fresh.epub");
        let first_block = {
            let session = app.session.as_ref().expect("session");
            match session.items[0] {
                super::RenderItem::Block(node) => node,
                _ => panic!("first item should be a block"),
            }
        };
        {
            let session = app.session.as_mut().expect("session");
            wrap_words(&mut session.book.tree, first_block);
        }

        // Loading another book rebuilds the tree; nothing carries over.
        assemble_book(&mut app, &long_book(10), "fresh2.epub");
        let session = app.session.as_ref().expect("session");
        assert_eq!(session.book_name, "fresh2.epub");
    }

    #[test]
    fn load_failure_clears_progress_and_keeps_prior_session() {
        let mut app = build_test_app("failure");
        assemble_book(&mut app, &long_book(5), "kept.epub");

        app.handle_book_load_failed(
            PathBuf::from("/tmp/broken.epub"),
            "not a zip archive".to_string(),
        );
        assert!(!app.book_loading);
        assert!(app.load_stage.is_none());
        assert!(app.load_error.as_deref().unwrap_or("").contains("broken.epub"));
        assert_eq!(
            app.session.as_ref().map(|s| s.book_name.as_str()),
            Some("kept.epub"),
            "a failed load never tears down the open book"
        );
    }

    #[test]
    fn dispatch_covers_scroll_messages() {
        let mut app = build_test_app("dispatch");
        assemble_book(&mut app, &long_book(30), "dispatch.epub");
        let _ = app.update(Message::Scrolled {
            offset: RelativeOffset { x: 0.0, y: 0.2 },
            viewport_width: 900.0,
            viewport_height: 500.0,
            content_width: 900.0,
            content_height: 4000.0,
        });
        assert!(app.session.as_ref().expect("session").scroll.last_offset_px > 0.0);
    }
}

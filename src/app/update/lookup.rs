use super::Effect;
use super::super::state::App;
use tracing::{debug, info};

impl App {
    /// A word unit was activated: open the popup in its loading state right
    /// away, then ask the assistant for a definition.
    pub(super) fn handle_word_clicked(&mut self, word: String, effects: &mut Vec<Effect>) {
        if word.trim().is_empty() {
            return;
        }
        debug!(word = %word, "Word lookup requested");
        self.popup.open_loading(word.clone(), "Loading definition...");
        effects.push(Effect::RequestDefinition(word));
    }

    /// A section-break marker was activated: mark the section consumed and
    /// request its summary.
    pub(super) fn handle_trigger_clicked(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(section) = session.book.sections.get_mut(index) else {
            return;
        };
        section.consumed = true;
        let text = section.text.clone();
        info!(
            section = section.index,
            chars = text.len(),
            "Section summary requested"
        );
        self.popup.open_loading("Section Summary", "Generating summary...");
        effects.push(Effect::RequestSummary(text));
    }

    /// A lookup resolved. No request ids are tracked: when requests overlap,
    /// whichever response lands last owns the popup.
    pub(super) fn handle_lookup_finished(&mut self, title: String, body: String) {
        if !self.popup.visible {
            // Closed while the request was in flight; drop the response.
            return;
        }
        self.popup.resolve(title, body);
    }
}

#[cfg(test)]
mod tests {
    use super::super::Effect;
    use super::super::super::state::App;
    use crate::assistant::LOOKUP_FAILED;
    use crate::cache::PositionStore;
    use crate::config::AppConfig;
    use crate::markup::parse_markup;
    use crate::sectionizer::segment;
    use std::path::PathBuf;

    fn app_with_sectioned_book() -> App {
        let (mut app, _task) = App::bootstrap(AppConfig::default(), None);
        let store = std::env::temp_dir().join(format!(
            "booklens-lookup-test-{}.toml",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&store);
        app.positions = PositionStore::new(store);
        let raw: String = (0..12)
            .map(|_| format!("<p>{}</p>", "whale ".repeat(100)))
            .collect();
        let (tree, root) = parse_markup(&raw);
        let book = segment(&tree, root);
        let mut effects = Vec::new();
        app.handle_book_assembled(
            PathBuf::from("/tmp/lookup.epub"),
            "lookup.epub".to_string(),
            book,
            &mut effects,
        );
        app
    }

    #[test]
    fn word_click_opens_a_loading_popup_and_requests_a_definition() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();
        app.handle_word_clicked("whale.".to_string(), &mut effects);

        assert!(app.popup.visible);
        assert!(app.popup.loading);
        assert_eq!(app.popup.title, "whale.");
        assert!(matches!(effects.as_slice(), [Effect::RequestDefinition(w)] if w == "whale."));
    }

    #[test]
    fn empty_word_does_nothing() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();
        app.handle_word_clicked("  ".to_string(), &mut effects);
        assert!(!app.popup.visible);
        assert!(effects.is_empty());
    }

    #[test]
    fn trigger_click_marks_the_section_consumed() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();
        app.handle_trigger_clicked(0, &mut effects);

        assert!(app.popup.visible && app.popup.loading);
        assert_eq!(app.popup.title, "Section Summary");
        let session = app.session.as_ref().expect("session");
        assert!(session.book.sections[0].consumed);
        assert!(matches!(
            effects.as_slice(),
            [Effect::RequestSummary(text)] if text == &session.book.sections[0].text
        ));
    }

    #[test]
    fn unknown_trigger_index_is_ignored() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();
        app.handle_trigger_clicked(99, &mut effects);
        assert!(!app.popup.visible);
        assert!(effects.is_empty());
    }

    #[test]
    fn overlapping_lookups_resolve_last_responder_wins() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();

        // Word A clicked, then section B's trigger before A's response lands.
        app.handle_word_clicked("whale".to_string(), &mut effects);
        app.handle_trigger_clicked(0, &mut effects);
        assert_eq!(app.popup.title, "Section Summary");

        // A's late response briefly owns the popup, then B's overwrites it.
        app.handle_lookup_finished("whale".to_string(), "A large marine mammal.".to_string());
        app.handle_lookup_finished(
            "Section Summary".to_string(),
            "The crew hunts the whale.".to_string(),
        );

        assert!(!app.popup.loading);
        assert_eq!(app.popup.title, "Section Summary");
        assert_eq!(app.popup.body, "The crew hunts the whale.");
    }

    #[test]
    fn failed_lookup_replaces_loading_with_the_fixed_message() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();
        app.handle_word_clicked("whale".to_string(), &mut effects);

        app.handle_lookup_finished("whale".to_string(), LOOKUP_FAILED.to_string());
        assert!(!app.popup.loading, "the popup never sticks in loading");
        assert_eq!(app.popup.body, LOOKUP_FAILED);
    }

    #[test]
    fn responses_after_close_are_dropped() {
        let mut app = app_with_sectioned_book();
        let mut effects = Vec::new();
        app.handle_word_clicked("whale".to_string(), &mut effects);
        app.popup.close();

        app.handle_lookup_finished("whale".to_string(), "too late".to_string());
        assert!(!app.popup.visible);
        assert_ne!(app.popup.body, "too late");
    }
}

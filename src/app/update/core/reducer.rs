use super::super::super::messages::Message;
use super::super::super::state::App;
use super::super::Effect;
use iced::keyboard::Key;
use iced::keyboard::key::Named;
use std::path::PathBuf;
use tracing::info;

impl App {
    pub(super) fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::OpenPathInputChanged(path) => self.open_path_input = path,
            Message::OpenPathRequested => self.handle_open_path_requested(&mut effects),
            Message::ArchiveExtracted { path, book } => {
                self.handle_archive_extracted(path, book, &mut effects)
            }
            Message::BookAssembled { path, name, book } => {
                self.handle_book_assembled(path, name, book, &mut effects)
            }
            Message::BookLoadFailed { path, error } => self.handle_book_load_failed(path, error),
            Message::DismissLoadError => self.load_error = None,
            Message::WordClicked(word) => self.handle_word_clicked(word, &mut effects),
            Message::TriggerClicked(section) => {
                self.handle_trigger_clicked(section, &mut effects)
            }
            Message::LookupFinished { title, body } => self.handle_lookup_finished(title, body),
            Message::ClosePopup => self.popup.close(),
            Message::ToggleTheme => self.handle_toggle_theme(),
            Message::WindowResized { width, height } => {
                self.handle_window_resized(width, height)
            }
            Message::KeyPressed { key, .. } => self.handle_key_pressed(key),
            Message::Scrolled {
                offset,
                viewport_width,
                viewport_height,
                content_width,
                content_height,
            } => self.handle_scrolled(
                offset,
                viewport_width,
                viewport_height,
                content_width,
                content_height,
                &mut effects,
            ),
        }

        effects
    }

    fn handle_open_path_requested(&mut self, effects: &mut Vec<Effect>) {
        if self.book_loading {
            return;
        }
        let candidate = PathBuf::from(self.open_path_input.trim());
        if candidate.as_os_str().is_empty() {
            return;
        }
        if candidate.exists() {
            info!(path = %candidate.display(), "Opening book");
            effects.push(Effect::LoadBook(candidate));
        } else {
            self.load_error = Some(format!("File not found: {}", candidate.display()));
        }
    }

    fn handle_toggle_theme(&mut self) {
        self.config.theme = match self.config.theme {
            crate::config::ThemeMode::Day => crate::config::ThemeMode::Night,
            crate::config::ThemeMode::Night => crate::config::ThemeMode::Day,
        };
    }

    fn handle_window_resized(&mut self, width: f32, height: f32) {
        if width.is_finite() && width > 0.0 {
            self.config.window_width = width;
        }
        if height.is_finite() && height > 0.0 {
            self.config.window_height = height;
        }
        self.rebuild_block_geometry();
        self.wrap_blocks_near_viewport();
    }

    fn handle_key_pressed(&mut self, key: Key) {
        if matches!(key, Key::Named(Named::Escape)) {
            if self.popup.visible {
                self.popup.close();
            } else if self.load_error.is_some() {
                self.load_error = None;
            }
        }
    }
}

mod constants;
mod session;
mod ui;

use crate::assistant::Assistant;
use crate::cache::PositionStore;
use crate::config::AppConfig;
use crate::epub_loader::LoadStage;
use iced::Task;
use std::path::PathBuf;
use tracing::warn;

use super::messages::Message;

pub(crate) use constants::*;
pub(in crate::app) use session::{ReadingSession, RenderItem};
pub(in crate::app) use ui::PopupState;

/// Core application state composed of sub-models.
pub struct App {
    pub(super) config: AppConfig,
    pub(super) assistant: Assistant,
    pub(super) positions: PositionStore,
    pub(super) open_path_input: String,
    pub(super) book_loading: bool,
    pub(super) load_stage: Option<LoadStage>,
    pub(super) load_error: Option<String>,
    pub(super) session: Option<ReadingSession>,
    pub(super) popup: PopupState,
    pub(super) header_hidden: bool,
}

impl App {
    pub(super) fn bootstrap(
        mut config: AppConfig,
        initial_book: Option<PathBuf>,
    ) -> (App, Task<Message>) {
        clamp_config(&mut config);
        let assistant = Assistant::from_config(&config.assistant);
        if !assistant.has_credential() {
            warn!("No assistant credential configured; lookups will fail politely");
        }

        let mut app = App {
            config,
            assistant,
            positions: PositionStore::open_default(),
            open_path_input: String::new(),
            book_loading: false,
            load_stage: None,
            load_error: None,
            session: None,
            popup: PopupState::default(),
            header_hidden: false,
        };

        let init_task = match initial_book {
            Some(path) => {
                app.open_path_input = path.to_string_lossy().into_owned();
                Task::done(Message::OpenPathRequested)
            }
            None => Task::none(),
        };
        (app, init_task)
    }

    pub(super) fn theme_is_night(&self) -> bool {
        matches!(self.config.theme, crate::config::ThemeMode::Night)
    }
}

fn clamp_config(config: &mut AppConfig) {
    config.font_size = config.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    config.line_spacing = config.line_spacing.clamp(MIN_LINE_SPACING, MAX_LINE_SPACING);
    config.window_width = config.window_width.clamp(320.0, 7680.0);
    config.window_height = config.window_height.clamp(240.0, 4320.0);
}

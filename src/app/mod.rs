mod messages;
mod state;
mod update;
mod view;

pub use state::App;

use crate::config::AppConfig;
use iced::{Size, Theme, window};
use std::path::PathBuf;

/// Launch the reader, optionally opening a book straight away.
pub fn run_app(config: AppConfig, initial_book: Option<PathBuf>) -> iced::Result {
    let window_settings = window::Settings {
        size: Size::new(config.window_width, config.window_height),
        ..window::Settings::default()
    };

    iced::application("booklens", App::update, App::view)
        .window(window_settings)
        .subscription(App::subscription)
        .theme(|app: &App| {
            if app.theme_is_night() {
                Theme::Dark
            } else {
                Theme::Light
            }
        })
        .run_with(move || App::bootstrap(config, initial_book))
}

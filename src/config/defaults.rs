//! Default values for [`super::AppConfig`] fields.

use super::LogLevel;

pub(super) fn default_font_size() -> u32 {
    18
}

pub(super) fn default_line_spacing() -> f32 {
    1.4
}

pub(super) fn default_margin_horizontal() -> u16 {
    48
}

pub(super) fn default_margin_vertical() -> u16 {
    24
}

pub(super) fn default_window_width() -> f32 {
    1100.0
}

pub(super) fn default_window_height() -> f32 {
    800.0
}

pub(super) fn default_log_level() -> LogLevel {
    LogLevel::Info
}

pub(super) fn default_assistant_endpoint() -> String {
    "https://api.mistral.ai/v1/chat/completions".to_string()
}

pub(super) fn default_assistant_model() -> String {
    "mistral-large-latest".to_string()
}

pub(super) fn default_assistant_timeout_secs() -> u64 {
    30
}

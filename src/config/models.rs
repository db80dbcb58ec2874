use serde::Deserialize;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "crate::config::defaults::default_font_size")]
    pub font_size: u32,
    #[serde(default = "crate::config::defaults::default_line_spacing")]
    pub line_spacing: f32,
    #[serde(default = "crate::config::defaults::default_margin_horizontal")]
    pub margin_horizontal: u16,
    #[serde(default = "crate::config::defaults::default_margin_vertical")]
    pub margin_vertical: u16,
    #[serde(default = "crate::config::defaults::default_window_width")]
    pub window_width: f32,
    #[serde(default = "crate::config::defaults::default_window_height")]
    pub window_height: f32,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            theme: ThemeMode::Night,
            font_size: crate::config::defaults::default_font_size(),
            line_spacing: crate::config::defaults::default_line_spacing(),
            margin_horizontal: crate::config::defaults::default_margin_horizontal(),
            margin_vertical: crate::config::defaults::default_margin_vertical(),
            window_width: crate::config::defaults::default_window_width(),
            window_height: crate::config::defaults::default_window_height(),
            log_level: crate::config::defaults::default_log_level(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// Settings for the chat-completion capability behind definitions and
/// summaries.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AssistantConfig {
    #[serde(default = "crate::config::defaults::default_assistant_endpoint")]
    pub endpoint: String,
    #[serde(default = "crate::config::defaults::default_assistant_model")]
    pub model: String,
    /// Empty means "use the MISTRAL_API_KEY environment variable".
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "crate::config::defaults::default_assistant_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            endpoint: crate::config::defaults::default_assistant_endpoint(),
            model: crate::config::defaults::default_assistant_model(),
            api_key: String::new(),
            timeout_secs: crate::config::defaults::default_assistant_timeout_secs(),
        }
    }
}

/// Theme mode.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    Day,
    Night,
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::Night
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Day => "Day",
            ThemeMode::Night => "Night",
        };
        write!(f, "{}", label)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

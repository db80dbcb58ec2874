use crate::epub_loader::RawBook;
use crate::sectionizer::SectionedBook;
use iced::keyboard::{Key, Modifiers};
use iced::widget::scrollable::RelativeOffset;
use std::path::PathBuf;

/// Messages emitted by the UI and by background tasks.
#[derive(Debug, Clone)]
pub enum Message {
    OpenPathInputChanged(String),
    OpenPathRequested,
    /// The archive stage finished: all markup entries are concatenated.
    ArchiveExtracted {
        path: PathBuf,
        book: RawBook,
    },
    /// The parse/segment stage finished: the annotated tree is ready.
    BookAssembled {
        path: PathBuf,
        name: String,
        book: SectionedBook,
    },
    BookLoadFailed {
        path: PathBuf,
        error: String,
    },
    DismissLoadError,
    WordClicked(String),
    TriggerClicked(usize),
    /// An assistant response (or its fixed failure text) for the popup.
    /// Deliberately carries no request id: overlapping lookups resolve
    /// last-responder-wins.
    LookupFinished {
        title: String,
        body: String,
    },
    ClosePopup,
    ToggleTheme,
    WindowResized {
        width: f32,
        height: f32,
    },
    KeyPressed {
        key: Key,
        modifiers: Modifiers,
    },
    Scrolled {
        offset: RelativeOffset,
        viewport_width: f32,
        viewport_height: f32,
        content_width: f32,
        content_height: f32,
    },
}

use crate::epub_loader::RawBook;
use iced::widget::scrollable::RelativeOffset;
use std::path::PathBuf;

mod book;
mod core;
mod lookup;
mod scroll;

/// Describes work that must be performed outside the pure reducer.
pub(super) enum Effect {
    LoadBook(PathBuf),
    AssembleBook { path: PathBuf, book: RawBook },
    RequestDefinition(String),
    RequestSummary(String),
    SavePosition,
    ScrollTo(RelativeOffset),
}

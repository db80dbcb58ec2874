use super::super::super::messages::Message;
use super::super::super::state::{App, TEXT_SCROLL_ID};
use super::super::Effect;
use crate::assistant::LOOKUP_FAILED;
use crate::epub_loader::{self, LoadStage};
use crate::markup::parse_markup;
use crate::sectionizer::segment;
use iced::{Event, Task, event, keyboard, window};
use tracing::{info, warn};

impl App {
    pub(super) fn run_effect(&mut self, effect: Effect) -> Task<Message> {
        match effect {
            Effect::LoadBook(path) => {
                self.book_loading = true;
                self.load_error = None;
                self.load_stage = Some(LoadStage::Started);
                Task::perform(
                    async move {
                        let loaded = epub_loader::load_book_markup(&path, |stage| {
                            info!(
                                checkpoint = stage.label(),
                                percent = stage.percent(),
                                "Load progress"
                            );
                        });
                        match loaded {
                            Ok(book) => Message::ArchiveExtracted { path, book },
                            Err(err) => Message::BookLoadFailed {
                                path,
                                error: format!("{err:#}"),
                            },
                        }
                    },
                    |message| message,
                )
            }
            Effect::AssembleBook { path, book } => Task::perform(
                async move {
                    let (tree, root) = parse_markup(&book.markup);
                    let sectioned = segment(&tree, root);
                    info!(
                        name = %book.name,
                        sections = sectioned.sections.len(),
                        nodes = sectioned.tree.len(),
                        "Assembled section tree"
                    );
                    Message::BookAssembled {
                        path,
                        name: book.name,
                        book: sectioned,
                    }
                },
                |message| message,
            ),
            Effect::RequestDefinition(word) => {
                let assistant = self.assistant.clone();
                Task::perform(
                    async move {
                        let body = match assistant.define_word(&word).await {
                            Ok(text) => text,
                            Err(err) => {
                                warn!(word = %word, %err, "Definition lookup failed");
                                LOOKUP_FAILED.to_string()
                            }
                        };
                        Message::LookupFinished { title: word, body }
                    },
                    |message| message,
                )
            }
            Effect::RequestSummary(text) => {
                let assistant = self.assistant.clone();
                Task::perform(
                    async move {
                        let body = match assistant.summarize_section(&text).await {
                            Ok(summary) => summary,
                            Err(err) => {
                                warn!(%err, "Summary lookup failed");
                                LOOKUP_FAILED.to_string()
                            }
                        };
                        Message::LookupFinished {
                            title: "Section Summary".to_string(),
                            body,
                        }
                    },
                    |message| message,
                )
            }
            Effect::SavePosition => {
                self.persist_position();
                Task::none()
            }
            Effect::ScrollTo(offset) => {
                iced::widget::scrollable::snap_to(TEXT_SCROLL_ID.clone(), offset)
            }
        }
    }
}

pub(super) fn runtime_event_to_message(
    event: Event,
    status: event::Status,
    _window_id: window::Id,
) -> Option<Message> {
    if status == event::Status::Captured {
        return None;
    }
    match event {
        Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized {
            width: size.width,
            height: size.height,
        }),
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            Some(Message::KeyPressed { key, modifiers })
        }
        _ => None,
    }
}

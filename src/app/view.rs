use super::messages::Message;
use super::state::{App, BLOCK_SPACING_PX, RenderItem, TEXT_SCROLL_ID, TRIGGER_LABEL};
use crate::epub_loader::LoadStage;
use crate::markup::{MarkupTree, NodeId, NodeKind};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::text::{LineHeight, Span, Wrapping};
use iced::widget::{
    Column, button, center, column, container, horizontal_space, mouse_area, opaque,
    progress_bar, row, scrollable, stack, text, text_input,
};
use iced::{Color, Element, Length};

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let mut page: Column<'_, Message> = Column::new().height(Length::Fill);
        if !self.header_hidden {
            page = page.push(self.header());
        }
        if self.book_loading
            && let Some(stage) = self.load_stage
        {
            page = page.push(self.progress_row(stage));
        }
        page = page.push(self.reading_pane());

        let base: Element<'_, Message> = page.into();
        if self.popup.visible {
            modal(base, self.popup_card(), Message::ClosePopup)
        } else if let Some(error) = &self.load_error {
            modal(base, alert_card(error), Message::DismissLoadError)
        } else {
            base
        }
    }

    fn header(&self) -> Element<'_, Message> {
        let theme_label = if self.theme_is_night() {
            "Day Mode"
        } else {
            "Night Mode"
        };
        let open_button = if self.book_loading {
            button("Open")
        } else {
            button("Open").on_press(Message::OpenPathRequested)
        };

        container(
            row![
                text("booklens").size(22.0),
                horizontal_space(),
                text_input("path/to/book.epub", &self.open_path_input)
                    .on_input(Message::OpenPathInputChanged)
                    .on_submit(Message::OpenPathRequested)
                    .width(Length::Fixed(360.0)),
                open_button,
                button(theme_label).on_press(Message::ToggleTheme),
            ]
            .spacing(10)
            .align_y(Vertical::Center),
        )
        .width(Length::Fill)
        .padding([10, 16])
        .into()
    }

    fn progress_row(&self, stage: LoadStage) -> Element<'_, Message> {
        column![
            progress_bar(0.0..=100.0, stage.percent()).height(Length::Fixed(6.0)),
            text(stage.label()).size(12.0),
        ]
        .spacing(4)
        .padding([0, 16])
        .into()
    }

    fn reading_pane(&self) -> Element<'_, Message> {
        let Some(session) = &self.session else {
            return center(text("Open an EPUB to start reading.").size(18.0)).into();
        };

        let mut blocks: Column<'_, Message> =
            Column::new().spacing(BLOCK_SPACING_PX).width(Length::Fill);
        for item in &session.items {
            blocks = blocks.push(match item {
                RenderItem::Block(node) => self.block_view(&session.book.tree, *node),
                RenderItem::Trigger(index) => self.trigger_view(*index, session),
            });
        }

        scrollable(
            container(blocks).width(Length::Fill).padding([
                self.config.margin_vertical,
                self.config.margin_horizontal,
            ]),
        )
        .on_scroll(|viewport| Message::Scrolled {
            offset: viewport.relative_offset(),
            viewport_width: viewport.bounds().width,
            viewport_height: viewport.bounds().height,
            content_width: viewport.content_bounds().width,
            content_height: viewport.content_bounds().height,
        })
        .id(TEXT_SCROLL_ID.clone())
        .height(Length::Fill)
        .into()
    }

    /// One prose block: plain text runs until the lazy pass wraps it, then a
    /// mix of clickable word spans and preserved whitespace.
    fn block_view<'a>(&self, tree: &'a MarkupTree, node: NodeId) -> Element<'a, Message> {
        let size = self.config.font_size as f32;
        let line_height = LineHeight::Relative(self.config.line_spacing);

        let mut spans: Vec<Span<'a, Message>> = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match &tree.get(id).kind {
                NodeKind::Text(run) => {
                    spans.push(Span::new(run.as_str()).size(size).line_height(line_height));
                }
                NodeKind::Word(word) => {
                    spans.push(
                        Span::new(word.as_str())
                            .size(size)
                            .line_height(line_height)
                            .link(Message::WordClicked(word.clone())),
                    );
                }
                NodeKind::Element { tag, .. } => {
                    if tag == "br" {
                        spans.push(Span::new("\n").size(size).line_height(line_height));
                    }
                    for &child in tree.children(id).iter().rev() {
                        stack.push(child);
                    }
                }
                NodeKind::Trigger { .. } => {}
            }
        }

        iced::widget::text::Rich::with_spans(spans)
            .width(Length::Fill)
            .wrapping(Wrapping::WordOrGlyph)
            .align_x(Horizontal::Left)
            .into()
    }

    fn trigger_view(
        &self,
        index: usize,
        session: &super::state::ReadingSession,
    ) -> Element<'_, Message> {
        let consumed = session
            .book
            .sections
            .get(index)
            .map(|section| section.consumed)
            .unwrap_or(false);
        let marker = button(text(TRIGGER_LABEL).size(14.0)).on_press(Message::TriggerClicked(index));
        let marker = if consumed {
            marker.style(button::secondary)
        } else {
            marker.style(button::text)
        };
        container(marker)
            .width(Length::Fill)
            .align_x(Horizontal::Center)
            .into()
    }

    fn popup_card(&self) -> Element<'_, Message> {
        let body = text(self.popup.body.as_str()).size(15.0);
        let body = if self.popup.loading {
            body.style(text::secondary)
        } else {
            body
        };
        container(
            column![
                row![
                    text(self.popup.title.as_str()).size(18.0),
                    horizontal_space(),
                    button(text("\u{2715}").size(14.0))
                        .style(button::text)
                        .on_press(Message::ClosePopup),
                ]
                .spacing(8)
                .align_y(Vertical::Center),
                body,
            ]
            .spacing(12),
        )
        .width(Length::Fixed(480.0))
        .padding(20)
        .style(container::rounded_box)
        .into()
    }
}

fn alert_card(error: &str) -> Element<'_, Message> {
    container(
        column![
            text("Could not load book").size(18.0),
            text(error).size(15.0),
            row![
                horizontal_space(),
                button("OK").on_press(Message::DismissLoadError)
            ],
        ]
        .spacing(12),
    )
    .width(Length::Fixed(440.0))
    .padding(20)
    .style(container::rounded_box)
    .into()
}

/// Overlay `content` over `base`; clicking the dimmed backdrop emits
/// `on_blur`.
fn modal<'a>(
    base: Element<'a, Message>,
    content: Element<'a, Message>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base,
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| {
                container::Style {
                    background: Some(
                        Color {
                            a: 0.8,
                            ..Color::BLACK
                        }
                        .into(),
                    ),
                    ..container::Style::default()
                }
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}

use iced::widget::scrollable::Id as ScrollId;
use once_cell::sync::Lazy;

/// Proximity margin around the viewport inside which blocks get word-wrapped.
pub(crate) const WRAP_MARGIN_PX: f32 = 400.0;
/// Scrolling down past this offset hides the header chrome.
pub(crate) const HEADER_HIDE_THRESHOLD_PX: f32 = 100.0;
pub(crate) const MIN_FONT_SIZE: u32 = 12;
pub(crate) const MAX_FONT_SIZE: u32 = 36;
pub(crate) const MIN_LINE_SPACING: f32 = 0.8;
pub(crate) const MAX_LINE_SPACING: f32 = 2.5;
/// Label rendered on section-break markers.
pub(crate) const TRIGGER_LABEL: &str = "\u{2726} \u{2726} \u{2726} \u{2726} \u{2726}";
/// Estimated rendered height of a trigger row, for visibility math.
pub(crate) const EST_TRIGGER_HEIGHT_PX: f32 = 44.0;
pub(crate) const BLOCK_SPACING_PX: f32 = 12.0;
/// Rough average glyph width as a fraction of the font size.
pub(crate) const EST_GLYPH_WIDTH_RATIO: f32 = 0.55;
pub(crate) static TEXT_SCROLL_ID: Lazy<ScrollId> = Lazy::new(|| ScrollId::new("content-scroll"));

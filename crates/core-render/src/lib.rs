//! Frame painting onto a [`core_terminal::Screen`].
//!
//! The painter reads everything from the dispatcher's accessors: document
//! lines, highlight spans, selection, search matches, mode, prompt and
//! status. It owns no editor state besides the colors and a reusable overlay
//! buffer, so a frame is a pure function of the dispatcher.

pub mod painter;
pub mod status;
pub mod style;
pub mod theme;

pub use painter::Painter;
pub use status::{StatusContext, StatusSegment, build_status, compose_status, format_status};
pub use style::{StyleAttr, StyleLayer, StyleSpan};
pub use theme::Theme;

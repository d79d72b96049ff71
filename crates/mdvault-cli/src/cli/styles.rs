//! Semantic terminal styles.
//!
//! Renderers pick a style by what the text *is* (a title, a time, a count),
//! never by color. `console` drops the escapes when stdout is not a terminal.

use console::Style;

pub fn title() -> Style {
    Style::new().bold()
}

pub fn muted() -> Style {
    Style::new().color256(244)
}

pub fn time() -> Style {
    Style::new().color256(244).italic()
}

pub fn folder() -> Style {
    Style::new().cyan().bold()
}

pub fn count() -> Style {
    Style::new().color256(178)
}

pub fn success() -> Style {
    Style::new().green()
}

pub fn warning() -> Style {
    Style::new().yellow().bold()
}

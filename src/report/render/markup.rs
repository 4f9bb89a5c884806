//! Typst source fragments.
//!
//! Every piece of text reaches the document as a string literal in code
//! mode, so answers containing `*`, `_`, `$` or `#` print as typed.

use crate::report::layout::Rgb;

use super::story::{Align, FontFace};

/// Quote `text` as a Typst string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Length in points.
pub fn length(points: f32) -> String {
    format!("{:.2}pt", points)
}

pub fn color(rgb: Rgb) -> String {
    format!(
        "rgb({:.1}%, {:.1}%, {:.1}%)",
        rgb.0 * 100.0,
        rgb.1 * 100.0,
        rgb.2 * 100.0
    )
}

pub fn align(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

/// `text(...)` call for a string in the given face.
pub fn text(body: &str, face: FontFace, size: f32) -> String {
    let (weight, style) = match face {
        FontFace::Regular => ("regular", "normal"),
        FontFace::Bold => ("bold", "normal"),
        FontFace::Italic => ("regular", "italic"),
    };
    format!(
        "text(size: {}, weight: \"{}\", style: \"{}\", {})",
        length(size),
        weight,
        style,
        string_literal(body)
    )
}

//! Stylesheet for presentation layers that render units as markup.
//!
//! Every unit carries the classes `log-line <severity>`; the rules below
//! give each severity its accent.

use logtint_types::{DisplayUnit, Severity};

use crate::render::{escape_html, to_markup};
use crate::surface::LogSurface;

/// Id under which the stylesheet is injected into a surface
pub const STYLESHEET_ID: &str = "logtint-styles";

/// Class of the element holding the rendered projection
pub const PROJECTION_CLASS: &str = "logtint-projection";

/// Class carried by every rendered unit
pub const UNIT_CLASS: &str = "log-line";

/// Build the stylesheet from the severity table
pub fn stylesheet() -> String {
    let mut css = format!(
        ".{PROJECTION_CLASS} {{\n  font-size: 12px;\n  line-height: 1.5;\n  white-space: pre-wrap;\n  word-break: break-word;\n  background-color: #f8f9fa;\n  border-radius: 5px;\n}}\n\
         .{UNIT_CLASS} {{\n  display: block;\n  padding: 1px 8px 1px 0;\n  border-left: 3px solid transparent;\n}}\n"
    );

    for severity in Severity::ALL {
        let alpha = if severity.is_emphasized() { "0.15" } else { "0.1" };
        css.push_str(&format!(
            ".{UNIT_CLASS}.{name} {{\n  background-color: {bg};\n  border-left-color: {accent};{weight}\n}}\n",
            name = severity.as_str(),
            bg = tint(severity.accent_hex(), alpha),
            accent = severity.accent_hex(),
            weight = if severity.is_emphasized() {
                "\n  font-weight: bold;"
            } else {
                ""
            },
        ));
    }

    css
}

/// Inject the stylesheet unless the surface already carries it.
/// Returns true when an injection happened.
pub fn ensure_stylesheet<S: LogSurface + ?Sized>(surface: &mut S) -> bool {
    if surface.has_stylesheet(STYLESHEET_ID) {
        return false;
    }
    surface.inject_stylesheet(STYLESHEET_ID, &stylesheet());
    true
}

/// Standalone HTML page holding the units with the stylesheet embedded
pub fn export_document(title: &str, units: &[DisplayUnit]) -> String {
    let mut body = String::new();
    for unit in units {
        body.push_str(&to_markup(unit));
        body.push('\n');
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style id=\"{STYLESHEET_ID}\">\n{css}</style>\n</head>\n<body>\n\
         <div class=\"{PROJECTION_CLASS}\">\n{body}</div>\n</body>\n</html>\n",
        title = escape_html(title),
        css = stylesheet(),
    )
}

/// `#rrggbb` to `rgba(r, g, b, alpha)`
fn tint(hex: &str, alpha: &str) -> String {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or_default()
    };
    format!(
        "rgba({}, {}, {}, {})",
        channel(1..3),
        channel(3..5),
        channel(5..7),
        alpha
    )
}

use regex::Regex;
use std::sync::LazyLock;

use logtint_types::{DisplayUnit, Severity};

/// CSI and OSC escape sequences as emitted by colorizing loggers
static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
        .expect("escape sequence pattern is valid")
});

const TAB_WIDTH: usize = 4;

/// Render one line into a display unit, or nothing for blank input
pub fn render_line(line: &str, sequence_index: usize, severity: Severity) -> Option<DisplayUnit> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(DisplayUnit::new(sequence_index, severity, sanitize(trimmed)))
}

/// Strip escape sequences and control characters so log content cannot
/// drive the terminal
pub fn sanitize(text: &str) -> String {
    let stripped = ESCAPE_SEQUENCE.replace_all(text, "");

    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '\t' => out.extend(std::iter::repeat_n(' ', TAB_WIDTH)),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Markup form of a unit, tagged with its styling classes and sequence index
pub fn to_markup(unit: &DisplayUnit) -> String {
    format!(
        "<div class=\"{}\" data-seq=\"{}\">{}</div>",
        unit.class_attr(),
        unit.sequence_index,
        escape_html(&unit.text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_render_nothing() {
        assert!(render_line("", 0, Severity::Info).is_none());
        assert!(render_line("   \t ", 0, Severity::Info).is_none());
    }

    #[test]
    fn test_render_tags_unit() {
        let unit = render_line("  [FAILED] step  ", 7, Severity::Failed).unwrap();
        assert_eq!(unit.sequence_index, 7);
        assert_eq!(unit.severity, Severity::Failed);
        assert_eq!(unit.text, "[FAILED] step");
    }

    #[test]
    fn test_sanitize_strips_terminal_sequences() {
        assert_eq!(sanitize("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(sanitize("\x1b]0;title\x07after"), "after");
        assert_eq!(sanitize("bell\x07 and\x08 back"), "bell and back");
        assert_eq!(sanitize("a\tb"), "a    b");
    }

    #[test]
    fn test_markup_is_escaped() {
        let unit = render_line("<script>alert('x')</script> & done", 2, Severity::Error).unwrap();
        assert_eq!(
            to_markup(&unit),
            "<div class=\"log-line error\" data-seq=\"2\">&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; done</div>"
        );
    }
}

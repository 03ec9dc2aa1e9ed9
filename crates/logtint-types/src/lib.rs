//! Shared types for logtint
//!
//! This crate contains data structures used across multiple logtint crates.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Severity
// ============================================================================

/// Severity category assigned to every log line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Succeeded,
    Failed,
    Warning,
    Error,
    #[default]
    Info,
}

impl Severity {
    /// All severities in display order
    pub const ALL: [Severity; 5] = [
        Self::Succeeded,
        Self::Failed,
        Self::Warning,
        Self::Error,
        Self::Info,
    ];

    /// Stable lowercase name, also used as the styling class
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
        }
    }

    /// Short display string (3 chars)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "SUC",
            Self::Failed => "FLD",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Info => "INF",
        }
    }

    /// Accent color as a CSS hex string
    pub fn accent_hex(&self) -> &'static str {
        match self {
            Self::Succeeded => "#28a745",
            Self::Failed | Self::Error => "#dc3545",
            Self::Warning => "#ffc107",
            Self::Info => "#17a2b8",
        }
    }

    /// Get display color for this severity
    pub fn color(&self) -> Color {
        match self {
            Self::Succeeded => Color::Rgb(0x28, 0xa7, 0x45),
            Self::Failed | Self::Error => Color::Rgb(0xdc, 0x35, 0x45),
            Self::Warning => Color::Rgb(0xff, 0xc1, 0x07),
            Self::Info => Color::Rgb(0x17, 0xa2, 0xb8),
        }
    }

    /// Whether the line should be emphasized beyond its color
    pub fn is_emphasized(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts per severity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub warning: usize,
    pub error: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Succeeded => self.succeeded += 1,
            Severity::Failed => self.failed += 1,
            Severity::Warning => self.warning += 1,
            Severity::Error => self.error += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Succeeded => self.succeeded,
            Severity::Failed => self.failed,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
            Severity::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.warning + self.error + self.info
    }
}

// ============================================================================
// Lines
// ============================================================================

/// One non-blank line of the source text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// Position among non-blank lines of the snapshot (0-based, contiguous)
    pub sequence_index: usize,

    /// Line text as it appeared in the source
    pub raw_text: String,
}

impl LogLine {
    pub fn new(sequence_index: usize, raw_text: String) -> Self {
        Self {
            sequence_index,
            raw_text,
        }
    }

    /// Trimmed text, the part that is classified and rendered
    pub fn trimmed(&self) -> &str {
        self.raw_text.trim()
    }

    /// Identity fingerprint of this line
    pub fn key(&self) -> LineKey {
        LineKey::new(self.sequence_index, self.trimmed())
    }
}

/// Identity of a rendered line: position plus trimmed content
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub sequence_index: usize,
    pub text: String,
}

impl LineKey {
    pub fn new(sequence_index: usize, text: &str) -> Self {
        Self {
            sequence_index,
            text: text.to_string(),
        }
    }
}

/// Split source text into non-blank lines with contiguous sequence indices
pub fn split_lines(text: &str) -> Vec<LogLine> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(idx, line)| LogLine::new(idx, line.to_string()))
        .collect()
}

/// Cheap fingerprint of a source text snapshot
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ContentFingerprint {
    /// Total byte length of the text
    pub len: usize,

    /// Trimmed text of the last non-blank line
    pub last_line: String,
}

impl ContentFingerprint {
    pub fn of(text: &str) -> Self {
        let last_line = text
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        Self {
            len: text.len(),
            last_line: last_line.to_string(),
        }
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Identity of one mounted projection root
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectionId(pub u64);

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projection#{}", self.0)
    }
}

/// A rendered, display-safe log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayUnit {
    /// Sequence index of the source line (for traceability)
    pub sequence_index: usize,

    /// Severity, drives styling
    pub severity: Severity,

    /// Sanitized line text, free of control sequences
    pub text: String,
}

impl DisplayUnit {
    pub fn new(sequence_index: usize, severity: Severity, text: String) -> Self {
        Self {
            sequence_index,
            severity,
            text,
        }
    }

    /// Styling classes exposed to presentation layers
    pub fn class_attr(&self) -> String {
        format!("log-line {}", self.severity.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_skips_blank_lines() {
        let lines = split_lines("a\n\nb");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], LogLine::new(0, "a".to_string()));
        assert_eq!(lines[1], LogLine::new(1, "b".to_string()));
    }

    #[test]
    fn test_split_lines_whitespace_only_and_crlf() {
        let lines = split_lines("  \r\nfirst\r\n\t\n  second  \n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].trimmed(), "first");
        assert_eq!(lines[1].sequence_index, 1);
        assert_eq!(lines[1].key(), LineKey::new(1, "second"));
    }

    #[test]
    fn test_fingerprint_uses_last_non_blank_line() {
        let fp = ContentFingerprint::of("one\ntwo  \n\n   \n");
        assert_eq!(fp.last_line, "two");
        assert_eq!(fp.len, 15);

        assert_eq!(ContentFingerprint::of(""), ContentFingerprint::default());
    }

    #[test]
    fn test_fingerprint_detects_appended_line() {
        let before = ContentFingerprint::of("a\nb");
        let after = ContentFingerprint::of("a\nb\nc");
        assert_ne!(before, after);
    }

    #[test]
    fn test_severity_counts() {
        let mut counts = SeverityCounts::default();
        counts.increment(Severity::Failed);
        counts.increment(Severity::Failed);
        counts.increment(Severity::Info);
        assert_eq!(counts.get(Severity::Failed), 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_severity_class_attr() {
        let unit = DisplayUnit::new(3, Severity::Warning, "x".to_string());
        assert_eq!(unit.class_attr(), "log-line warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}

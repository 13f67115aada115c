//! ftrace text-output tokenizer
//!
//! Splits lines of `trace` / `trace_pipe` output into `EventRecord`s:
//!
//! ```text
//!        kswapd0-47    [001] ....  1234.567890: mm_vmscan_kswapd_wake: nid=0 order=3
//!           java-2310  ( 2290) [003] d..1  1234.600001: mm_vmscan_direct_reclaim_begin: ...
//! ```
//!
//! The tgid column and the irq-info flags column are optional. Header and
//! comment lines (starting with `#`) are skipped.

use regex::Regex;

use crate::types::{DecoderError, EventRecord, Result};

const LINE_PATTERN: &str = concat!(
    r"^\s*(.+?)-(\d+)\s+",        // task label and pid
    r"(?:\(\s*(?:\d+|-+)\)\s+)?", // optional tgid
    r"\[(\d+)\]\s+",              // cpu
    r"(?:[\w.]{4,5}\s+)?",        // optional irq-info flags
    r"(\d+\.\d+):\s+",            // timestamp in seconds
    r"(\w+):\s?(.*)$",            // event name and details
);

/// Result of tokenizing one line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Blank line or `#` comment
    Comment,
    /// A trace event
    Event(EventRecord),
    /// Anything else
    Malformed,
}

/// Tokenizer for ftrace text lines
#[derive(Debug, Clone)]
pub struct LineParser {
    line_re: Regex,
}

impl LineParser {
    pub fn new() -> Result<Self> {
        let line_re = Regex::new(LINE_PATTERN).map_err(|source| DecoderError::Pattern {
            pattern: LINE_PATTERN,
            source,
        })?;
        Ok(Self { line_re })
    }

    /// Tokenize a single line; timestamps are converted to milliseconds
    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let trimmed = line.trim_end();
        if trimmed.trim_start().is_empty() || trimmed.trim_start().starts_with('#') {
            return ParsedLine::Comment;
        }

        let Some(caps) = self.line_re.captures(trimmed) else {
            return ParsedLine::Malformed;
        };

        let (Ok(pid), Ok(cpu), Ok(secs)) = (
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
            caps[4].parse::<f64>(),
        ) else {
            return ParsedLine::Malformed;
        };

        ParsedLine::Event(EventRecord {
            name: caps[5].to_string(),
            cpu,
            pid,
            timestamp: secs * 1000.0,
            thread_label: caps[1].trim().to_string(),
            details: caps[6].to_string(),
        })
    }
}

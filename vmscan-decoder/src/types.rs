//! Core types for the vmscan trace decoder
//!
//! This module defines the records fed into the decoder and the slices it
//! emits. Event records are produced by the ftrace tokenizer (or by any other
//! collaborator) and are read-only to the reclaim tracker.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::color::ColorId;

/// Timestamp type used throughout the decoder (milliseconds)
pub type Timestamp = f64;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that can occur while setting up or feeding the decoder
///
/// Malformed event details are not errors: handlers report them through
/// their `bool` return value and the importer counts them.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to compile pattern {pattern:?}: {source}")]
    Pattern {
        pattern: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One tokenized trace line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name, e.g. `mm_vmscan_kswapd_wake`
    pub name: String,
    /// CPU the event was recorded on (informational only)
    pub cpu: u32,
    /// Process id of the originating task
    pub pid: u32,
    /// Event time in milliseconds
    pub timestamp: Timestamp,
    /// Originating kernel thread / task name
    pub thread_label: String,
    /// Free-text detail suffix
    pub details: String,
}

impl EventRecord {
    /// Create a new event record
    pub fn new(
        name: impl Into<String>,
        cpu: u32,
        pid: u32,
        timestamp: Timestamp,
        thread_label: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cpu,
            pid,
            timestamp,
            thread_label: thread_label.into(),
            details: details.into(),
        }
    }
}

/// Value of a slice argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Integer(u64),
    Text(String),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Integer(v) => write!(f, "{}", v),
            ArgValue::Text(v) => write!(f, "{}", v),
        }
    }
}

impl ArgValue {
    /// Get the integer value, if this is an integer argument
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ArgValue::Integer(v) => Some(*v),
            ArgValue::Text(_) => None,
        }
    }

    /// Get the text value, if this is a text argument
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Text(v) => Some(v),
            ArgValue::Integer(_) => None,
        }
    }
}

impl From<u32> for ArgValue {
    fn from(v: u32) -> Self {
        ArgValue::Integer(u64::from(v))
    }
}

impl From<u64> for ArgValue {
    fn from(v: u64) -> Self {
        ArgValue::Integer(v)
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Text(v)
    }
}

/// Slice arguments, ordered by key
pub type SliceArgs = BTreeMap<String, ArgValue>;

/// A closed, labeled time span on a thread's timeline
///
/// Slices are created once at close time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Reclaim phenomenon this slice belongs to
    pub category: String,
    /// Display label
    pub title: String,
    /// Color classification derived from `title`
    pub color: ColorId,
    /// Start time in milliseconds
    pub start: Timestamp,
    /// Duration in milliseconds
    pub duration: Timestamp,
    /// Attributes captured while the interval was open
    pub args: SliceArgs,
}

impl Slice {
    /// End time of the slice
    pub fn end(&self) -> Timestamp {
        self.start + self.duration
    }

    /// Look up an argument by name
    pub fn arg(&self, key: &str) -> Option<&ArgValue> {
        self.args.get(key)
    }
}

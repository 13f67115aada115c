//! Decoder configuration types
//!
//! This module defines the small amount of configuration the decoder needs:
//! which of the four vmscan events are handled and what to do with intervals
//! whose end precedes their start.

use serde::{Deserialize, Serialize};

use crate::dispatch::EventKind;

/// What to do with an interval whose close timestamp precedes its open one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeDurationPolicy {
    /// Emit the slice with a zero duration
    #[default]
    Clamp,
    /// Emit the slice with the negative duration unchanged
    Keep,
    /// Do not emit the slice
    Drop,
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Policy for non-monotonic open/close pairs
    #[serde(default)]
    pub negative_durations: NegativeDurationPolicy,

    /// Optional: only handle these event names
    #[serde(default)]
    pub enabled_events: Option<Vec<String>>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the negative duration policy
    pub fn with_negative_duration_policy(mut self, policy: NegativeDurationPolicy) -> Self {
        self.negative_durations = policy;
        self
    }

    /// Builder method: restrict handling to the given events
    pub fn with_enabled_events(mut self, events: &[EventKind]) -> Self {
        self.enabled_events = Some(events.iter().map(|e| e.name().to_string()).collect());
        self
    }

    /// Check if an event kind should be handled
    pub fn is_event_enabled(&self, kind: EventKind) -> bool {
        match &self.enabled_events {
            Some(names) => names.iter().any(|n| n == kind.name()),
            None => true,
        }
    }

    /// Reject event names that none of the handlers know
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(names) = &self.enabled_events {
            for name in names {
                if EventKind::from_name(name).is_none() {
                    return Err(crate::DecoderError::Config(format!(
                        "Unknown event name in enabled_events: {}",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

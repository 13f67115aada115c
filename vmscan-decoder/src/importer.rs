//! Trace importer
//!
//! Drives the tokenizer and the reclaim tracker over a whole trace and
//! collects the resulting timeline plus import statistics.

use serde::Serialize;
use std::path::Path;

use crate::config::DecoderConfig;
use crate::dispatch::EventKind;
use crate::ftrace::{LineParser, ParsedLine};
use crate::registry::{ReclaimCategory, Thread};
use crate::tracker::ReclaimTracker;
use crate::types::{EventRecord, Result, Timestamp};

/// Counters gathered while importing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Lines read, including comments
    pub lines: usize,
    /// Lines that were neither comments nor parseable events
    pub malformed_lines: usize,
    /// Event records seen
    pub events: usize,
    /// Events routed to a handler that accepted them
    pub handled_events: usize,
    /// Events whose details did not match their handler's pattern
    pub unhandled_events: usize,
    /// Events with no handler (or with a disabled one)
    pub unknown_events: usize,
    /// Slices emitted
    pub slices: usize,
}

/// A context whose interval was still open when the trace ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterval {
    pub category: ReclaimCategory,
    pub label: String,
    pub pid: u32,
    pub since: Timestamp,
}

/// The decoded reclaim timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    /// Threads sorted by pid, slices in close order
    pub threads: Vec<Thread>,
    /// Intervals never closed
    pub open_intervals: Vec<OpenInterval>,
    pub stats: ImportStats,
}

impl Timeline {
    /// Total number of slices across all threads
    pub fn slice_count(&self) -> usize {
        self.threads.iter().map(|t| t.slices().len()).sum()
    }
}

/// Feeds trace text through the reclaim tracker
#[derive(Debug, Clone)]
pub struct Importer {
    config: DecoderConfig,
    lines: LineParser,
    tracker: ReclaimTracker,
    stats: ImportStats,
}

impl Importer {
    /// Create an importer; fails only on invalid configuration
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            lines: LineParser::new()?,
            tracker: ReclaimTracker::new(config.negative_durations)?,
            config,
            stats: ImportStats::default(),
        })
    }

    /// Read and import a trace file
    pub fn import_file(&mut self, path: &Path) -> Result<()> {
        log::info!("Importing trace file: {:?}", path);
        let text = std::fs::read_to_string(path)?;
        self.import_str(&text);
        log::info!(
            "Imported {:?}: {} events, {} slices",
            path,
            self.stats.events,
            self.tracker.registry().stats().num_slices
        );
        Ok(())
    }

    /// Import trace text, line by line in order
    pub fn import_str(&mut self, text: &str) {
        for (index, line) in text.lines().enumerate() {
            self.stats.lines += 1;
            match self.lines.parse_line(line) {
                ParsedLine::Comment => {}
                ParsedLine::Event(record) => self.process_record(&record),
                ParsedLine::Malformed => {
                    self.stats.malformed_lines += 1;
                    log::debug!("Skipping malformed line {}: {}", index + 1, line);
                }
            }
        }
    }

    /// Route one event record to its handler
    pub fn process_record(&mut self, record: &EventRecord) {
        self.stats.events += 1;

        let kind = match EventKind::from_name(&record.name) {
            Some(kind) if self.config.is_event_enabled(kind) => kind,
            _ => {
                self.stats.unknown_events += 1;
                log::debug!("No handler for event: {}", record.name);
                return;
            }
        };

        if self.tracker.handle(kind, record) {
            self.stats.handled_events += 1;
        } else {
            self.stats.unhandled_events += 1;
            log::warn!(
                "Unrecognized {} record at {:.6} (pid {}): {}",
                kind,
                record.timestamp,
                record.pid,
                record.details
            );
        }
    }

    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    pub fn tracker(&self) -> &ReclaimTracker {
        &self.tracker
    }

    /// Finish the import and build the timeline
    pub fn finish(self) -> Timeline {
        let registry = self.tracker.into_registry();
        let mut stats = self.stats;
        stats.slices = registry.stats().num_slices;

        let open_intervals: Vec<OpenInterval> = registry
            .open_contexts()
            .filter_map(|ctx| {
                ctx.open_timestamp.map(|since| OpenInterval {
                    category: ctx.key().category,
                    label: ctx.key().label.clone(),
                    pid: ctx.key().pid,
                    since,
                })
            })
            .collect();
        if !open_intervals.is_empty() {
            log::info!("{} reclaim intervals still open at end of trace", open_intervals.len());
        }

        let mut threads = registry.into_threads();
        threads.sort_by_key(|t| t.pid);

        Timeline {
            threads,
            open_intervals,
            stats,
        }
    }
}

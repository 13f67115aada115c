//! vmscan Trace Decoder Library
//!
//! Turns Linux `vmscan` trace events into a timeline of memory-reclaim
//! slices per kernel execution context.
//!
//! # Architecture
//!
//! Two reclaim phenomena are tracked independently for every process:
//! - kswapd background reclaim (`mm_vmscan_kswapd_wake` / `_sleep`)
//! - direct reclaim (`mm_vmscan_direct_reclaim_begin` / `_end`)
//!
//! Each phenomenon is a small idle/open state machine per
//! `(category, thread label, pid)` context. When a close event arrives for
//! an open context, a `Slice` is appended to the owning thread.
//!
//! The library does NOT:
//! - Parse trace headers or CPU topology
//! - Handle any event other than the four vmscan events above
//! - Lay out or coalesce slices for display
//!
//! # Example Usage
//!
//! ```no_run
//! use vmscan_decoder::{DecoderConfig, Importer};
//! use std::path::Path;
//!
//! let mut importer = Importer::new(DecoderConfig::new()).unwrap();
//! importer.import_file(Path::new("trace.txt")).unwrap();
//! let timeline = importer.finish();
//!
//! for thread in &timeline.threads {
//!     for slice in thread.slices() {
//!         println!("{} {} {:.3}ms", thread.pid, slice.title, slice.duration);
//!     }
//! }
//! ```

// Public modules
pub mod color;
pub mod config;
pub mod dispatch;
pub mod ftrace;
pub mod importer;
pub mod patterns;
pub mod registry;
pub mod tracker;
pub mod types;

// Re-export main types for convenience
pub use color::ColorId;
pub use config::{DecoderConfig, NegativeDurationPolicy};
pub use dispatch::EventKind;
pub use importer::{ImportStats, Importer, OpenInterval, Timeline};
pub use registry::{ContextId, ReclaimCategory, Thread, ThreadContext, ThreadRegistry};
pub use tracker::ReclaimTracker;
pub use types::{ArgValue, DecoderError, EventRecord, Result, Slice, SliceArgs, Timestamp};

// Internal modules (not exposed in public API)
mod emitter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

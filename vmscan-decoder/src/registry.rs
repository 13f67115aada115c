//! Thread and reclaim-context registry
//!
//! Owns two arenas: the execution threads (one per pid) that collect emitted
//! slices, and the per-(category, label, pid) reclaim contexts that hold the
//! open-interval state. Contexts refer to their owner thread by `ThreadId`
//! only, so the registry stays the single owner of every slice collection.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::types::{Slice, Timestamp};

/// The two reclaim phenomena tracked per process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReclaimCategory {
    /// Background page-out by the kswapd daemon
    Kswapd,
    /// Synchronous reclaim by an allocating task
    DirectReclaim,
}

impl ReclaimCategory {
    /// Human-readable category name, also used as the context key prefix
    pub fn as_str(self) -> &'static str {
        match self {
            ReclaimCategory::Kswapd => "kswapd",
            ReclaimCategory::DirectReclaim => "direct reclaim",
        }
    }
}

impl fmt::Display for ReclaimCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a reclaim context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey {
    pub category: ReclaimCategory,
    pub label: String,
    pub pid: u32,
}

impl ContextKey {
    /// Display name, e.g. `kswapd: kswapd0`
    pub fn name(&self) -> String {
        format!("{}: {}", self.category, self.label)
    }
}

/// Handle to a thread in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(usize);

/// Handle to a reclaim context in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(usize);

/// An execution thread and its slice timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thread {
    /// Thread / process id
    pub pid: u32,
    /// Name of the first context that resolved onto this thread
    pub name: String,
    slices: Vec<Slice>,
}

impl Thread {
    fn new(pid: u32, name: String) -> Self {
        Self {
            pid,
            name,
            slices: Vec::new(),
        }
    }

    /// Append a finished slice; insertion order is kept
    pub fn push_slice(&mut self, slice: Slice) {
        self.slices.push(slice);
    }

    /// Slices in the order they were closed
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }
}

/// Per-context reclaim state
///
/// `open_timestamp` is the state flag: `Some` while an interval is open,
/// `None` when idle. The attribute slots are scratch space for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadContext {
    key: ContextKey,
    owner: ThreadId,
    pub open_timestamp: Option<Timestamp>,
    pub order: Option<u32>,
    pub gfp: Option<String>,
    /// Last node id reported on wake; never copied into a slice
    pub numa_node: Option<u32>,
}

impl ThreadContext {
    fn new(key: ContextKey, owner: ThreadId) -> Self {
        Self {
            key,
            owner,
            open_timestamp: None,
            order: None,
            gfp: None,
            numa_node: None,
        }
    }

    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    /// Thread whose timeline receives this context's slices
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// True while an interval is open
    pub fn is_open(&self) -> bool {
        self.open_timestamp.is_some()
    }

    /// Return to the idle state, dropping all pending attributes
    pub fn clear(&mut self) {
        self.open_timestamp = None;
        self.order = None;
        self.gfp = None;
        self.numa_node = None;
    }
}

/// Registry of threads and reclaim contexts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadRegistry {
    /// Thread arena
    threads: Vec<Thread>,

    /// Thread lookup by pid
    thread_lookup: HashMap<u32, ThreadId>,

    /// Context arena
    contexts: Vec<ThreadContext>,

    /// Context lookup by identity
    context_lookup: HashMap<ContextKey, ContextId>,
}

impl ThreadRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the context for `(category, label, pid)`
    ///
    /// Idempotent: the same key always yields the same handle. The owner
    /// thread for `pid` is created on first use as well.
    pub fn resolve(&mut self, category: ReclaimCategory, label: &str, pid: u32) -> ContextId {
        let key = ContextKey {
            category,
            label: label.to_string(),
            pid,
        };
        if let Some(id) = self.context_lookup.get(&key) {
            return *id;
        }

        let owner = self.resolve_thread(pid, key.name());
        let id = ContextId(self.contexts.len());
        log::debug!("New reclaim context: {} (pid {})", key.name(), pid);
        self.contexts.push(ThreadContext::new(key.clone(), owner));
        self.context_lookup.insert(key, id);
        id
    }

    fn resolve_thread(&mut self, pid: u32, name: String) -> ThreadId {
        if let Some(id) = self.thread_lookup.get(&pid) {
            return *id;
        }
        let id = ThreadId(self.threads.len());
        self.threads.push(Thread::new(pid, name));
        self.thread_lookup.insert(pid, id);
        id
    }

    /// Look up an existing context without creating it
    pub fn find(&self, category: ReclaimCategory, label: &str, pid: u32) -> Option<ContextId> {
        let key = ContextKey {
            category,
            label: label.to_string(),
            pid,
        };
        self.context_lookup.get(&key).copied()
    }

    pub fn context(&self, id: ContextId) -> &ThreadContext {
        &self.contexts[id.0]
    }

    pub fn context_mut(&mut self, id: ContextId) -> &mut ThreadContext {
        &mut self.contexts[id.0]
    }

    pub fn thread(&self, id: ThreadId) -> &Thread {
        &self.threads[id.0]
    }

    pub fn thread_mut(&mut self, id: ThreadId) -> &mut Thread {
        &mut self.threads[id.0]
    }

    /// Thread for a pid, if any context has resolved onto it
    pub fn thread_by_pid(&self, pid: u32) -> Option<&Thread> {
        self.thread_lookup.get(&pid).map(|id| self.thread(*id))
    }

    /// All threads in creation order
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.iter()
    }

    /// Contexts that still have an interval open
    pub fn open_contexts(&self) -> impl Iterator<Item = &ThreadContext> {
        self.contexts.iter().filter(|ctx| ctx.is_open())
    }

    /// Consume the registry and hand over the threads
    pub fn into_threads(self) -> Vec<Thread> {
        self.threads
    }

    /// Get registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            num_threads: self.threads.len(),
            num_contexts: self.contexts.len(),
            num_slices: self.threads.iter().map(|t| t.slices.len()).sum(),
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Threads that own at least one context
    pub num_threads: usize,
    /// Reclaim contexts created
    pub num_contexts: usize,
    /// Slices emitted across all threads
    pub num_slices: usize,
}

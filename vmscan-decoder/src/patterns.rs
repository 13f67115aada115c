//! Detail-text matchers for the four vmscan events
//!
//! Each matcher pulls typed fields out of the free-text suffix of a trace
//! line. A `None` result means the text does not have the shape the event
//! name promises; callers skip the record without touching any state.

use regex::Regex;

use crate::types::{DecoderError, Result};

// mm_vmscan_kswapd_wake: nid=%d order=%d
const KSWAPD_WAKE: &str = r"nid=(\d+) order=(\d+)";

// mm_vmscan_kswapd_sleep: nid=%d
const KSWAPD_SLEEP: &str = r"nid=(\d+)";

// mm_vmscan_direct_reclaim_begin: order=%d may_writepage=%d gfp_flags=%s
const RECLAIM_BEGIN: &str = r"order=(\d+) may_writepage=\d+ gfp_flags=(.+)";

// mm_vmscan_direct_reclaim_end: nr_reclaimed=%lu
const RECLAIM_END: &str = r"nr_reclaimed=(\d+)";

/// Fields of `mm_vmscan_kswapd_wake`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KswapdWake {
    pub nid: u32,
    pub order: u32,
}

/// Fields of `mm_vmscan_kswapd_sleep`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KswapdSleep {
    pub nid: u32,
}

/// Fields of `mm_vmscan_direct_reclaim_begin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimBegin {
    pub order: u32,
    /// Opaque allocation flags, passed through as written
    pub gfp_flags: String,
}

/// Fields of `mm_vmscan_direct_reclaim_end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimEnd {
    pub nr_reclaimed: u64,
}

/// Compiled detail patterns
#[derive(Debug, Clone)]
pub struct EventPatterns {
    kswapd_wake: Regex,
    kswapd_sleep: Regex,
    reclaim_begin: Regex,
    reclaim_end: Regex,
}

impl EventPatterns {
    /// Compile all four patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            kswapd_wake: compile(KSWAPD_WAKE)?,
            kswapd_sleep: compile(KSWAPD_SLEEP)?,
            reclaim_begin: compile(RECLAIM_BEGIN)?,
            reclaim_end: compile(RECLAIM_END)?,
        })
    }

    pub fn kswapd_wake(&self, details: &str) -> Option<KswapdWake> {
        let caps = self.kswapd_wake.captures(details)?;
        Some(KswapdWake {
            nid: caps[1].parse().ok()?,
            order: caps[2].parse().ok()?,
        })
    }

    pub fn kswapd_sleep(&self, details: &str) -> Option<KswapdSleep> {
        let caps = self.kswapd_sleep.captures(details)?;
        Some(KswapdSleep {
            nid: caps[1].parse().ok()?,
        })
    }

    pub fn reclaim_begin(&self, details: &str) -> Option<ReclaimBegin> {
        let caps = self.reclaim_begin.captures(details)?;
        Some(ReclaimBegin {
            order: caps[1].parse().ok()?,
            gfp_flags: caps[2].to_string(),
        })
    }

    pub fn reclaim_end(&self, details: &str) -> Option<ReclaimEnd> {
        let caps = self.reclaim_end.captures(details)?;
        Some(ReclaimEnd {
            nr_reclaimed: caps[1].parse().ok()?,
        })
    }
}

fn compile(pattern: &'static str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| DecoderError::Pattern { pattern, source })
}

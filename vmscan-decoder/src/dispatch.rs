//! Event kinds handled by the decoder
//!
//! The set of recognized events is closed, so routing is a static `match`
//! over `EventKind` rather than a name-keyed callback table.

use serde::Serialize;
use std::fmt;

/// The four vmscan events with a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    KswapdWake,
    KswapdSleep,
    DirectReclaimBegin,
    DirectReclaimEnd,
}

impl EventKind {
    /// Every registered event kind
    pub const ALL: [EventKind; 4] = [
        EventKind::KswapdWake,
        EventKind::KswapdSleep,
        EventKind::DirectReclaimBegin,
        EventKind::DirectReclaimEnd,
    ];

    /// Map a trace event name to its kind
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mm_vmscan_kswapd_wake" => Some(EventKind::KswapdWake),
            "mm_vmscan_kswapd_sleep" => Some(EventKind::KswapdSleep),
            "mm_vmscan_direct_reclaim_begin" => Some(EventKind::DirectReclaimBegin),
            "mm_vmscan_direct_reclaim_end" => Some(EventKind::DirectReclaimEnd),
            _ => None,
        }
    }

    /// Trace event name
    pub fn name(self) -> &'static str {
        match self {
            EventKind::KswapdWake => "mm_vmscan_kswapd_wake",
            EventKind::KswapdSleep => "mm_vmscan_kswapd_sleep",
            EventKind::DirectReclaimBegin => "mm_vmscan_direct_reclaim_begin",
            EventKind::DirectReclaimEnd => "mm_vmscan_direct_reclaim_end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_mapping_is_bijective() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(EventKind::from_name("sched_switch"), None);
        assert_eq!(EventKind::from_name("mm_vmscan_kswapd_wake "), None);
        assert_eq!(EventKind::from_name(""), None);
    }
}

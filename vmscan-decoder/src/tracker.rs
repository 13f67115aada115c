//! Reclaim state tracker
//!
//! Runs two independent idle/open state machines per process:
//!
//! - **kswapd**: wake opens an interval, further wakes only raise the
//!   recorded order, sleep closes it.
//! - **direct reclaim**: begin (re)opens an interval, restarting it if one
//!   is already open, end closes it.
//!
//! Orphan closes are ignored. A record whose details do not match the
//! event's pattern makes the handler return `false` without touching state.

use crate::config::NegativeDurationPolicy;
use crate::dispatch::EventKind;
use crate::emitter::SliceEmitter;
use crate::patterns::EventPatterns;
use crate::registry::{ReclaimCategory, ThreadRegistry};
use crate::types::{ArgValue, EventRecord, Result, SliceArgs};

/// Title used for every direct reclaim slice
pub const DIRECT_RECLAIM_TITLE: &str = "direct reclaim";

/// Event-at-a-time reclaim state machine
#[derive(Debug, Clone)]
pub struct ReclaimTracker {
    patterns: EventPatterns,
    emitter: SliceEmitter,
    registry: ThreadRegistry,
}

impl ReclaimTracker {
    /// Create a tracker with an empty registry
    pub fn new(policy: NegativeDurationPolicy) -> Result<Self> {
        Ok(Self {
            patterns: EventPatterns::new()?,
            emitter: SliceEmitter::new(policy),
            registry: ThreadRegistry::new(),
        })
    }

    /// Route one record to the handler for `kind`
    ///
    /// Returns false if the record's details do not match the pattern for
    /// `kind`; the caller should treat that as a recoverable miss.
    pub fn handle(&mut self, kind: EventKind, record: &EventRecord) -> bool {
        match kind {
            EventKind::KswapdWake => self.kswapd_wake(record),
            EventKind::KswapdSleep => self.kswapd_sleep(record),
            EventKind::DirectReclaimBegin => self.reclaim_begin(record),
            EventKind::DirectReclaimEnd => self.reclaim_end(record),
        }
    }

    pub fn kswapd_wake(&mut self, record: &EventRecord) -> bool {
        let Some(wake) = self.patterns.kswapd_wake(&record.details) else {
            return false;
        };

        let id = self
            .registry
            .resolve(ReclaimCategory::Kswapd, &record.thread_label, record.pid);
        let ctx = self.registry.context_mut(id);
        if ctx.is_open() {
            ctx.order = ctx.order.max(Some(wake.order));
        } else {
            ctx.open_timestamp = Some(record.timestamp);
            ctx.order = Some(wake.order);
        }
        ctx.numa_node = Some(wake.nid);
        true
    }

    pub fn kswapd_sleep(&mut self, record: &EventRecord) -> bool {
        if self.patterns.kswapd_sleep(&record.details).is_none() {
            return false;
        }

        let id = self
            .registry
            .resolve(ReclaimCategory::Kswapd, &record.thread_label, record.pid);
        let ctx = self.registry.context_mut(id);
        let open = ctx.open_timestamp;
        let order = ctx.order;
        ctx.clear();

        match open {
            Some(start) => {
                let mut args = SliceArgs::new();
                if let Some(order) = order {
                    args.insert("order".to_string(), ArgValue::from(order));
                }
                self.emitter.emit(
                    &mut self.registry,
                    id,
                    &record.thread_label,
                    start,
                    record.timestamp,
                    args,
                );
            }
            None => log::trace!(
                "kswapd sleep without wake: {} (pid {})",
                record.thread_label,
                record.pid
            ),
        }
        true
    }

    pub fn reclaim_begin(&mut self, record: &EventRecord) -> bool {
        let Some(begin) = self.patterns.reclaim_begin(&record.details) else {
            return false;
        };

        let id = self.registry.resolve(
            ReclaimCategory::DirectReclaim,
            &record.thread_label,
            record.pid,
        );
        let ctx = self.registry.context_mut(id);
        if let Some(previous) = ctx.open_timestamp {
            log::debug!(
                "direct reclaim restarted for {} (pid {}): {:.6} -> {:.6}",
                record.thread_label,
                record.pid,
                previous,
                record.timestamp
            );
        }
        ctx.open_timestamp = Some(record.timestamp);
        ctx.order = Some(begin.order);
        ctx.gfp = Some(begin.gfp_flags);
        true
    }

    pub fn reclaim_end(&mut self, record: &EventRecord) -> bool {
        let Some(end) = self.patterns.reclaim_end(&record.details) else {
            return false;
        };

        let id = self.registry.resolve(
            ReclaimCategory::DirectReclaim,
            &record.thread_label,
            record.pid,
        );
        let ctx = self.registry.context_mut(id);
        let open = ctx.open_timestamp;
        let order = ctx.order;
        let gfp = ctx.gfp.take();
        ctx.clear();

        match open {
            Some(start) => {
                let mut args = SliceArgs::new();
                if let Some(order) = order {
                    args.insert("order".to_string(), ArgValue::from(order));
                }
                if let Some(gfp) = gfp {
                    args.insert("gfp".to_string(), ArgValue::from(gfp));
                }
                args.insert(
                    "nr_reclaimed".to_string(),
                    ArgValue::from(end.nr_reclaimed),
                );
                self.emitter.emit(
                    &mut self.registry,
                    id,
                    DIRECT_RECLAIM_TITLE,
                    start,
                    record.timestamp,
                    args,
                );
            }
            None => log::trace!(
                "direct reclaim end without begin: {} (pid {})",
                record.thread_label,
                record.pid
            ),
        }
        true
    }

    pub fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ThreadRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> ThreadRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Slice;

    const PID: u32 = 47;

    fn tracker() -> ReclaimTracker {
        ReclaimTracker::new(NegativeDurationPolicy::Clamp).unwrap()
    }

    fn rec(name: &str, ts: f64, label: &str, details: &str) -> EventRecord {
        EventRecord::new(name, 0, PID, ts, label, details)
    }

    fn wake(ts: f64, order: u32) -> EventRecord {
        rec(
            "mm_vmscan_kswapd_wake",
            ts,
            "kswapd0",
            &format!("nid=0 order={}", order),
        )
    }

    fn sleep(ts: f64) -> EventRecord {
        rec("mm_vmscan_kswapd_sleep", ts, "kswapd0", "nid=0")
    }

    fn begin(ts: f64, order: u32, gfp: &str) -> EventRecord {
        rec(
            "mm_vmscan_direct_reclaim_begin",
            ts,
            "kswapd0",
            &format!("order={} may_writepage=1 gfp_flags={}", order, gfp),
        )
    }

    fn end(ts: f64, nr: u64) -> EventRecord {
        rec(
            "mm_vmscan_direct_reclaim_end",
            ts,
            "kswapd0",
            &format!("nr_reclaimed={}", nr),
        )
    }

    fn slices(tracker: &ReclaimTracker) -> &[Slice] {
        tracker
            .registry()
            .thread_by_pid(PID)
            .map(|t| t.slices())
            .unwrap_or(&[])
    }

    #[test]
    fn test_wake_sleep_pair() {
        let mut t = tracker();
        assert!(t.kswapd_wake(&wake(100.0, 3)));
        assert!(t.kswapd_sleep(&sleep(104.5)));

        let s = slices(&t);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].title, "kswapd0");
        assert_eq!(s[0].category, "kswapd");
        assert_eq!(s[0].start, 100.0);
        assert_eq!(s[0].duration, 4.5);
        assert_eq!(s[0].arg("order"), Some(&ArgValue::Integer(3)));
        assert_eq!(s[0].args.len(), 1);
    }

    #[test]
    fn test_repeated_wakes_keep_start_and_max_order() {
        let mut t = tracker();
        assert!(t.kswapd_wake(&wake(10.0, 2)));
        assert!(t.kswapd_wake(&wake(15.0, 1)));
        assert!(t.kswapd_sleep(&sleep(20.0)));

        let s = slices(&t);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].start, 10.0);
        assert_eq!(s[0].duration, 10.0);
        assert_eq!(s[0].arg("order"), Some(&ArgValue::Integer(2)));
    }

    #[test]
    fn test_later_wake_raises_order() {
        let mut t = tracker();
        t.kswapd_wake(&wake(10.0, 1));
        t.kswapd_wake(&wake(11.0, 5));
        t.kswapd_sleep(&sleep(12.0));
        assert_eq!(slices(&t)[0].arg("order"), Some(&ArgValue::Integer(5)));
    }

    #[test]
    fn test_orphan_sleep() {
        let mut t = tracker();
        assert!(t.kswapd_sleep(&sleep(5.0)));
        assert!(slices(&t).is_empty());

        let id = t.registry().find(ReclaimCategory::Kswapd, "kswapd0", PID).unwrap();
        assert!(!t.registry().context(id).is_open());
        assert_eq!(t.registry().context(id).order, None);
    }

    #[test]
    fn test_sleep_returns_to_idle() {
        let mut t = tracker();
        t.kswapd_wake(&wake(1.0, 4));
        t.kswapd_sleep(&sleep(2.0));
        t.kswapd_wake(&wake(3.0, 0));
        t.kswapd_sleep(&sleep(7.0));

        let s = slices(&t);
        assert_eq!(s.len(), 2);
        assert_eq!(s[1].start, 3.0);
        assert_eq!(s[1].arg("order"), Some(&ArgValue::Integer(0)));
    }

    #[test]
    fn test_second_begin_restarts_interval() {
        let mut t = tracker();
        assert!(t.reclaim_begin(&begin(5.0, 3, "A")));
        assert!(t.reclaim_begin(&begin(8.0, 4, "B")));
        assert!(t.reclaim_end(&end(12.0, 100)));

        let s = slices(&t);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].title, DIRECT_RECLAIM_TITLE);
        assert_eq!(s[0].category, "direct reclaim");
        assert_eq!(s[0].start, 8.0);
        assert_eq!(s[0].duration, 4.0);
        assert_eq!(s[0].arg("order"), Some(&ArgValue::Integer(4)));
        assert_eq!(s[0].arg("gfp"), Some(&ArgValue::Text("B".into())));
        assert_eq!(s[0].arg("nr_reclaimed"), Some(&ArgValue::Integer(100)));
    }

    #[test]
    fn test_orphan_end() {
        let mut t = tracker();
        assert!(t.reclaim_end(&end(3.0, 7)));
        assert!(slices(&t).is_empty());
        assert_eq!(t.registry().open_contexts().count(), 0);
    }

    #[test]
    fn test_mismatch_leaves_state_unchanged() {
        let mut t = tracker();
        t.kswapd_wake(&wake(1.0, 2));
        t.reclaim_begin(&begin(2.0, 1, "GFP_KERNEL"));
        let snapshot = t.registry().clone();

        let bad = [
            (EventKind::KswapdWake, "nid=0"),
            (EventKind::KswapdSleep, "order=1"),
            (EventKind::DirectReclaimBegin, "order=1 gfp_flags=GFP_KERNEL"),
            (EventKind::DirectReclaimEnd, "nr_reclaimed="),
        ];
        for (kind, details) in bad {
            assert!(!t.handle(kind, &rec(kind.name(), 9.0, "kswapd0", details)));
            // A label never seen before must not create a context either
            assert!(!t.handle(kind, &rec(kind.name(), 9.0, "fresh", details)));
        }
        assert_eq!(t.registry(), &snapshot);
    }

    #[test]
    fn test_tracks_do_not_interfere() {
        // Every interleaving of wake<sleep and begin<end, nested ones included
        let orders: [[EventKind; 4]; 6] = [
            [EventKind::KswapdWake, EventKind::KswapdSleep, EventKind::DirectReclaimBegin, EventKind::DirectReclaimEnd],
            [EventKind::KswapdWake, EventKind::DirectReclaimBegin, EventKind::KswapdSleep, EventKind::DirectReclaimEnd],
            [EventKind::KswapdWake, EventKind::DirectReclaimBegin, EventKind::DirectReclaimEnd, EventKind::KswapdSleep],
            [EventKind::DirectReclaimBegin, EventKind::KswapdWake, EventKind::KswapdSleep, EventKind::DirectReclaimEnd],
            [EventKind::DirectReclaimBegin, EventKind::KswapdWake, EventKind::DirectReclaimEnd, EventKind::KswapdSleep],
            [EventKind::DirectReclaimBegin, EventKind::DirectReclaimEnd, EventKind::KswapdWake, EventKind::KswapdSleep],
        ];

        for order in orders {
            let mut t = tracker();
            let ts_of = |kind: EventKind| (order.iter().position(|k| *k == kind).unwrap() + 1) as f64;

            for kind in order {
                let ts = ts_of(kind);
                let record = match kind {
                    EventKind::KswapdWake => wake(ts, 2),
                    EventKind::KswapdSleep => sleep(ts),
                    EventKind::DirectReclaimBegin => begin(ts, 5, "GFP_NOFS"),
                    EventKind::DirectReclaimEnd => end(ts, 32),
                };
                assert!(t.handle(kind, &record));
            }

            let s = slices(&t);
            assert_eq!(s.len(), 2, "interleaving {:?}", order);

            let kswapd = s.iter().find(|s| s.title == "kswapd0").unwrap();
            assert_eq!(kswapd.category, "kswapd");
            assert_eq!(kswapd.start, ts_of(EventKind::KswapdWake));
            assert_eq!(
                kswapd.duration,
                ts_of(EventKind::KswapdSleep) - ts_of(EventKind::KswapdWake)
            );
            assert_eq!(kswapd.args.len(), 1);
            assert_eq!(kswapd.arg("order"), Some(&ArgValue::Integer(2)));

            let direct = s.iter().find(|s| s.title == DIRECT_RECLAIM_TITLE).unwrap();
            assert_eq!(direct.category, "direct reclaim");
            assert_eq!(direct.start, ts_of(EventKind::DirectReclaimBegin));
            assert_eq!(
                direct.duration,
                ts_of(EventKind::DirectReclaimEnd) - ts_of(EventKind::DirectReclaimBegin)
            );
            assert_eq!(direct.arg("order"), Some(&ArgValue::Integer(5)));
            assert_eq!(direct.arg("gfp"), Some(&ArgValue::Text("GFP_NOFS".into())));
            assert_eq!(direct.arg("nr_reclaimed"), Some(&ArgValue::Integer(32)));

            assert_eq!(t.registry().open_contexts().count(), 0);
        }
    }

    #[test]
    fn test_wake_records_numa_node_but_slice_omits_it() {
        let mut t = tracker();
        t.kswapd_wake(&rec("mm_vmscan_kswapd_wake", 1.0, "kswapd1", "nid=1 order=0"));
        let id = t.registry().find(ReclaimCategory::Kswapd, "kswapd1", PID).unwrap();
        assert_eq!(t.registry().context(id).numa_node, Some(1));

        t.kswapd_sleep(&rec("mm_vmscan_kswapd_sleep", 2.0, "kswapd1", "nid=1"));
        assert_eq!(t.registry().context(id).numa_node, None);
        assert!(slices(&t)[0].arg("nid").is_none());
    }
}

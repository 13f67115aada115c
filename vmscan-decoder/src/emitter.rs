//! Slice emission
//!
//! Turns a closed reclaim interval into a `Slice` and appends it to the
//! context's owner thread. The append is the only observable effect of a
//! successful close.

use crate::color::ColorId;
use crate::config::NegativeDurationPolicy;
use crate::registry::{ContextId, ThreadRegistry};
use crate::types::{Slice, SliceArgs, Timestamp};

/// Builds slices and hands them to owner threads
#[derive(Debug, Clone, Copy, Default)]
pub struct SliceEmitter {
    policy: NegativeDurationPolicy,
}

impl SliceEmitter {
    pub fn new(policy: NegativeDurationPolicy) -> Self {
        Self { policy }
    }

    /// Close an interval opened at `start` on `context` at time `end`
    ///
    /// Returns true if a slice was appended.
    pub fn emit(
        &self,
        registry: &mut ThreadRegistry,
        context: ContextId,
        title: &str,
        start: Timestamp,
        end: Timestamp,
        args: SliceArgs,
    ) -> bool {
        let ctx = registry.context(context);
        let category = ctx.key().category;
        let owner = ctx.owner();

        let mut duration = end - start;
        if duration < 0.0 {
            log::warn!(
                "{} closed at {:.6} before it opened at {:.6} (pid {}), policy {:?}",
                ctx.key().name(),
                end,
                start,
                ctx.key().pid,
                self.policy
            );
            match self.policy {
                NegativeDurationPolicy::Clamp => duration = 0.0,
                NegativeDurationPolicy::Keep => {}
                NegativeDurationPolicy::Drop => return false,
            }
        }

        let slice = Slice {
            category: category.to_string(),
            title: title.to_string(),
            color: ColorId::for_name(title),
            start,
            duration,
            args,
        };
        registry.thread_mut(owner).push_slice(slice);
        true
    }
}

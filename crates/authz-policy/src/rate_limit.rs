// rate_limit.rs - Usage counter seam for the rate-limit layer.
//
// `rate_limits[subject]` is part of the tables contract, but counting calls
// is somebody else's job. The engine asks an injected UsageCounter for the
// subject's current usage; with no counter wired in, the layer never fires.

use crate::tables::RateLimit;

/// Reports how many calls a subject has made in the current window.
pub trait UsageCounter: Send + Sync {
    /// Current usage, or `None` when the subject is not tracked.
    fn usage(&self, subject: &str) -> Option<u64>;
}

/// The default counter: tracks nothing, so limits are never exceeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsageCounter;

impl UsageCounter for NoUsageCounter {
    fn usage(&self, _subject: &str) -> Option<u64> {
        None
    }
}

impl<F> UsageCounter for F
where
    F: Fn(&str) -> Option<u64> + Send + Sync,
{
    fn usage(&self, subject: &str) -> Option<u64> {
        self(subject)
    }
}

/// Whether `subject` has used up `limit` according to `counter`.
pub fn limit_exceeded(counter: &dyn UsageCounter, subject: &str, limit: &RateLimit) -> bool {
    counter
        .usage(subject)
        .is_some_and(|used| used >= limit.max_requests)
}

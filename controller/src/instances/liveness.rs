use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// How long a missing instance is still reported as existing
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Remembers, per provider ID, when the directory last confirmed the instance
/// or first stopped returning it.
///
/// A sighting resets the clock to now. A miss only sets it when no entry
/// exists, so a run of misses is measured from the first one. Every query
/// touches `last_queried`, which is what the sweeper evicts by.
#[derive(Debug)]
pub struct LivenessTracker {
    seen: DashMap<String, Observation>,
    grace_period: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    /// Start of the current grace window
    since: Instant,
    last_queried: Instant,
}

impl Observation {
    fn at(now: Instant) -> Self {
        Self {
            since: now,
            last_queried: now,
        }
    }
}

impl LivenessTracker {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            grace_period,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// The directory returned the instance
    pub fn record_present(&self, provider_id: &str) {
        self.seen
            .insert(provider_id.to_string(), Observation::at(Instant::now()));
    }

    /// The directory answered 404. Returns whether the instance should still
    /// be treated as existing.
    pub fn record_absent(&self, provider_id: &str) -> bool {
        let now = Instant::now();
        let since = {
            let mut entry = self
                .seen
                .entry(provider_id.to_string())
                .or_insert_with(|| Observation::at(now));
            entry.last_queried = now;
            entry.since
        };
        let elapsed = now.saturating_duration_since(since);

        if elapsed < self.grace_period {
            debug!(
                "Instance {} missing for {:?}, within grace period of {:?}",
                provider_id, elapsed, self.grace_period
            );
            true
        } else {
            info!(
                "Instance {} missing for {:?}, past grace period of {:?}",
                provider_id, elapsed, self.grace_period
            );
            false
        }
    }

    /// Drop entries nobody has queried for `retention`. Returns how many were
    /// removed.
    pub fn sweep(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.seen.len();
        self.seen
            .retain(|_, obs| now.saturating_duration_since(obs.last_queried) < retention);
        before.saturating_sub(self.seen.len())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

/// Background task that bounds the liveness table by dropping old entries
pub async fn liveness_sweeper(tracker: Arc<LivenessTracker>, interval: Duration, retention: Duration) {
    info!(
        "Starting liveness sweeper (interval={:?}, retention={:?})",
        interval, retention
    );

    let mut ticker = tokio::time::interval(interval);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let removed = tracker.sweep(retention);
        if removed > 0 {
            info!(
                "Swept {} stale liveness entr{} ({} remaining)",
                removed,
                if removed == 1 { "y" } else { "ies" },
                tracker.len()
            );
        }
    }
}

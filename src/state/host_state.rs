use std::time::Duration;
use tokio::time::Instant;

/// Tracks dispatches to one host during a run
///
/// Uses tokio's clock so tests can drive it with a paused runtime.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of dispatches made to this host in the current run
    pub dispatch_count: u64,

    /// Start time of the most recent dispatch to this host
    pub last_dispatch: Option<Instant>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the remaining wait before the next dispatch, or None if it may start now
    pub fn time_until_next_dispatch(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a dispatch started at `now`
    pub fn record_dispatch(&mut self, now: Instant) {
        self.dispatch_count += 1;
        self.last_dispatch = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn test_new_host_state() {
        let state = HostState::new();
        assert_eq!(state.dispatch_count, 0);
        assert!(state.last_dispatch.is_none());
    }

    #[test]
    fn test_can_dispatch_initially() {
        let state = HostState::new();
        assert!(state.time_until_next_dispatch(DELAY, Instant::now()).is_none());
    }

    #[test]
    fn test_cannot_dispatch_too_soon() {
        let mut state = HostState::new();
        let now = Instant::now();
        state.record_dispatch(now);

        assert!(state.time_until_next_dispatch(DELAY, now).is_some());
        assert!(state
            .time_until_next_dispatch(DELAY, now + Duration::from_millis(500))
            .is_some());
    }

    #[test]
    fn test_can_dispatch_after_delay() {
        let mut state = HostState::new();
        let now = Instant::now();
        state.record_dispatch(now);

        assert!(state
            .time_until_next_dispatch(DELAY, now + Duration::from_millis(1000))
            .is_none());
        assert!(state
            .time_until_next_dispatch(DELAY, now + Duration::from_millis(1100))
            .is_none());
    }

    #[test]
    fn test_zero_delay_never_waits() {
        let mut state = HostState::new();
        let now = Instant::now();
        state.record_dispatch(now);
        assert!(state.time_until_next_dispatch(Duration::ZERO, now).is_none());
    }

    #[test]
    fn test_time_until_next_dispatch() {
        let mut state = HostState::new();
        let now = Instant::now();

        assert!(state.time_until_next_dispatch(DELAY, now).is_none());

        state.record_dispatch(now);
        assert_eq!(state.time_until_next_dispatch(DELAY, now), Some(DELAY));

        let soon = now + Duration::from_millis(400);
        assert_eq!(
            state.time_until_next_dispatch(DELAY, soon),
            Some(Duration::from_millis(600))
        );

        let later = now + Duration::from_millis(1100);
        assert!(state.time_until_next_dispatch(DELAY, later).is_none());
    }

    #[test]
    fn test_record_dispatch_counts() {
        let mut state = HostState::new();
        let now = Instant::now();

        state.record_dispatch(now);
        state.record_dispatch(now);

        assert_eq!(state.dispatch_count, 2);
        assert_eq!(state.last_dispatch, Some(now));
    }
}

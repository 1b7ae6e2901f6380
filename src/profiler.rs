//! Named-timer accumulator for per-phase timings.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Accumulated timings for one key
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimerEntry {
    pub total: Duration,
    pub count: u64,
}

impl TimerEntry {
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count as u32
        }
    }
}

impl fmt::Display for TimerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} ms total, {} times, {:.3} ms average",
            self.total.as_secs_f64() * 1e3,
            self.count,
            self.average().as_secs_f64() * 1e3
        )
    }
}

/// Keys report in the order they were first recorded.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    started: HashMap<String, Instant>,
    entries: IndexMap<String, TimerEntry>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, key: &str) {
        self.started.insert(key.to_string(), Instant::now());
    }

    /// Stop the timer started under `key`. Stopping a timer that was never
    /// started does nothing.
    pub fn stop(&mut self, key: &str) -> Option<Duration> {
        let elapsed = self.started.remove(key)?.elapsed();
        self.record(key, elapsed);
        Some(elapsed)
    }

    /// Add a measured duration under `key`
    pub fn record(&mut self, key: &str, elapsed: Duration) {
        if !self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), TimerEntry::default());
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.total += elapsed;
            entry.count += 1;
        }
    }

    pub fn get(&self, key: &str) -> Option<&TimerEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &TimerEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Log every timer at info level
    pub fn report(&self) {
        for (key, entry) in &self.entries {
            log::info!("{}: {}", key, entry);
        }
    }

    pub fn reset(&mut self) {
        self.started.clear();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut profiler = Profiler::new();
        profiler.record("interaction", Duration::from_millis(4));
        profiler.record("interaction", Duration::from_millis(6));

        let entry = profiler.get("interaction").unwrap();
        assert_eq!(entry.count, 2);
        assert_eq!(entry.total, Duration::from_millis(10));
        assert_eq!(entry.average(), Duration::from_millis(5));
    }

    #[test]
    fn test_start_stop() {
        let mut profiler = Profiler::new();
        assert!(profiler.stop("never").is_none());

        profiler.start("phase");
        assert!(profiler.stop("phase").is_some());
        assert_eq!(profiler.get("phase").map(|e| e.count), Some(1));
        // A second stop without start is ignored
        assert!(profiler.stop("phase").is_none());
    }

    #[test]
    fn test_report_order_and_reset() {
        let mut profiler = Profiler::new();
        for key in ["interaction", "reaction", "post_iteration"] {
            profiler.record(key, Duration::from_micros(1));
        }
        let keys: Vec<&str> = profiler.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["interaction", "reaction", "post_iteration"]);

        profiler.reset();
        assert_eq!(profiler.entries().count(), 0);
    }
}

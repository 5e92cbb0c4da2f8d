use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

/// Jobs accepted by the router (counter, labels: namespace).
pub const JOBS_SUBMITTED_TOTAL: &str = "jobs_submitted_total";
/// Jobs whose body returned `Ok` (counter, labels: namespace).
pub const JOBS_COMPLETED_TOTAL: &str = "jobs_completed_total";
/// Jobs whose body errored or panicked (counter, labels: namespace).
pub const JOBS_FAILED_TOTAL: &str = "jobs_failed_total";
/// Namespace workers started (counter).
pub const WORKERS_SPAWNED_TOTAL: &str = "workers_spawned_total";
/// Wall time of a job body in milliseconds (histogram).
pub const JOB_DURATION_MS: &str = "job_duration_ms";

/// Observations kept per histogram for percentiles. Older ones only count
/// towards `count` and `mean`.
pub const HISTOGRAM_WINDOW: usize = 1024;

/// Latency histogram over a sliding window of recent observations.
struct Histogram {
    total: u64,
    sum: f64,
    recent: VecDeque<f64>,
}

impl Histogram {
    fn new() -> Self {
        Self {
            total: 0,
            sum: 0.0,
            recent: VecDeque::with_capacity(HISTOGRAM_WINDOW),
        }
    }

    fn observe(&mut self, value: f64) {
        self.total += 1;
        self.sum += value;
        if self.recent.len() == HISTOGRAM_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
    }

    fn summary(&self) -> HistogramSummary {
        if self.recent.is_empty() {
            return HistogramSummary::default();
        }
        let mut window: Vec<f64> = self.recent.iter().copied().collect();
        window.sort_by(f64::total_cmp);
        let n = window.len();
        let at = |q: f64| window[((n as f64 * q) as usize).min(n - 1)];
        HistogramSummary {
            count: self.total,
            mean: self.sum / self.total as f64,
            p50: at(0.50),
            p95: at(0.95),
            max: window[n - 1],
        }
    }
}

/// Histogram snapshot. Percentiles and `max` cover the recent window.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
}

/// Metric key: name + labels sorted by label name.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct MetricKey {
    name: String,
    labels: Vec<(String, String)>,
}

impl MetricKey {
    fn new(name: &str, labels: &[(&str, &str)]) -> Self {
        let mut labels: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        labels.sort();
        Self {
            name: name.to_string(),
            labels,
        }
    }
}

/// Thread-safe in-process metrics, read back by the queue status snapshot.
#[derive(Default)]
pub struct MetricsRecorder {
    counters: RwLock<HashMap<MetricKey, AtomicU64>>,
    histograms: RwLock<HashMap<MetricKey, Mutex<Histogram>>>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter_inc(&self, name: &str, labels: &[(&str, &str)], n: u64) {
        let key = MetricKey::new(name, labels);
        if let Some(c) = self.counters.read().get(&key) {
            c.fetch_add(n, Ordering::Relaxed);
            return;
        }
        self.counters
            .write()
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(n, Ordering::Relaxed);
    }

    pub fn counter_get(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .read()
            .get(&MetricKey::new(name, labels))
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Sum of a counter across every label set.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .read()
            .iter()
            .filter(|(k, _)| k.name == name)
            .map(|(_, c)| c.load(Ordering::Relaxed))
            .sum()
    }

    pub fn histogram_observe(&self, name: &str, labels: &[(&str, &str)], value: f64) {
        let key = MetricKey::new(name, labels);
        if let Some(h) = self.histograms.read().get(&key) {
            h.lock().observe(value);
            return;
        }
        self.histograms
            .write()
            .entry(key)
            .or_insert_with(|| Mutex::new(Histogram::new()))
            .lock()
            .observe(value);
    }

    pub fn histogram_summary(&self, name: &str, labels: &[(&str, &str)]) -> HistogramSummary {
        self.histograms
            .read()
            .get(&MetricKey::new(name, labels))
            .map(|h| h.lock().summary())
            .unwrap_or_default()
    }
}

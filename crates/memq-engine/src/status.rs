use memq_telemetry::HistogramSummary;
use serde::Serialize;

/// Snapshot of one namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamespaceStatus {
    pub namespace: String,
    /// Jobs waiting to run. The job currently executing is not counted.
    pub depth: usize,
    pub worker_active: bool,
}

/// Snapshot of the whole router, as served by the status endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct QueueStatus {
    pub capacity: usize,
    pub in_flight: usize,
    /// Sorted by namespace.
    pub namespaces: Vec<NamespaceStatus>,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    /// Job body wall time across all namespaces.
    pub job_duration_ms: HistogramSummary,
}

impl QueueStatus {
    pub fn total_depth(&self) -> usize {
        self.namespaces.iter().map(|n| n.depth).sum()
    }

    pub fn active_workers(&self) -> usize {
        self.namespaces.iter().filter(|n| n.worker_active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_and_serializes() {
        let status = QueueStatus {
            capacity: 10,
            in_flight: 1,
            namespaces: vec![
                NamespaceStatus {
                    namespace: "a".into(),
                    depth: 3,
                    worker_active: true,
                },
                NamespaceStatus {
                    namespace: "b".into(),
                    depth: 0,
                    worker_active: false,
                },
            ],
            submitted: 5,
            completed: 1,
            failed: 0,
            job_duration_ms: HistogramSummary::default(),
        };
        assert_eq!(status.total_depth(), 3);
        assert_eq!(status.active_workers(), 1);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["namespaces"][0]["worker_active"], true);
        assert_eq!(json["capacity"], 10);
    }
}

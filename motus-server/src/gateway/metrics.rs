use std::sync::atomic::{AtomicU64, Ordering};

/// Leaderboard request tallies, zeroed on every scrape.
#[derive(Debug, Default)]
pub struct LeaderboardMetrics {
    requests: AtomicU64,
    errors: AtomicU64,
}

impl LeaderboardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scrape(&self) -> String {
        let requests = self.requests.swap(0, Ordering::Relaxed);
        let errors = self.errors.swap(0, Ordering::Relaxed);
        format!(
            "http_requests_leaderbord_total {}\nerror_total {}",
            requests, errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_resets_counters() {
        let metrics = LeaderboardMetrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_error();

        assert_eq!(
            metrics.scrape(),
            "http_requests_leaderbord_total 2\nerror_total 1"
        );
        assert_eq!(
            metrics.scrape(),
            "http_requests_leaderbord_total 0\nerror_total 0"
        );
    }
}

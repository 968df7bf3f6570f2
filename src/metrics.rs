//! Performance metrics and statistics tracking for the scoring service.

use crate::types::verdict::RiskVerdict;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for the scoring pipeline
pub struct PipelineMetrics {
    /// Transactions that received a verdict
    pub transactions_scored: AtomicU64,
    /// Verdicts labelled FRAUD
    pub fraud_verdicts: AtomicU64,
    /// Rejected requests by error kind
    rejections: RwLock<HashMap<&'static str, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: AtomicU64::new(0),
            fraud_verdicts: AtomicU64::new(0),
            rejections: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a scored transaction
    pub fn record_verdict(&self, processing_time: Duration, verdict: &RiskVerdict) {
        self.transactions_scored.fetch_add(1, Ordering::Relaxed);
        if verdict.is_fraud() {
            self.fraud_verdicts.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = ((verdict.probability * 10.0) as usize).min(9);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a rejected request
    pub fn record_rejection(&self, kind: &'static str) {
        if let Ok(mut rejections) = self.rejections.write() {
            *rejections.entry(kind).or_insert(0) += 1;
        }
    }

    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or_default()
    }

    pub fn get_rejections(&self) -> HashMap<&'static str, u64> {
        self.rejections
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn total_rejections(&self) -> u64 {
        self.get_rejections().values().sum()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let scored = self.transactions_scored.load(Ordering::Relaxed);
        let fraud = self.fraud_verdicts.load(Ordering::Relaxed);
        let fraud_rate = if scored > 0 {
            (fraud as f64 / scored as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let distribution = self.get_probability_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             FRAUD RISK SCORER - METRICS SUMMARY              ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Scored: {:>8}  │  Throughput: {:>6.1} tx/s    ║",
            scored,
            self.get_throughput()
        );
        info!(
            "║ FRAUD Verdicts:      {:>8}  │  Fraud Rate: {:>6.1}%        ║",
            fraud, fraud_rate
        );
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Rejections:                                                  ║");
        for (kind, count) in &self.get_rejections() {
            info!("║   {:18}: {:>6}", kind, count);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fraud Probability Distribution:                              ║");
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic summary reporter
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::verdict::RiskLabel;

    fn verdict(label: RiskLabel, probability: f64) -> RiskVerdict {
        RiskVerdict { label, probability }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_verdict(Duration::from_micros(100), &verdict(RiskLabel::Safe, 0.05));
        metrics.record_verdict(Duration::from_micros(300), &verdict(RiskLabel::Fraud, 1.0));
        metrics.record_rejection("invalid_input");
        metrics.record_rejection("invalid_input");
        metrics.record_rejection("model_unavailable");

        assert_eq!(metrics.transactions_scored.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.fraud_verdicts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_rejections().get("invalid_input"), Some(&2));
        assert_eq!(metrics.total_rejections(), 3);

        let distribution = metrics.get_probability_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_verdict(Duration::from_micros(us), &verdict(RiskLabel::Safe, 0.1));
        }
        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}

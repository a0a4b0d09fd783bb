use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

/// Metrics for the M-Pesa verification path, kept in a service-local registry.
#[derive(Clone)]
pub struct VerificationMetrics {
    pub registry: Registry,
    pub verifications_total: IntCounterVec,
    pub verification_failures_total: IntCounterVec,
    pub message_bytes: Histogram,
}

impl VerificationMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let verifications_total = IntCounterVec::new(
            Opts::new("mpesa_verifications_total", "M-Pesa message verifications by outcome"),
            &["outcome"],
        ).unwrap();
        let verification_failures_total = IntCounterVec::new(
            Opts::new(
                "mpesa_verification_failures_total",
                "Reasons reported by rejected verifications",
            ),
            &["reason"],
        ).unwrap();
        let message_bytes = Histogram::with_opts(
            HistogramOpts::new("mpesa_message_bytes", "Size of submitted confirmation messages")
                .buckets(vec![0.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 4096.0]),
        ).unwrap();
        let _ = registry.register(Box::new(verifications_total.clone()));
        let _ = registry.register(Box::new(verification_failures_total.clone()));
        let _ = registry.register(Box::new(message_bytes.clone()));
        VerificationMetrics { registry, verifications_total, verification_failures_total, message_bytes }
    }

    /// Record one verification. `reasons` is empty when the message verified.
    pub fn observe(&self, message_len: usize, reasons: &[&str]) {
        self.message_bytes.observe(message_len as f64);
        let outcome = if reasons.is_empty() { "verified" } else { "rejected" };
        self.verifications_total.with_label_values(&[outcome]).inc();
        for reason in reasons {
            self.verification_failures_total.with_label_values(&[reason]).inc();
        }
    }
}

impl Default for VerificationMetrics {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_counts_outcomes_and_reasons() {
        let metrics = VerificationMetrics::new();
        metrics.observe(40, &[]);
        metrics.observe(12, &["amount_mismatch", "recipient_mismatch"]);
        metrics.observe(0, &["unparseable_message"]);
        assert_eq!(metrics.verifications_total.with_label_values(&["verified"]).get(), 1);
        assert_eq!(metrics.verifications_total.with_label_values(&["rejected"]).get(), 2);
        assert_eq!(metrics.verification_failures_total.with_label_values(&["amount_mismatch"]).get(), 1);
        assert_eq!(metrics.message_bytes.get_sample_count(), 3);
    }

    #[test]
    fn registries_are_independent() {
        let a = VerificationMetrics::new();
        let b = VerificationMetrics::new();
        a.observe(1, &[]);
        assert_eq!(b.verifications_total.with_label_values(&["verified"]).get(), 0);
        assert!(!a.registry.gather().is_empty());
    }
}

//! Prometheus metrics for the wallet.
//!
//! [`WalletMetrics`] owns a dedicated [`Registry`] that a presentation layer
//! can encode into the text exposition format with
//! [`WalletMetrics::encode_text`].

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::TransferError;

pub struct WalletMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Transfer requests that entered the pipeline.
    pub transfers_attempted: IntCounter,
    /// Transfers accepted by the pending pool.
    pub transfers_submitted: IntCounter,
    /// Failed transfers and message signings, by stage and error kind.
    pub transfer_failures: IntCounterVec,
    /// Executor answers carrying neither a block nor an error.
    pub generation_contract_violations: IntCounter,
    /// Raw messages signed.
    pub messages_signed: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a transfer from validation to pool answer.
    pub transfer_duration_ms: Histogram,
}

impl WalletMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let transfers_attempted = register_int_counter_with_registry!(
            Opts::new(
                "quill_transfers_attempted_total",
                "Transfer requests that entered the pipeline"
            ),
            registry
        )?;

        let transfers_submitted = register_int_counter_with_registry!(
            Opts::new(
                "quill_transfers_submitted_total",
                "Transfers accepted by the pending pool"
            ),
            registry
        )?;

        let transfer_failures = register_int_counter_vec_with_registry!(
            Opts::new(
                "quill_transfer_failures_total",
                "Failed wallet operations by pipeline stage and error kind"
            ),
            &["stage", "kind"],
            registry
        )?;

        let generation_contract_violations = register_int_counter_with_registry!(
            Opts::new(
                "quill_generation_contract_violations_total",
                "Executor results with neither block nor error"
            ),
            registry
        )?;

        let messages_signed = register_int_counter_with_registry!(
            Opts::new("quill_messages_signed_total", "Raw messages signed"),
            registry
        )?;

        // 1 ms → ~16 s
        let transfer_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "quill_transfer_duration_ms",
                "Transfer pipeline duration in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 15)?),
            registry
        )?;

        Ok(Self {
            registry,
            transfers_attempted,
            transfers_submitted,
            transfer_failures,
            generation_contract_violations,
            messages_signed,
            transfer_duration_ms,
        })
    }

    pub fn record_failure(&self, error: &TransferError) {
        self.transfer_failures
            .with_label_values(&[error.stage().as_str(), error.kind().as_str()])
            .inc();
        if matches!(error, TransferError::EmptyGenerationResult) {
            self.generation_contract_violations.inc();
        }
    }

    /// Failures recorded for `stage` and `kind` so far.
    pub fn failures(&self, stage: &str, kind: &str) -> u64 {
        self.transfer_failures.with_label_values(&[stage, kind]).get()
    }

    /// Every metric in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

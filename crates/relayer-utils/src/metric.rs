// Copyright 2024 Pell Network Developers.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use prometheus::core::{AtomicU64, GenericCounter};
use prometheus::{opts, Encoder, IntCounterVec, Registry, TextEncoder};

/// A struct definition for collecting metrics in the relayer.
///
/// Every instance owns its own [`Registry`], so several relayer contexts can
/// live in one process (as they do in tests) without colliding on the
/// global default registry.
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    /// Source events received by a watcher, labeled by event name.
    pub events_received: IntCounterVec,
    /// Source events whose handler completed without error.
    pub events_handled: IntCounterVec,
    /// Source events whose handler returned an error and were dropped.
    pub events_failed: IntCounterVec,
    /// Anchor events whose composite record was not found within the scan window.
    pub correlation_misses: GenericCounter<AtomicU64>,
    /// Transactions accepted by a destination ledger.
    pub tx_submitted: GenericCounter<AtomicU64>,
    /// Outbound calls that turned out to be already applied.
    pub tx_benign_revert: GenericCounter<AtomicU64>,
    /// Outbound calls that failed to prepare, sign, submit or execute.
    pub tx_failed: GenericCounter<AtomicU64>,
    /// Failed liveness checks against a ledger connection.
    pub health_check_failures: GenericCounter<AtomicU64>,
}

impl Metrics {
    /// Instantiates the various metrics and their counters, also creates a registry for the counters and
    /// registers the counters
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("pell_relayer".into()), None)?;
        let events_received = IntCounterVec::new(
            opts!("events_received_total", "The total number of source events received"),
            &["event"],
        )?;
        let events_handled = IntCounterVec::new(
            opts!("events_handled_total", "The total number of source events relayed"),
            &["event"],
        )?;
        let events_failed = IntCounterVec::new(
            opts!("events_failed_total", "The total number of source events dropped after a handler error"),
            &["event"],
        )?;
        let correlation_misses = GenericCounter::with_opts(opts!(
            "correlation_misses_total",
            "Composite records not found within the scan window"
        ))?;
        let tx_submitted = GenericCounter::with_opts(opts!(
            "tx_submitted_total",
            "The total number of transactions submitted"
        ))?;
        let tx_benign_revert = GenericCounter::with_opts(opts!(
            "tx_benign_revert_total",
            "Outbound calls whose effect was already applied"
        ))?;
        let tx_failed = GenericCounter::with_opts(opts!(
            "tx_failed_total",
            "Outbound calls that failed"
        ))?;
        let health_check_failures = GenericCounter::with_opts(opts!(
            "health_check_failures_total",
            "Failed ledger liveness checks"
        ))?;

        registry.register(Box::new(events_received.clone()))?;
        registry.register(Box::new(events_handled.clone()))?;
        registry.register(Box::new(events_failed.clone()))?;
        registry.register(Box::new(correlation_misses.clone()))?;
        registry.register(Box::new(tx_submitted.clone()))?;
        registry.register(Box::new(tx_benign_revert.clone()))?;
        registry.register(Box::new(tx_failed.clone()))?;
        registry.register(Box::new(health_check_failures.clone()))?;

        Ok(Self {
            registry,
            events_received,
            events_handled,
            events_failed,
            correlation_misses,
            tx_submitted,
            tx_benign_revert,
            tx_failed,
            health_check_failures,
        })
    }

    /// Gathers the whole relayer metrics
    pub fn gather_metrics(&self) -> Result<String, GatherMetricsError> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode(&metric_families, &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }
}

/// Errors raised while rendering the metrics as text.
#[derive(Debug, thiserror::Error)]
pub enum GatherMetricsError {
    /// Encoding failed.
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    /// The encoder produced invalid UTF-8.
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
}

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

//! # Connection Health Monitor 🩺
//!
//! Watches the liveness of one websocket connection by reading the block
//! height on a fixed interval. Sustained failure takes the whole relayer
//! down: readiness is disabled for good and the shutdown signal is raised.

use std::sync::Arc;
use std::time::Duration;

use pell_ledger_client::LedgerClient;
use pell_relayer_context::RelayerContext;
use pell_relayer_utils::{probe, Error, Result};
use tokio::task::JoinHandle;

/// Counts consecutive failed checks.
#[derive(Debug, Clone, Copy)]
pub struct FailureCounter {
    consecutive: u32,
    threshold: u32,
}

impl FailureCounter {
    /// Trips once more than `threshold` checks in a row failed.
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold,
        }
    }

    /// Records the outcome of one check. Returns `true` when the counter trips.
    pub fn record(&mut self, healthy: bool) -> bool {
        if healthy {
            self.consecutive = 0;
            return false;
        }
        self.consecutive += 1;
        self.consecutive > self.threshold
    }

    /// Failed checks since the last success.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

/// Liveness checks of one websocket connection.
pub struct ConnectionHealthMonitor {
    /// The ledgers sharing this connection, for messages.
    ledger: String,
    client: Arc<dyn LedgerClient>,
    interval: Duration,
    counter: FailureCounter,
}

impl ConnectionHealthMonitor {
    /// Creates a monitor configured from the relayer context.
    pub fn new(
        ctx: &RelayerContext,
        ledger: impl Into<String>,
        client: Arc<dyn LedgerClient>,
    ) -> Self {
        Self {
            ledger: ledger.into(),
            client,
            interval: ctx.config.health.interval(),
            counter: FailureCounter::new(ctx.config.health.max_consecutive_failures),
        }
    }

    /// Takes the initial reading and spawns the check loop.
    ///
    /// Fails without spawning anything when the initial reading fails.
    pub async fn start(self, ctx: RelayerContext) -> Result<JoinHandle<()>> {
        let height = match tokio::time::timeout(
            self.interval,
            self.client.block_number(),
        )
        .await
        {
            Ok(Ok(height)) => height,
            Ok(Err(e)) => {
                tracing::error!(
                    ledger = %self.ledger,
                    error = %e,
                    "initial block number check failed",
                );
                return Err(e);
            }
            Err(_) => {
                tracing::error!(
                    ledger = %self.ledger,
                    "initial block number check timed out",
                );
                return Err(Error::ConnectionLost {
                    ledger: self.ledger,
                });
            }
        };
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Health,
            ledger = %self.ledger,
            %height,
            started = true,
        );
        Ok(tokio::spawn(self.run(ctx)))
    }

    async fn run(mut self, ctx: RelayerContext) {
        let mut shutdown = ctx.shutdown_signal();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::debug!(ledger = %self.ledger, "health monitor stopped");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
            let healthy = self.check(&ctx).await;
            if !self.counter.record(healthy) {
                continue;
            }
            let reason = format!(
                "ledger {} unreachable: block number check failed {} consecutive times",
                self.ledger,
                self.counter.consecutive(),
            );
            tracing::error!(%reason, "connection lost, shutting down");
            if ctx.readiness().disable(reason.as_str()) {
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::Health,
                    ledger = %self.ledger,
                    ready = false,
                );
            }
            ctx.shutdown();
            return;
        }
    }

    async fn check(&self, ctx: &RelayerContext) -> bool {
        let error = match tokio::time::timeout(
            self.interval,
            self.client.block_number(),
        )
        .await
        {
            Ok(Ok(height)) => {
                if self.counter.consecutive() > 0 {
                    tracing::info!(
                        ledger = %self.ledger,
                        %height,
                        "ledger reachable again",
                    );
                }
                tracing::trace!(ledger = %self.ledger, %height, "ledger alive");
                return true;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => String::from("timed out"),
        };
        ctx.metrics.health_check_failures.inc();
        tracing::warn!(
            ledger = %self.ledger,
            failures = self.counter.consecutive() + 1,
            %error,
            "block number check failed",
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use pell_ledger_client::mock::MockLedger;
    use pell_relayer_config::PellRelayerConfig;

    use super::*;

    fn setup() -> (RelayerContext, MockLedger) {
        let ctx = RelayerContext::new(PellRelayerConfig::default()).unwrap();
        let mock = MockLedger::new(1337);
        mock.set_head(7);
        (ctx, mock)
    }

    #[test]
    fn a_success_resets_the_count() {
        let mut counter = FailureCounter::new(3);
        for _ in 0..3 {
            assert!(!counter.record(false));
        }
        assert!(!counter.record(true));
        assert_eq!(counter.consecutive(), 0);
        for _ in 0..3 {
            assert!(!counter.record(false));
        }
        assert!(counter.record(false));
        assert_eq!(counter.consecutive(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn an_unreachable_ledger_fails_startup() {
        let (ctx, mock) = setup();
        mock.set_block_number_failing(true);
        let monitor =
            ConnectionHealthMonitor::new(&ctx, "pellevm", Arc::new(mock));
        assert!(monitor.start(ctx.clone()).await.is_err());
        assert!(!ctx.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    #[tracing_test::traced_test]
    async fn sustained_failures_disable_readiness_once() -> Result<()> {
        let (ctx, mock) = setup();
        assert!(ctx.readiness().enable());
        let monitor =
            ConnectionHealthMonitor::new(&ctx, "pellevm", Arc::new(mock.clone()));
        let handle = monitor.start(ctx.clone()).await?;

        mock.set_block_number_failing(true);
        handle.await.unwrap();

        let snapshot = ctx.readiness().snapshot();
        assert!(!snapshot.ready);
        assert_eq!(
            snapshot.message,
            "ledger pellevm unreachable: block number check failed 4 consecutive times"
        );
        assert_eq!(ctx.metrics.health_check_failures.get(), 4);
        assert!(ctx.is_shutting_down());
        assert!(!ctx.readiness().enable());
        assert!(logs_contain("connection lost"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_changes_nothing() -> Result<()> {
        let (ctx, mock) = setup();
        assert!(ctx.readiness().enable());
        let monitor =
            ConnectionHealthMonitor::new(&ctx, "pellevm", Arc::new(mock.clone()));
        let handle = monitor.start(ctx.clone()).await?;

        tokio::time::sleep(Duration::from_secs(10)).await;
        mock.set_block_number_failing(true);
        ctx.shutdown();
        handle.await.unwrap();

        assert!(ctx.readiness().is_ready());
        assert_eq!(ctx.metrics.health_check_failures.get(), 0);
        Ok(())
    }
}

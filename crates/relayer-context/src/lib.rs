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

#![warn(missing_docs)]
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use pell_ledger_client::{EthersClient, Ledger, LedgerClient, Ledgers};
use pell_relayer_config::PellRelayerConfig;
use pell_relayer_types::rpc_url::RpcUrl;
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::metric::Metrics;
use pell_relayer_utils::{probe, retry};
use pell_signing_backends::TxSigner;
use tokio::sync::watch;

/// Process wide readiness state.
pub mod readiness;

pub use readiness::{ReadinessRegistry, ReadinessSnapshot};

/// How many times a websocket connection is retried at startup.
const WS_CONNECT_RETRIES: usize = 5;

/// RelayerContext contains Relayer's configuration and shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: PellRelayerConfig,
    /// Broadcasts a shutdown signal to all active tasks.
    ///
    /// Raised either by the process signal handler or by the connection
    /// health monitor. A watch channel is used so that a task subscribing
    /// after the signal was raised still observes it.
    notify_shutdown: Arc<watch::Sender<bool>>,
    /// Represents the metrics for the relayer
    pub metrics: Arc<Metrics>,
    readiness: ReadinessRegistry,
}

impl RelayerContext {
    /// Creates a new RelayerContext.
    pub fn new(
        config: PellRelayerConfig,
    ) -> pell_relayer_utils::Result<Self> {
        let (notify_shutdown, _) = watch::channel(false);
        let metrics = Arc::new(Metrics::new()?);
        Ok(Self {
            config,
            notify_shutdown: Arc::new(notify_shutdown),
            metrics,
            readiness: ReadinessRegistry::new(),
        })
    }

    /// Returns a receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }

    /// Sends a shutdown signal to all subscribed tasks.
    pub fn shutdown(&self) {
        self.notify_shutdown.send_replace(true);
    }

    /// Whether the shutdown signal was raised.
    pub fn is_shutting_down(&self) -> bool {
        *self.notify_shutdown.borrow()
    }

    /// The process wide readiness registry.
    pub fn readiness(&self) -> &ReadinessRegistry {
        &self.readiness
    }

    /// Sets up and returns the signer of the relayer account.
    pub fn signer(&self) -> pell_relayer_utils::Result<Arc<dyn TxSigner>> {
        pell_signing_backends::from_config(&self.config.signer)
    }

    /// Connects to every ledger, opening one client pair per distinct endpoint.
    pub async fn connect_ledgers(
        &self,
    ) -> pell_relayer_utils::Result<Ledgers> {
        let mut http_clients: HashMap<RpcUrl, Arc<dyn LedgerClient>> =
            HashMap::new();
        let mut ws_clients: HashMap<RpcUrl, Arc<dyn LedgerClient>> =
            HashMap::new();
        let mut ledgers = Ledgers::default();
        for kind in LedgerKind::ALL {
            let config = self.config.ledger(kind);
            let rpc = match http_clients.get(&config.http_endpoint) {
                Some(client) => client.clone(),
                None => {
                    let client: Arc<dyn LedgerClient> = Arc::new(
                        EthersClient::connect_http(
                            config.http_endpoint.as_url(),
                        )?,
                    );
                    http_clients
                        .insert(config.http_endpoint.clone(), client.clone());
                    client
                }
            };
            let ws = match ws_clients.get(&config.ws_endpoint) {
                Some(client) => client.clone(),
                None => {
                    let client = connect_ws(&config.ws_endpoint).await?;
                    ws_clients.insert(config.ws_endpoint.clone(), client.clone());
                    client
                }
            };
            let chain_id = rpc.chain_id().await?;
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Lifecycle,
                ledger = %kind,
                %chain_id,
                ws_endpoint = %config.ws_endpoint,
                "ledger connected",
            );
            ledgers.insert(Ledger {
                kind,
                chain_id,
                rpc,
                ws,
                ws_endpoint: config.ws_endpoint.to_string(),
                explorer: config.explorer.clone(),
            });
        }
        Ok(ledgers)
    }
}

async fn connect_ws(
    url: &RpcUrl,
) -> pell_relayer_utils::Result<Arc<dyn LedgerClient>> {
    let backoff = retry::ConstantWithMaxRetryCount::new(
        Duration::from_secs(1),
        WS_CONNECT_RETRIES,
    );
    let client = backoff::future::retry(backoff, || async {
        EthersClient::connect_ws(url.as_url()).await.map_err(|e| {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::WARN,
                kind = %probe::Kind::Retry,
                %url,
                error = %e,
                "websocket connection failed",
            );
            backoff::Error::transient(e)
        })
    })
    .await?;
    Ok(Arc::new(client))
}

/// Listens for the shutdown signal.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `watch::Receiver`.
    pub fn new(notify: watch::Receiver<bool>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        // If the shutdown signal has already been received, then return
        // immediately.
        if self.shutdown {
            return;
        }

        // a closed channel means the context is gone, which is a shutdown too.
        let _ = self.notify.wait_for(|stop| *stop).await;

        // Remember that the signal has been received.
        self.shutdown = true;
    }

    /// Whether the signal was raised, without waiting.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown || *self.notify.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn late_subscribers_observe_the_signal() -> pell_relayer_utils::Result<()> {
        let ctx = RelayerContext::new(PellRelayerConfig::default())?;
        let mut early = ctx.shutdown_signal();
        assert!(!early.is_shutdown());
        ctx.shutdown();
        early.recv().await;
        let mut late = ctx.shutdown_signal();
        assert!(late.is_shutdown());
        late.recv().await;
        assert!(ctx.is_shutting_down());
        Ok(())
    }

    #[tokio::test]
    async fn contexts_do_not_share_metrics() -> pell_relayer_utils::Result<()> {
        let a = RelayerContext::new(PellRelayerConfig::default())?;
        let b = RelayerContext::new(PellRelayerConfig::default())?;
        a.metrics.tx_submitted.inc();
        assert_eq!(b.metrics.tx_submitted.get(), 0);
        Ok(())
    }

    #[test]
    fn builds_the_configured_signer() -> pell_relayer_utils::Result<()> {
        let ctx = RelayerContext::new(PellRelayerConfig::default())?;
        let signer = ctx.signer()?;
        let devnet: ethers::types::Address =
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(signer.address(), devnet);
        Ok(())
    }
}

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

//! # Relayer Service Module 🕸️
//!
//! A module for starting long-running tasks for event watching.
//!
//! ## Overview
//!
//! Services are tasks which the relayer constantly runs throughout its lifetime:
//! one per event watcher, one health monitor per ledger connection and the
//! status server. All of them stop on the shared shutdown signal.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use pell_event_watcher_traits::WatcherState;
use pell_ew_evm::{build_watchers, resolve_contracts, update_connectors};
use pell_ledger_client::{Ledger, Ledgers};
use pell_relayer_context::{ReadinessSnapshot, RelayerContext};
use pell_relayer_tx_queue::TxSubmitter;
use pell_relayer_utils::probe;
use tokio::task::JoinHandle;

use crate::health::ConnectionHealthMonitor;

/// How long in-flight status requests may drain after shutdown.
const GRACEFUL_DRAIN: Duration = Duration::from_secs(5);

/// Handles of the background tasks started by [`ignite`].
#[derive(Debug)]
pub struct Services {
    /// One per event watcher, resolving to its terminal state.
    pub watchers: Vec<JoinHandle<WatcherState>>,
    /// One per websocket connection.
    pub monitors: Vec<JoinHandle<()>>,
}

impl Services {
    /// Waits for every task to finish.
    pub async fn join(self) {
        for handle in self.monitors {
            let _ = handle.await;
        }
        for handle in self.watchers {
            match handle.await {
                Ok(state) => tracing::debug!(%state, "event watcher finished"),
                Err(e) => tracing::error!(error = %e, "event watcher task panicked"),
            }
        }
    }
}

/// Connects to the configured ledgers and starts every background service.
///
/// Returns once all watchers are listening and the relayer is marked ready.
pub async fn ignite(ctx: &RelayerContext) -> crate::Result<Services> {
    tracing::debug!(
        "Relayer configuration: {}",
        serde_json::to_string_pretty(&ctx.config)?
    );
    let ledgers = ctx.connect_ledgers().await?;
    start_services(ctx, &ledgers).await
}

/// Starts every background service over already connected ledgers.
///
/// Setup is all or nothing: the first error is returned and readiness is
/// left untouched.
pub async fn start_services(
    ctx: &RelayerContext,
    ledgers: &Ledgers,
) -> crate::Result<Services> {
    let mut monitors = Vec::new();
    match setup(ctx, ledgers, &mut monitors).await {
        Ok(watchers) => Ok(Services { watchers, monitors }),
        Err(e) => {
            monitors.iter().for_each(JoinHandle::abort);
            Err(e)
        }
    }
}

async fn setup(
    ctx: &RelayerContext,
    ledgers: &Ledgers,
    monitors: &mut Vec<JoinHandle<()>>,
) -> crate::Result<Vec<JoinHandle<WatcherState>>> {
    for (endpoint, (ledger, names)) in connections(ledgers) {
        tracing::debug!(%endpoint, ledgers = %names, "starting health monitor");
        let monitor = ConnectionHealthMonitor::new(ctx, names, ledger.ws.clone());
        monitors.push(monitor.start(ctx.clone()).await?);
    }

    let signer = ctx.signer()?;
    let submitter = TxSubmitter::from_context(ctx, ledgers, signer);
    tracing::info!(relayer = ?submitter.address(), "relayer account");
    let contracts = resolve_contracts(ledgers, &ctx.config.contracts).await?;
    if ctx.config.auto_update_connector {
        update_connectors(&submitter, &contracts.configured, ctx.shutdown_signal())
            .await?;
    }

    let mut watchers = build_watchers(ctx, ledgers, &submitter, &contracts)?;
    for watcher in watchers.iter_mut() {
        let info = watcher.info();
        tracing::debug!(
            ledger = %info.source,
            contract = info.contract,
            event = info.event,
            "Starting event watcher",
        );
        watcher.init().await?;
    }
    let mut handles = Vec::with_capacity(watchers.len());
    for watcher in watchers.iter_mut() {
        handles.push(watcher.listen(ctx.shutdown_signal())?);
    }
    if ctx.readiness().enable() {
        tracing::info!(watchers = handles.len(), "relayer is ready");
    }
    Ok(handles)
}

/// Groups the ledgers by websocket endpoint, naming each group after its
/// ledgers.
fn connections(ledgers: &Ledgers) -> BTreeMap<String, (Ledger, String)> {
    let mut groups: BTreeMap<String, (Ledger, String)> = BTreeMap::new();
    for ledger in ledgers.iter() {
        groups
            .entry(ledger.ws_endpoint.clone())
            .and_modify(|(_, names)| {
                names.push(',');
                names.push_str(&ledger.kind.to_string());
            })
            .or_insert_with(|| (ledger.clone(), ledger.kind.to_string()));
    }
    groups
}

async fn handle_status(
    State(ctx): State<Arc<RelayerContext>>,
) -> Json<ReadinessSnapshot> {
    Json(ctx.readiness().snapshot())
}

async fn handle_metrics(
    State(ctx): State<Arc<RelayerContext>>,
) -> Result<String, (StatusCode, String)> {
    ctx.metrics
        .gather_metrics()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// The routes of the status server.
pub fn build_router(ctx: RelayerContext) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/metrics", get(handle_metrics))
        .with_state(Arc::new(ctx))
}

/// Serves the status routes on the configured port until shutdown.
///
/// After the shutdown signal, in-flight requests get a bounded drain before
/// the server is dropped.
pub async fn build_axum_services(ctx: RelayerContext) -> crate::Result<()> {
    let socket_addr = SocketAddr::from(([0, 0, 0, 0], ctx.config.port));
    let mut graceful = ctx.shutdown_signal();
    let server = axum::Server::try_bind(&socket_addr)?
        .serve(build_router(ctx.clone()).into_make_service())
        .with_graceful_shutdown(async move { graceful.recv().await });
    tracing::info!("Starting the server on {}", socket_addr);
    tokio::pin!(server);

    let mut shutdown = ctx.shutdown_signal();
    tokio::select! {
        result = &mut server => result?,
        _ = shutdown.recv() => {
            match tokio::time::timeout(GRACEFUL_DRAIN, &mut server).await {
                Ok(result) => result?,
                Err(_) => tracing::warn!("status server did not drain in time, closing"),
            }
        }
    }
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        server_stopped = true,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use ethers::types::{Address, U256};
    use pell_ledger_client::mock::MockLedger;
    use pell_relayer_config::PellRelayerConfig;
    use pell_relayer_types::LedgerKind;
    use tower::ServiceExt;

    use super::*;

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn config() -> PellRelayerConfig {
        let mut config = PellRelayerConfig::default();
        config.contracts.pell_stake_registry_router = Some(Address::repeat_byte(0x5e));
        config.contracts.pell_strategy_manager = Some(Address::repeat_byte(0x5f));
        config
    }

    /// Every ledger on its own mock, pell and dvs sharing one connection.
    fn ledgers() -> (Ledgers, MockLedger, MockLedger) {
        let shared = MockLedger::new(1337);
        let staking = MockLedger::new(17000);
        let ledgers = LedgerKind::ALL
            .into_iter()
            .map(|kind| {
                let mock = match kind {
                    LedgerKind::Staking => staking.clone(),
                    _ => shared.clone(),
                };
                let endpoint = match kind {
                    LedgerKind::Staking => "ws://staking:8546",
                    _ => "ws://hub:8546",
                };
                Ledger {
                    kind,
                    chain_id: U256::from(match kind {
                        LedgerKind::Staking => 17000u64,
                        _ => 1337,
                    }),
                    rpc: Arc::new(mock.clone()),
                    ws: Arc::new(mock),
                    ws_endpoint: endpoint.into(),
                    explorer: None,
                }
            })
            .collect();
        (ledgers, shared, staking)
    }

    #[tokio::test]
    async fn status_reports_the_readiness_snapshot() {
        let ctx = RelayerContext::new(PellRelayerConfig::default()).unwrap();
        let (status, body) = get_body(build_router(ctx.clone()), "/status").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ready": false, "message": "initializing"}));

        ctx.readiness().enable();
        let (_, body) = get_body(build_router(ctx.clone()), "/status").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, serde_json::json!({"ready": true, "message": "ok"}));
    }

    #[tokio::test]
    async fn metrics_are_served_as_text() {
        let ctx = RelayerContext::new(PellRelayerConfig::default()).unwrap();
        ctx.metrics.tx_submitted.inc();
        let (status, body) = get_body(build_router(ctx), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("pell_relayer_tx_submitted_total 1"));
    }

    #[test]
    fn one_monitor_per_connection() {
        let (ledgers, _, _) = ledgers();
        let groups = connections(&ledgers);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["ws://hub:8546"].1, "pellevm,serviceevm,dvsevm");
        assert_eq!(groups["ws://staking:8546"].1, "stakingevm");
    }

    #[tokio::test(start_paused = true)]
    async fn services_start_listening_and_become_ready() -> crate::Result<()> {
        let ctx = RelayerContext::new(config())?;
        let (ledgers, shared, staking) = ledgers();
        let services = start_services(&ctx, &ledgers).await?;
        assert_eq!(services.watchers.len(), 12);
        assert_eq!(services.monitors.len(), 2);
        assert!(ctx.readiness().is_ready());
        assert_eq!(shared.active_subscriptions() + staking.active_subscriptions(), 12);

        ctx.shutdown();
        services.join().await;
        assert_eq!(shared.active_subscriptions() + staking.active_subscriptions(), 0);
        assert!(ctx.readiness().is_ready());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn an_unreachable_ledger_aborts_startup() {
        let ctx = RelayerContext::new(config()).unwrap();
        let (ledgers, _, staking) = ledgers();
        staking.set_block_number_failing(true);
        assert!(start_services(&ctx, &ledgers).await.is_err());
        assert!(!ctx.readiness().is_ready());
        assert_eq!(ctx.readiness().snapshot().message, "initializing");
    }

    #[tokio::test(start_paused = true)]
    async fn connectors_are_updated_before_watching() -> crate::Result<()> {
        let mut config = config();
        config.auto_update_connector = true;
        let ctx = RelayerContext::new(config)?;
        let (ledgers, shared, staking) = ledgers();
        let services = start_services(&ctx, &ledgers).await?;
        // dvs and service share the hub mock, staking has its own.
        assert_eq!(shared.submitted().len(), 2);
        assert_eq!(staking.submitted().len(), 1);
        ctx.shutdown();
        services.join().await;
        Ok(())
    }
}

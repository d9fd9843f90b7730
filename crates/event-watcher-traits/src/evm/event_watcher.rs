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

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use ethers::contract::{EthEvent, LogMeta};
use ethers::types::{Filter, Log};
use pell_ledger_client::{LedgerClient, LogSubscription};
use pell_relayer_context::{RelayerContext, Shutdown};
use pell_relayer_utils::metric::Metrics;
use pell_relayer_utils::{probe, Error, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::{log_meta, raw_log};
use crate::{EventWatcher, WatcherInfo, WatcherState};

/// A trait that defines a handler for one event type.
///
/// The watcher awaits the handler for an event before it looks at the next
/// one, so a handler never overlaps with itself.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// The type of event this handler is for.
    type Event: EthEvent + Clone + Debug + Send + Sync + 'static;

    /// Narrows the live subscription, for example by indexed topics.
    ///
    /// The filter passed in already selects the contract and the event
    /// signature.
    fn filter(&self, filter: Filter) -> Filter {
        filter
    }

    /// a method to be called with the event information,
    /// it is up to the handler to decide what to do with the event.
    ///
    /// An error is logged by the watcher and the event is dropped.
    async fn handle_event(
        &self,
        (event, log): (Self::Event, LogMeta),
        shutdown: Shutdown,
    ) -> Result<()>;
}

/// The [`EventWatcher`] of one contract event, driving one [`EventHandler`].
pub struct ContractEventWatcher<H: EventHandler> {
    info: WatcherInfo,
    client: Arc<dyn LedgerClient>,
    handler: Arc<H>,
    subscription: Option<LogSubscription>,
    state: Arc<watch::Sender<WatcherState>>,
    subscription_backoff: Duration,
    idle_tick: Duration,
    metrics: Arc<Metrics>,
}

impl<H: EventHandler> ContractEventWatcher<H> {
    /// Creates a watcher that subscribes through `client`.
    pub fn new(
        ctx: &RelayerContext,
        info: WatcherInfo,
        client: Arc<dyn LedgerClient>,
        handler: H,
    ) -> Self {
        let (state, _) = watch::channel(WatcherState::Created);
        Self {
            info,
            client,
            handler: Arc::new(handler),
            subscription: None,
            state: Arc::new(state),
            subscription_backoff: ctx.config.relay.subscription_backoff(),
            idle_tick: ctx.config.relay.idle_tick(),
            metrics: ctx.metrics.clone(),
        }
    }

    /// The live subscription filter: the contract and the event signature.
    pub fn subscription_filter(&self) -> Filter {
        self.handler.filter(
            Filter::new()
                .address(self.info.address)
                .topic0(H::Event::signature()),
        )
    }

    fn invalid_state(&self, action: &'static str) -> Error {
        Error::InvalidWatcherState {
            action,
            state: self.state().to_string(),
        }
    }
}

#[async_trait::async_trait]
impl<H: EventHandler> EventWatcher for ContractEventWatcher<H> {
    fn info(&self) -> &WatcherInfo {
        &self.info
    }

    fn state(&self) -> WatcherState {
        *self.state.borrow()
    }

    fn watch_state(&self) -> watch::Receiver<WatcherState> {
        self.state.subscribe()
    }

    #[tracing::instrument(
        skip_all,
        fields(event = %self.info.event, src = %self.info.source),
    )]
    async fn init(&mut self) -> Result<()> {
        if self.state() != WatcherState::Created {
            return Err(self.invalid_state("init"));
        }
        let filter = self.subscription_filter();
        match self.client.subscribe_logs(&filter).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.state.send_replace(WatcherState::Subscribed);
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::DEBUG,
                    kind = %probe::Kind::Subscription,
                    event = %self.info.event,
                    address = ?self.info.address,
                    subscribed = true,
                );
                Ok(())
            }
            Err(e) => {
                self.state.send_replace(WatcherState::Faulted);
                tracing::error!(
                    error = %e,
                    address = ?self.info.address,
                    "failed to subscribe to {}",
                    self.info.event,
                );
                Err(e)
            }
        }
    }

    fn listen(&mut self, shutdown: Shutdown) -> Result<JoinHandle<WatcherState>> {
        if self.state() != WatcherState::Subscribed {
            return Err(self.invalid_state("listen"));
        }
        let subscription = self
            .subscription
            .take()
            .ok_or_else(|| self.invalid_state("listen"))?;
        self.state.send_replace(WatcherState::Running);
        let span = tracing::info_span!(
            "event_watcher",
            event = %self.info.event,
            src = %self.info.source,
            contract = %self.info.contract,
            targets = %self.info.targets_label(),
        );
        let task = WatchLoop {
            event: self.info.event,
            handler: self.handler.clone(),
            state: self.state.clone(),
            subscription_backoff: self.subscription_backoff,
            idle_tick: self.idle_tick,
            metrics: self.metrics.clone(),
        };
        Ok(tokio::spawn(task.run(subscription, shutdown).instrument(span)))
    }
}

/// The running half of a [`ContractEventWatcher`].
struct WatchLoop<H: EventHandler> {
    event: &'static str,
    handler: Arc<H>,
    state: Arc<watch::Sender<WatcherState>>,
    subscription_backoff: Duration,
    idle_tick: Duration,
    metrics: Arc<Metrics>,
}

impl<H: EventHandler> WatchLoop<H> {
    async fn run(
        self,
        mut subscription: LogSubscription,
        mut shutdown: Shutdown,
    ) -> WatcherState {
        let mut logs_open = true;
        let mut errors_open = true;
        let mut idle = tokio::time::interval(self.idle_tick);
        idle.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Lifecycle,
            event = %self.event,
            running = true,
        );
        let last = loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    self.state.send_replace(WatcherState::Draining);
                    subscription.unsubscribe();
                    tracing::info!("event watcher stopped");
                    break WatcherState::Stopped;
                }
                maybe_log = subscription.logs.recv(), if logs_open => {
                    let Some(log) = maybe_log else {
                        logs_open = false;
                        tracing::warn!("live log feed closed, waiting for shutdown");
                        continue;
                    };
                    if let Err(e) = self.process(log, &shutdown).await {
                        tracing::error!(error = %e, "failed to decode {}, giving up", self.event);
                        subscription.unsubscribe();
                        break WatcherState::Faulted;
                    }
                }
                maybe_err = subscription.errors.recv(), if errors_open => {
                    let Some(e) = maybe_err else {
                        errors_open = false;
                        continue;
                    };
                    tracing::event!(
                        target: probe::TARGET,
                        tracing::Level::WARN,
                        kind = %probe::Kind::Subscription,
                        event = %self.event,
                        error = %e,
                        backoff_ms = self.subscription_backoff.as_millis() as u64,
                    );
                    tokio::select! {
                        _ = shutdown.recv() => {}
                        _ = tokio::time::sleep(self.subscription_backoff) => {}
                    }
                }
                _ = idle.tick() => {
                    tracing::trace!("idle");
                }
            }
        };
        self.state.send_replace(last);
        last
    }

    /// Decodes and handles one log. Only a decode failure is an error.
    async fn process(&self, log: Log, shutdown: &Shutdown) -> Result<()> {
        let meta = log_meta(&log);
        if log.removed == Some(true) {
            tracing::warn!(
                tx_hash = ?meta.transaction_hash,
                block = %meta.block_number,
                "skipping removed log",
            );
            return Ok(());
        }
        let event = <H::Event as EthEvent>::decode_log(&raw_log(&log))?;
        self.metrics
            .events_received
            .with_label_values(&[self.event])
            .inc();
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::Relay,
            event = %self.event,
            block = %meta.block_number,
            tx_hash = ?meta.transaction_hash,
            received = true,
        );
        let tx_hash = meta.transaction_hash;
        match self.handler.handle_event((event, meta), shutdown.clone()).await {
            Ok(()) => {
                self.metrics
                    .events_handled
                    .with_label_values(&[self.event])
                    .inc();
            }
            Err(e) => {
                self.metrics
                    .events_failed
                    .with_label_values(&[self.event])
                    .inc();
                tracing::error!(
                    error = %e,
                    ?tx_hash,
                    "Error while handling the event",
                );
            }
        }
        Ok(())
    }
}

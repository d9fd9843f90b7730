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
//! # Relayer Events Watcher Module 🕸️
//!
//! A module that listens for events on a given ledger.
//!
//! ## Overview
//!
//! Every (contract, event) pair the relayer follows is owned by one
//! [`EventWatcher`]. A watcher is set up in two steps: [`EventWatcher::init`]
//! opens the live subscription, and [`EventWatcher::listen`] spawns the watch
//! loop that decodes each log and hands it to an [`EventHandler`]. Handlers
//! that need more than the triggering log use the [`Correlator`] to recover
//! the sibling logs of the same transaction.

use derive_more::Display;
use ethers::types::Address;
use pell_relayer_context::Shutdown;
use pell_relayer_tx_queue::EventTarget;
use pell_relayer_types::LedgerKind;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Contract event watching and correlation.
pub mod evm;
pub use evm::{
    log_meta, Composite, CompositeScan, ContractEventWatcher, Correlation,
    Correlator, EventHandler,
};

#[cfg(test)]
mod tests;

/// The lifecycle of an event watcher.
///
/// `Created → Subscribed → Running → {Draining → Stopped | Faulted}`
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatcherState {
    /// Built, not subscribed yet.
    #[display(fmt = "created")]
    Created,
    /// The live subscription is open.
    #[display(fmt = "subscribed")]
    Subscribed,
    /// The watch loop is running.
    #[display(fmt = "running")]
    Running,
    /// Cancellation was received, the subscription is being released.
    #[display(fmt = "draining")]
    Draining,
    /// Released its subscription after cancellation.
    #[display(fmt = "stopped")]
    Stopped,
    /// Hit a setup or decode error it cannot recover from.
    #[display(fmt = "faulted")]
    Faulted,
}

impl WatcherState {
    /// Whether the watcher is done for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Faulted)
    }
}

/// What a watcher follows and where its events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherInfo {
    /// The ledger the events come from.
    pub source: LedgerKind,
    /// The name of the source contract.
    pub contract: &'static str,
    /// The address of the source contract.
    pub address: Address,
    /// The name of the watched event.
    pub event: &'static str,
    /// The destination methods this event feeds.
    pub targets: Vec<EventTarget>,
}

impl WatcherInfo {
    /// The targets, joined for a log field.
    pub fn targets_label(&self) -> String {
        self.targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A long lived watch over one (contract, event) pair.
#[async_trait::async_trait]
pub trait EventWatcher: Send + Sync {
    /// What this watcher follows.
    fn info(&self) -> &WatcherInfo;

    /// The current lifecycle state.
    fn state(&self) -> WatcherState;

    /// A receiver that observes every state change.
    fn watch_state(&self) -> watch::Receiver<WatcherState>;

    /// Opens the live subscription and returns.
    ///
    /// An error here is a setup error: the watcher is faulted and the
    /// relayer should not start.
    async fn init(&mut self) -> pell_relayer_utils::Result<()>;

    /// Spawns the watch loop and returns its handle.
    ///
    /// Must be called exactly once, after a successful [`EventWatcher::init`].
    /// The task resolves to the terminal state of the watcher.
    fn listen(
        &mut self,
        shutdown: Shutdown,
    ) -> pell_relayer_utils::Result<JoinHandle<WatcherState>>;
}

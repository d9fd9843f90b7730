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
//! # Ledger Client 🕸️
//!
//! Read and write access to one ledger: block height, historical and live
//! logs, nonce and fee state, transaction submission and receipts.
//!
//! Every ledger is reached through two clients, an http one for calls and
//! submission and a websocket one for live subscriptions. Both sit behind the
//! same [`LedgerClient`] trait so the rest of the relayer never names a
//! transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Block, Bytes, Filter, Log, Signature, TransactionReceipt, H256,
    U256, U64,
};
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::{Error, Result};
use tokio::sync::{mpsc, oneshot};

/// Ledger client backed by ethers providers.
pub mod evm;
/// In-memory ledger for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use evm::EthersClient;

/// A transaction together with the signature authorizing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// The transaction that was signed.
    pub tx: TypedTransaction,
    /// The sender's signature over it.
    pub signature: Signature,
}

impl SignedTransaction {
    /// The transaction hash, as the ledger will report it.
    pub fn hash(&self) -> H256 {
        self.tx.hash(&self.signature)
    }

    /// The raw, submittable encoding.
    pub fn rlp(&self) -> Bytes {
        self.tx.rlp_signed(&self.signature)
    }

    /// The account nonce this transaction consumes.
    pub fn nonce(&self) -> Option<U256> {
        self.tx.nonce().copied()
    }
}

/// A live log feed.
///
/// Logs and transport errors arrive on separate channels. Dropping the
/// subscription unsubscribes from the ledger.
#[derive(Debug)]
pub struct LogSubscription {
    /// Logs matching the subscription filter, in delivery order.
    pub logs: mpsc::Receiver<Log>,
    /// Transport errors of the subscription.
    pub errors: mpsc::Receiver<Error>,
    unsubscribe: Option<oneshot::Sender<()>>,
}

impl LogSubscription {
    /// Creates a subscription; `unsubscribe` is fired once when it is released.
    pub fn new(
        logs: mpsc::Receiver<Log>,
        errors: mpsc::Receiver<Error>,
        unsubscribe: oneshot::Sender<()>,
    ) -> Self {
        Self {
            logs,
            errors,
            unsubscribe: Some(unsubscribe),
        }
    }

    /// Stops the feed and releases the log channel.
    pub fn unsubscribe(&mut self) {
        if let Some(tx) = self.unsubscribe.take() {
            let _ = tx.send(());
        }
        self.logs.close();
        self.errors.close();
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Read and write access to a ledger.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync + 'static {
    /// The chain id of the ledger.
    async fn chain_id(&self) -> Result<U256>;
    /// The current block height.
    async fn block_number(&self) -> Result<U64>;
    /// The block at the given height, if any.
    async fn block_by_number(&self, number: U64) -> Result<Option<Block<H256>>>;
    /// Opens a live feed of the logs matching `filter`.
    async fn subscribe_logs(&self, filter: &Filter) -> Result<LogSubscription>;
    /// Returns the historical logs matching `filter`, including its block range.
    async fn query_logs(&self, filter: &Filter) -> Result<Vec<Log>>;
    /// Executes a read-only call against the latest state.
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;
    /// The next nonce of `address`, counting pending transactions.
    async fn pending_nonce(&self, address: Address) -> Result<U256>;
    /// Fills gas and fee fields. Fails with [`Error::Revert`] when the ledger
    /// predicts the call reverts.
    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<()>;
    /// Submits a signed transaction, returning its hash.
    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<H256>;
    /// The receipt of a transaction, once it is included.
    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>>;
}

/// A ledger the relayer is connected to.
#[derive(Clone)]
pub struct Ledger {
    /// Which ledger this is.
    pub kind: LedgerKind,
    /// Its chain id, read once at connection time.
    pub chain_id: U256,
    /// Client for calls, queries and submission.
    pub rpc: Arc<dyn LedgerClient>,
    /// Client for live subscriptions and liveness checks.
    pub ws: Arc<dyn LedgerClient>,
    /// The websocket endpoint, as printed in logs.
    pub ws_endpoint: String,
    /// Block explorer base url.
    pub explorer: Option<url::Url>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("kind", &self.kind)
            .field("chain_id", &self.chain_id)
            .field("ws_endpoint", &self.ws_endpoint)
            .finish()
    }
}

/// All ledgers the relayer is connected to.
#[derive(Debug, Clone, Default)]
pub struct Ledgers(BTreeMap<LedgerKind, Ledger>);

impl Ledgers {
    /// Registers a ledger, replacing an earlier one of the same kind.
    pub fn insert(&mut self, ledger: Ledger) {
        self.0.insert(ledger.kind, ledger);
    }

    /// Returns the ledger of the given kind.
    pub fn get(&self, kind: LedgerKind) -> Result<&Ledger> {
        self.0.get(&kind).ok_or_else(|| Error::LedgerNotConfigured {
            ledger: kind.to_string(),
        })
    }

    /// Iterates over the connected ledgers.
    pub fn iter(&self) -> impl Iterator<Item = &Ledger> {
        self.0.values()
    }
}

impl FromIterator<Ledger> for Ledgers {
    fn from_iter<T: IntoIterator<Item = Ledger>>(iter: T) -> Self {
        let mut ledgers = Ledgers::default();
        iter.into_iter().for_each(|l| ledgers.insert(l));
        ledgers
    }
}

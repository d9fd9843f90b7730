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

//! An in-memory ledger.
//!
//! It keeps a log history, forwards emitted logs to live subscriptions,
//! "mines" every accepted transaction into its own block and rejects nonce
//! reuse the way a node's mempool would.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Block, Bytes, Filter, Log, TransactionReceipt, ValueOrArray,
    H256, U256, U64,
};
use parking_lot::{Mutex, MutexGuard};
use pell_relayer_utils::{Error, Result};
use tokio::sync::{mpsc, oneshot};

use super::{LedgerClient, LogSubscription, SignedTransaction};

#[derive(Debug)]
struct MockSubscription {
    filter: Filter,
    logs: mpsc::Sender<Log>,
    errors: mpsc::Sender<Error>,
}

#[derive(Debug, Default)]
struct MockState {
    chain_id: U256,
    head: u64,
    history: Vec<Log>,
    subscriptions: Vec<MockSubscription>,
    submitted: Vec<SignedTransaction>,
    receipts: HashMap<H256, TransactionReceipt>,
    applied: HashSet<(Address, Bytes)>,
    call_results: HashMap<(Address, Bytes), Bytes>,
    duplicate_revert: Option<String>,
    failing_block_number: bool,
    failing_execution: bool,
    submit_delay: Duration,
}

/// A cloneable handle to one in-memory ledger.
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
}

impl MockLedger {
    /// Creates an empty ledger with the given chain id.
    pub fn new(chain_id: u64) -> Self {
        let ledger = Self::default();
        ledger.lock().chain_id = U256::from(chain_id);
        ledger
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock()
    }

    /// Moves the head to `number`.
    pub fn set_head(&self, number: u64) {
        self.lock().head = number;
    }

    /// Adds a log to the history only.
    pub fn push_log(&self, log: Log) {
        self.lock().history.push(log);
    }

    /// Adds a log to the history and delivers it to matching live subscriptions.
    pub fn emit(&self, log: Log) {
        let mut state = self.lock();
        state.history.push(log.clone());
        for sub in &state.subscriptions {
            if matches_filter(&sub.filter, &log, false) {
                let _ = sub.logs.try_send(log.clone());
            }
        }
    }

    /// Sends a transport error to every live subscription.
    pub fn fail_subscriptions(&self, reason: &'static str) {
        for sub in &self.lock().subscriptions {
            let _ = sub.errors.try_send(Error::Generic(reason));
        }
    }

    /// Number of subscriptions that were not released yet.
    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .subscriptions
            .iter()
            .filter(|s| !s.logs.is_closed())
            .count()
    }

    /// Makes every block number read fail (or succeed again).
    pub fn set_block_number_failing(&self, failing: bool) {
        self.lock().failing_block_number = failing;
    }

    /// Makes gas estimation revert with `code` for calls that were already executed.
    pub fn revert_duplicates_with(&self, code: &str) {
        self.lock().duplicate_revert = Some(code.to_string());
    }

    /// Makes included transactions fail (status 0).
    pub fn set_execution_failing(&self, failing: bool) {
        self.lock().failing_execution = failing;
    }

    /// Delays every submission, to interleave concurrent senders.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.lock().submit_delay = delay;
    }

    /// Sets what a read-only call of `data` on `to` returns.
    pub fn set_call_result(&self, to: Address, data: Bytes, result: Bytes) {
        self.lock().call_results.insert((to, data), result);
    }

    /// All transactions accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.lock().submitted.clone()
    }
}

/// Builds a mined log.
pub fn mined_log(
    address: Address,
    topics: Vec<H256>,
    data: impl Into<Bytes>,
    block_number: u64,
    transaction_hash: H256,
) -> Log {
    Log {
        address,
        topics,
        data: data.into(),
        block_hash: Some(H256::from_low_u64_be(block_number)),
        block_number: Some(U64::from(block_number)),
        transaction_hash: Some(transaction_hash),
        transaction_index: Some(U64::zero()),
        log_index: Some(U256::zero()),
        removed: Some(false),
        ..Default::default()
    }
}

fn topic_matches(
    wanted: &Option<ValueOrArray<Option<H256>>>,
    actual: Option<&H256>,
) -> bool {
    match wanted {
        None | Some(ValueOrArray::Value(None)) => true,
        Some(ValueOrArray::Value(Some(t))) => actual == Some(t),
        Some(ValueOrArray::Array(options)) => options
            .iter()
            .any(|o| o.as_ref().map_or(true, |t| actual == Some(t))),
    }
}

fn matches_filter(filter: &Filter, log: &Log, check_range: bool) -> bool {
    let address_ok = match &filter.address {
        None => true,
        Some(ValueOrArray::Value(a)) => *a == log.address,
        Some(ValueOrArray::Array(all)) => all.contains(&log.address),
    };
    let topics_ok = filter
        .topics
        .iter()
        .enumerate()
        .all(|(i, wanted)| topic_matches(wanted, log.topics.get(i)));
    let range_ok = !check_range || {
        let number = log.block_number.unwrap_or_default();
        filter.get_from_block().map_or(true, |from| number >= from)
            && filter.get_to_block().map_or(true, |to| number <= to)
    };
    address_ok && topics_ok && range_ok
}

fn call_key(tx: &TypedTransaction) -> (Address, Bytes) {
    let to = tx
        .to()
        .and_then(|to| to.as_address())
        .copied()
        .unwrap_or_default();
    (to, tx.data().cloned().unwrap_or_default())
}

#[async_trait::async_trait]
impl LedgerClient for MockLedger {
    async fn chain_id(&self) -> Result<U256> {
        Ok(self.lock().chain_id)
    }

    async fn block_number(&self) -> Result<U64> {
        let state = self.lock();
        if state.failing_block_number {
            return Err(Error::Generic("mock ledger is unreachable"));
        }
        Ok(U64::from(state.head))
    }

    async fn block_by_number(&self, number: U64) -> Result<Option<Block<H256>>> {
        let state = self.lock();
        if number.as_u64() > state.head {
            return Ok(None);
        }
        Ok(Some(Block {
            number: Some(number),
            hash: Some(H256::from_low_u64_be(number.as_u64())),
            timestamp: U256::from(number.as_u64()) * 12,
            ..Default::default()
        }))
    }

    async fn subscribe_logs(&self, filter: &Filter) -> Result<LogSubscription> {
        let (log_tx, logs) = mpsc::channel(256);
        let (err_tx, errors) = mpsc::channel(8);
        let (unsubscribe, _) = oneshot::channel();
        self.lock().subscriptions.push(MockSubscription {
            filter: filter.clone(),
            logs: log_tx,
            errors: err_tx,
        });
        Ok(LogSubscription::new(logs, errors, unsubscribe))
    }

    async fn query_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|log| matches_filter(filter, log, true))
            .cloned()
            .collect())
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        self.lock()
            .call_results
            .get(&call_key(tx))
            .cloned()
            .ok_or_else(|| Error::Revert {
                reason: String::from("execution reverted"),
            })
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256> {
        let count = self
            .lock()
            .submitted
            .iter()
            .filter(|s| s.tx.from() == Some(&address))
            .count();
        Ok(U256::from(count))
    }

    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<()> {
        let state = self.lock();
        if let Some(code) = &state.duplicate_revert {
            if state.applied.contains(&call_key(tx)) {
                return Err(Error::Revert {
                    reason: format!("execution reverted: {code}"),
                });
            }
        }
        if tx.gas().is_none() {
            tx.set_gas(U256::from(100_000u64));
        }
        tx.set_gas_price(U256::from(1_000_000_000u64));
        Ok(())
    }

    async fn send_transaction(&self, signed: &SignedTransaction) -> Result<H256> {
        let delay = self.lock().submit_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.lock();
        let from = signed.tx.from().copied();
        let reused = state.submitted.iter().any(|s| {
            s.tx.from().copied() == from && s.nonce() == signed.nonce()
        });
        if reused {
            return Err(Error::Submission {
                reason: String::from("nonce too low"),
            });
        }
        let hash = signed.hash();
        state.head += 1;
        let success = !state.failing_execution;
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(state.head)),
            from: from.unwrap_or_default(),
            to: signed.tx.to().and_then(|to| to.as_address()).copied(),
            status: Some(U64::from(u64::from(success))),
            ..Default::default()
        };
        if success {
            let key = call_key(&signed.tx);
            state.applied.insert(key);
        }
        state.receipts.insert(hash, receipt);
        state.submitted.push(signed.clone());
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>> {
        Ok(self.lock().receipts.get(&hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn live_and_historical_logs_follow_the_filter() -> Result<()> {
        let ledger = MockLedger::new(1337);
        let contract = Address::repeat_byte(0x11);
        let topic = H256::repeat_byte(0xaa);
        let filter = Filter::new().address(contract).topic0(topic);
        let mut sub = ledger.subscribe_logs(&filter).await?;

        ledger.emit(mined_log(contract, vec![topic], Vec::<u8>::new(), 5, H256::zero()));
        ledger.emit(mined_log(
            contract,
            vec![H256::repeat_byte(0xbb)],
            Vec::<u8>::new(),
            6,
            H256::zero(),
        ));
        let delivered = sub.logs.recv().await.expect("one log");
        assert_eq!(delivered.block_number, Some(U64::from(5)));
        assert!(sub.logs.try_recv().is_err());

        let ranged = filter.from_block(6u64).to_block(10u64);
        assert!(ledger.query_logs(&ranged).await?.is_empty());

        assert_eq!(ledger.active_subscriptions(), 1);
        sub.unsubscribe();
        assert_eq!(ledger.active_subscriptions(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn clones_share_one_ledger() -> Result<()> {
        let ledger = MockLedger::new(1337);
        let handle = ledger.clone();
        let writer = std::thread::spawn(move || handle.set_head(42));
        writer.join().expect("writer thread");
        assert_eq!(ledger.block_number().await?, U64::from(42));
        ledger.set_block_number_failing(true);
        assert!(ledger.clone().block_number().await.is_err());
        Ok(())
    }
}

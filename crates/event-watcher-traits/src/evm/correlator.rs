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

use std::collections::HashMap;
use std::sync::Arc;

use ethers::contract::{EthEvent, LogMeta};
use ethers::types::{Address, Filter, H256, U64};
use pell_ledger_client::LedgerClient;
use pell_relayer_utils::{probe, Result};

use super::{log_meta, raw_log};

/// A fact split over several events of one transaction.
///
/// The parts are filled in by [`Correlator::collect`], one event kind at a
/// time, and turned into the final value once the scan is over.
pub trait Composite: Default + Send {
    /// The assembled fact.
    type Output;

    /// Returns the fact if every required part was found.
    fn assemble(self) -> Option<Self::Output>;
}

/// The outcome of a correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation<T> {
    /// Every part was found under the anchor transaction.
    Complete(T),
    /// The window was exhausted without finding every part.
    NotFound,
}

/// The state of one bounded historical scan around an anchor event.
#[derive(Debug)]
pub struct CompositeScan<C> {
    anchor_tx: H256,
    from_block: U64,
    to_block: U64,
    records: HashMap<H256, C>,
}

impl<C: Composite> CompositeScan<C> {
    /// The transaction the scan is anchored at.
    pub fn anchor_tx(&self) -> H256 {
        self.anchor_tx
    }

    /// The scanned range, both ends included.
    pub fn range(&self) -> (U64, U64) {
        (self.from_block, self.to_block)
    }

    /// Number of distinct transactions seen so far.
    pub fn transactions(&self) -> usize {
        self.records.len()
    }

    /// Ends the scan. Only the record of the anchor transaction is considered,
    /// other transactions found in the window are dropped.
    pub fn finish(mut self) -> Correlation<C::Output> {
        match self.records.remove(&self.anchor_tx).and_then(C::assemble) {
            Some(output) => Correlation::Complete(output),
            None => Correlation::NotFound,
        }
    }
}

/// Recovers sibling events of an anchor event from the log history.
#[derive(Clone)]
pub struct Correlator {
    client: Arc<dyn LedgerClient>,
    window: u64,
}

impl Correlator {
    /// Creates a correlator scanning `window` blocks after each anchor.
    pub fn new(client: Arc<dyn LedgerClient>, window: u64) -> Self {
        Self { client, window }
    }

    /// Starts a scan over `[anchor_block, anchor_block + window]`.
    pub fn begin<C: Composite>(
        &self,
        anchor_tx: H256,
        anchor_block: U64,
    ) -> CompositeScan<C> {
        CompositeScan {
            anchor_tx,
            from_block: anchor_block,
            to_block: anchor_block.saturating_add(U64::from(self.window)),
            records: HashMap::new(),
        }
    }

    /// Queries every `E` emitted by `address` in the scan range and passes
    /// each to `assign`, together with the record of its transaction.
    ///
    /// Logs that do not decode are skipped. Returns how many were assigned.
    pub async fn collect<E, C, F>(
        &self,
        scan: &mut CompositeScan<C>,
        address: Address,
        mut assign: F,
    ) -> Result<usize>
    where
        E: EthEvent,
        C: Composite,
        F: FnMut(&mut C, E, LogMeta) + Send,
    {
        let filter = Filter::new()
            .address(address)
            .topic0(E::signature())
            .from_block(scan.from_block)
            .to_block(scan.to_block);
        let logs = self.client.query_logs(&filter).await?;
        let mut assigned = 0;
        for log in logs {
            if log.removed == Some(true) {
                continue;
            }
            let meta = log_meta(&log);
            let event = match <E as EthEvent>::decode_log(&raw_log(&log)) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        tx_hash = ?meta.transaction_hash,
                        "skipping undecodable {} log",
                        E::name(),
                    );
                    continue;
                }
            };
            let record = scan.records.entry(meta.transaction_hash).or_default();
            assign(record, event, meta);
            assigned += 1;
        }
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::TRACE,
            kind = %probe::Kind::Correlation,
            event = %E::name(),
            from_block = %scan.from_block,
            to_block = %scan.to_block,
            assigned,
        );
        Ok(assigned)
    }
}

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
use std::time::Duration;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Eip1559TransactionRequest, TransactionReceipt, H256, U256, U64,
};
use pell_ledger_client::{LedgerClient, Ledgers};
use pell_relayer_context::{RelayerContext, Shutdown};
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::clickable_link::tx_link;
use pell_relayer_utils::metric::Metrics;
use pell_relayer_utils::{probe, Error, Result};
use pell_signing_backends::TxSigner;
use tokio::sync::Mutex;

use crate::OutboundCall;

/// The result of a successful [`TxSubmitter::send`].
#[derive(Debug, Clone, PartialEq)]
pub enum TxOutcome {
    /// The transaction was included and executed.
    Included(TransactionReceipt),
    /// The destination reported that the effect is already in place.
    AlreadyApplied {
        /// The revert reason reported by the destination.
        reason: String,
    },
}

/// Revert codes that mean "already applied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenignReverts(Vec<String>);

impl BenignReverts {
    /// Creates the set from the configured codes.
    pub fn new(codes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(codes.into_iter().map(Into::into).collect())
    }

    /// Returns the first code contained in `reason`.
    pub fn matching(&self, reason: &str) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|code| reason.contains(code))
    }
}

/// Submission state of one destination chain.
struct Lane {
    client: Arc<dyn LedgerClient>,
    chain_id: U256,
    /// The next nonce to use, `None` when it must be read from the ledger.
    next_nonce: Mutex<Option<U256>>,
    explorer: Option<url::Url>,
}

/// The single, shared Transaction Submitter.
///
/// Cloning is cheap and every clone shares the same lanes, so concurrent
/// senders still queue on one lock per destination chain.
#[derive(Clone)]
pub struct TxSubmitter {
    lanes: Arc<HashMap<LedgerKind, Arc<Lane>>>,
    signer: Arc<dyn TxSigner>,
    benign_reverts: BenignReverts,
    receipt_poll_interval: Duration,
    metrics: Arc<Metrics>,
}

impl TxSubmitter {
    /// Creates a submitter over every connected ledger.
    ///
    /// Ledgers that resolve to the same chain id share one lane, and with it
    /// one nonce sequence.
    pub fn new(
        ledgers: &Ledgers,
        signer: Arc<dyn TxSigner>,
        benign_reverts: BenignReverts,
        receipt_poll_interval: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        let mut by_chain: HashMap<U256, Arc<Lane>> = HashMap::new();
        let lanes = ledgers
            .iter()
            .map(|ledger| {
                let lane = by_chain
                    .entry(ledger.chain_id)
                    .or_insert_with(|| {
                        Arc::new(Lane {
                            client: ledger.rpc.clone(),
                            chain_id: ledger.chain_id,
                            next_nonce: Mutex::new(None),
                            explorer: ledger.explorer.clone(),
                        })
                    })
                    .clone();
                (ledger.kind, lane)
            })
            .collect();
        Self {
            lanes: Arc::new(lanes),
            signer,
            benign_reverts,
            receipt_poll_interval,
            metrics,
        }
    }

    /// Creates a submitter configured from the relayer context.
    pub fn from_context(
        ctx: &RelayerContext,
        ledgers: &Ledgers,
        signer: Arc<dyn TxSigner>,
    ) -> Self {
        Self::new(
            ledgers,
            signer,
            BenignReverts::new(ctx.config.relay.benign_revert_codes.clone()),
            ctx.config.relay.receipt_poll_interval(),
            ctx.metrics.clone(),
        )
    }

    /// The account every transaction is sent from.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    fn lane(&self, ledger: LedgerKind) -> Result<&Arc<Lane>> {
        self.lanes
            .get(&ledger)
            .ok_or_else(|| Error::LedgerNotConfigured {
                ledger: ledger.to_string(),
            })
    }

    /// Signs and submits `call`, then waits for its receipt.
    ///
    /// Returns [`TxOutcome::AlreadyApplied`] when the destination reverts
    /// with one of the benign codes. Waiting is cut short by `shutdown`, which
    /// yields [`Error::ReceiptCancelled`].
    #[tracing::instrument(skip_all, fields(call = %call.target))]
    pub async fn send(
        &self,
        call: &OutboundCall,
        mut shutdown: Shutdown,
    ) -> Result<TxOutcome> {
        let lane = self.lane(call.target.ledger)?;
        let tx_hash = {
            let mut next_nonce = lane.next_nonce.lock().await;
            let tx = match self.prepare(lane, *next_nonce, call).await {
                Ok(tx) => tx,
                Err(Error::Revert { reason }) => {
                    return self.classify_revert(reason);
                }
                Err(e) => {
                    self.metrics.tx_failed.inc();
                    return Err(e);
                }
            };
            let nonce = tx.nonce().copied().unwrap_or_default();
            let signed =
                match self.signer.sign_transaction(lane.chain_id, &tx).await {
                    Ok(signed) => signed,
                    Err(e) => {
                        self.metrics.tx_failed.inc();
                        return Err(e);
                    }
                };
            match lane.client.send_transaction(&signed).await {
                Ok(hash) => {
                    *next_nonce = Some(nonce + 1);
                    hash
                }
                Err(e) => {
                    // the ledger may have moved on without us.
                    *next_nonce = None;
                    self.metrics.tx_failed.inc();
                    let hash = format!("{:?}", signed.hash());
                    tracing::error!(
                        %nonce,
                        "Error while sending tx {}, {}",
                        tx_link(lane.explorer.as_ref(), &hash),
                        e,
                    );
                    return Err(match e {
                        e @ Error::Submission { .. } => e,
                        e => Error::Submission {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        };
        self.metrics.tx_submitted.inc();
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::TxQueue,
            chain_id = %lane.chain_id,
            pending = true,
            %tx_hash,
        );
        let tx_hash_string = format!("{tx_hash:?}");
        tracing::info!(
            "Tx {} is submitted and pending!",
            tx_link(lane.explorer.as_ref(), &tx_hash_string),
        );

        let receipt = self.wait_for_receipt(lane, tx_hash, &mut shutdown).await?;
        if receipt.status == Some(U64::zero()) {
            self.metrics.tx_failed.inc();
            tracing::warn!(
                "Tx {} Failed",
                tx_link(lane.explorer.as_ref(), &tx_hash_string)
            );
            return Err(Error::TransactionReverted { tx_hash });
        }
        tracing::info!(
            "Tx {} Finalized",
            tx_link(lane.explorer.as_ref(), &tx_hash_string)
        );
        tracing::event!(
            target: probe::TARGET,
            tracing::Level::DEBUG,
            kind = %probe::Kind::TxQueue,
            chain_id = %lane.chain_id,
            finalized = true,
            %tx_hash,
        );
        Ok(TxOutcome::Included(receipt))
    }

    /// Builds the unsigned transaction for `call`, bound to the current
    /// nonce and fee state of the lane.
    async fn prepare(
        &self,
        lane: &Lane,
        cached_nonce: Option<U256>,
        call: &OutboundCall,
    ) -> Result<TypedTransaction> {
        let from = self.signer.address();
        let pending = lane.client.pending_nonce(from).await?;
        let nonce = cached_nonce.map_or(pending, |cached| cached.max(pending));
        let mut tx: TypedTransaction = Eip1559TransactionRequest::new()
            .from(from)
            .to(call.to)
            .data(call.data.clone())
            .nonce(nonce)
            .chain_id(lane.chain_id.as_u64())
            .into();
        lane.client.fill_transaction(&mut tx).await?;
        Ok(tx)
    }

    fn classify_revert(&self, reason: String) -> Result<TxOutcome> {
        if let Some(code) = self.benign_reverts.matching(&reason) {
            self.metrics.tx_benign_revert.inc();
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::TxQueue,
                already_applied = true,
                %code,
                %reason,
            );
            tracing::info!(%reason, "call already applied on the destination");
            return Ok(TxOutcome::AlreadyApplied { reason });
        }
        self.metrics.tx_failed.inc();
        Err(Error::Revert { reason })
    }

    async fn wait_for_receipt(
        &self,
        lane: &Lane,
        tx_hash: H256,
        shutdown: &mut Shutdown,
    ) -> Result<TransactionReceipt> {
        let mut poll = tokio::time::interval(self.receipt_poll_interval);
        poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    return Err(Error::ReceiptCancelled { tx_hash });
                }
                _ = poll.tick() => {
                    match lane.client.transaction_receipt(tx_hash).await {
                        Ok(Some(receipt)) => return Ok(receipt),
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(%tx_hash, error = %e, "receipt lookup failed");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use ethers::types::Bytes;
    use pell_ledger_client::mock::MockLedger;
    use pell_ledger_client::Ledger;
    use pell_relayer_config::signing_backend::DEVNET_PRIVATE_KEY;
    use pell_relayer_config::PellRelayerConfig;
    use pell_signing_backends::LocalSigner;

    use super::*;
    use crate::EventTarget;

    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Dvs,
        "DVSCentralScheduler",
        "syncUpdateOperators",
    );

    fn setup(mock: &MockLedger) -> (RelayerContext, TxSubmitter) {
        let ctx = RelayerContext::new(PellRelayerConfig::default()).unwrap();
        let client: Arc<dyn LedgerClient> = Arc::new(mock.clone());
        let ledgers: Ledgers = LedgerKind::ALL
            .into_iter()
            .map(|kind| Ledger {
                kind,
                chain_id: U256::from(1337),
                rpc: client.clone(),
                ws: client.clone(),
                ws_endpoint: String::from("ws://mock"),
                explorer: None,
            })
            .collect();
        let signer =
            LocalSigner::from_private_key(&DEVNET_PRIVATE_KEY.parse().unwrap())
                .unwrap();
        let submitter =
            TxSubmitter::from_context(&ctx, &ledgers, Arc::new(signer));
        (ctx, submitter)
    }

    fn call(byte: u8) -> OutboundCall {
        OutboundCall {
            target: TARGET,
            to: Address::repeat_byte(0x42),
            data: Bytes::from(vec![byte; 4]),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_sends_never_share_a_nonce() -> Result<()> {
        let mock = MockLedger::new(1337);
        mock.set_submit_delay(Duration::from_millis(50));
        let (ctx, submitter) = setup(&mock);

        let sends = (0..8u8).map(|i| {
            let submitter = submitter.clone();
            let shutdown = ctx.shutdown_signal();
            tokio::spawn(async move { submitter.send(&call(i), shutdown).await })
        });
        for outcome in futures::future::join_all(sends).await {
            let outcome = outcome.expect("send task panicked")?;
            assert!(matches!(outcome, TxOutcome::Included(_)));
        }

        let nonces: HashSet<U256> =
            mock.submitted().iter().filter_map(|tx| tx.nonce()).collect();
        assert_eq!(nonces.len(), 8);
        assert_eq!(nonces, (0..8u64).map(U256::from).collect());
        assert_eq!(ctx.metrics.tx_submitted.get(), 8);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn a_repeated_call_is_already_applied() -> Result<()> {
        let mock = MockLedger::new(1337);
        mock.revert_duplicates_with("RR25");
        let (ctx, submitter) = setup(&mock);

        let first = submitter.send(&call(1), ctx.shutdown_signal()).await?;
        assert!(matches!(first, TxOutcome::Included(_)));
        let second = submitter.send(&call(1), ctx.shutdown_signal()).await?;
        assert!(matches!(
            second,
            TxOutcome::AlreadyApplied { ref reason } if reason.contains("RR25")
        ));
        assert_eq!(mock.submitted().len(), 1);
        assert_eq!(ctx.metrics.tx_benign_revert.get(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn other_reverts_are_errors() {
        let mock = MockLedger::new(1337);
        mock.revert_duplicates_with("RR99");
        let (ctx, submitter) = setup(&mock);

        submitter.send(&call(1), ctx.shutdown_signal()).await.unwrap();
        let err = submitter
            .send(&call(1), ctx.shutdown_signal())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Revert { .. }));
        assert_eq!(ctx.metrics.tx_failed.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_failed_execution_is_reported() {
        let mock = MockLedger::new(1337);
        mock.set_execution_failing(true);
        let (ctx, submitter) = setup(&mock);

        let err = submitter
            .send(&call(7), ctx.shutdown_signal())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TransactionReverted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_the_receipt_wait() {
        let mock = MockLedger::new(1337);
        let (ctx, submitter) = setup(&mock);
        ctx.shutdown();

        let err = submitter
            .send(&call(3), ctx.shutdown_signal())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReceiptCancelled { .. }));
        assert_eq!(mock.submitted().len(), 1);
    }

    #[test]
    fn benign_codes_match_inside_reasons() {
        let codes = BenignReverts::new(["RR25"]);
        assert_eq!(codes.matching("execution reverted: RR25"), Some("RR25"));
        assert_eq!(codes.matching("execution reverted: RR26"), None);
    }
}

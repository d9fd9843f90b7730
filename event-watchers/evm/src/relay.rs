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

use ethers::contract::{EthEvent, LogMeta};
use ethers::types::{Address, U256};
use pell_event_watcher_traits::{
    ContractEventWatcher, EventHandler, EventWatcher, WatcherInfo,
};
use pell_ledger_client::Ledgers;
use pell_relayer_context::{RelayerContext, Shutdown};
use pell_relayer_tx_queue::{EventTarget, OutboundCall, TxOutcome, TxSubmitter};
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::{probe, Result};

/// How one event kind maps onto its destination call.
///
/// The mapping is a pure function of the event and the chain id of the
/// ledger it was emitted on, so relaying the same event twice always
/// produces the same call.
pub trait RelayMapping: Send + Sync + 'static {
    /// The source event.
    type Event: EthEvent + Clone + Debug + Send + Sync + 'static;
    /// The ledger the event is emitted on.
    const SOURCE: LedgerKind;
    /// The name of the emitting contract.
    const CONTRACT: &'static str;
    /// The name of the event.
    const EVENT: &'static str;
    /// The destination method.
    const TARGET: EventTarget;

    /// Builds the destination call for `event`.
    fn outbound_call(&self, source_chain_id: U256, event: &Self::Event) -> OutboundCall;
}

/// Relays every event of one kind through the shared submitter.
#[derive(typed_builder::TypedBuilder)]
pub struct RelayHandler<M> {
    mapping: M,
    #[builder(setter(into))]
    source_chain_id: U256,
    submitter: TxSubmitter,
}

#[async_trait::async_trait]
impl<M: RelayMapping> EventHandler for RelayHandler<M> {
    type Event = M::Event;

    #[tracing::instrument(skip_all, fields(event = M::EVENT))]
    async fn handle_event(
        &self,
        (event, log): (Self::Event, LogMeta),
        shutdown: Shutdown,
    ) -> Result<()> {
        tracing::info!(
            ?event,
            block = %log.block_number,
            tx_hash = ?log.transaction_hash,
            "received event",
        );
        let call = self.mapping.outbound_call(self.source_chain_id, &event);
        submit(&self.submitter, &call, shutdown).await
    }
}

/// Submits `call` and logs how it ended.
pub(crate) async fn submit(
    submitter: &TxSubmitter,
    call: &OutboundCall,
    shutdown: Shutdown,
) -> Result<()> {
    tracing::debug!(dest = %call.target, to = ?call.to, "prepare to forward event");
    match submitter.send(call, shutdown).await? {
        TxOutcome::Included(receipt) => {
            tracing::event!(
                target: probe::TARGET,
                tracing::Level::DEBUG,
                kind = %probe::Kind::Relay,
                relayed = true,
                target_method = %call.target,
                tx_hash = ?receipt.transaction_hash,
            );
            tracing::info!(
                tx_hash = ?receipt.transaction_hash,
                "tx successfully included",
            );
        }
        TxOutcome::AlreadyApplied { reason } => {
            tracing::info!(%reason, "destination already up to date");
        }
    }
    Ok(())
}

/// Builds the watcher of `M::Event` emitted by `address`.
pub(crate) fn relay_watcher<M: RelayMapping>(
    ctx: &RelayerContext,
    ledgers: &Ledgers,
    submitter: &TxSubmitter,
    address: Address,
    mapping: M,
) -> Result<Box<dyn EventWatcher>> {
    let source = ledgers.get(M::SOURCE)?;
    let info = WatcherInfo {
        source: M::SOURCE,
        contract: M::CONTRACT,
        address,
        event: M::EVENT,
        targets: vec![M::TARGET],
    };
    let handler = RelayHandler::builder()
        .mapping(mapping)
        .source_chain_id(source.chain_id)
        .submitter(submitter.clone())
        .build();
    Ok(Box::new(ContractEventWatcher::new(
        ctx,
        info,
        source.ws.clone(),
        handler,
    )))
}

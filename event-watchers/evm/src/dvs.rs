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

//! Registration of a DVS ledger on the pell registry router.
//!
//! The registry interactor emits three events in the registration
//! transaction, one per DVS contract. Only the central scheduler event is
//! watched; the other two are recovered from the log history.

use std::sync::Arc;

use ethers::contract::LogMeta;
use ethers::types::{Address, U256};
use pell_event_watcher_traits::{
    Composite, ContractEventWatcher, Correlation, Correlator, EventHandler,
    EventWatcher, WatcherInfo,
};
use pell_ledger_client::Ledgers;
use pell_relayer_context::{RelayerContext, Shutdown};
use pell_relayer_tx_queue::{EventTarget, OutboundCall, TxSubmitter};
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::metric::Metrics;
use pell_relayer_utils::{probe, Result};

use crate::bindings::*;
use crate::relay::submit;

/// The name of the emitting contract.
pub const CONTRACT: &str = "PellRegistryInteractor";

/// `PellRegistryRouter.addSupportedChain`
pub const TARGET: EventTarget = EventTarget::new(
    LedgerKind::Pell,
    "PellRegistryRouter",
    "addSupportedChain",
);

/// The three registration events of one transaction.
#[derive(Debug, Clone, Default)]
pub struct DvsRegistrationParts {
    /// The anchor part.
    pub central_scheduler: Option<RegisterCentralSchedulerToPellFilter>,
    /// The stake manager part.
    pub stake_manager: Option<RegisterStakeManagerToPellFilter>,
    /// The ejection manager part.
    pub ejection_manager: Option<RegisterEjectionManagerToPellFilter>,
}

/// A complete DVS registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DvsRegistration {
    /// Carries the approver signature too.
    pub central_scheduler: RegisterCentralSchedulerToPellFilter,
    /// The DVS operator stake manager.
    pub stake_manager: Address,
    /// The DVS ejection manager.
    pub ejection_manager: Address,
}

impl Composite for DvsRegistrationParts {
    type Output = DvsRegistration;

    fn assemble(self) -> Option<Self::Output> {
        Some(DvsRegistration {
            central_scheduler: self.central_scheduler?,
            stake_manager: self.stake_manager?.stake_manager,
            ejection_manager: self.ejection_manager?.ejection_manager,
        })
    }
}

/// Builds the `addSupportedChain` call of a registration.
///
/// `dvs_chain_id` is the chain id of the ledger the registration was
/// emitted on.
pub fn add_supported_chain(
    to: Address,
    dvs_chain_id: U256,
    registration: &DvsRegistration,
) -> OutboundCall {
    let anchor = &registration.central_scheduler;
    OutboundCall::new(
        TARGET,
        to,
        AddSupportedChainCall {
            dvs_info: DvsInfo {
                chain_id: dvs_chain_id,
                central_scheduler: anchor.central_scheduler,
                ejection_manager: registration.ejection_manager,
                stake_manager: registration.stake_manager,
            },
            dvs_chain_approver_signature: anchor
                .dvs_chain_approver_signature
                .clone(),
        },
    )
}

/// Handles `RegisterCentralSchedulerToPell` by correlating the sibling
/// events and registering the DVS on the pell ledger.
#[derive(typed_builder::TypedBuilder)]
pub struct RegisterToPellHandler {
    /// The registry interactor, emitter of all three events.
    interactor: Address,
    /// The pell registry router.
    registry_router: Address,
    #[builder(setter(into))]
    dvs_chain_id: U256,
    correlator: Correlator,
    submitter: TxSubmitter,
    metrics: Arc<Metrics>,
}

impl RegisterToPellHandler {
    /// Scans the window after the anchor for the full registration.
    pub async fn correlate(
        &self,
        anchor: &LogMeta,
    ) -> Result<Correlation<DvsRegistration>> {
        let mut scan = self.correlator.begin::<DvsRegistrationParts>(
            anchor.transaction_hash,
            anchor.block_number,
        );
        self.correlator
            .collect(
                &mut scan,
                self.interactor,
                |parts, e: RegisterCentralSchedulerToPellFilter, _| {
                    parts.central_scheduler = Some(e)
                },
            )
            .await?;
        self.correlator
            .collect(
                &mut scan,
                self.interactor,
                |parts, e: RegisterStakeManagerToPellFilter, _| {
                    parts.stake_manager = Some(e)
                },
            )
            .await?;
        self.correlator
            .collect(
                &mut scan,
                self.interactor,
                |parts, e: RegisterEjectionManagerToPellFilter, _| {
                    parts.ejection_manager = Some(e)
                },
            )
            .await?;
        let (from_block, to_block) = scan.range();
        tracing::debug!(
            %from_block,
            %to_block,
            transactions = scan.transactions(),
            "registration scan done",
        );
        Ok(scan.finish())
    }
}

#[async_trait::async_trait]
impl EventHandler for RegisterToPellHandler {
    type Event = RegisterCentralSchedulerToPellFilter;

    #[tracing::instrument(skip_all, fields(event = "RegisterCentralSchedulerToPell"))]
    async fn handle_event(
        &self,
        (event, log): (Self::Event, LogMeta),
        shutdown: Shutdown,
    ) -> Result<()> {
        tracing::info!(
            central_scheduler = ?event.central_scheduler,
            block = %log.block_number,
            tx_hash = ?log.transaction_hash,
            "processing registration",
        );
        let registration = match self.correlate(&log).await? {
            Correlation::Complete(registration) => registration,
            Correlation::NotFound => {
                self.metrics.correlation_misses.inc();
                tracing::event!(
                    target: probe::TARGET,
                    tracing::Level::WARN,
                    kind = %probe::Kind::Correlation,
                    found = false,
                    tx_hash = ?log.transaction_hash,
                    block = %log.block_number,
                );
                tracing::warn!(
                    tx_hash = ?log.transaction_hash,
                    "registration parts not found, dropping the event",
                );
                return Ok(());
            }
        };
        tracing::debug!(?registration, "registration assembled");
        let call =
            add_supported_chain(self.registry_router, self.dvs_chain_id, &registration);
        submit(&self.submitter, &call, shutdown).await
    }
}

/// Builds the watcher of the DVS registrations.
pub(crate) fn registration_watcher(
    ctx: &RelayerContext,
    ledgers: &Ledgers,
    submitter: &TxSubmitter,
    interactor: Address,
    registry_router: Address,
) -> Result<Box<dyn EventWatcher>> {
    let dvs = ledgers.get(LedgerKind::Dvs)?;
    let info = WatcherInfo {
        source: LedgerKind::Dvs,
        contract: CONTRACT,
        address: interactor,
        event: "RegisterCentralSchedulerToPell",
        targets: vec![TARGET],
    };
    let handler = RegisterToPellHandler::builder()
        .interactor(interactor)
        .registry_router(registry_router)
        .dvs_chain_id(dvs.chain_id)
        .correlator(Correlator::new(
            dvs.rpc.clone(),
            ctx.config.relay.correlation_window,
        ))
        .submitter(submitter.clone())
        .metrics(ctx.metrics.clone())
        .build();
    Ok(Box::new(ContractEventWatcher::new(
        ctx,
        info,
        dvs.ws.clone(),
        handler,
    )))
}

#[cfg(test)]
mod tests {
    use ethers::abi::AbiDecode;
    use ethers::types::Bytes;

    use super::*;

    fn registration() -> DvsRegistration {
        DvsRegistration {
            central_scheduler: RegisterCentralSchedulerToPellFilter {
                central_scheduler: Address::repeat_byte(0x0c),
                dvs_chain_approver_signature: SignatureWithSaltAndExpiry {
                    signature: Bytes::from(vec![0xab; 65]),
                    salt: [0x5a; 32],
                    expiry: U256::from(1_900_000_000u64),
                },
            },
            stake_manager: Address::repeat_byte(0x05),
            ejection_manager: Address::repeat_byte(0x0e),
        }
    }

    #[test]
    fn a_registration_needs_every_part() {
        let reg = registration();
        let mut parts = DvsRegistrationParts {
            central_scheduler: Some(reg.central_scheduler.clone()),
            stake_manager: Some(RegisterStakeManagerToPellFilter {
                stake_manager: reg.stake_manager,
            }),
            ejection_manager: None,
        };
        assert!(parts.clone().assemble().is_none());
        parts.ejection_manager = Some(RegisterEjectionManagerToPellFilter {
            ejection_manager: reg.ejection_manager,
        });
        assert_eq!(parts.assemble(), Some(reg));
    }

    #[test]
    fn supported_chain_uses_the_dvs_chain_id() {
        let router = Address::repeat_byte(0x77);
        let call = add_supported_chain(router, U256::from(1338), &registration());
        assert_eq!(call.to, router);
        assert_eq!(call.target, TARGET);
        let decoded = AddSupportedChainCall::decode(&call.data).unwrap();
        assert_eq!(
            decoded.dvs_info,
            DvsInfo {
                chain_id: U256::from(1338),
                central_scheduler: Address::repeat_byte(0x0c),
                ejection_manager: Address::repeat_byte(0x0e),
                stake_manager: Address::repeat_byte(0x05),
            }
        );
        assert_eq!(decoded.dvs_chain_approver_signature.salt, [0x5a; 32]);
    }
}

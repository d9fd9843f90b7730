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
//! # Pell Event Watchers 🕸️
//!
//! The event kinds the relayer follows, how each maps onto its destination
//! call, and the set of watchers started by the relayer service.

use ethers::abi::{ParamType, Token};
use ethers::contract::EthCall;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest};
use pell_event_watcher_traits::EventWatcher;
use pell_ledger_client::{LedgerClient, Ledgers};
use pell_relayer_config::contracts::ContractAddresses;
use pell_relayer_context::{RelayerContext, Shutdown};
use pell_relayer_tx_queue::{EventTarget, OutboundCall, TxSubmitter};
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::{Error, Result};

/// Contract bindings.
pub mod bindings;
/// DVS ledger registrations, correlated over three events.
pub mod dvs;
/// Pell ledger events.
pub mod pell;
/// The generic one event, one call relay.
pub mod relay;
/// Staking ledger events.
pub mod staking;

#[cfg(test)]
mod tests;

use bindings::{StakeRegistryRouterCall, StrategyManagerCall, UpdateConnectorCall};
pub use relay::{RelayHandler, RelayMapping};

/// Every contract address the watchers need, with the derived ones resolved.
#[derive(Debug, Clone)]
pub struct ResolvedContracts {
    /// Addresses as configured.
    pub configured: ContractAddresses,
    /// Pell ledger stake registry router.
    pub pell_stake_registry_router: Address,
    /// Pell ledger strategy manager.
    pub pell_strategy_manager: Address,
}

/// Reads an `address` returned by a view method.
async fn read_address<C: EthCall>(
    client: &dyn LedgerClient,
    contract: Address,
    call: C,
) -> Result<Address> {
    let tx: TypedTransaction = Eip1559TransactionRequest::new()
        .to(contract)
        .data(call.encode())
        .into();
    let output = client.call(&tx).await?;
    match ethers::abi::decode(&[ParamType::Address], &output)?.as_slice() {
        [Token::Address(address)] => Ok(*address),
        _ => Err(Error::Generic("view call did not return an address")),
    }
}

/// Fills in the addresses that are not configured by asking the contracts
/// that own them.
pub async fn resolve_contracts(
    ledgers: &Ledgers,
    configured: &ContractAddresses,
) -> Result<ResolvedContracts> {
    let pell = ledgers.get(LedgerKind::Pell)?;
    let pell_stake_registry_router = match configured.pell_stake_registry_router
    {
        Some(address) => address,
        None => {
            read_address(
                pell.rpc.as_ref(),
                configured.pell_registry_router,
                StakeRegistryRouterCall,
            )
            .await?
        }
    };
    let pell_strategy_manager = match configured.pell_strategy_manager {
        Some(address) => address,
        None => {
            read_address(
                pell.rpc.as_ref(),
                configured.pell_delegation_manager,
                StrategyManagerCall,
            )
            .await?
        }
    };
    tracing::debug!(
        ?pell_stake_registry_router,
        ?pell_strategy_manager,
        "derived contract addresses resolved",
    );
    Ok(ResolvedContracts {
        configured: configured.clone(),
        pell_stake_registry_router,
        pell_strategy_manager,
    })
}

/// Authorizes the relayer account as connector on the destination
/// contracts. Any failure is a setup error.
pub async fn update_connectors(
    submitter: &TxSubmitter,
    contracts: &ContractAddresses,
    shutdown: Shutdown,
) -> Result<()> {
    let connector = submitter.address();
    let destinations = [
        (
            EventTarget::new(LedgerKind::Dvs, "DVSCentralScheduler", "updateConnector"),
            contracts.dvs_central_scheduler,
        ),
        (
            EventTarget::new(
                LedgerKind::Service,
                "ServiceOmniOperatorSharesManager",
                "updateConnector",
            ),
            contracts.service_omni_operator_shares_manager,
        ),
        (
            EventTarget::new(
                LedgerKind::Staking,
                "StakingDelegationManager",
                "updateConnector",
            ),
            contracts.staking_delegation_manager,
        ),
    ];
    for (target, to) in destinations {
        tracing::info!(contract = target.contract, ?connector, "updating connector");
        let call = OutboundCall::new(target, to, UpdateConnectorCall { connector });
        if let Err(e) = relay::submit(submitter, &call, shutdown.clone()).await {
            tracing::error!(
                contract = target.contract,
                error = %e,
                "failed to update connector",
            );
            return Err(e);
        }
    }
    Ok(())
}

/// Builds one watcher per event kind, in a stable order.
pub fn build_watchers(
    ctx: &RelayerContext,
    ledgers: &Ledgers,
    submitter: &TxSubmitter,
    contracts: &ResolvedContracts,
) -> Result<Vec<Box<dyn EventWatcher>>> {
    use relay::relay_watcher;

    let c = &contracts.configured;
    let watchers = vec![
        // pell ledger
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_registry_router,
            pell::CreateGroupRelay {
                to: c.dvs_central_scheduler,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_delegation_manager,
            pell::OperatorRegisteredRelay {
                to: c.staking_delegation_manager,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_registry_router,
            pell::RegisterOperatorRelay {
                to: c.dvs_central_scheduler,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_registry_router,
            pell::UpdateOperatorsRelay {
                to: c.dvs_central_scheduler,
            },
        )?,
        // dvs ledger
        dvs::registration_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_registry_interactor,
            c.pell_registry_router,
        )?,
        // staking ledger
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.staking_strategy_manager,
            staking::DepositRelay {
                to: contracts.pell_strategy_manager,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.staking_delegation_manager,
            staking::StakerDelegatedRelay {
                to: c.pell_delegation_manager,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.staking_delegation_manager,
            staking::StakerUndelegatedRelay {
                to: c.pell_delegation_manager,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.staking_delegation_manager,
            staking::WithdrawalQueuedRelay {
                to: c.pell_delegation_manager,
            },
        )?,
        // pell ledger, shares and pools
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            contracts.pell_stake_registry_router,
            pell::AddPoolsRelay {
                to: c.dvs_operator_stake_manager,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_delegation_manager,
            pell::SharesIncreasedRelay {
                to: c.service_omni_operator_shares_manager,
            },
        )?,
        relay_watcher(
            ctx,
            ledgers,
            submitter,
            c.pell_delegation_manager,
            pell::SharesDecreasedRelay {
                to: c.service_omni_operator_shares_manager,
            },
        )?,
    ];
    tracing::debug!(count = watchers.len(), "event watchers built");
    Ok(watchers)
}

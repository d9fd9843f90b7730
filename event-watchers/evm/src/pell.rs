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

//! Events emitted on the pell ledger.

use ethers::types::{Address, U256};
use pell_relayer_tx_queue::{EventTarget, OutboundCall};
use pell_relayer_types::LedgerKind;

use crate::bindings::*;
use crate::relay::RelayMapping;

/// `SyncCreateGroup` → `DVSCentralScheduler.syncCreateGroup`
#[derive(Debug, Clone)]
pub struct CreateGroupRelay {
    /// The DVS central scheduler.
    pub to: Address,
}

impl RelayMapping for CreateGroupRelay {
    type Event = SyncCreateGroupFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellRegistryRouter";
    const EVENT: &'static str = "SyncCreateGroup";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Dvs,
        "DVSCentralScheduler",
        "syncCreateGroup",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncCreateGroupCall {
                group_number: event.group_number,
                operator_set_params: event.operator_set_params.clone(),
                minimum_stake: event.minimum_stake,
                pool_params: event.pool_params.clone(),
            },
        )
    }
}

/// `OperatorRegistered` → `StakingDelegationManager.syncRegisterAsOperator`
#[derive(Debug, Clone)]
pub struct OperatorRegisteredRelay {
    /// The staking delegation manager.
    pub to: Address,
}

impl RelayMapping for OperatorRegisteredRelay {
    type Event = OperatorRegisteredFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellDelegationManager";
    const EVENT: &'static str = "OperatorRegistered";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Staking,
        "StakingDelegationManager",
        "syncRegisterAsOperator",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        let details = StakingOperatorDetails {
            // no longer read by the staking ledger.
            deprecated_earnings_receiver: Address::zero(),
            delegation_approver: event.operator_details.delegation_approver,
            staker_opt_out_window: event.operator_details.staker_opt_out_window,
        };
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncRegisterAsOperatorCall {
                operator: event.operator,
                registering_operator_details: details,
            },
        )
    }
}

/// `SyncRegisterOperator` → `DVSCentralScheduler.syncRegisterOperator`
#[derive(Debug, Clone)]
pub struct RegisterOperatorRelay {
    /// The DVS central scheduler.
    pub to: Address,
}

impl RelayMapping for RegisterOperatorRelay {
    type Event = SyncRegisterOperatorFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellRegistryRouter";
    const EVENT: &'static str = "SyncRegisterOperator";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Dvs,
        "DVSCentralScheduler",
        "syncRegisterOperator",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncRegisterOperatorCall {
                operator: event.operator,
                group_numbers: event.group_numbers.clone(),
                params: PubkeyParams {
                    pubkey_g1: event.params.pubkey_g1.clone(),
                    pubkey_g2: event.params.pubkey_g2.clone(),
                },
            },
        )
    }
}

/// `SyncUpdateOperators` → `DVSCentralScheduler.syncUpdateOperators`
#[derive(Debug, Clone)]
pub struct UpdateOperatorsRelay {
    /// The DVS central scheduler.
    pub to: Address,
}

impl RelayMapping for UpdateOperatorsRelay {
    type Event = SyncUpdateOperatorsFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellRegistryRouter";
    const EVENT: &'static str = "SyncUpdateOperators";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Dvs,
        "DVSCentralScheduler",
        "syncUpdateOperators",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncUpdateOperatorsCall {
                operators: event.operators.clone(),
            },
        )
    }
}

/// `SyncAddPools` → `DVSOperatorStakeManager.syncAddPools`
#[derive(Debug, Clone)]
pub struct AddPoolsRelay {
    /// The DVS operator stake manager.
    pub to: Address,
}

impl RelayMapping for AddPoolsRelay {
    type Event = SyncAddPoolsFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellStakeRegistryRouter";
    const EVENT: &'static str = "SyncAddPools";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Dvs,
        "DVSOperatorStakeManager",
        "syncAddPools",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncAddPoolsCall {
                group_number: event.group_number,
                pool_params: event.pool_params.clone(),
            },
        )
    }
}

/// `OperatorSharesIncreased` → `ServiceOmniOperatorSharesManager.batchSyncIncreaseDelegatedShares`
#[derive(Debug, Clone)]
pub struct SharesIncreasedRelay {
    /// The service omni operator shares manager.
    pub to: Address,
}

impl RelayMapping for SharesIncreasedRelay {
    type Event = OperatorSharesIncreasedFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellDelegationManager";
    const EVENT: &'static str = "OperatorSharesIncreased";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Service,
        "ServiceOmniOperatorSharesManager",
        "batchSyncIncreaseDelegatedShares",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            BatchSyncIncreaseDelegatedSharesCall {
                chain_ids: vec![event.chain_id],
                operators: vec![event.operator],
                strategies: vec![event.strategy],
                shares: vec![event.shares],
            },
        )
    }
}

/// `OperatorSharesDecreased` → `ServiceOmniOperatorSharesManager.batchSyncDelegatedShares`
#[derive(Debug, Clone)]
pub struct SharesDecreasedRelay {
    /// The service omni operator shares manager.
    pub to: Address,
}

impl RelayMapping for SharesDecreasedRelay {
    type Event = OperatorSharesDecreasedFilter;
    const SOURCE: LedgerKind = LedgerKind::Pell;
    const CONTRACT: &'static str = "PellDelegationManager";
    const EVENT: &'static str = "OperatorSharesDecreased";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Service,
        "ServiceOmniOperatorSharesManager",
        "batchSyncDelegatedShares",
    );

    fn outbound_call(&self, _: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            BatchSyncDelegatedSharesCall {
                chain_ids: vec![event.chain_id],
                operators: vec![event.operator],
                strategies: vec![event.strategy],
                shares: vec![event.shares],
            },
        )
    }
}

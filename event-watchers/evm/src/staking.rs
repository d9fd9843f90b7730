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

//! Events emitted on the staking ledger. Each one updates the pell ledger's
//! view of the restaking state, tagged with the staking chain id.

use ethers::types::{Address, U256};
use pell_relayer_tx_queue::{EventTarget, OutboundCall};
use pell_relayer_types::LedgerKind;

use crate::bindings::*;
use crate::relay::RelayMapping;

/// `Deposit` → `PellStrategyManager.syncDepositState`
#[derive(Debug, Clone)]
pub struct DepositRelay {
    /// The pell strategy manager.
    pub to: Address,
}

impl RelayMapping for DepositRelay {
    type Event = DepositFilter;
    const SOURCE: LedgerKind = LedgerKind::Staking;
    const CONTRACT: &'static str = "StakingStrategyManager";
    const EVENT: &'static str = "Deposit";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Pell,
        "PellStrategyManager",
        "syncDepositState",
    );

    fn outbound_call(&self, source_chain_id: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncDepositStateCall {
                chain_id: source_chain_id,
                staker: event.staker,
                strategy: event.strategy,
                shares: event.shares,
            },
        )
    }
}

/// `StakerDelegated` → `PellDelegationManager.syncDelegateState`
#[derive(Debug, Clone)]
pub struct StakerDelegatedRelay {
    /// The pell delegation manager.
    pub to: Address,
}

impl RelayMapping for StakerDelegatedRelay {
    type Event = StakerDelegatedFilter;
    const SOURCE: LedgerKind = LedgerKind::Staking;
    const CONTRACT: &'static str = "StakingDelegationManager";
    const EVENT: &'static str = "StakerDelegated";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Pell,
        "PellDelegationManager",
        "syncDelegateState",
    );

    fn outbound_call(&self, source_chain_id: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncDelegateStateCall {
                chain_id: source_chain_id,
                staker: event.staker,
                operator: event.operator,
            },
        )
    }
}

/// `StakerUndelegated` → `PellDelegationManager.syncUndelegateState`
#[derive(Debug, Clone)]
pub struct StakerUndelegatedRelay {
    /// The pell delegation manager.
    pub to: Address,
}

impl RelayMapping for StakerUndelegatedRelay {
    type Event = StakerUndelegatedFilter;
    const SOURCE: LedgerKind = LedgerKind::Staking;
    const CONTRACT: &'static str = "StakingDelegationManager";
    const EVENT: &'static str = "StakerUndelegated";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Pell,
        "PellDelegationManager",
        "syncUndelegateState",
    );

    fn outbound_call(&self, source_chain_id: U256, event: &Self::Event) -> OutboundCall {
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncUndelegateStateCall {
                chain_id: source_chain_id,
                staker: event.staker,
            },
        )
    }
}

/// `WithdrawalQueued` → `PellDelegationManager.syncWithdrawalState`
#[derive(Debug, Clone)]
pub struct WithdrawalQueuedRelay {
    /// The pell delegation manager.
    pub to: Address,
}

impl RelayMapping for WithdrawalQueuedRelay {
    type Event = WithdrawalQueuedFilter;
    const SOURCE: LedgerKind = LedgerKind::Staking;
    const CONTRACT: &'static str = "StakingDelegationManager";
    const EVENT: &'static str = "WithdrawalQueued";
    const TARGET: EventTarget = EventTarget::new(
        LedgerKind::Pell,
        "PellDelegationManager",
        "syncWithdrawalState",
    );

    fn outbound_call(&self, source_chain_id: U256, event: &Self::Event) -> OutboundCall {
        let withdrawal = &event.withdrawal;
        OutboundCall::new(
            Self::TARGET,
            self.to,
            SyncWithdrawalStateCall {
                chain_id: source_chain_id,
                staker: withdrawal.staker,
                operator: withdrawal.delegated_to,
                params: WithdrawalParams {
                    strategies: withdrawal.strategies.clone(),
                    shares: withdrawal.shares.clone(),
                },
            },
        )
    }
}

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

use ethers::contract::EthEvent;
use ethers::types::{Address, Bytes, U256};

use super::types::*;

/// `PellRegistryRouter.SyncCreateGroup`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "SyncCreateGroup",
    abi = "SyncCreateGroup(uint8,(uint32,uint16,uint16),uint96,(address,uint96)[])"
)]
pub struct SyncCreateGroupFilter {
    #[ethevent(indexed)]
    pub group_number: u8,
    pub operator_set_params: OperatorSetParam,
    /// A `uint96`.
    pub minimum_stake: u128,
    pub pool_params: Vec<PoolParams>,
}

/// `PellDelegationManager.OperatorRegistered`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "OperatorRegistered",
    abi = "OperatorRegistered(address,(address,uint32))"
)]
pub struct OperatorRegisteredFilter {
    #[ethevent(indexed)]
    pub operator: Address,
    pub operator_details: OperatorDetails,
}

/// `PellRegistryRouter.SyncRegisterOperator`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "SyncRegisterOperator",
    abi = "SyncRegisterOperator(address,bytes32,bytes,string,((uint256,uint256),(uint256,uint256),(uint256[2],uint256[2])))"
)]
pub struct SyncRegisterOperatorFilter {
    #[ethevent(indexed)]
    pub operator: Address,
    #[ethevent(indexed)]
    pub operator_id: [u8; 32],
    pub group_numbers: Bytes,
    pub socket: String,
    pub params: PubkeyRegistrationParams,
}

/// `PellRegistryRouter.SyncUpdateOperators`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(name = "SyncUpdateOperators", abi = "SyncUpdateOperators(address[])")]
pub struct SyncUpdateOperatorsFilter {
    pub operators: Vec<Address>,
}

/// `PellStakeRegistryRouter.SyncAddPools`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(name = "SyncAddPools", abi = "SyncAddPools(uint8,(address,uint96)[])")]
pub struct SyncAddPoolsFilter {
    #[ethevent(indexed)]
    pub group_number: u8,
    pub pool_params: Vec<PoolParams>,
}

/// `PellDelegationManager.OperatorSharesIncreased`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "OperatorSharesIncreased",
    abi = "OperatorSharesIncreased(uint256,address,address,address,uint256)"
)]
pub struct OperatorSharesIncreasedFilter {
    pub chain_id: U256,
    #[ethevent(indexed)]
    pub operator: Address,
    #[ethevent(indexed)]
    pub staker: Address,
    pub strategy: Address,
    pub shares: U256,
}

/// `PellDelegationManager.OperatorSharesDecreased`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "OperatorSharesDecreased",
    abi = "OperatorSharesDecreased(uint256,address,address,address,uint256)"
)]
pub struct OperatorSharesDecreasedFilter {
    pub chain_id: U256,
    #[ethevent(indexed)]
    pub operator: Address,
    #[ethevent(indexed)]
    pub staker: Address,
    pub strategy: Address,
    pub shares: U256,
}

/// `StrategyManager.Deposit` of the staking ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Deposit", abi = "Deposit(address,address,address,uint256)")]
pub struct DepositFilter {
    pub staker: Address,
    pub token: Address,
    pub strategy: Address,
    pub shares: U256,
}

/// `DelegationManager.StakerDelegated` of the staking ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(name = "StakerDelegated", abi = "StakerDelegated(address,address)")]
pub struct StakerDelegatedFilter {
    #[ethevent(indexed)]
    pub staker: Address,
    #[ethevent(indexed)]
    pub operator: Address,
}

/// `DelegationManager.StakerUndelegated` of the staking ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(name = "StakerUndelegated", abi = "StakerUndelegated(address,address)")]
pub struct StakerUndelegatedFilter {
    #[ethevent(indexed)]
    pub staker: Address,
    #[ethevent(indexed)]
    pub operator: Address,
}

/// `DelegationManager.WithdrawalQueued` of the staking ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "WithdrawalQueued",
    abi = "WithdrawalQueued(bytes32,(address,address,address,uint256,uint32,address[],uint256[]))"
)]
pub struct WithdrawalQueuedFilter {
    pub withdrawal_root: [u8; 32],
    pub withdrawal: Withdrawal,
}

/// `RegistryInteractor.RegisterCentralSchedulerToPell`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "RegisterCentralSchedulerToPell",
    abi = "RegisterCentralSchedulerToPell(address,(bytes,bytes32,uint256))"
)]
pub struct RegisterCentralSchedulerToPellFilter {
    pub central_scheduler: Address,
    pub dvs_chain_approver_signature: SignatureWithSaltAndExpiry,
}

/// `RegistryInteractor.RegisterStakeManagerToPell`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "RegisterStakeManagerToPell",
    abi = "RegisterStakeManagerToPell(address)"
)]
pub struct RegisterStakeManagerToPellFilter {
    pub stake_manager: Address,
}

/// `RegistryInteractor.RegisterEjectionManagerToPell`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthEvent)]
#[ethevent(
    name = "RegisterEjectionManagerToPell",
    abi = "RegisterEjectionManagerToPell(address)"
)]
pub struct RegisterEjectionManagerToPellFilter {
    pub ejection_manager: Address,
}

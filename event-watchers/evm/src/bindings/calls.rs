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

use ethers::contract::EthCall;
use ethers::types::{Address, Bytes, U256};

use super::types::*;

/// `DVSCentralScheduler.syncCreateGroup`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "syncCreateGroup",
    abi = "syncCreateGroup(uint8,(uint32,uint16,uint16),uint96,(address,uint96)[])"
)]
pub struct SyncCreateGroupCall {
    pub group_number: u8,
    pub operator_set_params: OperatorSetParam,
    pub minimum_stake: u128,
    pub pool_params: Vec<PoolParams>,
}

/// `StakingDelegationManager.syncRegisterAsOperator`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "syncRegisterAsOperator",
    abi = "syncRegisterAsOperator(address,(address,address,uint32))"
)]
pub struct SyncRegisterAsOperatorCall {
    pub operator: Address,
    pub registering_operator_details: StakingOperatorDetails,
}

/// `DVSCentralScheduler.syncRegisterOperator`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "syncRegisterOperator",
    abi = "syncRegisterOperator(address,bytes,((uint256,uint256),(uint256[2],uint256[2])))"
)]
pub struct SyncRegisterOperatorCall {
    pub operator: Address,
    pub group_numbers: Bytes,
    pub params: PubkeyParams,
}

/// `DVSCentralScheduler.syncUpdateOperators`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "syncUpdateOperators", abi = "syncUpdateOperators(address[])")]
pub struct SyncUpdateOperatorsCall {
    pub operators: Vec<Address>,
}

/// `PellRegistryRouter.addSupportedChain`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "addSupportedChain",
    abi = "addSupportedChain((uint256,address,address,address),(bytes,bytes32,uint256))"
)]
pub struct AddSupportedChainCall {
    pub dvs_info: DvsInfo,
    pub dvs_chain_approver_signature: SignatureWithSaltAndExpiry,
}

/// `PellStrategyManager.syncDepositState`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "syncDepositState",
    abi = "syncDepositState(uint256,address,address,uint256)"
)]
pub struct SyncDepositStateCall {
    pub chain_id: U256,
    pub staker: Address,
    pub strategy: Address,
    pub shares: U256,
}

/// `PellDelegationManager.syncDelegateState`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "syncDelegateState",
    abi = "syncDelegateState(uint256,address,address)"
)]
pub struct SyncDelegateStateCall {
    pub chain_id: U256,
    pub staker: Address,
    pub operator: Address,
}

/// `PellDelegationManager.syncUndelegateState`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "syncUndelegateState", abi = "syncUndelegateState(uint256,address)")]
pub struct SyncUndelegateStateCall {
    pub chain_id: U256,
    pub staker: Address,
}

/// `PellDelegationManager.syncWithdrawalState`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "syncWithdrawalState",
    abi = "syncWithdrawalState(uint256,address,address,(address[],uint256[]))"
)]
pub struct SyncWithdrawalStateCall {
    pub chain_id: U256,
    pub staker: Address,
    pub operator: Address,
    pub params: WithdrawalParams,
}

/// `DVSOperatorStakeManager.syncAddPools`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "syncAddPools", abi = "syncAddPools(uint8,(address,uint96)[])")]
pub struct SyncAddPoolsCall {
    pub group_number: u8,
    pub pool_params: Vec<PoolParams>,
}

/// `ServiceOmniOperatorSharesManager.batchSyncIncreaseDelegatedShares`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "batchSyncIncreaseDelegatedShares",
    abi = "batchSyncIncreaseDelegatedShares(uint256[],address[],address[],uint256[])"
)]
pub struct BatchSyncIncreaseDelegatedSharesCall {
    pub chain_ids: Vec<U256>,
    pub operators: Vec<Address>,
    pub strategies: Vec<Address>,
    pub shares: Vec<U256>,
}

/// `ServiceOmniOperatorSharesManager.batchSyncDelegatedShares`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(
    name = "batchSyncDelegatedShares",
    abi = "batchSyncDelegatedShares(uint256[],address[],address[],uint256[])"
)]
pub struct BatchSyncDelegatedSharesCall {
    pub chain_ids: Vec<U256>,
    pub operators: Vec<Address>,
    pub strategies: Vec<Address>,
    pub shares: Vec<U256>,
}

/// `updateConnector`, shared by every connector-gated destination.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "updateConnector", abi = "updateConnector(address)")]
pub struct UpdateConnectorCall {
    pub connector: Address,
}

/// `PellRegistryRouter.stakeRegistryRouter`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "stakeRegistryRouter", abi = "stakeRegistryRouter()")]
pub struct StakeRegistryRouterCall;

/// `PellDelegationManager.strategyManager`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "strategyManager", abi = "strategyManager()")]
pub struct StrategyManagerCall;

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

use ethers::contract::EthAbiType;
use ethers::types::{Address, Bytes, U256};

/// `IPellDelegationManager.OperatorDetails`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct OperatorDetails {
    pub delegation_approver: Address,
    pub staker_opt_out_window: u32,
}

/// `IDelegationManager.OperatorDetails` of the staking ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct StakingOperatorDetails {
    pub deprecated_earnings_receiver: Address,
    pub delegation_approver: Address,
    pub staker_opt_out_window: u32,
}

/// `ICentralScheduler.OperatorSetParam`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct OperatorSetParam {
    pub max_operator_count: u32,
    pub kick_bips_of_operator_stake: u16,
    pub kick_bips_of_total_stake: u16,
}

/// `IOperatorStakeManager.PoolParams`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct PoolParams {
    pub pool: Address,
    /// A `uint96`.
    pub multiplier: u128,
}

/// `BN254.G1Point`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct G1Point {
    pub x: U256,
    pub y: U256,
}

/// `BN254.G2Point`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct G2Point {
    pub x: [U256; 2],
    pub y: [U256; 2],
}

/// `IRegistryRouter.PubkeyRegistrationParams`, as emitted on the pell ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct PubkeyRegistrationParams {
    pub pubkey_registration_signature: G1Point,
    pub pubkey_g1: G1Point,
    pub pubkey_g2: G2Point,
}

/// `IOperatorKeyManager.PubkeyRegistrationParams` of the DVS ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct PubkeyParams {
    pub pubkey_g1: G1Point,
    pub pubkey_g2: G2Point,
}

/// `IDelegationManager.Withdrawal`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct Withdrawal {
    pub staker: Address,
    pub delegated_to: Address,
    pub withdrawer: Address,
    pub nonce: U256,
    pub start_timestamp: u32,
    pub strategies: Vec<Address>,
    pub shares: Vec<U256>,
}

/// `IPellDelegationManager.WithdrawalParams`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct WithdrawalParams {
    pub strategies: Vec<Address>,
    pub shares: Vec<U256>,
}

/// `ISignatureUtils.SignatureWithSaltAndExpiry`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct SignatureWithSaltAndExpiry {
    pub signature: Bytes,
    pub salt: [u8; 32],
    pub expiry: U256,
}

/// `IRegistryRouter.DVSInfo`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthAbiType)]
pub struct DvsInfo {
    pub chain_id: U256,
    pub central_scheduler: Address,
    pub ejection_manager: Address,
    pub stake_manager: Address,
}

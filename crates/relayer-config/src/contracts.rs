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

use ethers::types::Address;

use super::*;

// Deterministic addresses of a fresh local deployment.
const PELL_DELEGATION_MANAGER: &str = "0x7a2088a1bFc9d81c55368AE168C2C02570cB814F";
const PELL_REGISTRY_ROUTER: &str = "0x3E69aeCb6a5abAc2D87d6707649E2fB0173ee2Da";
const PELL_REGISTRY_INTERACTOR: &str = "0x922D6956C99E12DFeB3224DEA977D0939758A1Fe";
const STAKING_STRATEGY_MANAGER: &str = "0xCf7Ed3AccA5a467e9e704C703E8D87F634fB0Fc9";
const STAKING_DELEGATION_MANAGER: &str = "0xDc64a140Aa3E981100a9becA4E685f962f0cF6C9";
const SERVICE_OMNI_OPERATOR_SHARES_MANAGER: &str =
    "0x4c5859f0F772848b2D91F1D83E2Fe57935348029";
const DVS_CENTRAL_SCHEDULER: &str = "0x04C89607413713Ec9775E14b954286519d836FEf";
const DVS_OPERATOR_STAKE_MANAGER: &str = "0x2E2Ed0Cfd3AD2f1d34481277b3204d807Ca2F8c2";

fn address(hex: &str) -> Address {
    hex.parse().expect("valid default contract address")
}

/// Addresses of every contract the relayer reads from or writes to.
///
/// The pell stake registry router and the pell strategy manager are
/// resolved from the registry router and the delegation manager at startup
/// when they are not configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContractAddresses {
    /// Pell ledger delegation manager.
    pub pell_delegation_manager: Address,
    /// Pell ledger registry router.
    pub pell_registry_router: Address,
    /// Registry interactor, emits the DVS registration events.
    pub pell_registry_interactor: Address,
    /// Pell ledger stake registry router.
    #[serde(default)]
    pub pell_stake_registry_router: Option<Address>,
    /// Pell ledger strategy manager.
    #[serde(default)]
    pub pell_strategy_manager: Option<Address>,
    /// Staking ledger strategy manager.
    pub staking_strategy_manager: Address,
    /// Staking ledger delegation manager.
    pub staking_delegation_manager: Address,
    /// Service ledger omni operator shares manager.
    pub service_omni_operator_shares_manager: Address,
    /// DVS ledger central scheduler.
    pub dvs_central_scheduler: Address,
    /// DVS ledger operator stake manager.
    pub dvs_operator_stake_manager: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            pell_delegation_manager: address(PELL_DELEGATION_MANAGER),
            pell_registry_router: address(PELL_REGISTRY_ROUTER),
            pell_registry_interactor: address(PELL_REGISTRY_INTERACTOR),
            pell_stake_registry_router: None,
            pell_strategy_manager: None,
            staking_strategy_manager: address(STAKING_STRATEGY_MANAGER),
            staking_delegation_manager: address(STAKING_DELEGATION_MANAGER),
            service_omni_operator_shares_manager: address(
                SERVICE_OMNI_OPERATOR_SHARES_MANAGER,
            ),
            dvs_central_scheduler: address(DVS_CENTRAL_SCHEDULER),
            dvs_operator_stake_manager: address(DVS_OPERATOR_STAKE_MANAGER),
        }
    }
}

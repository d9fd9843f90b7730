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

use std::fmt;

use ethers::abi::AbiEncode;
use ethers::types::{Address, Bytes};
use pell_relayer_types::LedgerKind;

/// Where an event is relayed to: a destination ledger, contract and method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventTarget {
    /// The destination ledger.
    pub ledger: LedgerKind,
    /// The destination contract name.
    pub contract: &'static str,
    /// The destination method name.
    pub method: &'static str,
}

impl EventTarget {
    /// Creates a new target.
    pub const fn new(
        ledger: LedgerKind,
        contract: &'static str,
        method: &'static str,
    ) -> Self {
        Self {
            ledger,
            contract,
            method,
        }
    }
}

impl fmt::Display for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target_{}:{}:{}", self.ledger, self.contract, self.method)
    }
}

/// A destination method call, ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    /// What this call targets.
    pub target: EventTarget,
    /// The destination contract address.
    pub to: Address,
    /// ABI encoded calldata, selector included.
    pub data: Bytes,
}

impl OutboundCall {
    /// Encodes `call` as calldata for the contract at `to`.
    pub fn new<C: AbiEncode>(target: EventTarget, to: Address, call: C) -> Self {
        Self {
            target,
            to,
            data: call.encode().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_renders_for_spans() {
        let target = EventTarget::new(
            LedgerKind::Staking,
            "StakingDelegationManager",
            "syncRegisterAsOperator",
        );
        assert_eq!(
            target.to_string(),
            "target_stakingevm:StakingDelegationManager:syncRegisterAsOperator"
        );
    }
}

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
//! Value types shared by the relayer configuration and runtime.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A module for managing private keys.
pub mod private_key;
/// A module for [`url::Url`] values that may come from the environment.
pub mod rpc_url;

/// One of the ledgers taking part in the relay.
///
/// The display form is the ledger's domain name as it appears in log targets,
/// the serde form is the short key used in the config.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerKind {
    /// The hub ledger, home of the registry routers and managers.
    #[display(fmt = "pellevm")]
    Pell,
    /// The restaking ledger.
    #[display(fmt = "stakingevm")]
    Staking,
    /// The service ledger.
    #[display(fmt = "serviceevm")]
    Service,
    /// The DVS ledger.
    #[display(fmt = "dvsevm")]
    Dvs,
}

impl LedgerKind {
    /// Every ledger kind, in a stable order.
    pub const ALL: [LedgerKind; 4] = [
        LedgerKind::Pell,
        LedgerKind::Staking,
        LedgerKind::Service,
        LedgerKind::Dvs,
    ];

    /// The config key of this ledger.
    pub fn key(&self) -> &'static str {
        match self {
            LedgerKind::Pell => "pell",
            LedgerKind::Staking => "staking",
            LedgerKind::Service => "service",
            LedgerKind::Dvs => "dvs",
        }
    }
}

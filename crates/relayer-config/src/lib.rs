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

//! # Relayer Configuration Module 🕸️
//!
//! A module for configuring the relayer.
//!
//! ## Overview
//!
//! Every key has a default, so an empty config describes a relayer for a
//! local devnet where all four ledgers share one node. Possible configuration include:
//! * `port`: The port the status surface listens on. Defaults to 9090
//! * `ledger` / `ledgers`: the default endpoints and per-ledger overrides.
//! * `contracts`: addresses of the source and destination contracts.
//! * `signer`: the signing backend of the relayer account.
//! * `relay` / `health`: watcher, submitter and health monitor tunables.

/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Contract addresses configuration
pub mod contracts;
/// Event watcher and transaction queue configuration
pub mod event_watcher;
/// Ledger endpoints configuration
pub mod ledger;
/// Signing backend configuration
pub mod signing_backend;
/// Utils for processing configuration
pub mod utils;

use std::collections::HashMap;

use pell_relayer_types::LedgerKind;
use serde::{Deserialize, Serialize};

use contracts::ContractAddresses;
use event_watcher::{HealthConfig, RelayConfig};
use ledger::LedgerConfig;
use signing_backend::SignerConfig;

/// The default port the relayer will listen on. Defaults to 9090.
const fn default_port() -> u16 {
    9090
}

/// PellRelayerConfig is the configuration for the pell relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PellRelayerConfig {
    /// HTTP status server port number
    ///
    /// default to 9090
    #[serde(default = "default_port")]
    pub port: u16,
    /// Endpoints used by every ledger that has no override.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Per ledger endpoint overrides.
    #[serde(default)]
    pub ledgers: HashMap<LedgerKind, LedgerConfig>,
    /// Source and destination contract addresses.
    #[serde(default)]
    pub contracts: ContractAddresses,
    /// The signing backend for the relayer account.
    #[serde(default, skip_serializing)]
    pub signer: SignerConfig,
    /// Event watcher, correlator and transaction queue tunables.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Connection health monitor tunables.
    #[serde(default)]
    pub health: HealthConfig,
    /// Authorize the relayer account as connector on the destination
    /// contracts before the watchers start.
    #[serde(default)]
    pub auto_update_connector: bool,
}

impl Default for PellRelayerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            ledger: LedgerConfig::default(),
            ledgers: HashMap::new(),
            contracts: ContractAddresses::default(),
            signer: SignerConfig::default(),
            relay: RelayConfig::default(),
            health: HealthConfig::default(),
            auto_update_connector: false,
        }
    }
}

impl PellRelayerConfig {
    /// Returns the endpoints of the given ledger, falling back to the default ones.
    pub fn ledger(&self, kind: LedgerKind) -> &LedgerConfig {
        self.ledgers.get(&kind).unwrap_or(&self.ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_a_devnet_config() {
        let config: PellRelayerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.relay.correlation_window, 1000);
        assert_eq!(config.health.max_consecutive_failures, 3);
        assert_eq!(config.relay.benign_revert_codes, vec!["RR25".to_string()]);
        assert!(!config.auto_update_connector);
        assert!(config.signer.is_devnet_default());
    }

    #[test]
    fn ledger_overrides_fall_back_to_the_default() {
        let config: PellRelayerConfig = serde_json::from_str(
            r#"{
                "ledgers": {
                    "dvs": {
                        "http-endpoint": "http://dvs.local:8545",
                        "ws-endpoint": "ws://dvs.local:8546"
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.ledger(LedgerKind::Dvs).http_endpoint.host_str(),
            Some("dvs.local")
        );
        assert_eq!(
            config.ledger(LedgerKind::Pell).http_endpoint.host_str(),
            Some("127.0.0.1")
        );
    }
}

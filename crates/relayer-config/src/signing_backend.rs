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

use std::path::PathBuf;
use std::str::FromStr;

use ethers::types::Address;
use pell_relayer_types::private_key::PrivateKey;
use pell_relayer_types::rpc_url::RpcUrl;

use super::*;

/// The first account of a Hardhat/Anvil devnet. Publicly known, never holds value.
pub const DEVNET_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Enumerates the supported signing backends configurations.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignerConfig {
    /// Signs with a raw private key.
    PrivateKey(PrivateKeySignerConfig),
    /// Signs with a key decrypted from an encrypted JSON keystore.
    Keystore(KeystoreSignerConfig),
    /// Delegates signing to a web3signer compatible service.
    Remote(RemoteSignerConfig),
}

/// PrivateKeySignerConfig represents the configuration for the private key backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrivateKeySignerConfig {
    /// The private key, as hex or `$ENV_VAR`.
    pub private_key: PrivateKey,
}

/// KeystoreSignerConfig represents the configuration for the keystore backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeystoreSignerConfig {
    /// Path to the encrypted JSON keystore.
    pub path: PathBuf,
    /// The keystore password, or `$ENV_VAR` holding it.
    pub password: String,
}

/// RemoteSignerConfig represents the configuration for the remote backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteSignerConfig {
    /// JSON-RPC endpoint of the signing service.
    pub endpoint: RpcUrl,
    /// The account the service signs for.
    pub address: Address,
}

impl Default for SignerConfig {
    fn default() -> Self {
        SignerConfig::PrivateKey(PrivateKeySignerConfig {
            private_key: PrivateKey::from_str(DEVNET_PRIVATE_KEY)
                .expect("valid devnet private key"),
        })
    }
}

impl SignerConfig {
    /// Whether this is the well known devnet account.
    pub fn is_devnet_default(&self) -> bool {
        match self {
            SignerConfig::PrivateKey(c) => PrivateKey::from_str(
                DEVNET_PRIVATE_KEY,
            )
            .map(|devnet| devnet == c.private_key)
            .unwrap_or(false),
            _ => false,
        }
    }
}

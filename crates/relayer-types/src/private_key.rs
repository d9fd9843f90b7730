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

use std::str::FromStr;

use ethers::types::H256;
use serde::Deserialize;

/// PrivateKey represents a private key.
///
/// It never prints its value, and deserializes either from a `0x` prefixed
/// hex string or from `$NAME`, an env var holding such a string.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(H256);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKey").finish()
    }
}

impl From<H256> for PrivateKey {
    fn from(secret: H256) -> Self {
        PrivateKey(secret)
    }
}

impl std::ops::Deref for PrivateKey {
    type Target = H256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for PrivateKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = if let Some(var) = value.strip_prefix('$') {
            tracing::trace!("Reading {} from env", var);
            std::env::var(var).map_err(|e| {
                format!("error while loading this env {var}: {e}")
            })?
        } else {
            value.to_string()
        };
        if !hex.starts_with("0x") {
            return Err(String::from(
                "expected a 0x prefixed hex string or an env var ($NAME)",
            ));
        }
        H256::from_str(&hex).map(Self).map_err(|e| {
            format!(
                "{e}\n got {} chars but expected a 66 chars string (including the 0x prefix)",
                hex.len()
            )
        })
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PrivateKeyVistor;
        impl<'de> serde::de::Visitor<'de> for PrivateKeyVistor {
            type Value = PrivateKey;

            fn expecting(
                &self,
                formatter: &mut std::fmt::Formatter,
            ) -> std::fmt::Result {
                formatter.write_str(
                    "hex string or an env var containing a hex string in it",
                )
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                PrivateKey::from_str(value).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_str(PrivateKeyVistor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str =
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn parses_hex_and_env() {
        let direct = PrivateKey::from_str(KEY).unwrap();
        std::env::set_var("PELL_TEST_PRIVATE_KEY", KEY);
        let from_env = PrivateKey::from_str("$PELL_TEST_PRIVATE_KEY").unwrap();
        assert_eq!(direct, from_env);
    }

    #[test]
    fn rejects_other_forms_without_leaking() {
        assert!(PrivateKey::from_str("test test test junk").is_err());
        assert!(PrivateKey::from_str("0x1234").is_err());
        let key = PrivateKey::from_str(KEY).unwrap();
        assert_eq!(format!("{key:?}"), "PrivateKey");
    }
}

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

use std::path::Path;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, U256};
use pell_ledger_client::SignedTransaction;
use pell_relayer_types::private_key::PrivateKey;
use pell_relayer_utils::{Error, Result};

use super::{ensure_sender, TxSigner};

/// A signer holding its key in memory.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    wallet: LocalWallet,
}

impl LocalSigner {
    /// Creates a signer from a raw private key.
    pub fn from_private_key(key: &PrivateKey) -> Result<Self> {
        let wallet = LocalWallet::from_bytes(key.as_bytes())?;
        Ok(Self { wallet })
    }

    /// Decrypts an encrypted JSON keystore. The password may be `$ENV_VAR`.
    pub fn from_keystore(path: &Path, password: &str) -> Result<Self> {
        let password = match password.strip_prefix('$') {
            Some(var) => {
                std::env::var(var).map_err(|_| Error::MissingSecrets)?
            }
            None => password.to_string(),
        };
        let wallet = LocalWallet::decrypt_keystore(path, password)?;
        Ok(Self { wallet })
    }
}

#[async_trait::async_trait]
impl TxSigner for LocalSigner {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    async fn sign_transaction(
        &self,
        chain_id: U256,
        tx: &TypedTransaction,
    ) -> Result<SignedTransaction> {
        ensure_sender(self.address(), tx)?;
        let mut tx = tx.clone();
        tx.set_chain_id(chain_id.as_u64());
        let signature = self.wallet.sign_transaction(&tx).await?;
        Ok(SignedTransaction { tx, signature })
    }
}

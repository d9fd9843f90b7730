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
//! # Signing Backends 🕸️
//!
//! The relayer owns exactly one account. Every backend signs for that one
//! address only, and refuses transactions that name another sender.

use std::sync::Arc;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, U256};
use pell_ledger_client::SignedTransaction;
use pell_relayer_config::signing_backend::SignerConfig;
use pell_relayer_utils::{Error, Result};

/// Signs with a key held in memory.
pub mod local;
/// Delegates to a web3signer compatible service.
pub mod remote;

pub use local::LocalSigner;
pub use remote::RemoteSigner;

/// Produces signed, submittable transactions for one fixed account.
#[async_trait::async_trait]
pub trait TxSigner: Send + Sync + 'static {
    /// The account this signer is bound to.
    fn address(&self) -> Address;

    /// Signs `tx` for the destination chain `chain_id`.
    ///
    /// Fails with [`Error::SignerNotAuthorized`] when `tx.from` is not [`TxSigner::address`].
    async fn sign_transaction(
        &self,
        chain_id: U256,
        tx: &TypedTransaction,
    ) -> Result<SignedTransaction>;
}

/// Checks that `tx` is sent by `signer`.
pub fn ensure_sender(signer: Address, tx: &TypedTransaction) -> Result<()> {
    match tx.from() {
        Some(from) if *from == signer => Ok(()),
        requested => Err(Error::SignerNotAuthorized {
            signer,
            requested: requested.copied(),
        }),
    }
}

/// Builds the signer described by the config.
pub fn from_config(config: &SignerConfig) -> Result<Arc<dyn TxSigner>> {
    let signer: Arc<dyn TxSigner> = match config {
        SignerConfig::PrivateKey(c) => {
            Arc::new(LocalSigner::from_private_key(&c.private_key)?)
        }
        SignerConfig::Keystore(c) => {
            Arc::new(LocalSigner::from_keystore(&c.path, &c.password)?)
        }
        SignerConfig::Remote(c) => Arc::new(RemoteSigner::new(
            c.endpoint.as_url().clone(),
            c.address,
        )),
    };
    tracing::debug!(address = ?signer.address(), "signer ready");
    Ok(signer)
}

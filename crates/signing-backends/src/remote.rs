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

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, U256};
use ethers::utils::rlp::Rlp;
use pell_ledger_client::SignedTransaction;
use pell_relayer_utils::{Error, Result};
use serde::Deserialize;

use super::{ensure_sender, TxSigner};

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Bytes>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// A signer backed by a web3signer compatible `eth_signTransaction` endpoint.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: reqwest::Client,
    endpoint: url::Url,
    address: Address,
}

impl RemoteSigner {
    /// Creates a signer for `address` served by `endpoint`.
    pub fn new(endpoint: url::Url, address: Address) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            address,
        }
    }

    /// Checks a signing response against the transaction that was sent.
    fn accept(
        &self,
        tx: TypedTransaction,
        response: RpcResponse,
    ) -> Result<SignedTransaction> {
        if let Some(e) = response.error {
            return Err(Error::RemoteSigner {
                code: e.code,
                message: e.message,
            });
        }
        let raw = response
            .result
            .ok_or_else(|| malformed("empty eth_signTransaction result"))?;
        let (_, signature) = TypedTransaction::decode_signed(&Rlp::new(&raw))
            .map_err(|e| malformed(format!("undecodable signed tx: {e}")))?;
        // the signature must cover our transaction, not whatever the service decoded.
        let signer = signature
            .recover(tx.sighash())
            .map_err(|e| malformed(format!("invalid signature: {e}")))?;
        if signer != self.address {
            return Err(Error::SignerNotAuthorized {
                signer,
                requested: Some(self.address),
            });
        }
        Ok(SignedTransaction { tx, signature })
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::RemoteSigner {
        code: -1,
        message: message.into(),
    }
}

#[async_trait::async_trait]
impl TxSigner for RemoteSigner {
    fn address(&self) -> Address {
        self.address
    }

    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn sign_transaction(
        &self,
        chain_id: U256,
        tx: &TypedTransaction,
    ) -> Result<SignedTransaction> {
        ensure_sender(self.address, tx)?;
        let mut tx = tx.clone();
        tx.set_chain_id(chain_id.as_u64());
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_signTransaction",
            "params": [&tx],
        });
        let response: RpcResponse = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        self.accept(tx, response)
    }
}

#[cfg(test)]
mod tests {
    use ethers::signers::LocalWallet;
    use ethers::types::Eip1559TransactionRequest;

    use super::*;

    const KEY: &str =
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn wallet() -> LocalWallet {
        KEY.parse().unwrap()
    }

    fn remote_for(address: Address) -> RemoteSigner {
        RemoteSigner::new("http://127.0.0.1:9000".parse().unwrap(), address)
    }

    fn transaction(from: Address) -> TypedTransaction {
        let mut tx: TypedTransaction = Eip1559TransactionRequest::new()
            .from(from)
            .to(Address::repeat_byte(0x22))
            .nonce(3u64)
            .gas(21_000u64)
            .into();
        tx.set_chain_id(1337u64);
        tx
    }

    fn response(body: serde_json::Value) -> RpcResponse {
        serde_json::from_value(body).unwrap()
    }

    fn signed_by(wallet: &LocalWallet, tx: &TypedTransaction) -> serde_json::Value {
        let signature = wallet.sign_transaction_sync(tx).unwrap();
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": tx.rlp_signed(&signature),
        })
    }

    #[test]
    fn accepts_a_signature_of_its_account() -> Result<()> {
        let wallet = wallet();
        let address = ethers::signers::Signer::address(&wallet);
        let tx = transaction(address);
        let signed = remote_for(address)
            .accept(tx.clone(), response(signed_by(&wallet, &tx)))?;
        assert_eq!(signed.tx, tx);
        assert_eq!(signed.signature.recover(tx.sighash()).unwrap(), address);
        Ok(())
    }

    #[test]
    fn error_bodies_become_remote_signer_errors() {
        let tx = transaction(Address::repeat_byte(0x11));
        let err = remote_for(Address::repeat_byte(0x11))
            .accept(
                tx,
                response(serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32000, "message": "key locked" },
                })),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RemoteSigner { code: -32000, ref message } if message == "key locked"
        ));
    }

    #[test]
    fn a_missing_result_is_malformed() {
        let tx = transaction(Address::repeat_byte(0x11));
        let err = remote_for(Address::repeat_byte(0x11))
            .accept(tx, response(serde_json::json!({ "jsonrpc": "2.0", "id": 1 })))
            .unwrap_err();
        assert!(matches!(err, Error::RemoteSigner { code: -1, .. }));
    }

    #[test]
    fn a_signature_of_another_account_is_rejected() {
        let wallet = wallet();
        let expected = Address::repeat_byte(0x44);
        // the service signed with its own key, not the configured account.
        let tx = transaction(expected);
        let err = remote_for(expected)
            .accept(tx.clone(), response(signed_by(&wallet, &tx)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SignerNotAuthorized { signer, requested: Some(requested) }
                if signer == ethers::signers::Signer::address(&wallet)
                    && requested == expected
        ));
    }
}

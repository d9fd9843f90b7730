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

use std::sync::Arc;
use std::time::Duration;

use ethers::providers::{
    Http, JsonRpcClient, Middleware, Provider, ProviderError, RpcError, Ws,
};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, Block, BlockNumber, Bytes, Filter, Log, TransactionReceipt,
    H256, U256, U64,
};
use futures::StreamExt;
use pell_relayer_utils::{Error, Result};
use tokio::sync::{mpsc, oneshot};

use super::{LedgerClient, LogSubscription, SignedTransaction};

/// How many undelivered logs a subscription buffers before it applies
/// backpressure to the websocket reader.
const LOG_CHANNEL_CAPACITY: usize = 256;

/// A [`LedgerClient`] over an ethers [`Provider`].
#[derive(Debug)]
pub struct EthersClient<P: JsonRpcClient> {
    provider: Arc<Provider<P>>,
}

impl<P: JsonRpcClient> Clone for EthersClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

impl<P: JsonRpcClient> EthersClient<P> {
    /// Wraps an already configured provider.
    pub fn new(provider: Provider<P>) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// The underlying provider.
    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }
}

impl EthersClient<Http> {
    /// Creates an http client.
    pub fn connect_http(url: &url::Url) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url.as_str())?
            .interval(Duration::from_millis(500u64));
        Ok(Self::new(provider))
    }
}

impl EthersClient<Ws> {
    /// Opens a websocket connection.
    pub async fn connect_ws(url: &url::Url) -> Result<Self> {
        let provider = Provider::<Ws>::connect(url.as_str()).await?;
        Ok(Self::new(provider))
    }
}

/// Transports that can (or cannot) carry a live log feed.
#[async_trait::async_trait]
pub trait LogStreamTransport: JsonRpcClient + Sized + 'static {
    /// Subscribes to the logs matching `filter`.
    async fn subscribe_logs(
        provider: Arc<Provider<Self>>,
        filter: Filter,
    ) -> Result<LogSubscription>;
}

#[async_trait::async_trait]
impl LogStreamTransport for Http {
    async fn subscribe_logs(
        _provider: Arc<Provider<Self>>,
        _filter: Filter,
    ) -> Result<LogSubscription> {
        Err(Error::SubscriptionUnsupported)
    }
}

#[async_trait::async_trait]
impl LogStreamTransport for Ws {
    async fn subscribe_logs(
        provider: Arc<Provider<Self>>,
        filter: Filter,
    ) -> Result<LogSubscription> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (log_tx, logs) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let (err_tx, errors) = mpsc::channel(8);
        let (unsubscribe_tx, mut unsubscribe_rx) = oneshot::channel::<()>();
        // the stream borrows the provider, so it lives in its own task that
        // forwards into the channels.
        tokio::spawn(async move {
            let mut stream = match provider.subscribe_logs(&filter).await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(Error::from(e)));
                    return;
                }
            };
            tracing::trace!(id = ?stream.id, "log subscription opened");
            loop {
                tokio::select! {
                    _ = &mut unsubscribe_rx => {
                        if let Err(e) = stream.unsubscribe().await {
                            tracing::debug!(error = %e, "unsubscribe failed");
                        }
                        break;
                    }
                    item = stream.next() => match item {
                        Some(log) => {
                            if log_tx.send(log).await.is_err() {
                                let _ = stream.unsubscribe().await;
                                break;
                            }
                        }
                        None => {
                            let _ = err_tx.send(Error::SubscriptionClosed).await;
                            break;
                        }
                    }
                }
            }
        });
        ready_rx.await.map_err(|_| Error::SubscriptionClosed)??;
        Ok(LogSubscription::new(logs, errors, unsubscribe_tx))
    }
}

/// Maps a provider error of a call or gas estimation, surfacing reverts.
fn call_error(e: ProviderError) -> Error {
    let reason = e
        .as_error_response()
        .map(|rpc| rpc.message.clone())
        .unwrap_or_else(|| e.to_string());
    if reason.contains("revert") {
        Error::Revert { reason }
    } else {
        Error::EthersProvider(e)
    }
}

#[async_trait::async_trait]
impl<P: LogStreamTransport> LedgerClient for EthersClient<P> {
    async fn chain_id(&self) -> Result<U256> {
        Ok(self.provider.get_chainid().await?)
    }

    async fn block_number(&self) -> Result<U64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn block_by_number(&self, number: U64) -> Result<Option<Block<H256>>> {
        Ok(self.provider.get_block(number).await?)
    }

    async fn subscribe_logs(&self, filter: &Filter) -> Result<LogSubscription> {
        P::subscribe_logs(self.provider.clone(), filter.clone()).await
    }

    async fn query_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        Ok(self.provider.get_logs(filter).await?)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        self.provider.call(tx, None).await.map_err(call_error)
    }

    async fn pending_nonce(&self, address: Address) -> Result<U256> {
        let nonce = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await?;
        Ok(nonce)
    }

    async fn fill_transaction(&self, tx: &mut TypedTransaction) -> Result<()> {
        self.provider
            .fill_transaction(tx, None)
            .await
            .map_err(call_error)
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<H256> {
        let pending = self
            .provider
            .send_raw_transaction(tx.rlp())
            .await
            .map_err(|e| Error::Submission {
                reason: e.to_string(),
            })?;
        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>> {
        Ok(self.provider.get_transaction_receipt(hash).await?)
    }
}

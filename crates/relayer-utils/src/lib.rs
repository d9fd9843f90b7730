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
//! # Relayer Utils 🕸️
//!
//! Shared error type, probes, metrics and small helpers used across the
//! relayer crates.

use ethers::types::{Address, H256};

/// Terminal hyperlinks for transaction hashes.
pub mod clickable_link;

/// Metrics functionality
pub mod metric;
/// A module used for debugging relayer lifecycle, relay state, or other relayer state.
pub mod probe;
/// Retry functionality
pub mod retry;

/// An enum of all possible errors that could be encountered during the execution of the Pell
/// Relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Error in the underlying Http/Ws server.
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    /// Ethers provider error.
    #[error(transparent)]
    EthersProvider(#[from] ethers::providers::ProviderError),
    /// Ethers wallet error.
    #[error(transparent)]
    EtherWalletError(#[from] ethers::signers::WalletError),
    /// ABI decoding error, raised when a log does not match its event schema.
    #[error(transparent)]
    Abi(#[from] ethers::abi::Error),
    /// Calldata or return data that does not match the expected types.
    #[error(transparent)]
    AbiCodec(#[from] ethers::abi::AbiError),
    /// Http client error.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Prometheus error.
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Config parse error.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// The loaded configuration is not usable.
    #[error("Invalid config: {}", reason)]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
    /// No ledger client was created for that ledger.
    #[error("Ledger Not Configured: {}", ledger)]
    LedgerNotConfigured {
        /// The ledger name.
        ledger: String,
    },
    /// Missing Secrets in the config, for example the signer key.
    #[error("Missing required private-key or keystore password in the config")]
    MissingSecrets,
    /// The signer was asked to sign for an account it does not own.
    #[error("Signer {} is not authorized to sign for {:?}", signer, requested)]
    SignerNotAuthorized {
        /// The address the signer is bound to.
        signer: Address,
        /// The sender the transaction asked for.
        requested: Option<Address>,
    },
    /// The remote signing service answered with an error.
    #[error("Remote signer error ({}): {}", code, message)]
    RemoteSigner {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
    /// The destination contract rejected the call.
    #[error("Execution reverted: {}", reason)]
    Revert {
        /// Revert reason as reported by the ledger.
        reason: String,
    },
    /// The ledger did not accept the signed transaction.
    #[error("Transaction submission failed: {}", reason)]
    Submission {
        /// Underlying error text.
        reason: String,
    },
    /// The transaction was included but its execution failed.
    #[error("Transaction {:?} reverted on chain", tx_hash)]
    TransactionReverted {
        /// The hash of the failed transaction.
        tx_hash: H256,
    },
    /// Waiting for a receipt was cancelled by the shutdown signal.
    #[error("Gave up waiting for the receipt of {:?}", tx_hash)]
    ReceiptCancelled {
        /// The hash of the submitted transaction.
        tx_hash: H256,
    },
    /// The live log subscription ended.
    #[error("Log subscription closed")]
    SubscriptionClosed,
    /// The transport cannot carry a live subscription.
    #[error("Live log subscriptions are not supported over this transport")]
    SubscriptionUnsupported,
    /// A watcher lifecycle step was called out of order.
    #[error("Event watcher cannot {} from the {} state", action, state)]
    InvalidWatcherState {
        /// The lifecycle step, `init` or `listen`.
        action: &'static str,
        /// The state the watcher was in.
        state: String,
    },
    /// A ledger stopped answering liveness checks.
    #[error("Connection to ledger {} lost", ledger)]
    ConnectionLost {
        /// The ledger name.
        ledger: String,
    },
    /// Task was asked to stop externally.
    #[error("Task Force Shutdown")]
    ForceShutdown,
}

impl Error {
    /// Returns the revert reason if this error means the destination rejected the call.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Error::Revert { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// A type alias for the result for pell relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;

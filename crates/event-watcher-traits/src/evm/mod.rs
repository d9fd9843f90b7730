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

//! # EVM Events Watcher Traits 🕸️

use ethers::abi::RawLog;
use ethers::contract::LogMeta;
use ethers::types::Log;

/// Event watching traits
mod event_watcher;
pub use event_watcher::*;

/// Multi-part event reconstruction
mod correlator;
pub use correlator::*;

/// Extracts the position of a mined log.
///
/// Pending logs have no position yet; their fields default to zero.
pub fn log_meta(log: &Log) -> LogMeta {
    LogMeta {
        address: log.address,
        block_number: log.block_number.unwrap_or_default(),
        block_hash: log.block_hash.unwrap_or_default(),
        transaction_hash: log.transaction_hash.unwrap_or_default(),
        transaction_index: log.transaction_index.unwrap_or_default(),
        log_index: log.log_index.unwrap_or_default(),
    }
}

fn raw_log(log: &Log) -> RawLog {
    RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    }
}

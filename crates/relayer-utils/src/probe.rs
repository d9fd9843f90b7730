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

use derive_more::Display;
/// Target for logger
pub const TARGET: &str = "pell_probe";

/// The Kind of the Probe.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// When the Lifecycle of the Relayer changes, like starting or shutting down.
    #[display(fmt = "lifecycle")]
    Lifecycle,
    /// Live subscription updates of an event watcher.
    #[display(fmt = "subscription")]
    Subscription,
    /// A source event was relayed (or dropped) by its handler.
    #[display(fmt = "relay")]
    Relay,
    /// Relayer Transaction Queue state on a specific chain.
    #[display(fmt = "tx_queue")]
    TxQueue,
    /// Composite event reconstruction.
    #[display(fmt = "correlation")]
    Correlation,
    /// Ledger connection health.
    #[display(fmt = "health")]
    Health,
    /// When the relayer will retry to do something.
    #[display(fmt = "retry")]
    Retry,
}

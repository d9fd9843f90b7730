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

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # Pell Relayer Crate 🕸️
//!
//! A crate used to keep the Pell restaking ledgers in sync.
//!
//! ## Overview
//!
//! The restaking state of the Pell network is spread over several ledgers:
//! the pell hub, the staking ledger where deposits and delegations happen,
//! the service ledger and the DVS ledgers. Each ledger emits contract events
//! when its part of the state changes, and the relayer forwards every such
//! change as a transaction to the ledger that mirrors it.
//!
//! The relayer is composed of the following parts:
//!
//!   1. Event watchers, one per (contract, event) pair, each handling its
//!      events strictly in order.
//!   2. A correlator, recovering the sibling events of a DVS registration
//!      from the log history of the registration transaction.
//!   3. A single transaction submitter, serializing every write of the one
//!      relayer account per destination chain.
//!   4. Connection health monitors, taking the relayer down when a ledger
//!      stops answering.
//!   5. A status server exposing readiness and metrics.

/// Liveness checks of the ledger connections.
pub mod health;
/// A module for starting long-running tasks for event watching.
pub mod service;

pub use pell_relayer_utils::{Error, Result};

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
//! # Transaction Submitter 🕸️
//!
//! All outbound calls of the relayer go through one [`TxSubmitter`]. It owns
//! the only signing identity and serializes prepare, sign and submit per
//! destination chain, so no two transactions ever share an account nonce.

/// Destination calls derived from source events.
pub mod call;
mod submitter;

pub use call::{EventTarget, OutboundCall};
pub use submitter::{BenignReverts, TxOutcome, TxSubmitter};

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

use std::time::Duration;

use super::*;

/// The correlation window is `1000` blocks by default.
const fn correlation_window_default() -> u64 {
    1000
}
/// Pause after a transient subscription error, `1_000`ms by default.
const fn subscription_backoff_ms_default() -> u64 {
    1_000
}
/// The idle tick of a watcher loop is `1_000`ms by default.
const fn idle_tick_ms_default() -> u64 {
    1_000
}
/// Receipts are polled every `500`ms by default.
const fn receipt_poll_interval_ms_default() -> u64 {
    500
}
/// Liveness is checked every `3_000`ms by default.
const fn health_interval_ms_default() -> u64 {
    3_000
}
/// Readiness is dropped after more than `3` consecutive failed checks.
const fn max_consecutive_failures_default() -> u32 {
    3
}
/// `RR25`: the chain is already supported by the registry router.
fn benign_revert_codes_default() -> Vec<String> {
    vec![String::from("RR25")]
}

/// Tunables of the event watchers, the correlator and the transaction queue.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayConfig {
    /// How many blocks after the anchor event are scanned for sibling events.
    #[serde(default = "correlation_window_default")]
    pub correlation_window: u64,
    /// Pause after a transient subscription error, in milliseconds.
    #[serde(default = "subscription_backoff_ms_default")]
    pub subscription_backoff_ms: u64,
    /// Heartbeat of an idle watcher loop, in milliseconds.
    #[serde(default = "idle_tick_ms_default")]
    pub idle_tick_ms: u64,
    /// How often a receipt is polled for after submission, in milliseconds.
    #[serde(default = "receipt_poll_interval_ms_default")]
    pub receipt_poll_interval_ms: u64,
    /// Revert codes meaning the relayed effect is already applied.
    #[serde(default = "benign_revert_codes_default")]
    pub benign_revert_codes: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            correlation_window: correlation_window_default(),
            subscription_backoff_ms: subscription_backoff_ms_default(),
            idle_tick_ms: idle_tick_ms_default(),
            receipt_poll_interval_ms: receipt_poll_interval_ms_default(),
            benign_revert_codes: benign_revert_codes_default(),
        }
    }
}

impl RelayConfig {
    /// Pause after a transient subscription error.
    pub fn subscription_backoff(&self) -> Duration {
        Duration::from_millis(self.subscription_backoff_ms)
    }
    /// Heartbeat of an idle watcher loop.
    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }
    /// Receipt polling interval.
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

/// Tunables of the connection health monitor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HealthConfig {
    /// Interval between two liveness checks, in milliseconds. Also bounds a single check.
    #[serde(default = "health_interval_ms_default")]
    pub interval_ms: u64,
    /// Readiness is dropped once the consecutive failures exceed this number.
    #[serde(default = "max_consecutive_failures_default")]
    pub max_consecutive_failures: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_ms: health_interval_ms_default(),
            max_consecutive_failures: max_consecutive_failures_default(),
        }
    }
}

impl HealthConfig {
    /// Interval between two liveness checks.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

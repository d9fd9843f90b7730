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

use parking_lot::RwLock;
use serde::Serialize;

/// The message reported while the relayer is still starting up.
pub const INITIALIZING: &str = "initializing";
/// The message reported while the relayer is ready.
pub const OK: &str = "ok";

/// A consistent view of the readiness state, as served by the status surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessSnapshot {
    /// Whether the relayer considers itself healthy.
    pub ready: bool,
    /// `ok`, or why the relayer is not ready.
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Initializing,
    Ready,
    Disabled(String),
}

/// Process wide readiness.
///
/// Starts not ready, becomes ready once every watcher is listening, and is
/// disabled for good when a ledger connection is lost. Once disabled it never
/// becomes ready again.
#[derive(Debug, Clone)]
pub struct ReadinessRegistry {
    phase: Arc<RwLock<Phase>>,
}

impl Default for ReadinessRegistry {
    fn default() -> Self {
        Self {
            phase: Arc::new(RwLock::new(Phase::Initializing)),
        }
    }
}

impl ReadinessRegistry {
    /// Creates a registry in the initializing state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the relayer ready. Returns `false` (and changes nothing) once disabled.
    pub fn enable(&self) -> bool {
        let mut phase = self.phase.write();
        match *phase {
            Phase::Disabled(_) => false,
            _ => {
                *phase = Phase::Ready;
                true
            }
        }
    }

    /// Marks the relayer not ready for the rest of the process lifetime.
    ///
    /// Returns `true` only for the call that performed the transition, later
    /// calls keep the first reason.
    pub fn disable(&self, reason: impl Into<String>) -> bool {
        let mut phase = self.phase.write();
        match *phase {
            Phase::Disabled(_) => false,
            _ => {
                *phase = Phase::Disabled(reason.into());
                true
            }
        }
    }

    /// Whether the relayer is ready.
    pub fn is_ready(&self) -> bool {
        *self.phase.read() == Phase::Ready
    }

    /// Returns the current state.
    pub fn snapshot(&self) -> ReadinessSnapshot {
        match &*self.phase.read() {
            Phase::Initializing => ReadinessSnapshot {
                ready: false,
                message: INITIALIZING.into(),
            },
            Phase::Ready => ReadinessSnapshot {
                ready: true,
                message: OK.into(),
            },
            Phase::Disabled(reason) => ReadinessSnapshot {
                ready: false,
                message: reason.clone(),
            },
        }
    }
}

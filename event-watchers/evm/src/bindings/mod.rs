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

//! Typed bindings of the contracts the relayer talks to.
//!
//! Events are named after the contract event with a `Filter` suffix and
//! calls after the method with a `Call` suffix.
#![allow(missing_docs)]

mod calls;
mod events;
mod types;

pub use calls::*;
pub use events::*;
pub use types::*;

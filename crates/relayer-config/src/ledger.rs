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

use pell_relayer_types::rpc_url::RpcUrl;

use super::*;

fn default_http_endpoint() -> RpcUrl {
    url::Url::parse("http://127.0.0.1:8545")
        .expect("valid default http endpoint")
        .into()
}

fn default_ws_endpoint() -> RpcUrl {
    url::Url::parse("ws://127.0.0.1:8545")
        .expect("valid default ws endpoint")
        .into()
}

/// Endpoints of one ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LedgerConfig {
    /// Http(s) endpoint used for calls, queries and submission.
    #[serde(default = "default_http_endpoint")]
    pub http_endpoint: RpcUrl,
    /// Websocket endpoint used for live log subscriptions and liveness checks.
    #[serde(default = "default_ws_endpoint")]
    pub ws_endpoint: RpcUrl,
    /// Block explorer base url, used to print clickable transaction links.
    #[serde(default)]
    pub explorer: Option<url::Url>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            http_endpoint: default_http_endpoint(),
            ws_endpoint: default_ws_endpoint(),
            explorer: None,
        }
    }
}

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

use std::path::{Path, PathBuf};

use config::{Config, File};

use crate::PellRelayerConfig;

/// Environment variables with this prefix override the config files,
/// for example `PELL_RELAYER_PORT=9191`.
pub const ENV_PREFIX: &str = "PELL_RELAYER";

/// A helper function that will search for all config files in the given directory and return them as a vec
/// of the paths.
///
/// Supported file extensions are:
/// - `.toml`.
/// - `.json`.
pub fn search_config_files<P: AsRef<Path>>(
    base_dir: P,
) -> pell_relayer_utils::Result<Vec<PathBuf>> {
    // A pattern that covers all toml or json files in the config directory and subdirectories.
    let toml_pattern = format!("{}/**/*.toml", base_dir.as_ref().display());
    let json_pattern = format!("{}/**/*.json", base_dir.as_ref().display());
    tracing::trace!(
        "Loading config files from {} and {}",
        toml_pattern,
        json_pattern
    );
    let toml_files = glob::glob(&toml_pattern)?;
    let json_files = glob::glob(&json_pattern)?;
    toml_files
        .chain(json_files)
        .map(|v| v.map_err(pell_relayer_utils::Error::from))
        .collect()
}

/// Try to parse the [`PellRelayerConfig`] from the given config file(s).
pub fn parse_from_files(
    files: &[PathBuf],
) -> pell_relayer_utils::Result<PellRelayerConfig> {
    let mut builder = Config::builder();
    for config_file in files {
        tracing::trace!("Loading config file: {}", config_file.display());
        let ext = config_file
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let format = match ext {
            "toml" => config::FileFormat::Toml,
            "json" => config::FileFormat::Json,
            _ => {
                tracing::warn!("Unknown file extension: {}", ext);
                continue;
            }
        };
        builder = builder
            .add_source(File::from(config_file.as_path()).format(format));
    }

    // also merge in the environment (with a prefix of PELL_RELAYER).
    let builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX).separator("_"),
    );
    let cfg = builder.build()?;
    // and finally deserialize the config and post-process it
    let config: Result<
        PellRelayerConfig,
        serde_path_to_error::Error<config::ConfigError>,
    > = serde_path_to_error::deserialize(cfg);
    match config {
        Ok(c) => postloading_process(c),
        Err(e) => {
            tracing::error!("{}", e);
            Err(e.into())
        }
    }
}

/// Load the configuration files found under `path`.
///
/// it is the same as using the [`search_config_files`] and [`parse_from_files`] functions combined.
pub fn load<P: AsRef<Path>>(
    path: P,
) -> pell_relayer_utils::Result<PellRelayerConfig> {
    parse_from_files(&search_config_files(path)?)
}

/// The postloading_process exists to validate configuration
pub fn postloading_process(
    config: PellRelayerConfig,
) -> pell_relayer_utils::Result<PellRelayerConfig> {
    tracing::trace!("Checking configration sanity ...");
    let invalid = |reason: String| pell_relayer_utils::Error::InvalidConfig { reason };

    if config.relay.correlation_window == 0 {
        return Err(invalid("relay.correlation-window must be positive".into()));
    }
    if config.relay.subscription_backoff_ms == 0
        || config.relay.idle_tick_ms == 0
        || config.relay.receipt_poll_interval_ms == 0
    {
        return Err(invalid("relay intervals must be positive".into()));
    }
    if config.health.interval_ms == 0 {
        return Err(invalid("health.interval-ms must be positive".into()));
    }
    for kind in pell_relayer_types::LedgerKind::ALL {
        let ledger = config.ledger(kind);
        if !ledger.ws_endpoint.is_websocket() {
            return Err(invalid(format!(
                "ws-endpoint of the {} ledger must be a ws:// or wss:// url, got {}",
                kind.key(),
                ledger.ws_endpoint
            )));
        }
    }
    if config.signer.is_devnet_default() {
        tracing::warn!(
            "!!WARNING!!: no signer configured, using the well known devnet account"
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_and_merges_files() -> pell_relayer_utils::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut main = std::fs::File::create(dir.path().join("main.toml"))?;
        writeln!(main, "port = 9191\nauto-update-connector = true")?;
        std::fs::create_dir(dir.path().join("ledgers"))?;
        let mut dvs =
            std::fs::File::create(dir.path().join("ledgers").join("dvs.json"))?;
        writeln!(
            dvs,
            r#"{{ "ledgers": {{ "dvs": {{ "http-endpoint": "http://dvs:8545", "ws-endpoint": "wss://dvs:8546" }} }} }}"#
        )?;

        let config = load(dir.path())?;
        assert_eq!(config.port, 9191);
        assert!(config.auto_update_connector);
        assert_eq!(
            config
                .ledger(pell_relayer_types::LedgerKind::Dvs)
                .ws_endpoint
                .scheme(),
            "wss"
        );
        Ok(())
    }

    #[test]
    fn rejects_http_ws_endpoint() {
        let mut config = PellRelayerConfig::default();
        config.ledger.ws_endpoint = "http://127.0.0.1:8545".parse().unwrap();
        assert!(matches!(
            postloading_process(config),
            Err(pell_relayer_utils::Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_empty_correlation_window() {
        let mut config = PellRelayerConfig::default();
        config.relay.correlation_window = 0;
        assert!(postloading_process(config).is_err());
    }
}

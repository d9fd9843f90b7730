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

use crate::PellRelayerConfig;
use anyhow::Context;
use directories_next::ProjectDirs;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// Package identifier, where the default configuration is defined.
/// If the user does not start the relayer with the `--config-dir`
/// it will default to read from the default location depending on the OS.
pub const PACKAGE_ID: [&str; 3] = ["network", "pell", "pell-relayer"];

/// The Pell Relayer Command-line tool
///
/// Start the relayer from a config directory:
///
/// $ pell-relayer -vvv -c <CONFIG_DIR_PATH>
#[derive(StructOpt)]
#[structopt(name = "Pell Relayer")]
pub struct Opts {
    /// A level of verbosity, and can be used multiple times
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: i32,
    /// Directory that contains configration files.
    #[structopt(
        short = "c",
        long = "config-dir",
        value_name = "PATH",
        parse(from_os_str)
    )]
    pub config_dir: Option<PathBuf>,
    /// Overrides the port of the status server.
    #[structopt(long)]
    pub port: Option<u16>,
    /// Print logs as json lines instead of the pretty format.
    #[structopt(long)]
    pub json_logs: bool,
}

/// Loads the configuration from the given directory.
///
/// Without a directory the OS default config dir is used, and when that one
/// does not exist either the built-in devnet defaults are returned.
pub fn load_config<P>(
    config_dir: Option<P>,
) -> Result<PellRelayerConfig, anyhow::Error>
where
    P: AsRef<Path>,
{
    let path = match config_dir {
        Some(p) => {
            let path = p.as_ref().to_path_buf();
            // return an error if the path is not a directory.
            if !path.is_dir() {
                return Err(anyhow::anyhow!(
                    "{} is not a directory",
                    path.display()
                ));
            }
            path
        }
        None => {
            tracing::debug!("Getting default dirs for pell relayer");
            let dirs = ProjectDirs::from(
                PACKAGE_ID[0],
                PACKAGE_ID[1],
                PACKAGE_ID[2],
            )
            .context("failed to get config")?;
            let path = dirs.config_dir().to_path_buf();
            if !path.is_dir() {
                tracing::info!(
                    "No config found at {}, using devnet defaults",
                    path.display()
                );
                let config = crate::utils::postloading_process(
                    PellRelayerConfig::default(),
                )?;
                return Ok(config);
            }
            path
        }
    };
    tracing::trace!("Loading Config from {} ..", path.display());
    let v = crate::utils::load(path)?;
    tracing::trace!("Config loaded..");
    Ok(v)
}

/// Sets up the logger for the relayer, based on the verbosity level passed in.
///
/// Every workspace crate logs under a `pell_` target, so the verbosity only
/// applies to those; other crates stay at the `RUST_LOG` level.
pub fn setup_logger(verbosity: i32, json: bool) -> anyhow::Result<()> {
    use tracing::Level;
    let log_level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in [
        "pell_relayer",
        "pell_ew_evm",
        "pell_event_watcher_traits",
        "pell_ledger_client",
        "pell_signing_backends",
        pell_relayer_utils::probe::TARGET,
    ] {
        env_filter =
            env_filter.add_directive(format!("{target}={log_level}").parse()?);
    }
    let logger = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(log_level)
        .with_env_filter(env_filter);
    if json {
        logger
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .init();
    } else {
        logger.pretty().init();
    }
    Ok(())
}

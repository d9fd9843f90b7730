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

//! Pell Relayer Binary.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use pell_relayer::service::{build_axum_services, ignite};
use tokio::signal::unix;

use pell_relayer_config::cli::{load_config, setup_logger, Opts};
use pell_relayer_context::RelayerContext;
use pell_relayer_utils::probe;

/// The main entry point for the relayer.
///
/// # Arguments
///
/// * `args` - The command line arguments.
#[paw::main]
#[tokio::main]
async fn main(args: Opts) -> anyhow::Result<()> {
    let dotenv = dotenv::dotenv();
    setup_logger(args.verbose, args.json_logs)?;
    match dotenv {
        Ok(_) => {
            tracing::trace!("Loaded .env file");
        }
        Err(e) => {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    // The configuration is validated and configured from the given directory
    let mut config = load_config(args.config_dir.clone())?;
    if let Some(port) = args.port {
        config.port = port;
    }

    // The RelayerContext holds the configuration, the shutdown signal, the
    // readiness state and the metrics for the lifetime of the relayer.
    let ctx = RelayerContext::new(config)?;

    // the status server reports `initializing` until ignite is done.
    let server_handle = tokio::spawn(build_axum_services(ctx.clone()));

    // start all background services.
    // this does not block, will fire the services on background tasks.
    let services = match ignite(&ctx).await {
        Ok(services) => services,
        Err(e) => {
            tracing::error!("Failed to start the relayer: {}", e);
            ctx.shutdown();
            let _ = server_handle.await;
            return Err(e.into());
        }
    };
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        started = true
    );

    // watch for signals, and for the health monitors giving up.
    let mut ctrlc_signal = unix::signal(unix::SignalKind::interrupt())?;
    let mut termination_signal = unix::signal(unix::SignalKind::terminate())?;
    let mut quit_signal = unix::signal(unix::SignalKind::quit())?;
    let mut connection_lost = ctx.shutdown_signal();
    let lost = tokio::select! {
        _ = ctrlc_signal.recv() => {
            tracing::warn!("Interrupted (Ctrl+C) ...");
            false
        },
        _ = termination_signal.recv() => {
            tracing::warn!("Got Terminate signal ...");
            false
        },
        _ = quit_signal.recv() => {
            tracing::warn!("Quitting ...");
            false
        },
        _ = connection_lost.recv() => true,
    };

    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        shutdown = true
    );
    tracing::warn!("Shutting down...");
    // send shutdown signal to all of the application.
    ctx.shutdown();
    services.join().await;
    match server_handle.await {
        Ok(Err(e)) => tracing::error!("Status server failed: {}", e),
        Err(e) => tracing::error!("Status server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    if lost {
        let status = ctx.readiness().snapshot();
        anyhow::bail!(status.message);
    }
    tracing::info!("Clean Exit ..");
    Ok(())
}

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
use std::time::Duration;

use ethers::abi::{encode, Token};
use ethers::contract::{EthEvent, LogMeta};
use ethers::types::{Address, H256, U256, U64};
use parking_lot::Mutex;
use pell_ledger_client::mock::{mined_log, MockLedger};
use pell_ledger_client::LedgerClient;
use pell_relayer_config::PellRelayerConfig;
use pell_relayer_context::{RelayerContext, Shutdown};
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::{Error, Result};

use crate::{
    Composite, ContractEventWatcher, Correlation, Correlator, EventHandler,
    EventWatcher, WatcherInfo, WatcherState,
};

#[derive(Debug, Clone, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Ping", abi = "Ping(uint256)")]
struct Ping {
    value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Pong", abi = "Pong(uint256)")]
struct Pong {
    value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, EthEvent)]
#[ethevent(name = "Pang", abi = "Pang(uint256)")]
struct Pang {
    value: U256,
}

const CONTRACT: Address = Address::repeat_byte(0x11);

fn log_of<E: EthEvent>(value: u64, block: u64, tx: H256) -> ethers::types::Log {
    mined_log(
        CONTRACT,
        vec![E::signature()],
        encode(&[Token::Uint(U256::from(value))]),
        block,
        tx,
    )
}

fn info() -> WatcherInfo {
    WatcherInfo {
        source: LedgerKind::Pell,
        contract: "PingEmitter",
        address: CONTRACT,
        event: "Ping",
        targets: vec![],
    }
}

/// Records when each event starts and finishes, sleeping on the first.
#[derive(Default)]
struct RecordingHandler {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl EventHandler for RecordingHandler {
    type Event = Ping;

    async fn handle_event(
        &self,
        (event, _log): (Self::Event, LogMeta),
        _shutdown: Shutdown,
    ) -> Result<()> {
        self.seen.lock().push(format!("start {}", event.value));
        if event.value == U256::one() {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.seen.lock().push(format!("end {}", event.value));
        if event.value == U256::from(3) {
            return Err(Error::Generic("three is not welcome"));
        }
        Ok(())
    }
}

type Fixture = (
    RelayerContext,
    MockLedger,
    Arc<Mutex<Vec<String>>>,
    ContractEventWatcher<RecordingHandler>,
);

fn setup() -> Fixture {
    let ctx = RelayerContext::new(PellRelayerConfig::default()).unwrap();
    let mock = MockLedger::new(1337);
    let handler = RecordingHandler::default();
    let seen = handler.seen.clone();
    let watcher = ContractEventWatcher::new(
        &ctx,
        info(),
        Arc::new(mock.clone()),
        handler,
    );
    (ctx, mock, seen, watcher)
}

async fn wait_for(seen: &Mutex<Vec<String>>, len: usize) {
    while seen.lock().len() < len {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn events_are_handled_one_at_a_time() -> Result<()> {
    let (ctx, mock, seen, mut watcher) = setup();
    watcher.init().await?;
    assert_eq!(watcher.state(), WatcherState::Subscribed);
    let handle = watcher.listen(ctx.shutdown_signal())?;
    assert_eq!(watcher.state(), WatcherState::Running);

    mock.emit(log_of::<Ping>(1, 10, H256::repeat_byte(1)));
    mock.emit(log_of::<Ping>(2, 11, H256::repeat_byte(2)));
    wait_for(&seen, 4).await;
    assert_eq!(*seen.lock(), ["start 1", "end 1", "start 2", "end 2"]);

    ctx.shutdown();
    assert_eq!(handle.await.unwrap(), WatcherState::Stopped);
    assert_eq!(watcher.state(), WatcherState::Stopped);
    assert_eq!(mock.active_subscriptions(), 0);
    assert_eq!(
        ctx.metrics.events_handled.with_label_values(&["Ping"]).get(),
        2
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn handler_errors_do_not_stop_the_watcher() -> Result<()> {
    let (ctx, mock, seen, mut watcher) = setup();
    watcher.init().await?;
    let handle = watcher.listen(ctx.shutdown_signal())?;

    mock.emit(log_of::<Ping>(3, 10, H256::repeat_byte(3)));
    mock.emit(log_of::<Ping>(4, 11, H256::repeat_byte(4)));
    wait_for(&seen, 4).await;
    assert_eq!(
        ctx.metrics.events_failed.with_label_values(&["Ping"]).get(),
        1
    );
    assert_eq!(watcher.state(), WatcherState::Running);

    ctx.shutdown();
    assert_eq!(handle.await.unwrap(), WatcherState::Stopped);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn transient_subscription_errors_are_survived() -> Result<()> {
    let (ctx, mock, seen, mut watcher) = setup();
    watcher.init().await?;
    let handle = watcher.listen(ctx.shutdown_signal())?;

    mock.fail_subscriptions("connection reset");
    mock.emit(log_of::<Ping>(2, 10, H256::repeat_byte(2)));
    wait_for(&seen, 2).await;
    assert_eq!(watcher.state(), WatcherState::Running);
    assert_eq!(mock.active_subscriptions(), 1);

    ctx.shutdown();
    assert_eq!(handle.await.unwrap(), WatcherState::Stopped);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn undecodable_logs_fault_the_watcher() -> Result<()> {
    let (ctx, mock, seen, mut watcher) = setup();
    watcher.init().await?;
    let handle = watcher.listen(ctx.shutdown_signal())?;

    mock.emit(mined_log(
        CONTRACT,
        vec![Ping::signature()],
        vec![0u8; 3],
        10,
        H256::repeat_byte(9),
    ));
    assert_eq!(handle.await.unwrap(), WatcherState::Faulted);
    assert_eq!(watcher.state(), WatcherState::Faulted);
    assert!(seen.lock().is_empty());
    assert_eq!(mock.active_subscriptions(), 0);
    Ok(())
}

#[tokio::test]
async fn listen_requires_init() {
    let (ctx, _mock, _seen, mut watcher) = setup();
    let err = watcher.listen(ctx.shutdown_signal()).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidWatcherState { action: "listen", .. }
    ));
    assert_eq!(watcher.state(), WatcherState::Created);
}

#[tokio::test]
async fn init_runs_once() -> Result<()> {
    let (_ctx, _mock, _seen, mut watcher) = setup();
    watcher.init().await?;
    assert!(watcher.init().await.is_err());
    Ok(())
}

#[test]
fn filter_selects_contract_and_signature() -> Result<()> {
    let (_ctx, _mock, _seen, watcher) = setup();
    let filter = watcher.subscription_filter();
    assert_eq!(
        filter.address,
        Some(ethers::types::ValueOrArray::Value(CONTRACT))
    );
    assert_eq!(
        filter.topics[0],
        Some(ethers::types::ValueOrArray::Value(Some(Ping::signature())))
    );
    Ok(())
}

/// Three parts, all required.
#[derive(Debug, Default)]
struct Triple {
    ping: Option<U256>,
    pong: Option<U256>,
    pang: Option<U256>,
}

impl Composite for Triple {
    type Output = (U256, U256, U256);

    fn assemble(self) -> Option<Self::Output> {
        Some((self.ping?, self.pong?, self.pang?))
    }
}

async fn correlate(
    mock: &MockLedger,
    anchor_tx: H256,
    anchor_block: u64,
) -> Result<Correlation<(U256, U256, U256)>> {
    let client: Arc<dyn LedgerClient> = Arc::new(mock.clone());
    let correlator = Correlator::new(client, 1000);
    let mut scan = correlator.begin::<Triple>(anchor_tx, U64::from(anchor_block));
    correlator
        .collect(&mut scan, CONTRACT, |r: &mut Triple, e: Ping, _| {
            r.ping = Some(e.value)
        })
        .await?;
    correlator
        .collect(&mut scan, CONTRACT, |r: &mut Triple, e: Pong, _| {
            r.pong = Some(e.value)
        })
        .await?;
    correlator
        .collect(&mut scan, CONTRACT, |r: &mut Triple, e: Pang, _| {
            r.pang = Some(e.value)
        })
        .await?;
    Ok(scan.finish())
}

#[tokio::test]
async fn all_three_parts_complete_the_record() -> Result<()> {
    let mock = MockLedger::new(1337);
    let tx = H256::repeat_byte(0xaa);
    mock.push_log(log_of::<Ping>(1, 100, tx));
    mock.push_log(log_of::<Pong>(2, 100, tx));
    mock.push_log(log_of::<Pang>(3, 104, tx));

    let outcome = correlate(&mock, tx, 100).await?;
    assert_eq!(
        outcome,
        Correlation::Complete((U256::from(1), U256::from(2), U256::from(3)))
    );
    Ok(())
}

#[tokio::test]
async fn a_missing_part_is_not_found() -> Result<()> {
    let mock = MockLedger::new(1337);
    let tx = H256::repeat_byte(0xaa);
    mock.push_log(log_of::<Ping>(1, 100, tx));
    mock.push_log(log_of::<Pong>(2, 100, tx));
    // outside of the window
    mock.push_log(log_of::<Pang>(3, 1101, tx));

    assert_eq!(correlate(&mock, tx, 100).await?, Correlation::NotFound);
    Ok(())
}

#[tokio::test]
async fn only_the_anchor_transaction_is_selected() -> Result<()> {
    let mock = MockLedger::new(1337);
    let anchor = H256::repeat_byte(0xaa);
    let decoy = H256::repeat_byte(0xbb);
    for (tx, base) in [(decoy, 10), (anchor, 20)] {
        mock.push_log(log_of::<Ping>(base + 1, 100, tx));
        mock.push_log(log_of::<Pong>(base + 2, 101, tx));
        mock.push_log(log_of::<Pang>(base + 3, 102, tx));
    }

    let outcome = correlate(&mock, anchor, 100).await?;
    assert_eq!(
        outcome,
        Correlation::Complete((U256::from(21), U256::from(22), U256::from(23)))
    );
    Ok(())
}

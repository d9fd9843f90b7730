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

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ethers::abi::{encode, AbiDecode, AbiEncode, Token};
use ethers::contract::EthEvent;
use ethers::types::{Address, H256, U256};
use pell_event_watcher_traits::WatcherState;
use pell_ledger_client::mock::{mined_log, MockLedger};
use pell_ledger_client::{Ledger, Ledgers};
use pell_relayer_config::contracts::ContractAddresses;
use pell_relayer_config::PellRelayerConfig;
use pell_relayer_context::RelayerContext;
use pell_relayer_tx_queue::TxSubmitter;
use pell_relayer_types::LedgerKind;
use pell_relayer_utils::Result;

use crate::bindings::*;
use crate::{build_watchers, resolve_contracts, update_connectors, ResolvedContracts};

struct Network {
    ctx: RelayerContext,
    ledgers: Ledgers,
    pell: MockLedger,
    staking: MockLedger,
    service: MockLedger,
    dvs: MockLedger,
}

impl Network {
    fn new() -> Self {
        let ctx = RelayerContext::new(PellRelayerConfig::default()).unwrap();
        let pell = MockLedger::new(1337);
        let staking = MockLedger::new(17000);
        let service = MockLedger::new(1338);
        let dvs = MockLedger::new(1339);
        let ledgers = [
            (LedgerKind::Pell, &pell),
            (LedgerKind::Staking, &staking),
            (LedgerKind::Service, &service),
            (LedgerKind::Dvs, &dvs),
        ]
        .into_iter()
        .map(|(kind, mock)| Ledger {
            kind,
            chain_id: U256::from(match kind {
                LedgerKind::Pell => 1337u64,
                LedgerKind::Staking => 17000,
                LedgerKind::Service => 1338,
                LedgerKind::Dvs => 1339,
            }),
            rpc: Arc::new(mock.clone()),
            ws: Arc::new(mock.clone()),
            ws_endpoint: format!("ws://{kind}"),
            explorer: None,
        })
        .collect();
        Self {
            ctx,
            ledgers,
            pell,
            staking,
            service,
            dvs,
        }
    }

    fn submitter(&self) -> TxSubmitter {
        TxSubmitter::from_context(&self.ctx, &self.ledgers, self.ctx.signer().unwrap())
    }
}

fn resolved() -> ResolvedContracts {
    ResolvedContracts {
        configured: ContractAddresses::default(),
        pell_stake_registry_router: Address::repeat_byte(0x5e),
        pell_strategy_manager: Address::repeat_byte(0x5f),
    }
}

#[tokio::test(start_paused = true)]
async fn operator_registration_reaches_the_staking_ledger() -> Result<()> {
    let net = Network::new();
    let submitter = net.submitter();
    let contracts = resolved();
    let mut watchers = build_watchers(&net.ctx, &net.ledgers, &submitter, &contracts)?;
    let watcher = watchers
        .iter_mut()
        .find(|w| w.info().event == "OperatorRegistered")
        .expect("operator registration is watched");
    watcher.init().await?;
    let handle = watcher.listen(net.ctx.shutdown_signal())?;

    let operator = Address::repeat_byte(0x0a);
    let approver = Address::repeat_byte(0x0b);
    net.pell.emit(mined_log(
        contracts.configured.pell_delegation_manager,
        vec![OperatorRegisteredFilter::signature(), H256::from(operator)],
        encode(&[Token::Tuple(vec![
            Token::Address(approver),
            Token::Uint(U256::from(50_400u32)),
        ])]),
        42,
        H256::repeat_byte(0x42),
    ));

    while net.staking.submitted().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let sent = net.staking.submitted();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0].tx;
    assert_eq!(
        tx.to().and_then(|to| to.as_address()).copied(),
        Some(contracts.configured.staking_delegation_manager)
    );
    assert_eq!(tx.from().copied(), Some(submitter.address()));
    let call = SyncRegisterAsOperatorCall::decode(tx.data().unwrap())?;
    assert_eq!(call.operator, operator);
    assert_eq!(call.registering_operator_details.delegation_approver, approver);
    assert_eq!(call.registering_operator_details.staker_opt_out_window, 50_400);
    assert!(net.pell.submitted().is_empty());

    net.ctx.shutdown();
    assert_eq!(handle.await.unwrap(), WatcherState::Stopped);
    assert_eq!(net.pell.active_subscriptions(), 0);
    Ok(())
}

#[tokio::test]
async fn every_event_kind_gets_one_watcher() -> Result<()> {
    let net = Network::new();
    let watchers =
        build_watchers(&net.ctx, &net.ledgers, &net.submitter(), &resolved())?;
    assert_eq!(watchers.len(), 12);
    let distinct: HashSet<_> = watchers
        .iter()
        .map(|w| (w.info().address, w.info().event))
        .collect();
    assert_eq!(distinct.len(), 12);
    assert!(watchers.iter().all(|w| w.state() == WatcherState::Created));
    let dvs: Vec<_> = watchers
        .iter()
        .filter(|w| w.info().source == LedgerKind::Dvs)
        .collect();
    assert_eq!(dvs.len(), 1);
    assert_eq!(dvs[0].info().event, "RegisterCentralSchedulerToPell");
    Ok(())
}

#[tokio::test]
async fn derived_addresses_are_read_from_the_pell_ledger() -> Result<()> {
    let net = Network::new();
    let configured = ContractAddresses::default();
    let router = Address::repeat_byte(0x71);
    let strategy_manager = Address::repeat_byte(0x72);
    net.pell.set_call_result(
        configured.pell_registry_router,
        StakeRegistryRouterCall.encode().into(),
        encode(&[Token::Address(router)]).into(),
    );
    net.pell.set_call_result(
        configured.pell_delegation_manager,
        StrategyManagerCall.encode().into(),
        encode(&[Token::Address(strategy_manager)]).into(),
    );

    let resolved = resolve_contracts(&net.ledgers, &configured).await?;
    assert_eq!(resolved.pell_stake_registry_router, router);
    assert_eq!(resolved.pell_strategy_manager, strategy_manager);

    // configured values win over the contracts.
    let pinned = ContractAddresses {
        pell_strategy_manager: Some(Address::repeat_byte(0x99)),
        ..configured
    };
    let resolved = resolve_contracts(&net.ledgers, &pinned).await?;
    assert_eq!(resolved.pell_strategy_manager, Address::repeat_byte(0x99));
    Ok(())
}

#[tokio::test]
async fn unresolvable_addresses_fail_startup() {
    let net = Network::new();
    let result =
        resolve_contracts(&net.ledgers, &ContractAddresses::default()).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn connectors_are_updated_on_every_destination() -> Result<()> {
    let net = Network::new();
    let submitter = net.submitter();
    let contracts = ContractAddresses::default();
    update_connectors(&submitter, &contracts, net.ctx.shutdown_signal()).await?;

    for (mock, to) in [
        (&net.dvs, contracts.dvs_central_scheduler),
        (&net.service, contracts.service_omni_operator_shares_manager),
        (&net.staking, contracts.staking_delegation_manager),
    ] {
        let sent = mock.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tx.to().and_then(|t| t.as_address()).copied(), Some(to));
        let call = UpdateConnectorCall::decode(sent[0].tx.data().unwrap())?;
        assert_eq!(call.connector, submitter.address());
    }
    assert!(net.pell.submitted().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn a_failed_connector_update_stops_the_rest() {
    let net = Network::new();
    net.service.set_execution_failing(true);
    let result = update_connectors(
        &net.submitter(),
        &ContractAddresses::default(),
        net.ctx.shutdown_signal(),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(net.dvs.submitted().len(), 1);
    assert!(net.staking.submitted().is_empty());
}

fn central_scheduler_log(interactor: Address, block: u64, tx: H256) -> ethers::types::Log {
    mined_log(
        interactor,
        vec![RegisterCentralSchedulerToPellFilter::signature()],
        encode(&[
            Token::Address(Address::repeat_byte(0x0c)),
            Token::Tuple(vec![
                Token::Bytes(vec![0xab; 65]),
                Token::FixedBytes(vec![0x5a; 32]),
                Token::Uint(U256::from(1_900_000_000u64)),
            ]),
        ]),
        block,
        tx,
    )
}

fn manager_log<E: EthEvent>(
    interactor: Address,
    manager: Address,
    block: u64,
    tx: H256,
) -> ethers::types::Log {
    mined_log(
        interactor,
        vec![E::signature()],
        encode(&[Token::Address(manager)]),
        block,
        tx,
    )
}

#[tokio::test(start_paused = true)]
async fn a_complete_registration_is_added_on_the_pell_ledger() -> Result<()> {
    let net = Network::new();
    let contracts = resolved();
    let interactor = contracts.configured.pell_registry_interactor;
    let mut watchers =
        build_watchers(&net.ctx, &net.ledgers, &net.submitter(), &contracts)?;
    let watcher = watchers
        .iter_mut()
        .find(|w| w.info().event == "RegisterCentralSchedulerToPell")
        .expect("dvs registration is watched");
    watcher.init().await?;
    let handle = watcher.listen(net.ctx.shutdown_signal())?;

    let tx = H256::repeat_byte(0x77);
    net.dvs.push_log(manager_log::<RegisterStakeManagerToPellFilter>(
        interactor,
        Address::repeat_byte(0x05),
        90,
        tx,
    ));
    net.dvs.push_log(manager_log::<RegisterEjectionManagerToPellFilter>(
        interactor,
        Address::repeat_byte(0x0e),
        90,
        tx,
    ));
    net.dvs.emit(central_scheduler_log(interactor, 90, tx));

    while net.pell.submitted().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let sent = net.pell.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].tx.to().and_then(|to| to.as_address()).copied(),
        Some(contracts.configured.pell_registry_router)
    );
    let call = AddSupportedChainCall::decode(sent[0].tx.data().unwrap())?;
    assert_eq!(
        call.dvs_info,
        DvsInfo {
            chain_id: U256::from(1339),
            central_scheduler: Address::repeat_byte(0x0c),
            ejection_manager: Address::repeat_byte(0x0e),
            stake_manager: Address::repeat_byte(0x05),
        }
    );
    assert_eq!(call.dvs_chain_approver_signature.salt, [0x5a; 32]);
    assert_eq!(net.ctx.metrics.correlation_misses.get(), 0);

    net.ctx.shutdown();
    assert_eq!(handle.await.unwrap(), WatcherState::Stopped);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn an_incomplete_registration_is_dropped() -> Result<()> {
    let net = Network::new();
    let contracts = resolved();
    let interactor = contracts.configured.pell_registry_interactor;
    let mut watchers =
        build_watchers(&net.ctx, &net.ledgers, &net.submitter(), &contracts)?;
    let watcher = watchers
        .iter_mut()
        .find(|w| w.info().event == "RegisterCentralSchedulerToPell")
        .expect("dvs registration is watched");
    watcher.init().await?;
    let handle = watcher.listen(net.ctx.shutdown_signal())?;

    // the ejection manager part only exists in another transaction.
    let tx = H256::repeat_byte(0x78);
    net.dvs.push_log(manager_log::<RegisterStakeManagerToPellFilter>(
        interactor,
        Address::repeat_byte(0x05),
        90,
        tx,
    ));
    net.dvs.push_log(manager_log::<RegisterEjectionManagerToPellFilter>(
        interactor,
        Address::repeat_byte(0x0e),
        91,
        H256::repeat_byte(0x79),
    ));
    net.dvs.emit(central_scheduler_log(interactor, 90, tx));

    while net.ctx.metrics.correlation_misses.get() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(net.ctx.metrics.correlation_misses.get(), 1);
    assert!(net.pell.submitted().is_empty());
    assert_eq!(watcher.state(), WatcherState::Running);

    net.ctx.shutdown();
    assert_eq!(handle.await.unwrap(), WatcherState::Stopped);
    Ok(())
}

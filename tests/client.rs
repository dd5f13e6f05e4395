use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ethnum::U256;
use futures_util::future::join_all;
use tron_sdk::troncrypt::{sha256, Address};
use tron_sdk::tronnet::testing::{MockChannel, MockDialer, MockService};
use tron_sdk::tronnet::{NetError, StatusCode};
use tron_sdk::tronabi::Abi;
use tron_sdk::tronstructs::{
    BlockExtention, BlockRef, CreateSmartContract, Message, ResourceCode, Return, Transaction,
    TransactionContract, TransactionExtention, TransactionInfo, TransferContract,
    TriggerSmartContract,
};
use tron_sdk::{
    recover_signers, Client, ClientConfig, Context, DeployRequest, LocalSigner, SdkError, Signer,
    Trc20, WALLET_SERVICE,
};

/// Full path of a wallet method, as carried on the wire.
fn wallet_method(name: &str) -> String {
    format!("/{}/{}", WALLET_SERVICE, name)
}

fn config(max_conns: usize) -> ClientConfig {
    ClientConfig {
        max_conns,
        ..ClientConfig::default()
    }
}

async fn client_with(dialer: Arc<MockDialer>, config: &ClientConfig) -> Client {
    Client::connect(config, dialer).await.unwrap()
}

fn decode<M: Message + Default>(bts: &[u8]) -> tron_sdk::tronnet::Result<M> {
    M::decode(bts).map_err(|e| NetError::Codec(e.to_string()))
}

fn ok() -> Return {
    Return {
        result: true,
        ..Default::default()
    }
}

/// Builds the transfer a node would return for a `CreateTransaction2` request.
fn node_transfer(request: &[u8]) -> tron_sdk::tronnet::Result<Vec<u8>> {
    let transfer: TransferContract = decode(request)?;
    let block = BlockRef {
        number: 42,
        hash: sha256(b"head"),
    };
    let tx = Transaction::assemble(TransactionContract::new(&transfer), &block, 1_700_000_000_000);
    let txid = tx.txid().map_err(|e| NetError::Codec(e.to_string()))?;
    Ok(TransactionExtention {
        transaction: Some(tx),
        txid: txid.to_vec(),
        result: Some(ok()),
        ..Default::default()
    }
    .encode_to_vec())
}

fn wallet_service() -> MockService {
    MockService::new()
        .route(&wallet_method("CreateTransaction2"), node_transfer)
        .route(&wallet_method("BroadcastTransaction"), |_| {
            Ok(ok().encode_to_vec())
        })
}

#[test]
fn pool_bounds_concurrent_calls() {
    let _ = env_logger::try_init();
    smol::block_on(async {
        let template = MockChannel::echo().with_delay(Duration::from_millis(30));
        let dialer = Arc::new(MockDialer::new(template));
        let client = client_with(dialer.clone(), &config(2)).await;
        let ctx = Context::background();
        let network = client.network();
        let results = join_all((0..6).map(|_| network.get_node_info(&ctx))).await;
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(dialer.peak_in_flight(), 2);
        assert!(dialer.dial_count() <= 2);
    })
}

#[test]
fn transfer_is_signed_and_broadcast() {
    smol::block_on(async {
        let dialer = Arc::new(MockDialer::new(MockChannel::new(wallet_service())));
        let client = client_with(dialer.clone(), &config(1)).await;
        let ctx = Context::background();
        let signer = LocalSigner::generate();
        let to = Address::from_evm([9u8; 20]);

        let ext = client
            .accounts()
            .create_transfer_transaction(&ctx, &signer.address(), &to, 1_000_000)
            .await
            .unwrap();
        let mut tx = ext.transaction.unwrap();
        assert_eq!(tx.txid().unwrap().to_vec(), ext.txid);
        let payload: TransferContract = tx.raw().unwrap().contract[0].payload().unwrap();
        assert_eq!(payload.amount, 1_000_000);

        signer.sign_tx(&ctx, &mut tx).await.unwrap();
        assert_eq!(recover_signers(&tx).unwrap(), vec![signer.address()]);
        let ret = client.network().broadcast_transaction(&ctx, &tx).await.unwrap();
        assert!(ret.result);
        assert_eq!(
            dialer.channels()[0].calls(),
            vec![
                wallet_method("CreateTransaction2"),
                wallet_method("BroadcastTransaction")
            ]
        );
    })
}

#[test]
fn mutation_after_signing_blocks_broadcast() {
    smol::block_on(async {
        let dialer = Arc::new(MockDialer::new(MockChannel::new(wallet_service())));
        let client = client_with(dialer.clone(), &config(1)).await;
        let ctx = Context::background();
        let signer = LocalSigner::generate();
        let mut tx = client
            .accounts()
            .create_transfer_transaction(&ctx, &signer.address(), &Address::from_evm([3u8; 20]), 5)
            .await
            .unwrap()
            .transaction
            .unwrap();
        signer.sign_tx(&ctx, &mut tx).await.unwrap();
        let before = tx.txid().unwrap();

        tx.set_fee_limit(150_000_000).unwrap();
        assert_ne!(tx.txid().unwrap(), before);
        assert!(tx.signature.is_empty());

        let res = client.network().broadcast_transaction(&ctx, &tx).await;
        assert!(matches!(res, Err(SdkError::State(_))));
        assert!(!dialer.channels()[0]
            .calls()
            .contains(&wallet_method("BroadcastTransaction")));
    })
}

#[test]
fn false_result_is_rejected() {
    smol::block_on(async {
        let service = MockService::new().route(&wallet_method("CreateTransaction2"), |_| {
            Ok(TransactionExtention {
                result: Some(Return {
                    result: false,
                    code: 2,
                    message: b"balance is not sufficient".to_vec(),
                }),
                ..Default::default()
            }
            .encode_to_vec())
        });
        let dialer = Arc::new(MockDialer::new(MockChannel::new(service)));
        let client = client_with(dialer, &config(1)).await;
        let res = client
            .accounts()
            .create_transfer_transaction(
                &Context::background(),
                &Address::from_evm([1u8; 20]),
                &Address::from_evm([2u8; 20]),
                10,
            )
            .await;
        match res {
            Err(SdkError::Rejected { op, message }) => {
                assert_eq!(op, "create_transaction");
                assert_eq!(message, "balance is not sufficient");
            }
            other => panic!("expected a rejection, got {:?}", other.map(|_| ())),
        }
    })
}

#[test]
fn invalid_arguments_never_reach_the_node() {
    smol::block_on(async {
        let dialer = Arc::new(MockDialer::new(MockChannel::new(wallet_service())));
        let client = client_with(dialer.clone(), &config(1)).await;
        let ctx = Context::background();
        let a = Address::from_evm([1u8; 20]);
        let accounts = client.accounts();
        assert!(matches!(
            accounts.create_transfer_transaction(&ctx, &a, &a, 10).await,
            Err(SdkError::Validation { .. })
        ));
        assert!(matches!(
            accounts
                .create_transfer_transaction(&ctx, &a, &Address::from_evm([2u8; 20]), 0)
                .await,
            Err(SdkError::Validation { .. })
        ));
        assert!(matches!(
            client.network().get_transaction_by_id(&ctx, "abc").await,
            Err(SdkError::Validation { .. })
        ));
        assert!(dialer.channels()[0].calls().is_empty());
    })
}

#[test]
fn caller_deadline_and_default_timeout() {
    smol::block_on(async {
        let template = MockChannel::echo().with_delay(Duration::from_millis(300));
        let dialer = Arc::new(MockDialer::new(template));

        let client = client_with(dialer.clone(), &config(1)).await;
        let ctx = Context::with_timeout(Duration::from_millis(20));
        let err = client.network().get_node_info(&ctx).await.unwrap_err();
        assert!(err.is_deadline_exceeded());

        let short = ClientConfig {
            timeout: Duration::from_millis(20),
            ..config(1)
        };
        let client = client_with(dialer, &short).await;
        let err = client
            .network()
            .get_node_info(&Context::background())
            .await
            .unwrap_err();
        assert!(err.is_deadline_exceeded());
    })
}

#[test]
fn cancellation_abandons_calls() {
    smol::block_on(async {
        let template = MockChannel::echo().with_delay(Duration::from_millis(300));
        let client = client_with(Arc::new(MockDialer::new(template)), &config(1)).await;
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let err = client.network().get_node_info(&ctx).await.unwrap_err();
        assert!(err.is_canceled());
    })
}

#[test]
fn remote_errors_carry_the_operation() {
    smol::block_on(async {
        let client = client_with(
            Arc::new(MockDialer::new(MockChannel::new(MockService::new()))),
            &config(1),
        )
        .await;
        match client.network().list_nodes(&Context::background()).await {
            Err(SdkError::Transport {
                op,
                source: NetError::Status { code, .. },
            }) => {
                assert_eq!(op, "list_nodes");
                assert_eq!(code, StatusCode::Unimplemented);
            }
            other => panic!("expected a transport error, got {:?}", other.map(|_| ())),
        }
    })
}

#[test]
fn missing_block_is_not_found() {
    smol::block_on(async {
        let service = MockService::new()
            .route(&wallet_method("GetBlockByNum2"), |_| {
                Ok(BlockExtention::default().encode_to_vec())
            })
            .route(&wallet_method("GetTransactionInfoById"), |_| {
                Ok(TransactionInfo::default().encode_to_vec())
            });
        let client = client_with(Arc::new(MockDialer::new(MockChannel::new(service))), &config(1)).await;
        let ctx = Context::background();
        let network = client.network();
        assert!(matches!(
            network.get_block_by_number(&ctx, 1_000_000_000).await,
            Err(SdkError::NotFound(_))
        ));
        let id = "ab".repeat(32);
        let info = network.get_transaction_info_by_id(&ctx, &id).await.unwrap();
        assert!(!info.is_confirmed());
    })
}

#[test]
fn waits_until_confirmed() {
    smol::block_on(async {
        let polls = Arc::new(AtomicUsize::new(0));
        let service = {
            let polls = polls.clone();
            MockService::new().route(&wallet_method("GetTransactionInfoById"), move |req| {
                let id: tron_sdk::tronstructs::BytesMessage = decode(req)?;
                let info = if polls.fetch_add(1, Ordering::SeqCst) < 2 {
                    TransactionInfo::default()
                } else {
                    TransactionInfo {
                        id: id.value,
                        block_number: 77,
                        ..Default::default()
                    }
                };
                Ok(info.encode_to_vec())
            })
        };
        let client = client_with(Arc::new(MockDialer::new(MockChannel::new(service))), &config(1)).await;
        let ctx = Context::background();
        let id = format!("0x{}", "cd".repeat(32));
        let network = client.network();

        let res = network
            .wait_for_transaction_info_every(&ctx, &id, 2, Duration::from_millis(5))
            .await;
        assert!(matches!(res, Err(SdkError::NotFound(_))));

        polls.store(0, Ordering::SeqCst);
        let info = network
            .wait_for_transaction_info_every(&ctx, &id, 3, Duration::from_millis(5))
            .await
            .unwrap();
        assert_eq!(info.block_number, 77);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    })
}

#[test]
fn trc20_balance_reads_through_constant_call() {
    smol::block_on(async {
        let token = Address::from_evm([0xAA; 20]);
        let holder = Address::from_evm([0xBB; 20]);
        let expected_caller = token.as_bytes().to_vec();
        let service = MockService::new().route(
            &wallet_method("TriggerConstantContract"),
            move |req| {
                let call: TriggerSmartContract = decode(req)?;
                assert_eq!(call.owner_address, expected_caller);
                assert_eq!(call.data[..4], [0x70, 0xa0, 0x82, 0x31]);
                let mut word = vec![0u8; 32];
                word[30..].copy_from_slice(&1234u16.to_be_bytes());
                Ok(TransactionExtention {
                    constant_result: vec![word],
                    result: Some(ok()),
                    ..Default::default()
                }
                .encode_to_vec())
            },
        );
        let client = client_with(Arc::new(MockDialer::new(MockChannel::new(service))), &config(1)).await;
        let trc20 = Trc20::new(client, token);
        let balance = trc20
            .balance_of(&Context::background(), &holder)
            .await
            .unwrap();
        assert_eq!(balance, U256::new(1234));
    })
}

#[test]
fn deployment_carries_fee_limit_and_constructor() {
    smol::block_on(async {
        let service = MockService::new().route(&wallet_method("DeployContract"), |req| {
            let create: CreateSmartContract = decode(req)?;
            let block = BlockRef {
                number: 7,
                hash: sha256(b"deploy"),
            };
            let tx = Transaction::assemble(TransactionContract::new(&create), &block, 1_700_000_000_000);
            Ok(TransactionExtention {
                transaction: Some(tx),
                result: Some(ok()),
                ..Default::default()
            }
            .encode_to_vec())
        });
        let client = client_with(Arc::new(MockDialer::new(MockChannel::new(service))), &config(1)).await;
        let abi = Abi::from_json(
            r#"[{"type":"constructor","inputs":[{"name":"supply","type":"uint256"}]}]"#,
        )
        .unwrap();
        let req = DeployRequest {
            owner: Address::from_evm([5u8; 20]),
            name: "Token".into(),
            abi,
            bytecode: vec![0x60, 0x80],
            constructor_args: vec![U256::new(1000).into()],
            call_value: 0,
            consume_user_resource_percent: 100,
            origin_energy_limit: 10_000_000,
            fee_limit: 1_000_000_000,
        };
        let ext = client
            .contracts()
            .deploy_contract(&Context::background(), &req)
            .await
            .unwrap();
        let tx = ext.transaction.unwrap();
        let raw = tx.raw().unwrap();
        assert_eq!(raw.fee_limit, 1_000_000_000);
        assert_eq!(ext.txid, tx.txid().unwrap().to_vec());

        let create: CreateSmartContract = raw.contract[0].payload().unwrap();
        let bytecode = create.new_contract.unwrap().bytecode;
        assert_eq!(bytecode.len(), 2 + 32);
        assert_eq!(&bytecode[32..], &1000u16.to_be_bytes());
    })
}

#[test]
fn delegation_arguments_are_checked() {
    smol::block_on(async {
        let dialer = Arc::new(MockDialer::new(MockChannel::new(MockService::new())));
        let client = client_with(dialer.clone(), &config(1)).await;
        let ctx = Context::background();
        let owner = Address::from_evm([1u8; 20]);
        let receiver = Address::from_evm([2u8; 20]);
        let resources = client.resources();
        assert!(matches!(
            resources
                .create_delegate_resource_transaction(&ctx, &owner, &owner, 10, ResourceCode::Energy, false, 0)
                .await,
            Err(SdkError::Validation { .. })
        ));
        assert!(matches!(
            resources
                .create_delegate_resource_transaction(
                    &ctx,
                    &owner,
                    &receiver,
                    10,
                    ResourceCode::TronPower,
                    false,
                    0
                )
                .await,
            Err(SdkError::Validation { .. })
        ));
        assert!(dialer.channels()[0].calls().is_empty());
    })
}

#[test]
fn reverted_call_surfaces_its_reason() {
    use tron_sdk::tronabi::{encode, selector_of, ParamType, Value};
    use tron_sdk::tronstructs::{ContractResult, TransactionResult};
    smol::block_on(async {
        let service = MockService::new().route(&wallet_method("TriggerConstantContract"), |_| {
            let mut reason = selector_of("Error(string)").to_vec();
            reason.extend(
                encode(&[ParamType::String], &[Value::String("paused".into())])
                    .map_err(|e| NetError::Codec(e.to_string()))?,
            );
            // a reverted constant call still comes back with a successful envelope
            Ok(TransactionExtention {
                transaction: Some(Transaction {
                    ret: vec![TransactionResult {
                        contract_ret: ContractResult::Revert as i32,
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                constant_result: vec![reason],
                result: Some(ok()),
                ..Default::default()
            }
            .encode_to_vec())
        });
        let client = client_with(Arc::new(MockDialer::new(MockChannel::new(service))), &config(1)).await;
        let trc20 = Trc20::new(client, Address::from_evm([0xAA; 20]));
        match trc20
            .balance_of(&Context::background(), &Address::from_evm([0xBB; 20]))
            .await
        {
            Err(SdkError::Rejected { op, message }) => {
                assert_eq!(op, "call");
                assert_eq!(message, "execution reverted: paused");
            }
            other => panic!("expected a rejection, got {:?}", other),
        }
    })
}

#[test]
fn connects_through_a_supplied_dialer() {
    use smol::net::TcpListener;
    use tron_sdk::tronnet::{FramedDialer, FramedServer};
    use tron_sdk::tronstructs::NodeInfo;
    smol::block_on(async {
        let mut server = FramedServer::new();
        server.register(&wallet_method("GetNodeInfo"), |_| async move {
            Ok(NodeInfo {
                block: "Num:9".into(),
                ..Default::default()
            }
            .encode_to_vec())
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = smol::spawn(server.run(listener));

        let config = ClientConfig::new(&format!("grpc://127.0.0.1:{}", port)).unwrap();
        let client = Client::connect(&config, Arc::new(FramedDialer)).await.unwrap();
        let info = client
            .network()
            .get_node_info(&Context::background())
            .await
            .unwrap();
        assert_eq!(info.block, "Num:9");
        client.close();
    })
}

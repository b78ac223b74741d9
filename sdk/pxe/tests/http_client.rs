use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::{Value, json};
use shieldmint_pxe::{HttpPxeClient, MemoryPxe, Pxe, PxeError, TokenContract, WaitOpts};
use shieldmint_primitives::{AztecAddress, Fr, TxHash, TxStatus};

/// Helpers

const TX_HASH: &str = "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a";

#[derive(Default)]
struct Stub {
    requests: Mutex<Vec<Value>>,
    receipt_polls: AtomicUsize,
}

async fn rpc(State(stub): State<Arc<Stub>>, Json(req): Json<Value>) -> Json<Value> {
    stub.requests.lock().unwrap().push(req.clone());
    let id = req["id"].clone();
    let params = &req["params"];

    let outcome: Result<Value, (i64, &str)> = match req["method"].as_str().unwrap_or_default() {
        "pxe_getNodeInfo" => Ok(json!({ "nodeVersion": "0.1.0", "chainId": 31337, "protocolVersion": 1 })),
        "pxe_getRegisteredAccounts" => Ok(json!([{ "address": "0x01" }, { "address": "0x02" }])),
        "pxe_simulateCall" => Ok(json!("0x64")),
        "pxe_sendCall" => Ok(json!(TX_HASH)),
        "pxe_getTxReceipt" if params[0] == TX_HASH => {
            // pending once, then mined
            if stub.receipt_polls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(json!({ "txHash": TX_HASH, "status": "pending" }))
            } else {
                Ok(json!({ "txHash": TX_HASH, "status": "success", "blockNumber": 7 }))
            }
        }
        "pxe_getTxReceipt" => Err((-32000, "unknown transaction")),
        "pxe_addNote" => Ok(Value::Null),
        _ => Err((-32601, "method not found")),
    };

    Json(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => {
            json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
        }
    })
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn stub_pxe() -> (HttpPxeClient, Arc<Stub>) {
    let stub = Arc::new(Stub::default());
    let router = Router::new()
        .route("/", post(rpc))
        .with_state(stub.clone());
    let url = serve(router).await;
    (HttpPxeClient::new(url).unwrap(), stub)
}

fn addr(n: u64) -> AztecAddress {
    AztecAddress(Fr::from_u64(n))
}

#[tokio::test]
async fn node_info_and_accounts_decode() {
    let (pxe, _stub) = stub_pxe().await;

    let info = pxe.get_node_info().await.unwrap();
    assert_eq!(info.chain_id, 31337);
    assert_eq!(info.node_version, "0.1.0");

    let accounts = pxe.get_registered_accounts().await.unwrap();
    let addresses: Vec<_> = accounts.iter().map(|a| a.address).collect();
    assert_eq!(addresses, vec![addr(1), addr(2)]);
}

#[tokio::test]
async fn token_send_then_wait_over_http() {
    let (pxe, stub) = stub_pxe().await;
    let token = TokenContract::at(addr(0xbeef), MemoryPxe::token_artifact(), &pxe)
        .unwrap()
        .with_wallet(addr(1));

    let sent = token.mint_public(addr(1), 100).await.unwrap();
    assert_eq!(sent.tx_hash(), TX_HASH.parse::<TxHash>().unwrap());

    let opts = WaitOpts {
        interval: Duration::from_millis(5),
        timeout: Some(Duration::from_secs(5)),
    };
    let receipt = sent.wait(&opts).await.unwrap();
    assert_eq!(receipt.status, TxStatus::Success);
    assert_eq!(receipt.block_number, Some(7));
    assert_eq!(stub.receipt_polls.load(Ordering::SeqCst), 2);

    let requests = stub.requests.lock().unwrap().clone();
    let send = requests
        .iter()
        .find(|r| r["method"] == "pxe_sendCall")
        .unwrap();
    assert_eq!(send["jsonrpc"], "2.0");
    assert_eq!(send["params"][0]["functionName"], "mint_public");
    assert_eq!(send["params"][0]["contractAddress"], addr(0xbeef).to_string());
    assert_eq!(send["params"][0]["args"][1], Fr::from_u64(100).to_hex());
    assert_eq!(send["params"][1], addr(1).to_string());

    assert_eq!(token.balance_of_public(addr(1)).await.unwrap(), 100);
}

#[tokio::test]
async fn rpc_errors_surface_with_code() {
    let (pxe, _stub) = stub_pxe().await;

    let err = pxe.get_tx_receipt(TxHash([0xff; 32])).await.unwrap_err();
    match err {
        PxeError::Rpc { code, message } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "unknown transaction");
        }
        other => panic!("expected rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_is_reported() {
    let router = Router::new().route(
        "/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let pxe = HttpPxeClient::new(serve(router).await).unwrap();

    let err = pxe.get_node_info().await.unwrap_err();
    assert!(matches!(err, PxeError::Http { status: 500, ref body } if body == "boom"));
    assert!(err.is_transient());
}

#[tokio::test]
async fn mismatched_response_id_is_rejected() {
    let router = Router::new().route(
        "/",
        post(|Json(req): Json<Value>| async move {
            let id = req["id"].as_u64().unwrap() + 100;
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": { "chainId": 1 } }))
        }),
    );
    let pxe = HttpPxeClient::new(serve(router).await).unwrap();

    let err = pxe.get_node_info().await.unwrap_err();
    match err {
        PxeError::UnexpectedResult { method, reason } => {
            assert_eq!(method, "pxe_getNodeInfo");
            assert!(reason.contains("does not match"), "{reason}");
        }
        other => panic!("expected id mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_node_is_a_transport_error() {
    // grab a free port, then close it again
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pxe = HttpPxeClient::with_timeout(format!("http://{addr}"), Some(Duration::from_secs(2)))
        .unwrap();
    let err = pxe.get_node_info().await.unwrap_err();
    assert!(matches!(err, PxeError::Transport { .. }), "got {err:?}");
}

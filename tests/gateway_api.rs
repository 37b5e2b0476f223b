//! HTTP surface end to end: the real router served on an ephemeral port,
//! in-memory ledger behind it, exercised with a plain HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;

use rust_decimal_macros::dec;
use serde_json::{Value, json};

use banklink::config::{InterbankConfig, LimitsConfig};
use banklink::gateway::{self, state::AppState};
use banklink::interbank::{CallOutcome, MockBankClient};
use banklink::ledger::MemoryLedger;
use banklink::registry::MemoryBankRegistry;
use banklink::transfer::{InboundSettlement, OutboundOrchestrator};

struct Served {
    addr: SocketAddr,
    ledger: MemoryLedger,
    client: Arc<MockBankClient>,
}

async fn serve() -> Served {
    let ledger = MemoryLedger::new();
    ledger.seed_account(1, "ES-ORIGEN", dec!(1000)).await;

    let registry = MemoryBankRegistry::new();
    registry.add_active("OTRO", "http://localhost:9000", "clave-otro");

    let client = Arc::new(MockBankClient::new());

    let outbound = OutboundOrchestrator::new(
        Arc::new(ledger.clone()),
        Arc::new(registry.clone()),
        client.clone(),
        &InterbankConfig::default(),
        &LimitsConfig::default(),
    );
    let inbound = InboundSettlement::new(Arc::new(ledger.clone()), Arc::new(registry));

    let state = Arc::new(AppState::new(outbound, inbound, None));
    let app = gateway::router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Served {
        addr,
        ledger,
        client,
    }
}

fn send_body(key: &str) -> Value {
    json!({
        "origin_account_id": 1,
        "destination_bank_code": "OTRO",
        "destination_account_number": "X",
        "amount": "300",
        "idempotency_key": key,
    })
}

fn receive_body(key: &str) -> Value {
    json!({
        "originBankCode": "OTRO",
        "originAccountNumber": "EXT-99",
        "destinationAccountNumber": "ES-ORIGEN",
        "amount": "50",
        "idempotencyKey": key,
    })
}

#[tokio::test]
async fn send_endpoint_commits_and_envelopes_the_result() {
    let served = serve().await;
    served
        .client
        .enqueue(CallOutcome::Accepted {
            transaction_id: "TX1".to_string(),
        })
        .await;

    let http = reqwest::Client::new();
    let response = http
        .post(format!("http://{}/api/v1/transfers/send", served.addr))
        .json(&send_body("k-1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["balance"], "700");
    assert_eq!(body["data"]["state"], "COMMITTED");
    assert_eq!(served.ledger.balance_of(1).await, Some(dec!(700)));
}

#[tokio::test]
async fn send_endpoint_maps_insufficient_balance_to_422() {
    let served = serve().await;

    let http = reqwest::Client::new();
    let mut body = send_body("k-1");
    body["amount"] = json!("5000");
    let response = http
        .post(format!("http://{}/api/v1/transfers/send", served.addr))
        .json(&body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 1002);
    assert_eq!(body["msg"], "Saldo insuficiente");
    assert_eq!(served.ledger.balance_of(1).await, Some(dec!(1000)));
}

#[tokio::test]
async fn send_endpoint_rejects_invalid_body_without_calling_out() {
    let served = serve().await;

    let http = reqwest::Client::new();
    let mut body = send_body("k-1");
    body["amount"] = json!("0");
    let response = http
        .post(format!("http://{}/api/v1/transfers/send", served.addr))
        .json(&body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(served.client.call_count().await, 0);
}

#[tokio::test]
async fn receive_endpoint_answers_bare_acknowledgement() {
    let served = serve().await;

    let http = reqwest::Client::new();
    let response = http
        .post(format!("http://{}/api/v1/transfers/receive", served.addr))
        .header("X-Api-Key", "clave-otro")
        .json(&receive_body("in-1"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["newBalance"], "1050");
    assert!(ack["transactionId"].is_string());
    assert_eq!(served.ledger.balance_of(1).await, Some(dec!(1050)));

    // Replay with the same key: acknowledged again, credited once
    let response = http
        .post(format!("http://{}/api/v1/transfers/receive", served.addr))
        .header("X-Api-Key", "clave-otro")
        .json(&receive_body("in-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(served.ledger.balance_of(1).await, Some(dec!(1050)));
}

#[tokio::test]
async fn receive_endpoint_refuses_bad_or_missing_key() {
    let served = serve().await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{}/api/v1/transfers/receive", served.addr))
        .header("X-Api-Key", "clave-robada")
        .json(&receive_body("in-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let ack: Value = response.json().await.unwrap();
    assert_eq!(ack["success"], false);

    let response = http
        .post(format!("http://{}/api/v1/transfers/receive", served.addr))
        .json(&receive_body("in-2"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    assert_eq!(served.ledger.balance_of(1).await, Some(dec!(1000)));
}

#[tokio::test]
async fn health_endpoint_reports_ok_without_database() {
    let served = serve().await;

    let response = reqwest::get(format!("http://{}/api/v1/health", served.addr))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 0);
    assert!(body["data"]["timestamp_ms"].is_u64());
}

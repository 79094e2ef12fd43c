//! HTTP broker client integration tests against an in-process mock brokerage
//! that checks the signature of every request.

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use ed25519_dalek::{SigningKey, VerifyingKey};
use serde_json::{Value, json};
use trading_bot::api::auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use trading_bot::api::client::{BrokerClient, HttpBrokerClient};
use trading_bot::config::Credentials;
use trading_bot::error::ClientError;
use trading_bot::types::order::{OrderKind, OrderRequest, OrderSide, OrderState};

#[derive(Clone)]
struct MockBrokerage {
    key: VerifyingKey,
    orders: Arc<Mutex<Vec<Value>>>,
}

impl MockBrokerage {
    fn new(key: VerifyingKey) -> Self {
        Self {
            key,
            orders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn check(&self, method: &Method, uri: &Uri, headers: &HeaderMap, body: &str) -> Result<(), StatusCode> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or(StatusCode::UNAUTHORIZED)
        };
        let timestamp = header(TIMESTAMP_HEADER)?;
        let signature = header(SIGNATURE_HEADER)?;
        let message = format!("{timestamp}{}{}{body}", method.as_str(), uri.path());
        if common::verify(&self.key, &message, signature) {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn login(
    State(state): State<MockBrokerage>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if let Err(status) = state.check(&method, &uri, &headers, &body) {
        return status;
    }
    let creds: Value = serde_json::from_str(&body).unwrap_or_default();
    if creds["username"] == "alice" && creds["password"] == "secret" {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn quote(
    State(state): State<MockBrokerage>,
    Path(symbol): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    state.check(&method, &uri, &headers, "")?;
    if symbol != "BTC-USD" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "symbol": symbol,
        "bid_price": 49_990.0,
        "ask_price": 50_010.0,
        "timestamp": "2026-10-17T12:00:00Z",
    })))
}

async fn holdings(
    State(state): State<MockBrokerage>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    state.check(&method, &uri, &headers, "")?;
    Ok(Json(json!({
        "results": [
            { "symbol": "BTC-USD", "quantity": 0.5, "average_buy_price": 40_000.0 },
            { "symbol": "ETH-USD", "quantity": 2.0, "average_buy_price": 2_500.0 },
        ]
    })))
}

async fn account(
    State(state): State<MockBrokerage>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    state.check(&method, &uri, &headers, "")?;
    Ok(Json(json!({
        "account_number": "RH-001",
        "buying_power": 1_000.0,
        "currency": "USD",
        "status": "active",
    })))
}

async fn place_order(
    State(state): State<MockBrokerage>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, StatusCode> {
    state.check(&method, &uri, &headers, &body)?;
    let order: Value = serde_json::from_str(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
    state.orders.lock().unwrap().push(order.clone());
    Ok(Json(json!({
        "id": "order-1",
        "client_order_id": order["client_order_id"],
        "symbol": order["symbol"],
        "side": order["side"],
        "state": "filled",
        "filled_quantity": order["quantity"],
        "average_fill_price": 50_000.0,
        "created_at": "2026-10-17T12:00:01Z",
    })))
}

fn mock_router(state: MockBrokerage) -> Router {
    Router::new()
        .route("/api/v1/login/", post(login))
        .route("/api/v1/marketdata/quotes/{symbol}/", get(quote))
        .route("/api/v1/holdings/", get(holdings))
        .route("/api/v1/account/", get(account))
        .route("/api/v1/orders/", post(place_order))
        .with_state(state)
}

/// Spawn the mock on a random port and return (base_url, guard that keeps server running).
async fn spawn_mock(state: MockBrokerage) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let app = mock_router(state);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base_url, handle)
}

fn credentials(password: &str) -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: password.to_string(),
    }
}

async fn logged_in_client() -> (HttpBrokerClient, MockBrokerage, tokio::task::JoinHandle<()>) {
    let signer = common::test_signer();
    let mock = MockBrokerage::new(signer.verifying_key());
    let (base_url, handle) = spawn_mock(mock.clone()).await;
    let client = HttpBrokerClient::new(&base_url, credentials("secret"), signer);
    client.login().await.unwrap();
    (client, mock, handle)
}

#[tokio::test]
async fn login_succeeds_with_valid_credentials() {
    let (client, _mock, _handle) = logged_in_client().await;
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let signer = common::test_signer();
    let (base_url, _handle) = spawn_mock(MockBrokerage::new(signer.verifying_key())).await;
    let client = HttpBrokerClient::new(&base_url, credentials("wrong"), signer);

    let err = client.login().await.unwrap_err();

    assert!(matches!(err, ClientError::Authentication(_)));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn login_rejects_signature_from_other_key() {
    let other = SigningKey::from_bytes(&[9u8; 32]).verifying_key();
    let (base_url, _handle) = spawn_mock(MockBrokerage::new(other)).await;
    let client = HttpBrokerClient::new(&base_url, credentials("secret"), common::test_signer());

    let err = client.login().await.unwrap_err();

    assert!(matches!(err, ClientError::Authentication(_)));
}

#[tokio::test]
async fn calls_before_login_fail() {
    let signer = common::test_signer();
    let (base_url, _handle) = spawn_mock(MockBrokerage::new(signer.verifying_key())).await;
    let client = HttpBrokerClient::new(&base_url, credentials("secret"), signer);

    assert!(matches!(client.get_quote("BTC-USD").await, Err(ClientError::NotLoggedIn)));
    assert!(matches!(client.get_account().await, Err(ClientError::NotLoggedIn)));
    assert!(matches!(client.get_holdings().await, Err(ClientError::NotLoggedIn)));
}

#[tokio::test]
async fn get_quote_returns_bid_and_ask() {
    let (client, _mock, _handle) = logged_in_client().await;

    let quote = client.get_quote("BTC-USD").await.unwrap();

    assert_eq!(quote.symbol, "BTC-USD");
    assert_eq!(quote.bid_price, 49_990.0);
    assert_eq!(quote.ask_price, 50_010.0);
    assert_eq!(quote.mid_price(), 50_000.0);
}

#[tokio::test]
async fn get_quote_unknown_symbol_is_api_error() {
    let (client, _mock, _handle) = logged_in_client().await;

    let err = client.get_quote("NOPE-USD").await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[tokio::test]
async fn get_holdings_and_account() {
    let (client, _mock, _handle) = logged_in_client().await;

    let holdings = client.get_holdings().await.unwrap();
    assert_eq!(holdings.len(), 2);
    assert_eq!(holdings[0].symbol, "BTC-USD");
    assert_eq!(holdings[1].average_buy_price, 2_500.0);

    let account = client.get_account().await.unwrap();
    assert_eq!(account.account_number, "RH-001");
    assert_eq!(account.buying_power, 1_000.0);
}

#[tokio::test]
async fn place_limit_order_sends_signed_body() {
    let (client, mock, _handle) = logged_in_client().await;
    let order = OrderRequest::limit("BTC-USD", OrderSide::Buy, 0.1, 49_000.0);

    let confirmation = client.place_order(&order).await.unwrap();

    assert_eq!(confirmation.client_order_id, order.client_order_id);
    assert_eq!(confirmation.state, OrderState::Filled);
    assert_eq!(confirmation.side, OrderSide::Buy);
    assert_eq!(confirmation.filled_quantity, 0.1);
    assert_eq!(confirmation.average_fill_price, Some(50_000.0));

    let orders = mock.orders.lock().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["type"], "limit");
    assert_eq!(orders[0]["price"], 49_000.0);
    assert_eq!(orders[0]["side"], "buy");
}

#[tokio::test]
async fn place_market_order_has_no_price() {
    let (client, mock, _handle) = logged_in_client().await;
    let order = OrderRequest::market("BTC-USD", OrderSide::Sell, 1.0);
    assert_eq!(order.kind, OrderKind::Market);

    client.place_order(&order).await.unwrap();

    let orders = mock.orders.lock().unwrap();
    assert_eq!(orders[0]["type"], "market");
    assert!(orders[0].get("price").is_none());
}

#[tokio::test]
async fn invalid_orders_are_rejected_locally() {
    let (client, mock, _handle) = logged_in_client().await;

    let zero_qty = OrderRequest::market("BTC-USD", OrderSide::Buy, 0.0);
    assert!(matches!(
        client.place_order(&zero_qty).await,
        Err(ClientError::InvalidOrder(_))
    ));

    let bad_limit = OrderRequest::limit("BTC-USD", OrderSide::Buy, 1.0, -1.0);
    assert!(matches!(
        client.place_order(&bad_limit).await,
        Err(ClientError::InvalidOrder(_))
    ));

    assert!(mock.orders.lock().unwrap().is_empty());
}

//! Brokerage boundary: the `BrokerClient` trait and its HTTP implementation.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::api::auth::RequestSigner;
use crate::config::Credentials;
use crate::error::ClientError;
use crate::types::account::{Account, Holding};
use crate::types::market::Quote;
use crate::types::order::{OrderConfirmation, OrderKind, OrderRequest};

pub const LOGIN_PATH: &str = "/api/v1/login/";
pub const HOLDINGS_PATH: &str = "/api/v1/holdings/";
pub const ACCOUNT_PATH: &str = "/api/v1/account/";
pub const ORDERS_PATH: &str = "/api/v1/orders/";

pub fn quote_path(symbol: &str) -> String {
    format!("/api/v1/marketdata/quotes/{symbol}/")
}

#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn login(&self) -> Result<(), ClientError>;
    async fn get_quote(&self, symbol: &str) -> Result<Quote, ClientError>;
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ClientError>;
    async fn get_holdings(&self) -> Result<Vec<Holding>, ClientError>;
    async fn get_account(&self) -> Result<Account, ClientError>;
}

/// Reject orders the brokerage would refuse anyway.
pub fn validate_order(order: &OrderRequest) -> Result<(), ClientError> {
    if !(order.quantity.is_finite() && order.quantity > 0.0) {
        return Err(ClientError::InvalidOrder(format!(
            "quantity must be positive, got {}",
            order.quantity
        )));
    }
    if let OrderKind::Limit { price } = order.kind {
        if !(price.is_finite() && price > 0.0) {
            return Err(ClientError::InvalidOrder(format!(
                "limit price must be positive, got {price}"
            )));
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

#[derive(Debug)]
pub struct HttpBrokerClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Credentials,
    signer: RequestSigner,
    logged_in: AtomicBool,
}

impl HttpBrokerClient {
    pub fn new(base_url: &str, credentials: Credentials, signer: RequestSigner) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            credentials,
            signer,
            logged_in: AtomicBool::new(false),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Acquire)
    }

    fn ensure_logged_in(&self) -> Result<(), ClientError> {
        if self.is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::NotLoggedIn)
        }
    }

    /// Sign and send one request; non-2xx statuses become `ClientError::Api`.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<reqwest::Response, ClientError> {
        let headers = self.signer.build_headers(method.as_str(), path, body.as_deref());
        let mut request = self.http.request(method, format!("{}{}", self.base_url, path));
        for (name, value) in headers.header_pairs() {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ClientError> {
        Ok(self.execute(method, path, body).await?.json::<T>().await?)
    }
}

#[async_trait]
impl BrokerClient for HttpBrokerClient {
    async fn login(&self) -> Result<(), ClientError> {
        let body = serde_json::to_string(&LoginRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
        })
        .map_err(|e| ClientError::Authentication(e.to_string()))?;

        match self.execute(Method::POST, LOGIN_PATH, Some(body)).await {
            Ok(_) => {
                self.logged_in.store(true, Ordering::Release);
                info!("successfully logged in");
                Ok(())
            }
            Err(ClientError::Api { status, message }) => {
                error!(status, %message, "authentication failed");
                Err(ClientError::Authentication(format!("{status}: {message}")))
            }
            Err(e) => {
                error!(error = %e, "error during login");
                Err(e)
            }
        }
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, ClientError> {
        self.ensure_logged_in()?;
        let quote: Quote = self
            .send(Method::GET, &quote_path(symbol), None)
            .await
            .inspect_err(|e| error!(symbol, error = %e, "failed to retrieve quote"))?;
        debug!(symbol, ?quote, "retrieved quote");
        Ok(quote)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderConfirmation, ClientError> {
        self.ensure_logged_in()?;
        validate_order(order).inspect_err(|e| error!(error = %e, "invalid order parameters"))?;

        let body = serde_json::to_string(order)
            .map_err(|e| ClientError::InvalidOrder(e.to_string()))?;
        let confirmation: OrderConfirmation = self
            .send(Method::POST, ORDERS_PATH, Some(body))
            .await
            .inspect_err(|e| error!(symbol = %order.symbol, error = %e, "failed to place order"))?;
        info!(?confirmation, "placed order");
        Ok(confirmation)
    }

    async fn get_holdings(&self) -> Result<Vec<Holding>, ClientError> {
        self.ensure_logged_in()?;
        let page: Page<Holding> = self
            .send(Method::GET, HOLDINGS_PATH, None)
            .await
            .inspect_err(|e| error!(error = %e, "failed to retrieve holdings"))?;
        debug!(holdings = ?page.results, "retrieved holdings");
        Ok(page.results)
    }

    async fn get_account(&self) -> Result<Account, ClientError> {
        self.ensure_logged_in()?;
        let account: Account = self
            .send(Method::GET, ACCOUNT_PATH, None)
            .await
            .inspect_err(|e| error!(error = %e, "failed to retrieve account information"))?;
        debug!(?account, "retrieved account information");
        Ok(account)
    }
}

use std::sync::Arc;

use api_types::{
    auth::{Login, Register, TokenResponse},
    period::Period,
    summary::Summary,
    transaction::{CategoriesResponse, MessageResponse, Transaction, TransactionInput},
};
use reqwest::{
    Method, StatusCode, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::session::Session;

const FALLBACK_MESSAGE: &str = "Request failed";
const VALIDATION_MESSAGE: &str = "Validation error";

/// The only error channel of the client: callers get a message, never a
/// structured error code.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
    #[error("invalid request: {0}")]
    Encode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::default()
        }
    }

    pub fn json<T: Serialize + ?Sized>(method: Method, body: &T) -> Result<Self, ClientError> {
        let body = serde_json::to_value(body).map_err(|err| ClientError::Encode(err.to_string()))?;
        Ok(Self {
            method,
            body: Some(body),
            headers: HeaderMap::new(),
        })
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
    session: Arc<Session>,
}

impl Client {
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let token = self.session.token();
        let headers = merge_headers(token.as_deref(), options.headers);

        tracing::debug!(method = %options.method, path, "api request");
        let mut req = self.http.request(options.method, self.url(path)).headers(headers);
        if let Some(body) = options.body {
            req = req.body(body.to_string());
        }

        let res = req.send().await.inspect_err(|err| {
            tracing::warn!(path, "api unreachable: {err}");
        })?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<T>().await?);
        }

        let body = res.bytes().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::warn!(%status, path, "api request failed: {message}");
        Err(ClientError::Api { status, message })
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<String, ClientError> {
        let payload = Register {
            email: email.to_string(),
            password: password.to_string(),
            name: name.unwrap_or_default().to_string(),
        };
        let res: TokenResponse = self
            .request("/auth/register", RequestOptions::json(Method::POST, &payload)?)
            .await?;
        Ok(res.access_token)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let payload = Login {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: TokenResponse = self
            .request("/auth/login", RequestOptions::json(Method::POST, &payload)?)
            .await?;
        Ok(res.access_token)
    }

    pub async fn transactions_list(
        &self,
        period: Option<Period>,
    ) -> Result<Vec<Transaction>, ClientError> {
        self.request(&with_month("/transactions", period), RequestOptions::get())
            .await
    }

    pub async fn transaction_get(&self, id: &str) -> Result<Transaction, ClientError> {
        self.request(&format!("/transactions/{id}"), RequestOptions::get())
            .await
    }

    pub async fn transaction_create(
        &self,
        input: &TransactionInput,
    ) -> Result<Transaction, ClientError> {
        self.request("/transactions", RequestOptions::json(Method::POST, input)?)
            .await
    }

    pub async fn transaction_update(
        &self,
        id: &str,
        input: &TransactionInput,
    ) -> Result<Transaction, ClientError> {
        self.request(
            &format!("/transactions/{id}"),
            RequestOptions::json(Method::PUT, input)?,
        )
        .await
    }

    pub async fn transaction_delete(&self, id: &str) -> Result<MessageResponse, ClientError> {
        self.request(&format!("/transactions/{id}"), RequestOptions::delete())
            .await
    }

    pub async fn categories(&self) -> Result<Vec<String>, ClientError> {
        let res: CategoriesResponse = self
            .request("/transactions/categories", RequestOptions::get())
            .await?;
        Ok(res.categories)
    }

    pub async fn summary(&self, period: Option<Period>) -> Result<Summary, ClientError> {
        self.request(&with_month("/summary", period), RequestOptions::get())
            .await
    }
}

fn with_month(path: &str, period: Option<Period>) -> String {
    match period {
        Some(period) => format!("{path}?month={period}"),
        None => path.to_string(),
    }
}

/// JSON content type first, caller headers override it, and the bearer token
/// always wins over any caller-supplied `Authorization`.
pub fn merge_headers(token: Option<&str>, extra: HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for name in extra.keys() {
        headers.remove(name);
    }
    for (name, value) in extra.iter() {
        headers.append(name.clone(), value.clone());
    }
    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("session token is not a valid header value"),
        }
    }
    headers
}

/// Extracts a readable message from an error response body.
///
/// A body that is not JSON is treated as `{"detail": <status text>}`.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    let detail = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut map)) => map.remove("detail"),
        Ok(_) => None,
        Err(_) => Some(Value::String(
            status.canonical_reason().unwrap_or(FALLBACK_MESSAGE).to_string(),
        )),
    };

    match detail {
        Some(Value::String(message)) => message,
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .unwrap_or(VALIDATION_MESSAGE)
            .to_string(),
        _ => FALLBACK_MESSAGE.to_string(),
    }
}

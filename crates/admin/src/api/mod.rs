//! REST client for the Talent Management API.
//!
//! Every call is made on behalf of the signed-in user: [`ApiClient::as_user`]
//! binds the session's access token, which is sent as a bearer token.
//!
//! The backend answers lists in three shapes (a bare array, a paged object
//! or the `{ value, isSuccess, ... }` envelope); all are normalized into
//! [`PagedResponse`] or `Vec<T>`.

mod resource;
pub mod types;

pub use resource::{Resource, order_by};
pub use types::*;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::ApiConfig;
use types::{ListBody, RecordBody};

/// Shown for transport failures (status 0).
pub const NETWORK_ERROR_MESSAGE: &str = "Network error - please check your connection";

/// Fallback when the dashboard envelope carries no message.
const DASHBOARD_FAILURE_MESSAGE: &str = "Failed to load dashboard metrics";

/// Errors calling the REST API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, timeout or other transport failure.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-success HTTP status.
    #[error("{status} {reason}")]
    Status {
        status: u16,
        reason: String,
        /// `message` (or `msg`) from the response body.
        message: Option<String>,
    },

    /// Body did not match any expected shape.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The envelope reported `isSuccess: false`.
    #[error("{0}")]
    Unsuccessful(String),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// HTTP status, with transport failures reported as `0`.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Network(_) => Some(0),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message for a toast: the body's `message`, else `msg`, else the
    /// network text for status 0, else `"{status} {reason}"`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Status {
                status,
                reason,
                message,
            } => message
                .clone()
                .unwrap_or_else(|| format!("{status} {reason}")),
            Self::Unsuccessful(message) => message.clone(),
            Self::Decode(_) | Self::Url(_) | Self::Client(_) => {
                "Unexpected response from the server".to_string()
            }
        }
    }

    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Network(error)
        }
    }
}

/// Pull `message`, then `msg`, out of an error body.
fn body_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "msg"].into_iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    })
}

/// Shared REST client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("talent-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Bind a user's access token to subsequent calls.
    #[must_use]
    pub fn as_user(&self, access_token: Option<String>) -> UserApi {
        UserApi {
            client: self.clone(),
            access_token,
        }
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

/// API calls made with one user's credentials.
pub struct UserApi {
    client: ApiClient,
    access_token: Option<String>,
}

impl UserApi {
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.client.url(path)?;
        let builder = self.client.inner.http.request(method, url);
        Ok(match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send, map non-success statuses and return the body text.
    async fn send(builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_transport)?;
        if status.is_success() {
            return Ok(body);
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: body_message(&body),
        })
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /{Entity}` with optional query parameters; unset ones are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decoding failure.
    #[instrument(skip(self, params), fields(endpoint = R::ENDPOINT))]
    pub async fn get_all<R: Resource>(
        &self,
        params: &[(&str, Option<String>)],
    ) -> Result<Vec<R>, ApiError> {
        let query: Vec<(&str, &str)> = params
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
            .collect();
        let body = Self::send(self.request(Method::GET, R::ENDPOINT)?.query(&query)).await?;
        match Self::decode::<ListBody<R>>(&body)? {
            ListBody::Bare(items) => Ok(items),
            ListBody::Paged(page) => Ok(page.items),
            ListBody::Envelope(envelope) => {
                if envelope.is_success {
                    Ok(envelope.value.unwrap_or_default())
                } else {
                    Err(unsuccessful(envelope.message, R::NOUN))
                }
            }
        }
    }

    /// `POST /{Entity}/Paged?pageNumber=&pageSize=&orderBy=` with an empty
    /// JSON body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decoding failure.
    #[instrument(skip(self), fields(endpoint = R::ENDPOINT))]
    pub async fn get_paged<R: Resource>(
        &self,
        query: &PageQuery,
    ) -> Result<PagedResponse<R>, ApiError> {
        let path = format!("{}/Paged", R::ENDPOINT);
        let builder = self
            .request(Method::POST, &path)?
            .query(&query.to_params())
            .json(&serde_json::json!({}));
        let body = Self::send(builder).await?;
        Ok(match Self::decode::<ListBody<R>>(&body)? {
            ListBody::Paged(page) => page,
            ListBody::Bare(items) => {
                let total = items.len() as u64;
                PagedResponse::new(items, query.page_number, query.page_size, total)
            }
            ListBody::Envelope(envelope) => {
                if !envelope.is_success {
                    return Err(unsuccessful(envelope.message, R::NOUN));
                }
                let items = envelope.value.unwrap_or_default();
                let total = envelope
                    .records_filtered
                    .or(envelope.records_total)
                    .unwrap_or(items.len() as u64);
                PagedResponse::new(
                    items,
                    envelope.page_number.unwrap_or(query.page_number),
                    envelope.page_size.unwrap_or(query.page_size),
                    total,
                )
            }
        })
    }

    /// `GET /{Entity}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport, status or decoding failure.
    #[instrument(skip(self, id), fields(endpoint = R::ENDPOINT, id = %id))]
    pub async fn get_by_id<R: Resource>(&self, id: &R::Id) -> Result<R, ApiError> {
        let path = format!("{}/{id}", R::ENDPOINT);
        let body = Self::send(self.request(Method::GET, &path)?).await?;
        match Self::decode::<RecordBody<R>>(&body)? {
            RecordBody::Bare(record) => Ok(record),
            RecordBody::Envelope(envelope) if envelope.is_success => Ok(envelope.value),
            RecordBody::Envelope(envelope) => Err(unsuccessful(envelope.message, R::NOUN)),
        }
    }

    /// `POST /{Entity}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport or status failure.
    #[instrument(skip(self, command), fields(endpoint = R::ENDPOINT))]
    pub async fn create<R: Resource>(&self, command: &R::Command) -> Result<(), ApiError> {
        self.write(Method::POST, R::ENDPOINT, command).await
    }

    /// `PUT /{Entity}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport or status failure.
    #[instrument(skip(self, id, command), fields(endpoint = R::ENDPOINT, id = %id))]
    pub async fn update<R: Resource>(
        &self,
        id: &R::Id,
        command: &R::Command,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{id}", R::ENDPOINT);
        self.write(Method::PUT, &path, command).await
    }

    /// `DELETE /{Entity}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport or status failure.
    #[instrument(skip(self, id), fields(endpoint = R::ENDPOINT, id = %id))]
    pub async fn delete<R: Resource>(&self, id: &R::Id) -> Result<(), ApiError> {
        let path = format!("{}/{id}", R::ENDPOINT);
        let body = Self::send(self.request(Method::DELETE, &path)?).await?;
        check_envelope(&body, R::NOUN)
    }

    /// `GET /Dashboard/Metrics`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unsuccessful`] when the envelope reports failure,
    /// or another [`ApiError`] on transport, status or decoding failure.
    #[instrument(skip(self))]
    pub async fn dashboard_metrics(&self) -> Result<DashboardMetrics, ApiError> {
        let body = Self::send(self.request(Method::GET, "Dashboard/Metrics")?).await?;
        let envelope: ApiEnvelope<DashboardMetrics> = Self::decode(&body)?;
        match envelope.value {
            Some(metrics) if envelope.is_success => Ok(metrics),
            _ => Err(ApiError::Unsuccessful(
                envelope
                    .message
                    .unwrap_or_else(|| DASHBOARD_FAILURE_MESSAGE.to_string()),
            )),
        }
    }

    /// `POST /Positions/AddMock` to seed generated positions.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport or status failure.
    #[instrument(skip(self))]
    pub async fn add_mock_positions(
        &self,
        command: InsertMockPositionsCommand,
    ) -> Result<(), ApiError> {
        let path = format!("{}/AddMock", <Position as Resource>::ENDPOINT);
        self.write(Method::POST, &path, &command).await
    }

    async fn write<C: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        command: &C,
    ) -> Result<(), ApiError> {
        let body = Self::send(self.request(method, path)?.json(command)).await?;
        check_envelope(&body, "Request")
    }
}

/// Writes may answer with an envelope; honour `isSuccess: false`.
fn check_envelope(body: &str, noun: &str) -> Result<(), ApiError> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Ok(());
    };
    match value.get("isSuccess").and_then(Value::as_bool) {
        Some(false) => Err(unsuccessful(
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            noun,
        )),
        _ => Ok(()),
    }
}

fn unsuccessful(message: Option<String>, noun: &str) -> ApiError {
    ApiError::Unsuccessful(message.unwrap_or_else(|| format!("{noun} request failed")))
}

//! HttpRemote - reqwest implementation of the remote service boundary

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{RemoteError, RemoteResult, RemoteService};
use shared::models::{Shift, ShiftClose, ShiftCreate, ShiftEdit, ShiftStatus, TripCreate, TripRecord};
use shared::sync::{SyncBatch, SyncBatchResponse};

/// HTTP client for the remote service REST API
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

/// Single-create body: the trip payload with its idempotency token attached
#[derive(Serialize)]
struct TokenizedTrip<'a> {
    client_uuid: &'a str,
    #[serde(flatten)]
    trip: &'a TripCreate,
}

#[derive(Serialize)]
struct SettledBody {
    settled: bool,
}

impl HttpRemote {
    /// Create a client against the given base URL
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| RemoteError::Protocol(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a finished response into the typed result or a classified error
    async fn handle<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| RemoteError::Protocol(format!("Failed to parse response: {e}")));
        }

        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, message))
    }

    /// Same as `handle` but treats 404 as absence rather than an error
    async fn handle_optional<T: DeserializeOwned>(response: Response) -> RemoteResult<Option<T>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::handle(response).await?))
    }
}

/// Transport errors (connect, timeout) are transient; everything else that
/// reqwest reports at request time counts as transport too, since no server
/// verdict was received.
fn classify_request_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

fn classify_status(status: StatusCode, message: String) -> RemoteError {
    if status.is_server_error() {
        RemoteError::Transport(format!("Server error {status}: {message}"))
    } else {
        RemoteError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl RemoteService for HttpRemote {
    async fn create_trip(&self, trip: &TripCreate, token: &str) -> RemoteResult<TripRecord> {
        let body = TokenizedTrip {
            client_uuid: token,
            trip,
        };
        let response = self
            .client
            .post(self.url("/api/trips"))
            .json(&body)
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn sync_batch(&self, batch: &SyncBatch) -> RemoteResult<SyncBatchResponse> {
        let response = self
            .client
            .post(self.url("/api/trips/sync"))
            .json(batch)
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn active_shift(&self, operator_id: i64) -> RemoteResult<Option<Shift>> {
        let response = self
            .client
            .get(self.url("/api/shifts/active"))
            .query(&[("operator_id", operator_id)])
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle_optional(response).await
    }

    async fn get_shift(&self, id: i64) -> RemoteResult<Option<Shift>> {
        let response = self
            .client
            .get(self.url(&format!("/api/shifts/{id}")))
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle_optional(response).await
    }

    async fn create_shift(&self, data: &ShiftCreate) -> RemoteResult<Shift> {
        let response = self
            .client
            .post(self.url("/api/shifts"))
            .json(data)
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn close_shift(&self, id: i64, data: &ShiftClose) -> RemoteResult<Shift> {
        let response = self
            .client
            .post(self.url(&format!("/api/shifts/{id}/close")))
            .json(data)
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn update_shift(&self, id: i64, data: &ShiftEdit) -> RemoteResult<Shift> {
        let response = self
            .client
            .put(self.url(&format!("/api/shifts/{id}")))
            .json(data)
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn set_settled(&self, id: i64, settled: bool) -> RemoteResult<Shift> {
        let response = self
            .client
            .put(self.url(&format!("/api/shifts/{id}/settled")))
            .json(&SettledBody { settled })
            .send()
            .await
            .map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn list_shifts(&self, status: Option<ShiftStatus>) -> RemoteResult<Vec<Shift>> {
        let mut request = self.client.get(self.url("/api/shifts"));
        if let Some(status) = status {
            let tag = match status {
                ShiftStatus::Open => "OPEN",
                ShiftStatus::Closed => "CLOSED",
                ShiftStatus::Settled => "SETTLED",
            };
            request = request.query(&[("status", tag)]);
        }
        let response = request.send().await.map_err(classify_request_error)?;
        Self::handle(response).await
    }

    async fn delete_shift(&self, id: i64) -> RemoteResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/shifts/{id}")))
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, message))
    }
}

use crate::{CoreResult, EchoTransport, SessionError};

use std::{panic::Location, time::Duration};

use async_trait::async_trait;
use error_location::ErrorLocation;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

/// Multipart field the server reads the recording from.
pub(crate) const RECORDING_FIELD: &str = "recording";
const RECORDING_FILE_NAME: &str = "recording.wav";
const RECORDING_MIME: &str = "audio/wav";
const ECHO_PATH: &str = "echo/";

/// [`EchoTransport`] over HTTP: `POST {base_url}/echo/` with one multipart
/// part named `recording`.
#[derive(Debug, Clone)]
pub struct HttpEchoTransport {
    client: reqwest::Client,
    endpoint: String,
    settle_delay: Duration,
}

impl HttpEchoTransport {
    /// Build a transport for `base_url` with a per-request `timeout`.
    #[track_caller]
    #[instrument]
    pub fn new(base_url: &str, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::TransportFailed {
                reason: format!("Failed to build HTTP client: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let endpoint = format!("{}/{}", base_url.trim_end_matches('/'), ECHO_PATH);

        info!(endpoint = %endpoint, "Echo transport configured");

        Ok(Self {
            client,
            endpoint,
            settle_delay: Duration::ZERO,
        })
    }

    /// Pause between building the request and dispatching it.
    ///
    /// Runs on the async timer, so other activity keeps going while it
    /// elapses.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[track_caller]
    fn build_form(recording: Vec<u8>) -> CoreResult<Form> {
        let part = Part::bytes(recording)
            .file_name(RECORDING_FILE_NAME)
            .mime_str(RECORDING_MIME)
            .map_err(|e| SessionError::EncodingFailed {
                reason: format!("Invalid recording part: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Form::new().part(RECORDING_FIELD, part))
    }
}

#[async_trait]
impl EchoTransport for HttpEchoTransport {
    #[instrument(skip(self, recording), fields(bytes = recording.len(), endpoint = %self.endpoint))]
    async fn exchange(&self, recording: Vec<u8>) -> CoreResult<Vec<u8>> {
        let form = Self::build_form(recording)?;

        if !self.settle_delay.is_zero() {
            debug!(delay_ms = self.settle_delay.as_millis(), "Settling before dispatch");
            tokio::time::sleep(self.settle_delay).await;
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SessionError::TransportFailed {
                reason: format!("Request failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Echo server rejected upload");
            return Err(SessionError::TransportFailed {
                reason: format!("Server responded {}", status),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SessionError::TransportFailed {
                reason: format!("Failed to read response body: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(status = %status, bytes = body.len(), "Echo received");

        Ok(body.to_vec())
    }
}

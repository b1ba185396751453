//! Upload-and-await exchange with the remote echo service.

mod http;

pub use http::HttpEchoTransport;
#[cfg(test)]
pub(crate) use http::RECORDING_FIELD;

use crate::CoreResult;

use async_trait::async_trait;

/// A single upload-and-await-response exchange.
///
/// Resolves exactly once with the response body or a failure. No retries
/// happen at this layer.
#[async_trait]
pub trait EchoTransport: Send + Sync {
    /// Upload `recording` and return the echoed bytes.
    async fn exchange(&self, recording: Vec<u8>) -> CoreResult<Vec<u8>>;
}

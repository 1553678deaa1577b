// ABOUTME: Service trait - the injected boundary to the remote operation.
// ABOUTME: Separates transport invocation from response-shape validation.

use async_trait::async_trait;

use crate::error::CallError;

/// An unreliable, possibly quota-limited remote operation.
///
/// `invoke` is the transport call; `extract` validates the response shape
/// and pulls out the usable payload. A structurally successful transport
/// response is not automatically a valid result: when the expected content
/// is absent, null, or the response carries zero candidates, `extract`
/// must return [`CallError::InvalidResponse`] so the retrying caller
/// treats it as retryable instead of handing back a false success.
#[async_trait]
pub trait Service: Send + Sync {
    type Request: Send + Sync;
    type Response: Send;
    type Payload: Send;

    /// Perform one transport-level call.
    async fn invoke(&self, request: &Self::Request) -> Result<Self::Response, CallError>;

    /// Validate the response shape and extract the payload.
    fn extract(&self, response: Self::Response) -> Result<Self::Payload, CallError>;
}

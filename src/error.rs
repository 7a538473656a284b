use thiserror::Error;

/// Failure taxonomy for one relay turn. The HTTP layer maps these to status
/// codes and logs the detail server-side; the detail string must never
/// contain the IBM API key.
#[derive(Debug, Error)]
pub enum RelayError {
    /// IAM token exchange failed (rejected credential or unreachable service).
    #[error("token acquisition failed: {0}")]
    Auth(String),

    /// The watsonx call failed (network, non-2xx status, unparseable body).
    #[error("provider request failed: {0}")]
    Provider(String),

    /// The inbound message was rejected before any network call.
    #[error("invalid message: {0}")]
    Validation(String),
}

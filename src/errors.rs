use thiserror::Error;

/// CleanSwipe SDK Errors.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The App ID provided is not in the right format. Must be in UUID (00000000-0000-0000-0000-000000000000) format.
    #[error("Invalid App ID format. Must be in UUID format.")]
    InvalidAppId,
    /// The response signing key provided is not in the right format. Must be a Base64-encoded DER public key.
    #[error("Invalid signing key format. Must be in Base64 format.")]
    InvalidSigningKey,

    /// Failed to derive the anonymous device identity.
    #[error("Failed to get device ID.")]
    FailedToGetDeviceId,

    /// Failed to send a request to the CleanSwipe API.
    #[error("Failed to send a request to the CleanSwipe API.")]
    RequestFailed,

    /// Failed to decode a CleanSwipe API response.
    #[error("Failed to decode CleanSwipe API response.")]
    FailedToDecode,

    /// Data returned from the CleanSwipe API does not match local data.
    #[error("Data returned from the CleanSwipe API does not match local data.")]
    StateMismatch,

    /// The API response has been tampered with.
    #[error("The API response has been tampered with.")]
    TamperedResponse,

    /// The CleanSwipe API returned a 400: Bad Request status code.
    /// This means that the parameters passed to the endpoint were not correct.
    #[error("Bad request.")]
    BadRequest,
    /// The CleanSwipe API returned a 404: Not Found status code.
    /// This means that the API failed to find the app.
    #[error("App not found.")]
    AppNotFound,
    /// The CleanSwipe API returned a 401: Unauthorized status code.
    /// This means that the device ID did not match a customer record.
    #[error("This device is not known to the purchase backend.")]
    Unauthorized,
    /// The CleanSwipe API returned a 429: Too Many Requests status code.
    /// This means that you're sending requests too fast.
    #[error("You are being rate limited.")]
    RateLimited,
    /// The CleanSwipe API returned a server error.
    /// This is a catch-all for unusual error cases.
    #[error("Server error.")]
    ServerError,

    /// Reading or writing the local swipe store failed.
    #[error("Swipe store error: {0}")]
    Store(String),
}

/// Purchase and restore failures surfaced to the UI.
///
/// These never propagate past the tracker boundary as panics or plain
/// `Err` returns; the tracker records them in its observable
/// [`PurchaseState`](crate::PurchaseState) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// The user backed out of the checkout flow.
    ///
    /// The bundled web-checkout client signals abandonment through
    /// [`PurchaseOutcome::Cancelled`](crate::PurchaseOutcome::Cancelled)
    /// (the tracker returns to `Idle`, no error). This variant is for
    /// providers backed by a platform store, which report cancellation
    /// as an explicit error.
    #[error("Purchase cancelled by the user.")]
    UserCancelled,
    /// The purchase backend could not be reached.
    #[error("Network error while contacting the purchase backend.")]
    NetworkError,
    /// Anything else, carrying the backend's reason string.
    #[error("Purchase failed: {0}")]
    Unknown(String),
}

impl From<SdkError> for PurchaseError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::RequestFailed | SdkError::RateLimited | SdkError::ServerError => {
                PurchaseError::NetworkError
            }
            other => PurchaseError::Unknown(other.to_string()),
        }
    }
}

//! HTTP client for the CleanSwipe purchase backend.
//!
//! Every response body is a [`SignedEnvelope`]; the payload is only
//! decoded after its ECDSA signature verifies against the app's signing
//! key, so a spoofed backend cannot grant entitlements.

use std::thread;
use std::time::Duration;

use base64::prelude::*;
use hardware_id::get_id;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{PurchaseError, SdkError};
use crate::provider::{EntitlementProvider, PurchaseOutcome};
use crate::structs::{CheckoutData, CustomerEntitlements, EntitlementsData, SignedEnvelope};

const API_BASE: &str = "https://api.cleanswipe.app/client";

/// How long `purchase` waits for the web checkout to complete before
/// treating the attempt as abandoned.
const CHECKOUT_POLL_ATTEMPTS: u32 = 60;
const CHECKOUT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// CleanSwipe API client. Used to query and purchase entitlements.
#[derive(Debug)]
pub struct Api {
    /// The ID of your CleanSwipe app. Should be in UUID format: 00000000-0000-0000-0000-000000000000
    pub app_id: String,
    verifying_key: VerifyingKey,
    device_id: String,
}

/// CleanSwipe API options. Pass this into the `new()` function of [`Api`].
#[derive(Debug)]
pub struct ApiOptions {
    /// The ID of your CleanSwipe app. Should be in UUID format: 00000000-0000-0000-0000-000000000000
    pub app_id: String,
    /// The response signing key for your app. Should be a Base64-encoded DER public key.
    pub signing_key: String,
}

impl Api {
    /// Creates a new CleanSwipe API client.
    pub fn new(options: ApiOptions) -> Result<Self, SdkError> {
        if options.app_id.len() != 36 {
            return Err(SdkError::InvalidAppId);
        }

        let key_bytes = BASE64_STANDARD
            .decode(&options.signing_key)
            .or(Err(SdkError::InvalidSigningKey))?;
        let verifying_key =
            VerifyingKey::from_public_key_der(&key_bytes).or(Err(SdkError::InvalidSigningKey))?;

        let device_id = get_id().or(Err(SdkError::FailedToGetDeviceId))?;

        Ok(Self {
            app_id: options.app_id,
            verifying_key,
            device_id,
        })
    }

    /// Query an endpoint from the CleanSwipe API, verifying the response
    /// signature before decoding the payload.
    fn verified_api_call<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SdkError> {
        let mut params = params.to_vec();
        params.push(("app_id", self.app_id.as_str()));
        params.push(("device_id", self.device_id.as_str()));

        let url = reqwest::Url::parse_with_params(&format!("{API_BASE}/{path}"), &params)
            .or(Err(SdkError::RequestFailed))?;

        let response = reqwest::blocking::get(url).or(Err(SdkError::RequestFailed))?;

        if !response.status().is_success() {
            return Err(match response.status() {
                StatusCode::BAD_REQUEST => SdkError::BadRequest,
                StatusCode::NOT_FOUND => SdkError::AppNotFound,
                StatusCode::UNAUTHORIZED => SdkError::Unauthorized,
                StatusCode::TOO_MANY_REQUESTS => SdkError::RateLimited,
                _ => SdkError::ServerError,
            });
        }

        let envelope = response
            .json::<SignedEnvelope>()
            .or(Err(SdkError::FailedToDecode))?;

        let payload = verify_envelope(&self.verifying_key, &envelope)?;

        serde_json::from_slice(&payload).or(Err(SdkError::FailedToDecode))
    }
}

/// Checks the envelope signature and returns the decoded payload bytes.
fn verify_envelope(key: &VerifyingKey, envelope: &SignedEnvelope) -> Result<Vec<u8>, SdkError> {
    let data_bytes = BASE64_STANDARD
        .decode(&envelope.data)
        .or(Err(SdkError::FailedToDecode))?;
    let signature_bytes = BASE64_STANDARD
        .decode(&envelope.signature)
        .or(Err(SdkError::FailedToDecode))?;

    let mut signature =
        Signature::from_slice(&signature_bytes).or(Err(SdkError::FailedToDecode))?;

    // Some backends emit high-S signatures; normalize before verifying.
    signature = signature.normalize_s().unwrap_or(signature);

    key.verify(&data_bytes, &signature)
        .or(Err(SdkError::TamperedResponse))?;

    Ok(data_bytes)
}

impl EntitlementProvider for Api {
    fn fetch_entitlements(&self) -> Result<CustomerEntitlements, SdkError> {
        let data: EntitlementsData = self.verified_api_call("entitlements", &[])?;

        // Verify that the backend resolved the customer from this device.
        if data.device_id != self.device_id {
            return Err(SdkError::StateMismatch);
        }

        Ok(CustomerEntitlements {
            entitlements: data.entitlements,
        })
    }

    /// Opens the web checkout for `product_id`, then polls until an active
    /// entitlement appears. No completion within the polling window is
    /// treated as the user abandoning the purchase.
    fn purchase(&self, product_id: &str) -> PurchaseOutcome {
        let checkout: CheckoutData =
            match self.verified_api_call("checkout", &[("product_id", product_id)]) {
                Ok(data) => data,
                Err(err) => return PurchaseOutcome::Failed(err.into()),
            };

        if open::that(&checkout.checkout_url).is_err() {
            return PurchaseOutcome::Failed(PurchaseError::Unknown(
                "failed to open the checkout page".to_string(),
            ));
        }

        for attempt in 0..CHECKOUT_POLL_ATTEMPTS {
            thread::sleep(CHECKOUT_POLL_INTERVAL);
            debug!(attempt, "polling for checkout completion");

            match self.fetch_entitlements() {
                Ok(customer) if customer.entitlements.iter().any(|e| e.active) => {
                    return PurchaseOutcome::Success(customer);
                }
                Ok(_) => {}
                Err(SdkError::RequestFailed) => {
                    return PurchaseOutcome::Failed(PurchaseError::NetworkError);
                }
                // Transient backend trouble; keep polling.
                Err(err) => debug!("checkout poll failed: {err}"),
            }
        }

        PurchaseOutcome::Cancelled
    }

    fn restore(&self) -> PurchaseOutcome {
        match self.fetch_entitlements() {
            Ok(customer) => PurchaseOutcome::Success(customer),
            Err(err) => PurchaseOutcome::Failed(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::SigningKey;

    use super::*;

    fn signed_envelope(signing_key: &SigningKey, payload: &[u8]) -> SignedEnvelope {
        let signature: Signature = signing_key.sign(payload);
        SignedEnvelope {
            data: BASE64_STANDARD.encode(payload),
            signature: BASE64_STANDARD.encode(signature.to_bytes()),
        }
    }

    #[test]
    fn valid_envelope_verifies() {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let payload = br#"{"device_id":"abc","timestamp":1756100000,"entitlements":[]}"#;

        let envelope = signed_envelope(&signing_key, payload);
        let decoded = verify_envelope(signing_key.verifying_key(), &envelope).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let envelope = signed_envelope(&signing_key, b"original payload");

        let tampered = SignedEnvelope {
            data: BASE64_STANDARD.encode(b"forged payload"),
            signature: envelope.signature,
        };

        assert!(matches!(
            verify_envelope(signing_key.verifying_key(), &tampered),
            Err(SdkError::TamperedResponse)
        ));
    }

    #[test]
    fn garbage_signature_fails_to_decode() {
        let signing_key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let envelope = SignedEnvelope {
            data: BASE64_STANDARD.encode(b"payload"),
            signature: "!!! not base64 !!!".to_string(),
        };

        assert!(matches!(
            verify_envelope(signing_key.verifying_key(), &envelope),
            Err(SdkError::FailedToDecode)
        ));
    }
}

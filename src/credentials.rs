use serde::{Deserialize, Serialize};

use crate::error::TrackingError;

// Sendungsverfolgung endpoints of the DHL developer portal
pub const SANDBOX_ENDPOINT: &str = "https://cig.dhl.de/services/sandbox/rest/sendungsverfolgung";
pub const PRODUCTION_ENDPOINT: &str =
    "https://cig.dhl.de/services/production/rest/sendungsverfolgung";

/// Account data for the tracking service.
///
/// The API pair is embedded in the XML request body, the basic-auth pair
/// authenticates the HTTP call against the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credentials {
    pub api_user: String,
    pub api_password: String,
    pub basic_auth_user: String,
    pub basic_auth_password: String,
    pub endpoint: String,
}

impl Credentials {
    pub fn new(
        api_user: impl Into<String>,
        api_password: impl Into<String>,
        basic_auth_user: impl Into<String>,
        basic_auth_password: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_user: api_user.into(),
            api_password: api_password.into(),
            basic_auth_user: basic_auth_user.into(),
            basic_auth_password: basic_auth_password.into(),
            endpoint: endpoint.into(),
        }
    }

    // Load credentials from a JSON config document
    pub fn from_json(json_str: &str) -> Result<Self, TrackingError> {
        serde_json::from_str(json_str).map_err(|e| TrackingError::Config(e.to_string()))
    }
}

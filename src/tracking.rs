// Piece tracking client
use parking_lot::RwLock;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::error::TrackingError;
use crate::language::Language;
use crate::request_builder::{build_authenticated_request, build_public_request, Operation};
use crate::transport::{BasicAuth, HttpRequest, ReqwestTransport, Transport};
use crate::xml_map::{parse_document, Attributes, XmlNode, XmlValue};

pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

// Response paths, relative to the root element
const SUMMARY_PATH: &[&str] = &["data"];
const PUBLIC_SUMMARY_PATH: &[&str] = &["data", "data"];
const EVENTS_PATH: &[&str] = &["data", "data", "data"];

// Summary of a piece together with its tracking events, in reverse of the
// order the service returned them
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TrackingReport {
    pub details: Attributes,
    pub events: Vec<Attributes>,
}

#[derive(Debug, Clone)]
struct Settings {
    credentials: Credentials,
    timeout_secs: f64,
}

/// Client for the piece tracking endpoint.
///
/// Every operation builds one request document, performs a single GET and
/// reshapes the XML answer. Credentials and timeout can be swapped at any
/// time; a call uses the values current when it starts.
pub struct ShipmentTracker<T: Transport = ReqwestTransport> {
    settings: RwLock<Settings>,
    transport: T,
}

impl ShipmentTracker<ReqwestTransport> {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_timeout(credentials, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(credentials: Credentials, timeout_secs: f64) -> Self {
        Self::with_transport(credentials, timeout_secs, ReqwestTransport::new())
    }
}

impl<T: Transport> ShipmentTracker<T> {
    pub fn with_transport(credentials: Credentials, timeout_secs: f64, transport: T) -> Self {
        Self {
            settings: RwLock::new(Settings {
                credentials,
                timeout_secs,
            }),
            transport,
        }
    }

    pub fn set_credentials(&self, credentials: Credentials) -> &Self {
        self.settings.write().credentials = credentials;
        self
    }

    // Zero or a negative value disables the timeout
    pub fn set_timeout(&self, timeout_secs: f64) -> &Self {
        self.settings.write().timeout_secs = timeout_secs;
        self
    }

    pub fn credentials(&self) -> Credentials {
        self.settings.read().credentials.clone()
    }

    pub fn timeout(&self) -> f64 {
        self.settings.read().timeout_secs
    }

    // Summary attributes of a piece
    pub async fn get_details(
        &self,
        piece_number: &str,
        language: Option<&Language>,
    ) -> Result<Attributes, TrackingError> {
        let root = self
            .fetch(Operation::GetPiece, piece_number, language)
            .await?;
        summary(&root, SUMMARY_PATH)
    }

    pub async fn get_details_and_events(
        &self,
        piece_number: &str,
        language: Option<&Language>,
    ) -> Result<TrackingReport, TrackingError> {
        let root = self
            .fetch(Operation::GetPieceDetail, piece_number, language)
            .await?;

        Ok(TrackingReport {
            details: summary(&root, SUMMARY_PATH)?,
            events: collect_events(&root),
        })
    }

    // Proof of delivery attributes
    pub async fn get_signature(
        &self,
        piece_number: &str,
        language: Option<&Language>,
    ) -> Result<Attributes, TrackingError> {
        let root = self
            .fetch(Operation::Signature, piece_number, language)
            .await?;
        summary(&root, SUMMARY_PATH)
    }

    // Status as shown to anonymous users; the summary sits one level deeper
    pub async fn get_public_details(
        &self,
        piece_number: &str,
        language: Option<&Language>,
    ) -> Result<TrackingReport, TrackingError> {
        let root = self
            .fetch(Operation::StatusPublic, piece_number, language)
            .await?;

        Ok(TrackingReport {
            details: summary(&root, PUBLIC_SUMMARY_PATH)?,
            events: collect_events(&root),
        })
    }

    /// Performs `operation` for a piece and returns the parsed response root
    /// without any reshaping. `None` as language means English.
    pub async fn fetch(
        &self,
        operation: Operation,
        piece_number: &str,
        language: Option<&Language>,
    ) -> Result<XmlNode, TrackingError> {
        let language = language.cloned().unwrap_or_default();
        let request = self.build_http_request(operation, piece_number, &language)?;

        debug!(
            operation = %operation,
            piece = piece_number,
            language = %language,
            timeout = ?request.timeout,
            "requesting tracking report"
        );

        let body = self.transport.get(&request).await?;
        parse_document(&body)
    }

    /// Describes the GET performed for `operation`: the request document goes
    /// form-encoded into the `xml` query parameter.
    pub fn build_http_request(
        &self,
        operation: Operation,
        piece_number: &str,
        language: &Language,
    ) -> Result<HttpRequest, TrackingError> {
        let settings = self.settings.read().clone();
        let credentials = &settings.credentials;

        let build = if operation.is_public() {
            build_public_request
        } else {
            build_authenticated_request
        };
        let document = build(
            operation,
            &credentials.api_user,
            &credentials.api_password,
            language,
            piece_number,
        )?;

        let url = reqwest::Url::parse_with_params(&credentials.endpoint, &[("xml", &document)])
            .map_err(|e| {
                TrackingError::InvalidEndpoint(format!("{}: {}", credentials.endpoint, e))
            })?;

        Ok(HttpRequest {
            url: url.to_string(),
            basic_auth: BasicAuth {
                user: credentials.basic_auth_user.clone(),
                password: credentials.basic_auth_password.clone(),
            },
            timeout: request_timeout(settings.timeout_secs),
        })
    }
}

fn request_timeout(timeout_secs: f64) -> Option<Duration> {
    if timeout_secs > 0.0 {
        Duration::try_from_secs_f64(timeout_secs).ok()
    } else {
        None
    }
}

fn summary(root: &XmlNode, path: &[&str]) -> Result<Attributes, TrackingError> {
    match root.attributes_at(path) {
        Ok(attributes) => Ok(attributes.clone()),
        Err(e) => {
            warn!(error = %e, "tracking response without summary");
            Err(e)
        }
    }
}

// Event attributes in reverse document order. A missing or empty event list is
// not an error, a lone event counts as a list of one.
fn collect_events(root: &XmlNode) -> Vec<Attributes> {
    root.lookup(EVENTS_PATH)
        .filter(|events| !matches!(events, XmlValue::Single(node) if node.is_empty()))
        .map(|events| {
            events
                .nodes()
                .iter()
                .rev()
                .map(|event| event.attributes.clone())
                .collect()
        })
        .unwrap_or_default()
}

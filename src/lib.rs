// Client library for the DHL piece tracking (Sendungsverfolgung) service

pub mod credentials;
pub mod error;
pub mod language;
pub mod request_builder;
pub mod tracking;
pub mod transport;
pub mod xml_map;

// Re-export key types for convenience
pub use credentials::{Credentials, PRODUCTION_ENDPOINT, SANDBOX_ENDPOINT};
pub use error::TrackingError;
pub use language::Language;
pub use request_builder::{build_authenticated_request, build_public_request, Operation};
pub use tracking::{ShipmentTracker, TrackingReport, DEFAULT_TIMEOUT_SECS};
pub use transport::{BasicAuth, HttpRequest, ReqwestTransport, Transport};
pub use xml_map::{parse_document, Attributes, XmlNode, XmlValue};

// Request documents for the piece tracking endpoint
use serde::Serialize;
use std::fmt;

use crate::error::TrackingError;
use crate::language::Language;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

// Report types the service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetPiece,
    GetPieceDetail,
    Signature,
    StatusPublic,
}

impl Operation {
    pub fn code(&self) -> &'static str {
        match self {
            Operation::GetPiece => "d-get-piece",
            Operation::GetPieceDetail => "d-get-piece-detail",
            Operation::Signature => "d-get-signature",
            Operation::StatusPublic => "get-status-for-public-user",
        }
    }

    // The public status query wraps the piece code in a nested element
    pub fn is_public(&self) -> bool {
        matches!(self, Operation::StatusPublic)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// <data appname=".." password=".." request=".." language-code=".." piece-code=".."/>
#[derive(Debug, Serialize)]
#[serde(rename = "data")]
struct XmlPieceRequest<'a> {
    #[serde(rename = "@appname")]
    appname: &'a str,
    #[serde(rename = "@password")]
    password: &'a str,
    #[serde(rename = "@request")]
    request: &'a str,
    #[serde(rename = "@language-code")]
    language_code: &'a str,
    #[serde(rename = "@piece-code")]
    piece_code: &'a str,
}

// <data appname=".." password=".." request=".." language-code=".."><data piece-code=".."/></data>
#[derive(Debug, Serialize)]
#[serde(rename = "data")]
struct XmlPublicRequest<'a> {
    #[serde(rename = "@appname")]
    appname: &'a str,
    #[serde(rename = "@password")]
    password: &'a str,
    #[serde(rename = "@request")]
    request: &'a str,
    #[serde(rename = "@language-code")]
    language_code: &'a str,
    data: XmlPieceCode<'a>,
}

#[derive(Debug, Serialize)]
struct XmlPieceCode<'a> {
    #[serde(rename = "@piece-code")]
    piece_code: &'a str,
}

fn to_document<T: Serialize>(request: &T) -> Result<String, TrackingError> {
    let body = quick_xml::se::to_string(request)
        .map_err(|e| TrackingError::Serialization(e.to_string()))?;
    Ok(format!("{}{}", XML_DECLARATION, body))
}

/// Builds the request document for the operations that need API credentials
/// in the body. Values are escaped by the serializer.
pub fn build_authenticated_request(
    operation: Operation,
    api_user: &str,
    api_password: &str,
    language: &Language,
    piece_number: &str,
) -> Result<String, TrackingError> {
    to_document(&XmlPieceRequest {
        appname: api_user,
        password: api_password,
        request: operation.code(),
        language_code: language.as_str(),
        piece_code: piece_number,
    })
}

/// Builds the request document in the envelope the public status query expects.
pub fn build_public_request(
    operation: Operation,
    api_user: &str,
    api_password: &str,
    language: &Language,
    piece_number: &str,
) -> Result<String, TrackingError> {
    to_document(&XmlPublicRequest {
        appname: api_user,
        password: api_password,
        request: operation.code(),
        language_code: language.as_str(),
        data: XmlPieceCode {
            piece_code: piece_number,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_map::parse_document;
    use test_case::test_case;

    #[test_case(Operation::GetPiece, "d-get-piece"; "piece")]
    #[test_case(Operation::GetPieceDetail, "d-get-piece-detail"; "piece detail")]
    #[test_case(Operation::Signature, "d-get-signature"; "signature")]
    #[test_case(Operation::StatusPublic, "get-status-for-public-user"; "public status")]
    fn test_operation_codes(operation: Operation, expected: &str) {
        assert_eq!(operation.code(), expected);
        assert_eq!(operation.to_string(), expected);
    }

    #[test]
    fn test_authenticated_request_round_trip() {
        let xml = build_authenticated_request(
            Operation::GetPieceDetail,
            "zt12345",
            "geheim",
            &Language::En,
            "1234567890",
        )
        .unwrap();

        assert!(xml.starts_with(XML_DECLARATION));

        let root = parse_document(&xml).unwrap();
        assert_eq!(root.attributes["piece-code"], "1234567890");
        assert_eq!(root.attributes["language-code"], "en");
        assert_eq!(root.attributes["request"], "d-get-piece-detail");
        assert_eq!(root.attributes["appname"], "zt12345");
        assert_eq!(root.attributes["password"], "geheim");
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_public_request_nests_piece_code() {
        let xml = build_public_request(
            Operation::StatusPublic,
            "zt12345",
            "geheim",
            &Language::De,
            "1234567890",
        )
        .unwrap();

        let root = parse_document(&xml).unwrap();
        assert_eq!(root.attributes["request"], "get-status-for-public-user");
        assert_eq!(root.attributes["language-code"], "de");
        assert!(!root.attributes.contains_key("piece-code"));

        let piece = root.attributes_at(&["data"]).unwrap();
        assert_eq!(piece["piece-code"], "1234567890");
    }

    #[test]
    fn test_request_values_are_escaped() {
        let xml = build_authenticated_request(
            Operation::GetPiece,
            "user&co",
            "p<w",
            &Language::En,
            "12<34>&56",
        )
        .unwrap();

        assert!(!xml.contains("12<34"));

        let root = parse_document(&xml).unwrap();
        assert_eq!(root.attributes["piece-code"], "12<34>&56");
        assert_eq!(root.attributes["appname"], "user&co");
        assert_eq!(root.attributes["password"], "p<w");
    }
}

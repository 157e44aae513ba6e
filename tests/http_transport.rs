// Runs the tracker over real HTTP against a minimal local server
use dhl_shipment_tracking::{
    parse_document, Credentials, Language, ShipmentTracker, TrackingError,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const DETAIL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<data name="piece-shipment-list" code="0">
  <data name="piece-shipment" piece-code="000" status="Die Sendung wurde zugestellt.">
    <data name="piece-event-list">
      <data name="piece-event" event-timestamp="18.03.2016 10:02" ice="SHRCU"/>
      <data name="piece-event" event-timestamp="21.03.2016 12:31" ice="DLVRD"/>
    </data>
  </data>
</data>"#;

// Accepts one connection, hands the raw request head to the test and answers
// with `status` and `body`.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let _ = tx.send(String::from_utf8_lossy(&head).into_owned());

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (format!("http://{}/rest/sendungsverfolgung", addr), rx)
}

fn credentials(endpoint: &str) -> Credentials {
    Credentials::new("a", "b", "u", "p", endpoint)
}

#[tokio::test]
async fn test_signature_over_http() {
    let (endpoint, head) = serve_once("200 OK", DETAIL_XML).await;
    let tracker = ShipmentTracker::new(credentials(&endpoint));

    let result = tracker.get_signature("000", None).await;
    assert!(result.is_ok(), "Request failed: {:?}", result.err());
    assert_eq!(result.unwrap()["piece-code"], "000");

    let head = head.await.unwrap();
    let request_line = head.lines().next().unwrap();
    assert!(request_line.starts_with("GET /rest/sendungsverfolgung?xml="));

    // base64("u:p")
    assert!(head
        .lines()
        .any(|line| line.eq_ignore_ascii_case("authorization: Basic dTpw")));

    let path = request_line.split_whitespace().nth(1).unwrap();
    let url = reqwest::Url::parse(&format!("http://localhost{}", path)).unwrap();
    let xml = url
        .query_pairs()
        .find(|(key, _)| key == "xml")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    let document = parse_document(&xml).unwrap();
    assert_eq!(document.attributes["request"], "d-get-signature");
    assert_eq!(document.attributes["appname"], "a");
    assert_eq!(document.attributes["password"], "b");
    assert_eq!(document.attributes["piece-code"], "000");
    assert_eq!(document.attributes["language-code"], "en");
}

#[tokio::test]
async fn test_details_and_events_over_http() {
    let (endpoint, _head) = serve_once("200 OK", DETAIL_XML).await;
    let tracker = ShipmentTracker::with_timeout(credentials(&endpoint), 0.0);

    let report = tracker
        .get_details_and_events("000", Some(&Language::De))
        .await
        .unwrap();

    assert_eq!(report.details["status"], "Die Sendung wurde zugestellt.");
    assert_eq!(report.events.len(), 2);
    assert_eq!(report.events[0]["ice"], "DLVRD");
    assert_eq!(report.events[1]["ice"], "SHRCU");
}

#[tokio::test]
async fn test_server_error_status_is_transport_error() {
    let (endpoint, _head) = serve_once("500 Internal Server Error", "oops").await;
    let tracker = ShipmentTracker::new(credentials(&endpoint));

    match tracker.get_details("000", None).await {
        Err(TrackingError::Transport(e)) => {
            assert_eq!(e.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind and drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tracker = ShipmentTracker::new(credentials(&format!("http://{}/x", addr)));
    let result = tracker.get_details("000", None).await;
    assert!(matches!(result, Err(TrackingError::Transport(_))));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and never answer
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let tracker = ShipmentTracker::with_timeout(credentials(&format!("http://{}/x", addr)), 0.2);
    match tracker.get_details("000", None).await {
        Err(TrackingError::Transport(e)) => assert!(e.is_timeout()),
        other => panic!("Expected timeout, got {:?}", other),
    }
}

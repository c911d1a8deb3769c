//! End-to-end tests of the HTTP oracle against a local stub endpoint.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use urbanium_core::{DecisionOracle, OracleError, OracleRequest};
use urbanium_oracle::{LlmOracle, OracleConfig};
use urbanium_types::{ActionType, TimeOfDay};
use urbanium_world::{City, CityConfig, generate_city};

/// Read one HTTP request (headers plus `Content-Length` body).
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve a single chat completion whose message content is `content`.
async fn serve_once(content: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string();
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
        request
    });
    (format!("http://{addr}/v1"), handle)
}

fn oracle_for(api_base: String) -> LlmOracle {
    let config = OracleConfig {
        api_base,
        model: String::from("stub-model"),
        ..OracleConfig::default()
    };
    LlmOracle::with_api_key(config, String::from("test-key")).unwrap()
}

fn sample_city() -> City {
    let config = CityConfig {
        population: 8,
        ..CityConfig::default()
    };
    generate_city(&config, 11).unwrap()
}

fn request<'a>(city: &'a City, available: &'a [ActionType]) -> OracleRequest<'a> {
    OracleRequest {
        tick: 3,
        time: Utc.with_ymd_and_hms(2025, 1, 6, 3, 0, 0).unwrap(),
        time_of_day: TimeOfDay::Night,
        is_working_hours: false,
        citizen: city.citizens.values().next().unwrap(),
        city,
        available,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn proposal_is_parsed_from_completion() {
    let (api_base, server) =
        serve_once(r#"{"action": "rest", "reasoning": "late night", "confidence": 0.7}"#).await;
    let mut oracle = oracle_for(api_base);
    let city = sample_city();
    let available = [ActionType::Rest, ActionType::Eat];

    let proposal = oracle
        .propose_action(&request(&city, &available), Duration::from_secs(5))
        .unwrap();

    assert_eq!(proposal.action, "rest");
    assert_eq!(proposal.reasoning.as_deref(), Some("late night"));

    let sent = server.await.unwrap();
    assert!(sent.starts_with("POST /v1/chat/completions"));
    assert!(sent.to_ascii_lowercase().contains("authorization: bearer test-key"));
    assert!(sent.contains("stub-model"));
    assert!(sent.contains("- rest"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn silent_endpoint_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _request = read_request(&mut stream).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let mut oracle = oracle_for(format!("http://{addr}/v1"));
    let city = sample_city();
    let available = [ActionType::Rest];

    let result = oracle.propose_action(&request(&city, &available), Duration::from_millis(100));
    assert_eq!(result, Err(OracleError::Timeout { timeout_ms: 100 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_endpoint_is_a_transport_fault() {
    // Bind then drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let mut oracle = oracle_for(format!("http://{addr}/v1"));
    let city = sample_city();
    let available = [ActionType::Rest];

    let result = oracle.propose_action(&request(&city, &available), Duration::from_secs(5));
    assert!(matches!(result, Err(OracleError::Transport { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn prose_reply_is_malformed() {
    let (api_base, _server) = serve_once("Honestly they should go for a swim.").await;
    let mut oracle = oracle_for(api_base);
    let city = sample_city();
    let available = [ActionType::Socialize];

    let result = oracle.propose_action(&request(&city, &available), Duration::from_secs(5));
    assert!(matches!(result, Err(OracleError::Malformed { .. })));
}

#[tokio::test]
async fn current_thread_runtime_is_unavailable() {
    let mut oracle = oracle_for(String::from("http://127.0.0.1:9/v1"));
    let city = sample_city();
    let available = [ActionType::Rest];

    let result = oracle.propose_action(&request(&city, &available), Duration::from_secs(1));
    assert!(matches!(result, Err(OracleError::Unavailable { .. })));
}

#[test]
fn no_runtime_is_unavailable() {
    let mut oracle = oracle_for(String::from("http://127.0.0.1:9/v1"));
    let city = sample_city();
    let available = [ActionType::Rest];

    let result = oracle.propose_action(&request(&city, &available), Duration::from_secs(1));
    assert!(matches!(result, Err(OracleError::Unavailable { .. })));
}

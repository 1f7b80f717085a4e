use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::{
    config::{SERPAPI_ENV_VAR, Settings},
    error::{Result, TubenoteError},
    types::{NOT_AVAILABLE, SearchResult, UNKNOWN},
};

pub const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const PROVIDER: &str = "SerpApi";

/// Keyword search over a video provider.
pub trait VideoSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// SerpApi's YouTube engine.
pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl SerpApiClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint: SERPAPI_URL.to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.search_api_key.clone(), settings.search_timeout)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl VideoSearch for SerpApiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TubenoteError::MissingApiKey {
                env_var: SERPAPI_ENV_VAR.to_string(),
            });
        };
        let limit = limit.max(1);
        let num = limit.to_string();

        debug!(query, limit, "requesting video search");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("engine", "youtube"),
                ("search_query", query),
                ("api_key", api_key),
                ("num", num.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| TubenoteError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TubenoteError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: provider_error_message(&body),
            });
        }

        let payload = response
            .json::<Value>()
            .await
            .map_err(|e| TubenoteError::from_reqwest(PROVIDER, e))?;

        normalize_results(&payload, limit)
    }
}

/// Flatten a SerpApi payload into at most `limit` results.
pub fn normalize_results(payload: &Value, limit: usize) -> Result<Vec<SearchResult>> {
    let Some(object) = payload.as_object() else {
        return Err(TubenoteError::MalformedPayload {
            provider: PROVIDER,
            reason: "response is not a JSON object".to_string(),
        });
    };

    if let Some(message) = object.get("error").and_then(Value::as_str) {
        return Err(TubenoteError::ProviderRejected {
            provider: PROVIDER,
            message: message.to_string(),
        });
    }

    let videos = match object.get("video_results") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(videos)) => videos,
        Some(_) => {
            return Err(TubenoteError::MalformedPayload {
                provider: PROVIDER,
                reason: "video_results is not a list".to_string(),
            });
        }
    };

    Ok(videos
        .iter()
        .take(limit.max(1))
        .map(normalize_video)
        .collect())
}

fn normalize_video(video: &Value) -> SearchResult {
    let channel = match video.get("channel") {
        Some(Value::Object(channel)) => channel.get("name").and_then(scalar_text),
        Some(other) => scalar_text(other),
        None => None,
    };

    SearchResult {
        title: field(video, "title").unwrap_or_else(|| UNKNOWN.to_string()),
        link: field(video, "link").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        channel: channel.unwrap_or_else(|| UNKNOWN.to_string()),
        duration: field(video, "duration")
            .or_else(|| field(video, "length"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        views: field(video, "views").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

fn field(video: &Value, key: &str) -> Option<String> {
    video.get(key).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    const KEY: &str = "sk-serp-secret-123";

    fn read_request(stream: &mut impl Read) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
    }

    /// Serves one canned HTTP response and returns the endpoint URL.
    fn serve_once(status_line: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/search.json")
    }

    fn client(endpoint: String, timeout: Duration) -> SerpApiClient {
        SerpApiClient::new(Some(KEY.to_string()), timeout).with_endpoint(endpoint)
    }

    fn assert_key_hidden(err: &TubenoteError) {
        assert!(!err.to_string().contains(KEY), "key leaked: {err}");
        assert!(!format!("{err:?}").contains(KEY), "key leaked: {err:?}");
    }

    #[test]
    fn flattens_nested_and_scalar_channels() {
        let payload = json!({
            "video_results": [
                {
                    "title": "Rust in 100 seconds",
                    "link": "https://www.youtube.com/watch?v=5C_HPTJg5ek",
                    "channel": {"name": "Fireship", "link": "https://www.youtube.com/@Fireship"},
                    "length": "2:29",
                    "views": 2_100_000
                },
                {
                    "title": "Ownership explained",
                    "link": "https://www.youtube.com/watch?v=abc",
                    "channel": "Let's Get Rusty",
                    "duration": "14:02",
                    "views": "120K views"
                }
            ]
        });

        let results = normalize_results(&payload, 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].channel, "Fireship");
        assert_eq!(results[0].duration, "2:29");
        assert_eq!(results[0].views, "2100000");
        assert_eq!(results[1].channel, "Let's Get Rusty");
        assert_eq!(results[1].duration, "14:02");
        assert_eq!(results[1].views, "120K views");
    }

    #[test]
    fn missing_fields_default_to_sentinels() {
        let payload = json!({"video_results": [{"channel": {}}]});
        let results = normalize_results(&payload, 1).unwrap();
        assert_eq!(
            results[0],
            SearchResult {
                title: "Unknown".into(),
                link: "N/A".into(),
                channel: "Unknown".into(),
                duration: "N/A".into(),
                views: "N/A".into(),
            }
        );
    }

    #[test]
    fn truncates_to_limit() {
        let payload = json!({
            "video_results": [
                {"title": "one"}, {"title": "two"}, {"title": "three"}
            ]
        });
        let results = normalize_results(&payload, 2).unwrap();
        let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["one", "two"]);

        let results = normalize_results(&payload, 0).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn absent_video_results_is_empty_success() {
        let results = normalize_results(&json!({"search_metadata": {}}), 3).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn bad_shapes_are_data_errors() {
        let err = normalize_results(&json!(["not", "an", "object"]), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);

        let err = normalize_results(&json!({"video_results": "nope"}), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataShape);
    }

    #[test]
    fn provider_error_field_is_rejection() {
        let err = normalize_results(&json!({"error": "Invalid API key."}), 1).unwrap_err();
        assert!(matches!(err, TubenoteError::ProviderRejected { .. }));
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = SerpApiClient::new(None, Duration::from_secs(1))
            .with_endpoint("http://127.0.0.1:9/unreachable");
        let err = client.search("rust", 1).await.unwrap_err();
        assert!(matches!(
            err,
            TubenoteError::MissingApiKey { ref env_var } if env_var == "SERPAPI_API_KEY"
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn status_body_prefers_error_field() {
        assert_eq!(
            provider_error_message(r#"{"error": "Your account has run out of searches."}"#),
            "Your account has run out of searches."
        );
        assert_eq!(provider_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn server_error_status_is_transient() {
        let endpoint = serve_once("500 Internal Server Error", r#"{"error": "backend down"}"#);
        let err = client(endpoint, Duration::from_secs(5))
            .search("rust", 1)
            .await
            .unwrap_err();

        match &err {
            TubenoteError::Status { status, body, .. } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "backend down");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn invalid_json_body_is_malformed_payload() {
        let endpoint = serve_once("200 OK", "<html>not json</html>");
        let err = client(endpoint, Duration::from_secs(5))
            .search("rust", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, TubenoteError::MalformedPayload { .. }));
        assert_eq!(err.kind(), ErrorKind::DataShape);
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                read_request(&mut stream);
                thread::sleep(Duration::from_secs(3));
            }
        });

        let err = client(format!("http://{addr}/search.json"), Duration::from_millis(300))
            .search("rust", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, TubenoteError::Timeout { provider: "SerpApi" }));
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[tokio::test]
    async fn refused_connection_hides_api_key() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let err = client(format!("http://{addr}/search.json"), Duration::from_secs(2))
            .search("rust", 1)
            .await
            .unwrap_err();

        assert!(matches!(err, TubenoteError::Connection { .. }));
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_key_hidden(&err);
    }

    #[tokio::test]
    async fn successful_response_is_normalized() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"video_results": [{"title": "Async Rust", "link": "https://youtu.be/a"}]}"#,
        );
        let results = client(endpoint, Duration::from_secs(5))
            .search("async rust", 3)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Async Rust");
        assert_eq!(results[0].channel, "Unknown");
    }
}

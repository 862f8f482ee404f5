use std::sync::Mutex;
use std::time::Duration;

use super::types::{GenerateContentRequest, GenerateContentResponse};
use super::{Oracle, OracleError};
use crate::config::AppConfig;

/// Longest error body kept in `OracleError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Blocking HTTP client for the Gemini `generateContent` endpoint.
///
/// Every call is bounded by `timeout_secs`; callers on an async runtime run
/// it inside `spawn_blocking`.
pub struct GeminiClient {
    api_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        api_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, OracleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OracleError::Client(e.to_string()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, OracleError> {
        Self::new(
            &config.gemini_api_url,
            config.gemini_api_key.clone(),
            config.oracle_timeout_secs,
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            OracleError::Transport(e.to_string())
        }
    }
}

impl Oracle for GeminiClient {
    fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, OracleError> {
        let mut builder = self.client.post(&self.api_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }

        let response = builder.send().map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(e)
            } else {
                OracleError::BodyRead(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| OracleError::Decode(e.to_string()))
    }
}

type ErrorFactory = Box<dyn Fn() -> OracleError + Send + Sync>;

/// Mock oracle for testing — returns a configured envelope or error and
/// records every request it receives.
pub struct MockOracle {
    outcome: Result<GenerateContentResponse, ErrorFactory>,
    requests: Mutex<Vec<GenerateContentRequest>>,
}

impl MockOracle {
    pub fn new(response: GenerateContentResponse) -> Self {
        Self {
            outcome: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Mock answering every request with a single text candidate.
    pub fn with_text(text: &str) -> Self {
        Self::new(GenerateContentResponse::with_text(text))
    }

    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> OracleError + Send + Sync + 'static,
    {
        Self {
            outcome: Err(Box::new(make_error)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Oracle for MockOracle {
    fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, OracleError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.outcome {
            Ok(response) => Ok(response.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{ask, build_request, NO_RESPONSE_SENTINEL};
    use std::collections::HashMap;
    use std::net::SocketAddr;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    /// Serve `router` on an ephemeral port from a dedicated runtime thread.
    fn spawn_stub(router: Router) -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, router).await.unwrap();
            });
        });
        addr
    }

    async fn echo(
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        let parts = body["contents"][0]["parts"].as_array().map(|p| p.len()).unwrap_or(0);
        let mime = body["contents"][0]["parts"][1]["inline_data"]["mime_type"]
            .as_str()
            .unwrap_or("none")
            .to_string();
        let key = query.get("key").cloned().unwrap_or_default();
        Json(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": format!("key={key};parts={parts};mime={mime}")}]}
            }]
        }))
    }

    fn stub_router() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/empty", post(|| async { "{}" }))
            .route(
                "/fail",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded") }),
            )
            .route("/garbage", post(|| async { "this is not json" }))
            .route(
                "/slow",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "{}"
                }),
            )
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GeminiClient::new("http://localhost:1234/gen/", None, 5).unwrap();
        assert_eq!(client.api_url, "http://localhost:1234/gen");
        assert_eq!(client.timeout_secs, 5);
    }

    #[test]
    fn sends_key_and_inline_image() {
        let addr = spawn_stub(stub_router());
        let client =
            GeminiClient::new(&format!("http://{addr}/echo"), Some("k123".into()), 5).unwrap();

        let text = ask(&client, "Analyze", Some(&[0xFF, 0xD8, 0xFF, 0xE0])).unwrap();
        assert_eq!(text, "key=k123;parts=2;mime=image/jpeg");
    }

    #[test]
    fn empty_envelope_yields_sentinel() {
        let addr = spawn_stub(stub_router());
        let client = GeminiClient::new(&format!("http://{addr}/empty"), None, 5).unwrap();

        assert_eq!(ask(&client, "X", None).unwrap(), NO_RESPONSE_SENTINEL);
    }

    #[test]
    fn non_success_status_is_status_error() {
        let addr = spawn_stub(stub_router());
        let client = GeminiClient::new(&format!("http://{addr}/fail"), None, 5).unwrap();

        let err = client.generate(&build_request("X", None).unwrap()).unwrap_err();
        match err {
            OracleError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let addr = spawn_stub(stub_router());
        let client = GeminiClient::new(&format!("http://{addr}/garbage"), None, 5).unwrap();

        let err = client.generate(&build_request("X", None).unwrap()).unwrap_err();
        assert!(matches!(err, OracleError::Decode(_)));
    }

    #[test]
    fn slow_endpoint_times_out() {
        let addr = spawn_stub(stub_router());
        let client = GeminiClient::new(&format!("http://{addr}/slow"), None, 1).unwrap();

        let err = client.generate(&build_request("X", None).unwrap()).unwrap_err();
        assert!(matches!(err, OracleError::Timeout { secs: 1 }));
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = GeminiClient::new(&format!("http://127.0.0.1:{port}/x"), None, 2).unwrap();

        let err = client.generate(&build_request("X", None).unwrap()).unwrap_err();
        assert!(matches!(err, OracleError::Transport(_)));
    }

    #[test]
    fn mock_records_requests() {
        let oracle = MockOracle::with_text("ok");
        assert_eq!(ask(&oracle, "first", None).unwrap(), "ok");
        assert_eq!(ask(&oracle, "second", None).unwrap(), "ok");
        assert_eq!(oracle.call_count(), 2);
        let last = oracle.last_request().unwrap();
        assert_eq!(
            last.contents[0].parts[0],
            crate::oracle::Part::Text { text: "second".into() }
        );
    }
}

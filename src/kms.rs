use std::time::Duration;

use reqwest::{multipart, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Multipart field the backend reads the PDF from.
pub const UPLOAD_FIELD: &str = "pdf-upload";

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
    platform: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the KMS backend (`/ask` and `/upload`).
#[derive(Clone)]
pub struct KmsClient {
    client: Client,
    base_url: String,
}

impl KmsClient {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ask(&self, question: &str, platform: &str) -> Result<String, ClientError> {
        let url = format!("{}/ask", self.base_url);
        debug!(%url, platform, "sending question");

        let response = self
            .client
            .post(&url)
            .json(&AskRequest { question, platform })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(response).await);
        }

        let body: AskResponse = response.json().await?;
        match (non_empty(body.answer), non_empty(body.error)) {
            (Some(answer), _) => Ok(answer),
            (None, Some(error)) => {
                warn!(%error, "backend reported an error");
                Err(ClientError::Server(error))
            }
            (None, None) => Err(ClientError::EmptyResponse),
        }
    }

    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ClientError> {
        let url = format!("{}/upload", self.base_url);
        debug!(%url, file_name, size = bytes.len(), "uploading file");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(response).await);
        }

        let body: UploadResponse = response.json().await?;
        match (non_empty(body.message), non_empty(body.error)) {
            (Some(message), _) => Ok(message),
            (None, Some(error)) => Err(ClientError::Server(error)),
            (None, None) => Ok(format!("File '{}' uploaded.", file_name)),
        }
    }
}

/// Build the error for a non-2xx response, preferring the body's `error`
/// field and falling back to the status text. Never fails.
async fn http_error(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| non_empty(b.error))
        .unwrap_or_else(|| status_text(status));

    warn!(status = status.as_u16(), %message, "request failed");
    ClientError::Http {
        status: status.as_u16(),
        message,
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> KmsClient {
        KmsClient::new(&server.uri(), None).unwrap()
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_json(serde_json::json!({
                "question": "what is the leave policy?",
                "platform": "gemini",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "42" })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server)
            .ask("what is the leave policy?", "gemini")
            .await
            .unwrap();
        assert_eq!(answer, "42");
    }

    #[tokio::test]
    async fn test_ask_error_field_with_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "bad request" })))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("q", "gemini").await.unwrap_err();
        assert!(matches!(err, ClientError::Server(ref e) if e == "bad request"));
        assert!(err.to_string().contains("bad request"));
    }

    #[tokio::test]
    async fn test_ask_empty_body_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("q", "gemini").await.unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_ask_http_error_with_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("q", "gemini").await.unwrap_err();
        assert_eq!(err.to_string(), "Error 500: Internal Server Error");
    }

    #[tokio::test]
    async fn test_ask_http_error_uses_body_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({ "error": "Unauthorized" })))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("q", "gemini").await.unwrap_err();
        match err {
            ClientError::Http { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ask_success_status_with_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).ask("q", "gemini").await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_ask_network_failure_carries_reason() {
        // Bind and drop a listener to get a port nobody is serving.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = KmsClient::new(&format!("http://127.0.0.1:{port}"), None).unwrap();

        let err = client.ask("q", "gemini").await.unwrap_err();
        match &err {
            ClientError::Network(reason) => assert!(!reason.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Could not reach the server"));
    }

    #[tokio::test]
    async fn test_ask_times_out_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "answer": "late" }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = KmsClient::new(&server.uri(), Some(Duration::from_millis(100))).unwrap();
        let err = client.ask("q", "gemini").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn test_upload_sends_pdf_field_and_returns_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(body_string_contains("name=\"pdf-upload\""))
            .and(body_string_contains("filename=\"handbook.pdf\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "message": "File 'handbook.pdf' received." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let message = client_for(&server)
            .upload("handbook.pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        assert_eq!(message, "File 'handbook.pdf' received.");
    }

    #[tokio::test]
    async fn test_upload_forbidden_surfaces_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({ "error": "Forbidden - Admin access required" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload("handbook.pdf", b"%PDF".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error 403: Forbidden - Admin access required");
    }

    #[tokio::test]
    async fn test_upload_success_status_with_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload("a.pdf", b"%PDF".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_upload_json_without_message_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let message = client_for(&server)
            .upload("a.pdf", b"%PDF".to_vec())
            .await
            .unwrap();
        assert_eq!(message, "File 'a.pdf' uploaded.");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = KmsClient::new("http://localhost:5000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}

use crate::models::{EmailDraft, EmailStats, GenerateRequest, GenerateResponse};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// The operations the email backend offers.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_emails(&self) -> Result<Vec<EmailDraft>>;
    async fn stats(&self) -> Result<EmailStats>;
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse>;
    async fn update_draft(&self, id: i64, content: &str) -> Result<()>;
    async fn send_draft(&self, id: i64) -> Result<()>;
    async fn delete_email(&self, id: i64) -> Result<()>;
    async fn health(&self) -> Result<()>;
}

#[derive(Serialize)]
struct UpdateDraftBody<'a> {
    content: &'a str,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(endpoint: &str, sent: reqwest::Result<Response>) -> Result<Response> {
        let response = sent.map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "backend rejected request");
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(endpoint, status = status.as_u16(), "backend request ok");
        Ok(response)
    }

    async fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
        response.json().await.map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn list_emails(&self) -> Result<Vec<EmailDraft>> {
        let endpoint = "/emails";
        let response = Self::check(endpoint, self.http.get(self.url(endpoint)).send().await)?;
        Self::decode(endpoint, response).await
    }

    async fn stats(&self) -> Result<EmailStats> {
        let endpoint = "/stats";
        let response = Self::check(endpoint, self.http.get(self.url(endpoint)).send().await)?;
        Self::decode(endpoint, response).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let endpoint = "/generate";
        debug!(
            recipient = %request.recipient,
            tone = %request.tone,
            kind = request.email_type.as_str(),
            "generating draft"
        );
        let sent = self
            .http
            .post(self.url(endpoint))
            .form(&request.form_fields()[..])
            .send()
            .await;
        let response = Self::check(endpoint, sent)?;
        Self::decode(endpoint, response).await
    }

    async fn update_draft(&self, id: i64, content: &str) -> Result<()> {
        let endpoint = format!("/update_draft/{}", id);
        let sent = self
            .http
            .post(self.url(&endpoint))
            .json(&UpdateDraftBody { content })
            .send()
            .await;
        Self::check(&endpoint, sent)?;
        Ok(())
    }

    async fn send_draft(&self, id: i64) -> Result<()> {
        let endpoint = format!("/send/{}", id);
        Self::check(&endpoint, self.http.post(self.url(&endpoint)).send().await)?;
        Ok(())
    }

    async fn delete_email(&self, id: i64) -> Result<()> {
        let endpoint = format!("/emails/{}", id);
        Self::check(&endpoint, self.http.delete(self.url(&endpoint)).send().await)?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let endpoint = "/health";
        Self::check(endpoint, self.http.get(self.url(endpoint)).send().await)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory backend that records every call it receives.

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeBackend {
        pub emails: Mutex<Vec<EmailDraft>>,
        pub stats: Mutex<EmailStats>,
        pub next_draft_id: Mutex<Option<i64>>,
        pub next_content: Mutex<Option<String>>,
        pub updates: Mutex<Vec<(i64, String)>>,
        pub fail: Mutex<Vec<&'static str>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub fn with_emails(emails: Vec<EmailDraft>) -> Self {
            let fake = Self::default();
            *fake.emails.lock().unwrap() = emails;
            fake
        }

        pub fn failing(self, op: &'static str) -> Self {
            self.fail.lock().unwrap().push(op);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn updates(&self) -> Vec<(i64, String)> {
            self.updates.lock().unwrap().clone()
        }

        fn record(&self, call: String, op: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(call.clone());
            if self.fail.lock().unwrap().contains(&op) {
                return Err(ApiError::Status {
                    endpoint: call,
                    status: 500,
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn list_emails(&self) -> Result<Vec<EmailDraft>> {
            self.record("GET /emails".into(), "list")?;
            Ok(self.emails.lock().unwrap().clone())
        }

        async fn stats(&self) -> Result<EmailStats> {
            self.record("GET /stats".into(), "stats")?;
            Ok(self.stats.lock().unwrap().clone())
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
            self.record("POST /generate".into(), "generate")?;
            let content = self.next_content.lock().unwrap().clone();
            Ok(GenerateResponse {
                content: content.unwrap_or_else(|| {
                    format!("Generated for {}: {}", request.recipient, request.prompt)
                }),
                draft_id: *self.next_draft_id.lock().unwrap(),
            })
        }

        async fn update_draft(&self, id: i64, content: &str) -> Result<()> {
            self.record(format!("POST /update_draft/{}", id), "update")?;
            self.updates.lock().unwrap().push((id, content.to_string()));
            Ok(())
        }

        async fn send_draft(&self, id: i64) -> Result<()> {
            self.record(format!("POST /send/{}", id), "send")
        }

        async fn delete_email(&self, id: i64) -> Result<()> {
            self.record(format!("DELETE /emails/{}", id), "delete")?;
            self.emails.lock().unwrap().retain(|e| e.id != id);
            Ok(())
        }

        async fn health(&self) -> Result<()> {
            self.record("GET /health".into(), "health")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailType, Tone};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerateRequest {
        GenerateRequest {
            prompt: "Ask for a deadline extension".into(),
            recipient: "boss@co.com".into(),
            tone: Tone::Apologetic,
            email_type: EmailType::General,
        }
    }

    #[tokio::test]
    async fn test_list_emails_decodes_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 1,
                "prompt": "p",
                "content": "c",
                "recipient": "contact@acme.com",
                "tone": "formal",
                "type": "general",
                "status": "sent",
                "created_at": "2024-01-01T00:00:00"
            }])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let emails = client.list_emails().await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].recipient, "contact@acme.com");
    }

    #[tokio::test]
    async fn test_list_emails_keeps_rows_with_unknown_tone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "recipient": "a@acme.com", "tone": "formal", "status": "sent"},
                {"id": 2, "recipient": "b@acme.com", "tone": "professional", "status": "draft"}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let emails = client.list_emails().await.unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].known_tone(), Some(Tone::Formal));
        assert_eq!(emails[1].tone, "professional");
        assert_eq!(emails[1].known_tone(), None);
    }

    #[tokio::test]
    async fn test_generate_posts_form_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("recipient=boss%40co.com"))
            .and(body_string_contains("tone=apologetic"))
            .and(body_string_contains("type=general"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": "Dear boss", "draft_id": 42})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        let response = client.generate(&request()).await.unwrap();
        assert_eq!(response.content, "Dear boss");
        assert_eq!(response.draft_id, Some(42));
    }

    #[tokio::test]
    async fn test_update_draft_sends_json_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update_draft/9"))
            .and(body_json(json!({"content": "edited"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&format!("{}/", server.uri()));
        client.update_draft(9, "edited").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send/3"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        match client.send_draft(3).await {
            Err(ApiError::Status { endpoint, status }) => {
                assert_eq!(endpoint, "/send/3");
                assert_eq!(status, 502);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_uses_delete_method() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/emails/2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        client.delete_email(2).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri());
        assert!(matches!(
            client.stats().await,
            Err(ApiError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.health().await,
            Err(ApiError::Transport { .. })
        ));
    }
}

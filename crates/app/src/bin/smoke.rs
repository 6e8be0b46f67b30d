//! Manual smoke test against a running contact relay.
//!
//! Reads `SMOKE_BASE_URL` (default `http://127.0.0.1:8080/api`) and exercises
//! the health probe, a valid submission and an invalid submission.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use contact_relay_app::telemetry;
use contact_relay_util::{load_env_file, Environment};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    telemetry::init_tracing(Environment::Development)?;

    let base = std::env::var("SMOKE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let client = SmokeClient::new(&base, Client::new())?;

    match client.run().await {
        Ok(report) => {
            info!(
                stage = "smoke",
                health = %report.health_message,
                email_sent = ?report.email_sent,
                validation_details = ?report.validation_details,
                "all checks completed"
            );
            Ok(())
        }
        Err(err) => {
            error!(stage = "smoke", error = %err, "smoke test failed");
            Err(err.into())
        }
    }
}

/// Outcome of a full smoke run.
#[derive(Debug, PartialEq)]
struct SmokeReport {
    health_message: String,
    /// `None` when the valid submission was not accepted (for example, no database yet).
    email_sent: Option<bool>,
    validation_details: Vec<String>,
}

struct SmokeClient {
    http: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    message: String,
    notification: NotificationBody,
}

#[derive(Debug, Deserialize)]
struct NotificationBody {
    email_sent: bool,
}

#[derive(Debug, Deserialize)]
struct ValidationBody {
    details: Vec<String>,
}

impl SmokeClient {
    fn new(base: &str, http: Client) -> Result<Self, SmokeError> {
        let mut base_url = Url::parse(base)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    async fn run(&self) -> Result<SmokeReport, SmokeError> {
        let health_message = self.check_health().await?;
        info!(stage = "smoke", message = %health_message, "health check passed");

        let email_sent = self.submit_valid().await?;
        let validation_details = self.submit_invalid().await?;
        info!(stage = "smoke", details = ?validation_details, "validation rejected bad input");

        Ok(SmokeReport {
            health_message,
            email_sent,
            validation_details,
        })
    }

    async fn check_health(&self) -> Result<String, SmokeError> {
        let response = self.http.get(self.base_url.join("health")?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SmokeError::UnexpectedStatus {
                step: "health",
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<HealthBody>().await?.message)
    }

    async fn submit_valid(&self) -> Result<Option<bool>, SmokeError> {
        let payload = json!({
            "name": "Test User",
            "email": "test@example.com",
            "message": "This is a test message from the API smoke test."
        });
        let response = self.post_contact(&payload).await?;
        let status = response.status();
        if status != StatusCode::CREATED {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            warn!(stage = "smoke", %status, body = %body, "valid submission was not accepted");
            return Ok(None);
        }

        let body: SubmitBody = response.json().await?;
        info!(
            stage = "smoke",
            message = %body.message,
            email_sent = body.notification.email_sent,
            "valid submission accepted"
        );
        Ok(Some(body.notification.email_sent))
    }

    async fn submit_invalid(&self) -> Result<Vec<String>, SmokeError> {
        let payload = json!({
            "name": "A",
            "email": "invalid-email",
            "message": "short"
        });
        let response = self.post_contact(&payload).await?;
        let status = response.status();
        if status != StatusCode::BAD_REQUEST {
            return Err(SmokeError::UnexpectedStatus {
                step: "validation",
                status,
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json::<ValidationBody>().await?.details)
    }

    async fn post_contact(&self, payload: &Value) -> Result<reqwest::Response, SmokeError> {
        Ok(self
            .http
            .post(self.base_url.join("contact")?)
            .json(payload)
            .send()
            .await?)
    }
}

#[derive(Debug, Error)]
enum SmokeError {
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{step} check returned {status}: {body}")]
    UnexpectedStatus {
        step: &'static str,
        status: StatusCode,
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn invalid_payload() -> Value {
        json!({ "name": "A", "email": "invalid-email", "message": "short" })
    }

    async fn mock_health(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(200)
                    .json_body(json!({ "status": "OK", "message": "Contact relay is running" }));
            })
            .await;
    }

    async fn mock_invalid(server: &MockServer, status: u16) {
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contact")
                    .json_body(invalid_payload());
                then.status(status).json_body(json!({
                    "error": "Validation failed",
                    "details": [
                        "Name must be at least 2 characters long",
                        "Please provide a valid email address",
                        "Message must be at least 10 characters long"
                    ]
                }));
            })
            .await;
    }

    #[tokio::test]
    async fn full_run_reports_each_step() {
        let server = MockServer::start_async().await;
        mock_health(&server).await;
        let valid = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contact")
                    .json_body_partial(r#"{ "name": "Test User" }"#);
                then.status(201).json_body(json!({
                    "success": true,
                    "message": "Thank you for your message! I'll get back to you soon.",
                    "data": { "id": "abc", "name": "Test User", "email": "test@example.com", "created_at": "2024-05-01T12:00:00Z" },
                    "notification": { "email_sent": false, "email_error": "mail relay is not configured" }
                }));
            })
            .await;
        mock_invalid(&server, 400).await;

        let client = SmokeClient::new(&server.url("/api"), Client::new()).expect("client");
        let report = client.run().await.expect("smoke run succeeds");
        valid.assert_async().await;

        assert_eq!(report.health_message, "Contact relay is running");
        assert_eq!(report.email_sent, Some(false));
        assert_eq!(report.validation_details.len(), 3);
    }

    #[tokio::test]
    async fn rejected_valid_submission_is_tolerated() {
        let server = MockServer::start_async().await;
        mock_health(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contact")
                    .json_body_partial(r#"{ "name": "Test User" }"#);
                then.status(500).json_body(json!({
                    "error": "Failed to process contact form submission",
                    "message": "Please try again later"
                }));
            })
            .await;
        mock_invalid(&server, 400).await;

        let client = SmokeClient::new(&server.url("/api/"), Client::new()).expect("client");
        let report = client.run().await.expect("smoke run succeeds");
        assert_eq!(report.email_sent, None);
    }

    #[tokio::test]
    async fn accepted_invalid_submission_fails_the_run() {
        let server = MockServer::start_async().await;
        mock_health(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/contact")
                    .json_body_partial(r#"{ "name": "Test User" }"#);
                then.status(201).json_body(json!({
                    "success": true,
                    "message": "ok",
                    "notification": { "email_sent": true }
                }));
            })
            .await;
        mock_invalid(&server, 201).await;

        let client = SmokeClient::new(&server.url("/api"), Client::new()).expect("client");
        let err = client.run().await.expect_err("validation step must fail");
        assert!(matches!(
            err,
            SmokeError::UnexpectedStatus {
                step: "validation",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failing_health_check_stops_the_run() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(503).body("down");
            })
            .await;

        let client = SmokeClient::new(&server.url("/api"), Client::new()).expect("client");
        let err = client.run().await.expect_err("health must fail");
        match err {
            SmokeError::UnexpectedStatus { step, status, body } => {
                assert_eq!(step, "health");
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

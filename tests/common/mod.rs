#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use club_mail_relay::config::{
    parse_origins, Config, HealthCheckSettings, Links, LogFormat, MailAdapter, SmtpSettings, SmtpTls,
};
use club_mail_relay::mail::{MailError, MailTransport, Mailer, OutgoingEmail, ProviderHealth};
use club_mail_relay::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;

/// Records every submission and answers with a fixed message id.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Option<String>,
}

impl MockTransport {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(reason.to_string()),
        })
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        self.sent.lock().unwrap().push(email.clone());
        match &self.failure {
            Some(reason) => Err(MailError::Smtp(reason.clone())),
            None => Ok("test-123".to_string()),
        }
    }

    async fn verify(&self) -> Result<(), MailError> {
        Ok(())
    }
}

/// Console adapter, local links and the health check switched off.
pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        service_name: "北商熱音社郵件服務".to_string(),
        log_format: LogFormat::Text,
        mail_adapter: MailAdapter::Console,
        smtp: SmtpSettings {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            tls: SmtpTls::None,
            timeout: Duration::from_secs(5),
        },
        mail_from: "北商熱音社 <noreply@club.example.com>".parse().unwrap(),
        links: Links {
            website_url: "https://club.example.com/".to_string(),
            admin_url: "https://club.example.com/admin".to_string(),
        },
        allowed_origins: parse_origins("http://localhost:3000,http://127.0.0.1:3000"),
        health_check: HealthCheckSettings {
            interval: Duration::ZERO,
            max_retries: 0,
            retry_delay: Duration::ZERO,
        },
        self_test_recipient: None,
    }
}

pub fn test_app(transport: Arc<MockTransport>) -> axum::Router {
    let config = test_config();
    let mailer = Mailer::with_transport(transport, config.mail_from.clone());
    let state = AppState::new(config, mailer, ProviderHealth::new());
    club_mail_relay::api::create_app(state)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

pub fn new_booking_payload(to: &str) -> Value {
    serde_json::json!({
        "to": to,
        "type": "admin",
        "notification_type": "new_booking",
        "data": {
            "real_name": "王小明",
            "user_email": "ming@example.com",
            "booking_date": "2024-06-03",
            "booking_time": "18:00-20:00",
            "booking_type": "band",
            "booking_name": "Night Owls",
            "booking_notes": "無",
            "timestamp": "2024-06-01 14:30"
        }
    })
}

pub fn booking_confirmation_payload(to: &str) -> Value {
    serde_json::json!({
        "to": to,
        "type": "user",
        "notification_type": "booking_confirmation",
        "data": {
            "real_name": "王小明",
            "booking_date": "2024-06-03",
            "booking_time": "18:00-20:00",
            "booking_type": "band",
            "booking_name": "Night Owls",
            "booking_id": 1024,
            "timestamp": "2024-06-01 14:30"
        }
    })
}

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::mime::{build_message, encode_raw, new_boundary};
use super::{DeliveryResult, MailError, MailTransport, OutgoingMail};
use crate::config::MailConfig;

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

struct Credentials<'a> {
    sender: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    refresh_token: &'a str,
}

/// Gmail API transport authenticated with an OAuth2 refresh-token grant.
///
/// A fresh access token is fetched for every message; the refresh token
/// itself is never rotated here.
pub struct GmailTransport {
    client: Client,
    config: MailConfig,
}

impl GmailTransport {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn credentials(&self) -> Result<Credentials<'_>, MailError> {
        Ok(Credentials {
            sender: self
                .config
                .sender
                .as_deref()
                .ok_or(MailError::MissingCredentials("GMAIL_USER"))?,
            client_id: self
                .config
                .client_id
                .as_deref()
                .ok_or(MailError::MissingCredentials("GMAIL_CLIENT_ID"))?,
            client_secret: self
                .config
                .client_secret
                .as_deref()
                .ok_or(MailError::MissingCredentials("GMAIL_CLIENT_SECRET"))?,
            refresh_token: self
                .config
                .refresh_token
                .as_deref()
                .ok_or(MailError::MissingCredentials("GMAIL_REFRESH_TOKEN"))?,
        })
    }

    async fn access_token(&self, creds: &Credentials<'_>) -> Result<String, MailError> {
        let grant = RefreshGrant {
            client_id: creds.client_id,
            client_secret: creds.client_secret,
            refresh_token: creds.refresh_token,
            grant_type: "refresh_token",
        };

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&grant)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OAuth2 token refresh failed: {} {}", status, body);
            return Err(MailError::TokenRefresh {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MailError::Parse(format!("token response: {}", e)))?;
        Ok(token.access_token)
    }
}

#[async_trait::async_trait]
impl MailTransport for GmailTransport {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<DeliveryResult, MailError> {
        let creds = self.credentials()?;
        let access_token = self.access_token(&creds).await?;

        let message = build_message(
            creds.sender,
            &mail.to,
            &mail.subject,
            &mail.html,
            &new_boundary(),
        );
        let body = SendRequest {
            raw: encode_raw(&message),
        };

        let response = self
            .client
            .post(&self.config.send_url)
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Gmail API send failed: {} {}", status, text);
            return Ok(DeliveryResult::failed(format!(
                "Gmail API error: {}",
                status
            )));
        }

        let parsed: SendResponse = serde_json::from_str(&text)
            .map_err(|e| MailError::Parse(format!("send response: {}", e)))?;
        info!("Gmail API accepted message {:?}", parsed.id);
        Ok(DeliveryResult::sent(parsed.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> MailConfig {
        MailConfig {
            sender: Some("committee@example.org".into()),
            client_id: Some("client-id".into()),
            client_secret: Some("client-secret".into()),
            refresh_token: Some("refresh-token".into()),
            token_url: format!("{}/token", server.uri()),
            send_url: format!("{}/send", server.uri()),
            timeout: Duration::from_secs(5),
            excluded_addresses: vec![],
        }
    }

    fn mail() -> OutgoingMail {
        OutgoingMail {
            to: "author@example.org".into(),
            subject: "Café — Müller".into(),
            html: "<p>Universität Zürich</p>".into(),
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token"))
            .and(body_string_contains("client_id=client-id"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "ya29.test", "expires_in": 3599})),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sends_utf8_message_with_bearer_token() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer ya29.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = GmailTransport::new(config(&server)).unwrap();
        let result = transport.deliver(&mail()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.id.as_deref(), Some("msg-1"));

        let requests = server.received_requests().await.unwrap();
        let send = requests
            .iter()
            .find(|r| r.url.path() == "/send")
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
        let raw = body["raw"].as_str().unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(raw).unwrap()).unwrap();
        assert!(decoded.contains("Subject: Café — Müller\r\n"));
        assert!(decoded.contains("From: committee@example.org\r\n"));
        assert!(decoded.contains("<p>Universität Zürich</p>"));
    }

    #[tokio::test]
    async fn token_refresh_failure_is_an_error_and_skips_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = GmailTransport::new(config(&server)).unwrap();
        let err = transport.deliver(&mail()).await.unwrap_err();
        assert!(matches!(err, MailError::TokenRefresh { status: 400, .. }));
    }

    #[tokio::test]
    async fn upstream_rejection_is_reported_not_raised() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"error": {"message": "forbidden"}})),
            )
            .mount(&server)
            .await;

        let transport = GmailTransport::new(config(&server)).unwrap();
        let result = transport.deliver(&mail()).await.unwrap();
        assert!(!result.success);
        assert!(result.message.contains("403"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let server = MockServer::start().await;
        let mut cfg = config(&server);
        cfg.refresh_token = None;

        let transport = GmailTransport::new(cfg).unwrap();
        let err = transport.deliver(&mail()).await.unwrap_err();
        assert!(matches!(err, MailError::MissingCredentials("GMAIL_REFRESH_TOKEN")));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "t"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.timeout = Duration::from_millis(200);
        let transport = GmailTransport::new(cfg).unwrap();
        let err = transport.deliver(&mail()).await.unwrap_err();
        assert!(matches!(err, MailError::Timeout));
    }
}

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// hCaptcha token verification for the registration form.
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    http_client: Client,
    secret: String,
    verify_url: String,
}

impl CaptchaVerifier {
    pub fn new(secret: &str, verify_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            secret: secret.to_string(),
            verify_url: verify_url.to_string(),
        }
    }

    /// `None` when `HCAPTCHA_SECRET` is not set, which disables the check.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .hcaptcha_secret
            .as_deref()
            .map(|secret| Self::new(secret, &config.hcaptcha_verify_url))
    }

    /// Returns `Ok(false)` for a token the provider rejects, `Err` when the
    /// provider cannot be reached.
    pub async fn verify(&self, token: &str) -> Result<bool> {
        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach captcha provider: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Captcha verification failed with status: {}", response.status()));
        }

        let body: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse captcha response: {}", e))?;

        if !body.success {
            debug!("Captcha rejected: {:?}", body.error_codes);
        }
        Ok(body.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_verify_accepts_valid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/siteverify"))
            .and(body_string_contains("secret=0xsecret"))
            .and(body_string_contains("response=good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"success": true})))
            .mount(&server)
            .await;

        let verifier = CaptchaVerifier::new("0xsecret", &format!("{}/siteverify", server.uri()));
        assert!(verifier.verify("good-token").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_rejects_bad_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/siteverify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error-codes": ["invalid-input-response"]
            })))
            .mount(&server)
            .await;

        let verifier = CaptchaVerifier::new("0xsecret", &format!("{}/siteverify", server.uri()));
        assert!(!verifier.verify("bad-token").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_errors_when_provider_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let verifier = CaptchaVerifier::new("0xsecret", &format!("{}/siteverify", server.uri()));
        assert!(verifier.verify("token").await.is_err());
    }
}

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{DocumentType, Locale};

/// Outbound email sent through the Resend API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// What happened to an upload, as told to its owner.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    Processed {
        filename: String,
        document_type: DocumentType,
        needs_review: bool,
    },
    Failed {
        filename: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct EmailNotifier {
    http_client: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl EmailNotifier {
    pub fn new(api_key: &str, from: &str, base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.to_string(),
            from: from.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `None` when no Resend key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .resend_api_key
            .as_deref()
            .map(|key| Self::new(key, &config.resend_from, &config.resend_base_url))
    }

    pub fn compose(&self, to: &str, locale: Locale, event: &DocumentEvent) -> EmailMessage {
        let (subject, text) = match event {
            DocumentEvent::Processed { filename, document_type, needs_review } => {
                let kind = document_type_label(*document_type, locale);
                let subject = locale
                    .pick(
                        &format!("Your document {} is ready", filename),
                        &format!("Votre document {} est prêt", filename),
                    )
                    .to_string();
                let mut text = locale
                    .pick(
                        &format!("We processed {} and filed it as: {}.", filename, kind),
                        &format!("Nous avons traité {} et l'avons classé comme : {}.", filename, kind),
                    )
                    .to_string();
                if *needs_review {
                    text.push_str(locale.pick(
                        "\n\nSome extracted values have low confidence. Please review them.",
                        "\n\nCertaines valeurs extraites sont incertaines. Veuillez les vérifier.",
                    ));
                }
                (subject, text)
            }
            DocumentEvent::Failed { filename, reason } => (
                locale
                    .pick(
                        &format!("We could not process {}", filename),
                        &format!("Le traitement de {} a échoué", filename),
                    )
                    .to_string(),
                locale
                    .pick(
                        &format!("Processing stopped: {}. You can upload the file again.", reason),
                        &format!("Le traitement s'est arrêté : {}. Vous pouvez téléverser le fichier à nouveau.", reason),
                    )
                    .to_string(),
            ),
        };

        EmailMessage {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject,
            text,
        }
    }

    /// Send the message and return the provider's email id.
    pub async fn send(&self, message: &EmailMessage) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach email provider: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("Email provider rejected message with status: {}", response.status()));
        }

        let body: ResendResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse email provider response: {}", e))?;

        info!("Sent notification email {}", body.id);
        Ok(body.id)
    }

    /// Send in the background; failures are only logged.
    pub fn notify_in_background(&self, to: String, locale: Locale, event: DocumentEvent) {
        let notifier = self.clone();
        tokio::spawn(async move {
            let message = notifier.compose(&to, locale, &event);
            if let Err(e) = notifier.send(&message).await {
                warn!("Notification email failed: {}", e);
            }
        });
    }
}

pub fn document_type_label(document_type: DocumentType, locale: Locale) -> String {
    let (en, fr) = match document_type {
        DocumentType::Invoice => ("invoice", "facture"),
        DocumentType::Receipt => ("receipt", "reçu"),
        DocumentType::Contract => ("contract", "contrat"),
        DocumentType::Quote => ("quote", "soumission"),
        DocumentType::BankStatement => ("bank statement", "relevé bancaire"),
        DocumentType::TaxForm => ("tax form", "formulaire fiscal"),
        DocumentType::PurchaseOrder => ("purchase order", "bon de commande"),
        DocumentType::Other => ("other document", "autre document"),
    };
    locale.pick(en, fr).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn processed(needs_review: bool) -> DocumentEvent {
        DocumentEvent::Processed {
            filename: "facture-42.pdf".to_string(),
            document_type: DocumentType::Invoice,
            needs_review,
        }
    }

    #[test]
    fn test_compose_french_processed_with_review() {
        let notifier = EmailNotifier::new("re_test", "Dossier <n@dossier.local>", "http://localhost");
        let message = notifier.compose("marie@example.ca", Locale::Fr, &processed(true));

        assert_eq!(message.subject, "Votre document facture-42.pdf est prêt");
        assert!(message.text.contains("facture"));
        assert!(message.text.contains("vérifier"));
        assert_eq!(message.to, vec!["marie@example.ca".to_string()]);
    }

    #[test]
    fn test_compose_english_failure() {
        let notifier = EmailNotifier::new("re_test", "Dossier <n@dossier.local>", "http://localhost");
        let event = DocumentEvent::Failed {
            filename: "scan.png".to_string(),
            reason: "no readable text".to_string(),
        };
        let message = notifier.compose("sam@example.com", Locale::En, &event);

        assert_eq!(message.subject, "We could not process scan.png");
        assert!(message.text.contains("no readable text"));
    }

    #[tokio::test]
    async fn test_send_posts_to_resend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(serde_json::json!({"to": ["sam@example.com"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "email_123"})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = EmailNotifier::new("re_test", "Dossier <n@dossier.local>", &server.uri());
        let message = notifier.compose("sam@example.com", Locale::En, &processed(false));

        assert_eq!(notifier.send(&message).await.unwrap(), "email_123");
    }

    #[tokio::test]
    async fn test_send_reports_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let notifier = EmailNotifier::new("re_test", "Dossier <n@dossier.local>", &server.uri());
        let message = notifier.compose("sam@example.com", Locale::En, &processed(false));

        assert!(notifier.send(&message).await.is_err());
    }
}

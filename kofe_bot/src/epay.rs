//! Client for the Epay (Halyk homebank) payment gateway.
//!
//! The flow is plain OAuth2 `client_credentials` plus one JSON invoice endpoint. The bearer token
//! is cached until the gateway rejects it; a "Token is not valid" response drops the cache and
//! retries the invoice exactly once with a fresh token.
use std::env;

use kofe_common::Tenge;
use log::*;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

const DEFAULT_OAUTH_URL: &str = "https://test-epay-oauth.epayment.kz/oauth2/token";
const DEFAULT_INVOICE_URL: &str = "https://test-epay-api.epayment.kz/invoice";
const DEFAULT_PAYMENT_PAGE_URL: &str = "https://test-epay.homebank.kz/epay2/personal/start.html";

#[derive(Debug, Error)]
pub enum EpayError {
    #[error("Epay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Epay rejected the request with status {status}: {body}")]
    Gateway { status: StatusCode, body: String },
    #[error("Epay response is missing the '{0}' field")]
    MissingField(&'static str),
}

#[derive(Clone, Debug, Default)]
pub struct EpayConfig {
    pub client_id: String,
    pub client_secret: kofe_common::Secret<String>,
    pub terminal_id: String,
    pub oauth_url: String,
    pub invoice_url: String,
    pub payment_page_url: String,
}

impl EpayConfig {
    pub fn from_env_or_default() -> Self {
        let client_id = env::var("EPAY_CLIENT_ID").unwrap_or_else(|_| {
            error!("🚨️ EPAY_CLIENT_ID is not set. Invoice creation will fail.");
            String::default()
        });
        let client_secret = env::var("EPAY_CLIENT_SECRET").map(kofe_common::Secret::new).unwrap_or_else(|_| {
            error!("🚨️ EPAY_CLIENT_SECRET is not set. Invoice creation will fail.");
            kofe_common::Secret::default()
        });
        let terminal_id = env::var("EPAY_TERMINAL_ID").unwrap_or_else(|_| {
            warn!("🪛️ EPAY_TERMINAL_ID is not set.");
            String::default()
        });
        let oauth_url = Self::url_var("EPAY_OAUTH_URL", DEFAULT_OAUTH_URL);
        let invoice_url = Self::url_var("EPAY_CREATE_INVOICE_URL", DEFAULT_INVOICE_URL);
        let payment_page_url = Self::url_var("EPAY_PAYMENT_PAGE_URL", DEFAULT_PAYMENT_PAGE_URL);
        Self { client_id, client_secret, terminal_id, oauth_url, invoice_url, payment_page_url }
    }

    fn url_var(var: &str, default: &str) -> String {
        env::var(var).ok().unwrap_or_else(|| {
            warn!("🪛️ {var} is not set. Using the test gateway default, {default}.");
            default.to_string()
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct InvoiceResponse {
    invoice_url: Option<String>,
}

pub struct EpayClient {
    client: reqwest::Client,
    config: EpayConfig,
    /// Where the gateway posts payment outcomes, `{base_url}/webhooks/epay`.
    post_link: String,
    token: RwLock<Option<String>>,
}

impl EpayClient {
    pub fn new(config: EpayConfig, post_link: String) -> Self {
        Self { client: reqwest::Client::new(), config, post_link, token: RwLock::new(None) }
    }

    /// Creates an invoice and returns the page URL the customer pays on.
    pub async fn create_invoice(
        &self,
        amount: Tenge,
        payment_id: &str,
        description: &str,
        back_link: &str,
    ) -> Result<String, EpayError> {
        let token = self.bearer().await?;
        match self.try_create_invoice(&token, amount, payment_id, description, back_link).await {
            Err(EpayError::Gateway { body, .. }) if body.contains("Token is not valid") => {
                warn!("💳️ Epay rejected the cached token. Fetching a fresh one and retrying.");
                let token = self.refresh_token().await?;
                self.try_create_invoice(&token, amount, payment_id, description, back_link).await
            },
            other => other,
        }
    }

    async fn try_create_invoice(
        &self,
        token: &str,
        amount: Tenge,
        payment_id: &str,
        description: &str,
        back_link: &str,
    ) -> Result<String, EpayError> {
        let body = serde_json::json!({
            "shop_id": self.config.terminal_id,
            "account_id": "01",
            "invoice_id": payment_id,
            "amount": amount.value(),
            "language": "rus",
            "description": description,
            "expire_period": "1d",
            "recipient_contact": "test@example.com",
            "recipient_contact_sms": "",
            "notifier_contact_sms": "",
            "currency": kofe_common::KZT_CURRENCY_CODE,
            "post_link": self.post_link,
            "failure_post_link": self.post_link,
            "back_link": back_link,
            "failure_back_link": "",
        });
        debug!("💳️ Creating Epay invoice #{payment_id} for {amount}");
        let response = self.client.post(&self.config.invoice_url).bearer_auth(token).json(&body).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EpayError::Gateway { status, body });
        }
        let parsed = serde_json::from_str::<InvoiceResponse>(&body)
            .map_err(|_| EpayError::Gateway { status, body: body.clone() })?;
        let url = parsed.invoice_url.ok_or(EpayError::MissingField("invoice_url"))?;
        info!("💳️ Invoice #{payment_id} created");
        Ok(url)
    }

    async fn bearer(&self) -> Result<String, EpayError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String, EpayError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("scope", "payment"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.reveal().as_str()),
        ];
        let response = self.client.post(&self.config.oauth_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(EpayError::Gateway { status, body });
        }
        let token = response.json::<TokenResponse>().await?.access_token;
        *self.token.write().await = Some(token.clone());
        info!("💳️ Obtained a fresh Epay access token");
        Ok(token)
    }
}

/// The webhook body Epay posts to `post_link` / `failure_post_link`. Only the id, the result code
/// and the amount matter; the rest is echo data the gateway includes for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpayWebhookEvent {
    pub invoice_id: String,
    pub code: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_code: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub card_mask: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl EpayWebhookEvent {
    /// The gateway signals success with `code == "ok"`, in whatever capitalisation.
    pub fn is_success(&self) -> bool {
        self.code.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn webhook_event_parses_with_unknown_echo_fields() {
        let json = r#"{
            "invoiceId": "1717171717000",
            "code": "OK",
            "amount": 1700.0,
            "currency": "KZT",
            "cardMask": "440043...0128",
            "terminal": "67e34d63-102f-4bd1-898e-370781d0074d",
            "dateTime": "2024-06-01T12:00:00+06:00"
        }"#;
        let event = serde_json::from_str::<EpayWebhookEvent>(json).unwrap();
        assert_eq!(event.invoice_id, "1717171717000");
        assert!(event.is_success());
        assert_eq!(event.card_mask.as_deref(), Some("440043...0128"));
        assert!(event.reason.is_none());
    }

    #[test]
    fn failure_codes_are_not_success() {
        let json = r#"{
            "invoiceId": "1717171717001",
            "code": "error",
            "amount": 1700.0,
            "currency": "KZT",
            "reason": "Insufficient funds",
            "reasonCode": 5002
        }"#;
        let event = serde_json::from_str::<EpayWebhookEvent>(json).unwrap();
        assert!(!event.is_success());
        assert_eq!(event.reason.as_deref(), Some("Insufficient funds"));
    }
}

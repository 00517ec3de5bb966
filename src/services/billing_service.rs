use crate::error::{Error, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use sqlx::PgPool;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Seam around the hosted payment API so handlers can be exercised with a
/// test double.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(
        &self,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
        customer_email: &str,
    ) -> Result<CheckoutSession>;
}

pub struct HttpPaymentProvider {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl HttpPaymentProvider {
    pub fn new(secret_key: String, api_base: Option<String>, client: Client) -> Self {
        Self {
            client,
            secret_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_checkout_session(
        &self,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
        customer_email: &str,
    ) -> Result<CheckoutSession> {
        if self.secret_key.is_empty() {
            return Err(Error::Internal(
                "Payment provider is not configured".to_string(),
            ));
        }

        let form = [
            ("mode", "subscription"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("customer_email", customer_email),
        ];

        let res = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Anyhow(anyhow::anyhow!(
                "Payment API error {}: {}",
                status,
                text
            )));
        }

        let body: JsonValue = res.json().await?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Internal("Payment API response lacks session id".to_string()))?
            .to_string();
        let url = body
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Internal("Payment API response lacks session url".to_string()))?
            .to_string();
        Ok(CheckoutSession { id, url })
    }
}

/// Hex HMAC-SHA256 of the raw body, compared in constant time.
pub fn verify_signature(body: &[u8], signature_hex: &str, secret: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());
    bool::from(ConstantTimeEq::ct_eq(
        expected.as_bytes(),
        signature_hex.trim().to_ascii_lowercase().as_bytes(),
    ))
}

#[derive(Clone)]
pub struct BillingService {
    pool: PgPool,
}

impl BillingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies one provider event. Completed checkouts flip the profile's
    /// premium flag in a single update; anything else is acknowledged and
    /// ignored.
    pub async fn handle_event(&self, event: &JsonValue) -> Result<()> {
        let event_type = event.get("type").and_then(|v| v.as_str()).unwrap_or("");
        if event_type != "checkout.session.completed" {
            tracing::debug!(event_type, "ignoring billing event");
            return Ok(());
        }

        let email = event
            .pointer("/data/object/customer_email")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::BadRequest("event lacks customer_email".to_string()))?;

        let res = sqlx::query(
            r#"UPDATE profiles SET is_premium = TRUE, updated_at = NOW() WHERE email = LOWER($1)"#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            tracing::warn!(email, "billing event for unknown profile");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let secret = "whsec_test";
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let sig = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(body, &sig, secret));
        assert!(verify_signature(body, &sig.to_uppercase(), secret));
        assert!(!verify_signature(body, &sig, "other_secret"));
        assert!(!verify_signature(b"tampered", &sig, secret));
        assert!(!verify_signature(body, "zz-not-hex", secret));
    }

    #[tokio::test]
    async fn mocked_provider_returns_session() {
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_create_checkout_session()
            .withf(|price, _, _, email| price == "price_123" && email == "a@b.c")
            .returning(|_, _, _, _| {
                Ok(CheckoutSession {
                    id: "cs_test_1".to_string(),
                    url: "https://pay.example/cs_test_1".to_string(),
                })
            });

        let session = provider
            .create_checkout_session("price_123", "https://ok", "https://no", "a@b.c")
            .await
            .unwrap();
        assert_eq!(session.id, "cs_test_1");
    }
}

use {
    crate::{
        config::PaypalMode,
        domain::{
            error::BrokerError,
            id::OrderId,
            provider::{
                CreatedPaypalOrder, PaypalCapture, PaypalGateway, PaypalOrderRequest,
                ProviderFuture,
            },
        },
    },
    chrono::{DateTime, Duration, Utc},
    serde::Deserialize,
    tokio::sync::RwLock,
    uuid::Uuid,
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// PayPal Orders v2 over REST.
pub struct PaypalProvider {
    http: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<CachedToken>>,
}

impl PaypalProvider {
    pub fn new(mode: PaypalMode, client_id: &str, client_secret: &str) -> Self {
        Self::with_api_base(mode.api_base(), client_id, client_secret)
    }

    pub fn with_api_base(api_base: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, BrokerError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let resp = self
            .http
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| BrokerError::Provider(format!("PayPal auth: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Provider(format!("PayPal auth failed ({status}): {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| BrokerError::Provider(format!("PayPal auth: {e}")))?;

        // Refresh a minute early.
        let expires_at = Utc::now() + Duration::seconds(token.expires_in.saturating_sub(60));
        *self.token.write().await = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    async fn create_order_inner(
        &self,
        request: &PaypalOrderRequest,
    ) -> Result<CreatedPaypalOrder, BrokerError> {
        let token = self.access_token().await?;
        let currency = request.money.currency();

        let mut unit = serde_json::json!({
            "amount": {
                "currency_code": currency.iso_code(),
                "value": request.money.amount().to_decimal(currency),
            },
        });
        if let Some(description) = &request.description {
            unit["description"] = description.clone().into();
        }
        if let Some(user_id) = &request.user_id {
            unit["custom_id"] = user_id.as_str().into();
        }
        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [unit],
            "application_context": {
                "return_url": request.return_url,
                "cancel_url": request.cancel_url,
            },
        });

        let resp = self
            .http
            .post(format!("{}/v2/checkout/orders", self.api_base))
            .bearer_auth(token)
            .header("PayPal-Request-Id", Uuid::now_v7().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| BrokerError::Provider(format!("PayPal: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| BrokerError::Provider(format!("PayPal: {e}")))?;
        if !status.is_success() {
            return Err(BrokerError::Provider(error_message(&text, status)));
        }

        let order: OrderResponse = serde_json::from_str(&text)
            .map_err(|e| BrokerError::Provider(format!("PayPal: unexpected order response: {e}")))?;
        let approval_url = order
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone());

        Ok(CreatedPaypalOrder {
            id: OrderId::new(order.id)?,
            status: order
                .status
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or_else(|| "created".into()),
            approval_url,
        })
    }

    async fn capture_order_inner(&self, order_id: &OrderId) -> Result<PaypalCapture, BrokerError> {
        let token = self.access_token().await?;

        let resp = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.api_base,
                order_id.as_str()
            ))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| BrokerError::Provider(format!("PayPal: {e}")))?;

        let success = resp.status().is_success();
        let text = resp
            .text()
            .await
            .map_err(|e| BrokerError::Provider(format!("PayPal: {e}")))?;
        let body = serde_json::from_str(&text).unwrap_or(serde_json::json!({ "raw": text }));
        let status = body
            .get("status")
            .and_then(|v| v.as_str())
            .map(|s| s.to_ascii_lowercase());

        Ok(PaypalCapture {
            success,
            status,
            body,
        })
    }
}

/// PayPal's `message` when the body is a JSON error, else the raw body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| Some(body.trim()).filter(|b| !b.is_empty()).map(str::to_string))
        .unwrap_or_else(|| format!("PayPal returned {status}"))
}

impl PaypalGateway for PaypalProvider {
    fn create_order<'a>(
        &'a self,
        request: &'a PaypalOrderRequest,
    ) -> ProviderFuture<'a, CreatedPaypalOrder> {
        Box::pin(async move { self.create_order_inner(request).await })
    }

    fn capture_order<'a>(&'a self, order_id: &'a OrderId) -> ProviderFuture<'a, PaypalCapture> {
        Box::pin(async move { self.capture_order_inner(order_id).await })
    }
}

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use pay_broker::AppState;
use hmac::{Hmac, Mac};
use pay_broker::adapters::stripe::signature::WebhookVerifier;
use pay_broker::domain::error::BrokerError;
use pay_broker::domain::id::{CustomerId, OrderId, UserId};
use pay_broker::domain::money::Money;
use pay_broker::domain::provider::{
    CheckoutRequest, CreatedCheckoutSession, CreatedPaymentIntent, CreatedPaypalOrder,
    PaypalCapture, PaypalGateway, PaypalOrderRequest, ProviderFuture, StripeGateway,
};
use pay_broker::infra::memory::record_store::RecordStore;
use pay_broker::transport::http::router;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const BASE_URL: &str = "http://broker.test";

// ── Fake Stripe ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStripe {
    pub customers: Mutex<Vec<(String, Option<String>)>>,
    pub sessions: Mutex<Vec<CheckoutRequest>>,
    pub intents: Mutex<Vec<Money>>,
    /// When set, every call fails with this provider message.
    pub fail_with: Mutex<Option<String>>,
}

impl FakeStripe {
    fn check_failure(&self) -> Result<(), BrokerError> {
        match self.fail_with.lock().unwrap().clone() {
            Some(msg) => Err(BrokerError::Provider(msg)),
            None => Ok(()),
        }
    }
}

impl StripeGateway for FakeStripe {
    fn create_customer<'a>(
        &'a self,
        user_id: &'a UserId,
        email: Option<&'a str>,
    ) -> ProviderFuture<'a, CustomerId> {
        Box::pin(async move {
            self.check_failure()?;
            let mut customers = self.customers.lock().unwrap();
            customers.push((user_id.to_string(), email.map(str::to_string)));
            CustomerId::new(format!("cus_fake_{}", customers.len()))
        })
    }

    fn create_checkout_session<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> ProviderFuture<'a, CreatedCheckoutSession> {
        Box::pin(async move {
            self.check_failure()?;
            let mut sessions = self.sessions.lock().unwrap();
            sessions.push(request.clone());
            let id = format!("cs_test_{}", sessions.len());
            Ok(CreatedCheckoutSession {
                url: Some(format!("https://checkout.stripe.com/c/pay/{id}")),
                id: OrderId::new(id)?,
            })
        })
    }

    fn create_payment_intent<'a>(
        &'a self,
        money: &'a Money,
        _user_id: Option<&'a UserId>,
    ) -> ProviderFuture<'a, CreatedPaymentIntent> {
        Box::pin(async move {
            self.check_failure()?;
            let mut intents = self.intents.lock().unwrap();
            intents.push(money.clone());
            let id = format!("pi_test_{}", intents.len());
            Ok(CreatedPaymentIntent {
                client_secret: format!("{id}_secret_abc"),
                id: OrderId::new(id)?,
            })
        })
    }
}

// ── Fake PayPal ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakePaypal {
    pub orders: Mutex<Vec<(String, PaypalOrderRequest)>>,
    pub captures: Mutex<Vec<String>>,
}

impl PaypalGateway for FakePaypal {
    fn create_order<'a>(
        &'a self,
        request: &'a PaypalOrderRequest,
    ) -> ProviderFuture<'a, CreatedPaypalOrder> {
        Box::pin(async move {
            let mut orders = self.orders.lock().unwrap();
            let id = format!("PAYPAL-ORDER-{}", orders.len() + 1);
            orders.push((id.clone(), request.clone()));
            Ok(CreatedPaypalOrder {
                approval_url: Some(format!(
                    "https://www.sandbox.paypal.com/checkoutnow?token={id}"
                )),
                status: "created".into(),
                id: OrderId::new(id)?,
            })
        })
    }

    fn capture_order<'a>(&'a self, order_id: &'a OrderId) -> ProviderFuture<'a, PaypalCapture> {
        Box::pin(async move {
            self.captures.lock().unwrap().push(order_id.to_string());
            let known = self
                .orders
                .lock()
                .unwrap()
                .iter()
                .any(|(id, _)| id == order_id.as_str());

            if known {
                Ok(PaypalCapture {
                    success: true,
                    status: Some("completed".into()),
                    body: serde_json::json!({"id": order_id.as_str(), "status": "COMPLETED"}),
                })
            } else {
                Ok(PaypalCapture {
                    success: false,
                    status: None,
                    body: serde_json::json!({
                        "name": "RESOURCE_NOT_FOUND",
                        "message": "The specified resource does not exist.",
                    }),
                })
            }
        })
    }
}

// ── App harness ────────────────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub store: Arc<RecordStore>,
    pub stripe: Arc<FakeStripe>,
    pub paypal: Arc<FakePaypal>,
}

pub fn test_app() -> TestApp {
    test_app_with(WebhookVerifier::from_config(Some(WEBHOOK_SECRET), false))
}

pub fn test_app_with(verifier: WebhookVerifier) -> TestApp {
    let store = Arc::new(RecordStore::new());
    let stripe = Arc::new(FakeStripe::default());
    let paypal = Arc::new(FakePaypal::default());
    let state = AppState {
        store: store.clone(),
        stripe: stripe.clone(),
        paypal: paypal.clone(),
        verifier: Arc::new(verifier),
        base_url: BASE_URL.into(),
    };
    TestApp {
        router: router::app(state),
        store,
        stripe,
        paypal,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Deliver a Stripe event signed with [`WEBHOOK_SECRET`].
    pub async fn stripe_webhook(&self, event: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let payload = event.to_string();
        let header = signature_header(&payload, WEBHOOK_SECRET);
        self.stripe_webhook_raw(payload, Some(header)).await
    }

    pub async fn stripe_webhook_raw(
        &self,
        payload: String,
        signature: Option<String>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            req = req.header("Stripe-Signature", sig);
        }
        self.send(req.body(Body::from(payload)).unwrap()).await
    }
}

/// Hex HMAC-SHA256 of `"{ts}.{payload}"`, the `v1` value Stripe sends.
pub fn sign(payload: &str, secret: &str, ts: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{ts}.{payload}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn signature_header_at(payload: &str, secret: &str, ts: i64) -> String {
    format!("t={ts},v1={}", sign(payload, secret, ts))
}

pub fn signature_header(payload: &str, secret: &str) -> String {
    signature_header_at(payload, secret, chrono::Utc::now().timestamp())
}

pub fn stripe_event(event_type: &str, object: stripe::EventObject) -> serde_json::Value {
    serde_json::json!({
        "id": format!("evt_{}", uuid::Uuid::now_v7().simple()),
        "object": "event",
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "livemode": false,
        "pending_webhooks": 1,
        "data": {"object": object},
    })
}

fn customer_ref(id: &str) -> stripe::Expandable<stripe::Customer> {
    stripe::Expandable::Id(id.parse().unwrap())
}

/// A completed checkout session, tagged with `userId` metadata when `user`
/// is given.
pub fn checkout_session(
    id: &str,
    customer: Option<&str>,
    subscription: Option<&str>,
    user: Option<&str>,
) -> stripe::EventObject {
    stripe::EventObject::CheckoutSession(stripe::CheckoutSession {
        id: id.parse().unwrap(),
        customer: customer.map(customer_ref),
        subscription: subscription.map(|s| stripe::Expandable::Id(s.parse().unwrap())),
        metadata: user.map(|u| HashMap::from([("userId".to_string(), u.to_string())])),
        ..Default::default()
    })
}

pub fn subscription(
    id: &str,
    customer: &str,
    status: stripe::SubscriptionStatus,
) -> stripe::EventObject {
    stripe::EventObject::Subscription(stripe::Subscription {
        id: id.parse().unwrap(),
        customer: customer_ref(customer),
        status,
        ..Default::default()
    })
}

pub fn customer_object(id: &str) -> stripe::EventObject {
    stripe::EventObject::Customer(stripe::Customer {
        id: id.parse().unwrap(),
        ..Default::default()
    })
}

/// Create a user through the checkout route so it gets a Stripe customer.
/// Returns the customer id the fake assigned.
pub async fn checkout_user(app: &TestApp, user_id: &str) -> String {
    let (status, _) = app
        .post_json(
            "/create-checkout-session",
            serde_json::json!({"userId": user_id, "priceId": "price_1", "mode": "subscription"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.store
        .get_user(&UserId::new(user_id).unwrap())
        .await
        .unwrap()
        .customer_id()
        .unwrap()
        .to_string()
}

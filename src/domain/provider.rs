use {
    super::error::BrokerError,
    super::id::{CustomerId, OrderId, UserId},
    super::money::Money,
    serde::{Deserialize, Serialize},
    std::{future::Future, pin::Pin},
};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BrokerError>> + Send + 'a>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    #[default]
    Payment,
    Subscription,
}

/// What to charge for: a catalogue price, or an ad-hoc amount.
#[derive(Debug, Clone)]
pub enum LineItem {
    Price { price_id: String },
    Amount { money: Money, product_name: String },
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: UserId,
    pub customer_id: CustomerId,
    pub line_item: LineItem,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CreatedCheckoutSession {
    pub id: OrderId,
    pub url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedPaymentIntent {
    pub id: OrderId,
    pub client_secret: String,
}

/// Stripe calls the broker needs. One method per upstream API call.
pub trait StripeGateway: Send + Sync {
    fn create_customer<'a>(
        &'a self,
        user_id: &'a UserId,
        email: Option<&'a str>,
    ) -> ProviderFuture<'a, CustomerId>;

    fn create_checkout_session<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> ProviderFuture<'a, CreatedCheckoutSession>;

    fn create_payment_intent<'a>(
        &'a self,
        money: &'a Money,
        user_id: Option<&'a UserId>,
    ) -> ProviderFuture<'a, CreatedPaymentIntent>;
}

#[derive(Debug, Clone)]
pub struct PaypalOrderRequest {
    pub money: Money,
    pub description: Option<String>,
    pub user_id: Option<UserId>,
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CreatedPaypalOrder {
    pub id: OrderId,
    pub status: String,
    pub approval_url: Option<String>,
}

/// Outcome of a capture call, kept even when PayPal answers with an error
/// body so the caller can relay it.
#[derive(Debug, Clone)]
pub struct PaypalCapture {
    pub success: bool,
    pub status: Option<String>,
    pub body: serde_json::Value,
}

pub trait PaypalGateway: Send + Sync {
    fn create_order<'a>(
        &'a self,
        request: &'a PaypalOrderRequest,
    ) -> ProviderFuture<'a, CreatedPaypalOrder>;

    fn capture_order<'a>(&'a self, order_id: &'a OrderId) -> ProviderFuture<'a, PaypalCapture>;
}

use {
    crate::{
        AppState,
        domain::{
            error::BrokerError,
            id::{OrderId, UserId},
            money::{Currency, Money, MoneyAmount},
            order::Provider,
            provider::{CheckoutMode, LineItem, PaypalOrderRequest},
            user::SubscriptionStatus,
        },
        services::payments::{self, CheckoutInput},
        transport::http::errors::ApiError,
    },
    axum::{
        Json,
        extract::{Path, Query, State, rejection::JsonRejection},
    },
    serde::Deserialize,
};

/// Amounts arrive either as a decimal string in major units (`"19.99"`)
/// or as an integer in minor units (`1999`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Decimal(String),
    Minor(i64),
}

impl AmountInput {
    fn into_money(self, currency: Currency) -> Result<Money, BrokerError> {
        let amount = match self {
            Self::Decimal(s) => MoneyAmount::parse_decimal(&s, &currency)?,
            Self::Minor(minor) => MoneyAmount::new(minor)?,
        };
        Ok(Money::new(amount, currency))
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| BrokerError::InvalidPayload(e.body_text()).into())
}

fn currency(raw: Option<&str>) -> Result<Currency, BrokerError> {
    raw.map(Currency::try_from).transpose().map(Option::unwrap_or_default)
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, BrokerError> {
    value.ok_or(BrokerError::MissingField(field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    email: Option<String>,
    #[serde(rename = "priceId")]
    price_id: Option<String>,
    amount: Option<AmountInput>,
    currency: Option<String>,
    #[serde(rename = "productName")]
    product_name: Option<String>,
    #[serde(default)]
    mode: CheckoutMode,
    success_url: Option<String>,
    cancel_url: Option<String>,
}

#[tracing::instrument(name = "create_checkout_session", skip_all)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = body(payload)?;
    let user_id = UserId::new(required(non_blank(req.user_id), "userId")?)?;

    let line_item = match (non_blank(req.price_id), req.amount) {
        (Some(price_id), _) => LineItem::Price { price_id },
        (None, Some(amount)) => LineItem::Amount {
            money: amount.into_money(currency(req.currency.as_deref())?)?,
            product_name: non_blank(req.product_name).unwrap_or_else(|| "Payment".into()),
        },
        (None, None) => return Err(BrokerError::MissingField("priceId").into()),
    };

    let input = CheckoutInput {
        user_id,
        email: non_blank(req.email),
        line_item,
        mode: req.mode,
        success_url: non_blank(req.success_url).unwrap_or_else(|| {
            format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", state.base_url)
        }),
        cancel_url: non_blank(req.cancel_url)
            .unwrap_or_else(|| format!("{}/cancel", state.base_url)),
    };

    let session = payments::create_checkout_session(&state.store, &*state.stripe, input).await?;
    Ok(Json(serde_json::json!({
        "url": session.url,
        "sessionId": session.id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntentBody {
    amount: Option<AmountInput>,
    currency: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[tracing::instrument(name = "create_payment_intent", skip_all)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    payload: Result<Json<PaymentIntentBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = body(payload)?;
    let money = required(req.amount, "amount")?.into_money(currency(req.currency.as_deref())?)?;
    let user_id = non_blank(req.user_id).map(UserId::new).transpose()?;

    let intent = payments::create_payment_intent(&state.store, &*state.stripe, money, user_id).await?;
    Ok(Json(serde_json::json!({
        "clientSecret": intent.client_secret,
        "paymentIntentId": intent.id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct PaypalOrderBody {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    amount: Option<AmountInput>,
    currency: Option<String>,
    description: Option<String>,
}

#[tracing::instrument(name = "create_paypal_order", skip_all)]
pub async fn create_paypal_order(
    State(state): State<AppState>,
    payload: Result<Json<PaypalOrderBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = body(payload)?;
    let money = required(req.amount, "amount")?.into_money(currency(req.currency.as_deref())?)?;

    let request = PaypalOrderRequest {
        money,
        description: non_blank(req.description),
        user_id: non_blank(req.user_id).map(UserId::new).transpose()?,
        return_url: format!("{}/paypal/return", state.base_url),
        cancel_url: format!("{}/paypal/cancel", state.base_url),
    };

    let order = payments::create_paypal_order(&state.store, &*state.paypal, request).await?;
    Ok(Json(serde_json::json!({
        "orderId": order.id,
        "approvalUrl": order.approval_url,
        "status": order.status,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CaptureBody {
    #[serde(rename = "orderId")]
    order_id: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

#[tracing::instrument(name = "capture_paypal_order", skip_all)]
pub async fn capture_paypal_order(
    State(state): State<AppState>,
    payload: Result<Json<CaptureBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = body(payload)?;
    let order_id = OrderId::new(required(non_blank(req.order_id), "orderId")?)?;
    let user_id = non_blank(req.user_id).map(UserId::new).transpose()?;

    let capture =
        payments::capture_paypal_order(&state.store, &*state.paypal, order_id, user_id).await?;
    Ok(Json(serde_json::json!({
        "ok": capture.success,
        "capture": capture.body,
    })))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

pub async fn subscription_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = UserId::new(required(non_blank(query.user_id), "userId")?)?;

    let body = match state.store.get_user(&user_id).await {
        Some(user) => serde_json::json!({
            "userId": user.id(),
            "subscriptionStatus": user.subscription_status(),
            "subscriptionId": user.subscription_id(),
            "stripeCustomerId": user.customer_id(),
        }),
        None => serde_json::json!({
            "userId": user_id,
            "subscriptionStatus": SubscriptionStatus::None,
            "subscriptionId": null,
            "stripeCustomerId": null,
        }),
    };
    Ok(Json(body))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path((provider, id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let provider = Provider::try_from(provider.as_str())?;
    let order_id = OrderId::new(id)?;

    let order = state
        .store
        .get_order(provider, &order_id)
        .await
        .ok_or_else(|| BrokerError::NotFound(format!("{provider} order {order_id}")))?;
    Ok(Json(serde_json::to_value(order).map_err(BrokerError::from)?))
}

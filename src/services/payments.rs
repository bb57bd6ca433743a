use {
    crate::{
        domain::{
            error::BrokerError,
            id::{CustomerId, OrderId, UserId},
            money::Money,
            order::{OrderPatch, Provider},
            provider::{
                CheckoutMode, CheckoutRequest, CreatedCheckoutSession, CreatedPaymentIntent,
                CreatedPaypalOrder, LineItem, PaypalCapture, PaypalGateway, PaypalOrderRequest,
                StripeGateway,
            },
        },
        infra::memory::record_store::RecordStore,
    },
};

#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub user_id: UserId,
    pub email: Option<String>,
    pub line_item: LineItem,
    pub mode: CheckoutMode,
    pub success_url: String,
    pub cancel_url: String,
}

/// Open a Stripe checkout session for a user, creating the user record and
/// the Stripe customer on first use.
pub async fn create_checkout_session(
    store: &RecordStore,
    stripe: &dyn StripeGateway,
    input: CheckoutInput,
) -> Result<CreatedCheckoutSession, BrokerError> {
    let customer_id = ensure_customer(store, stripe, &input.user_id, input.email.as_deref()).await?;

    let money = match &input.line_item {
        LineItem::Amount { money, .. } => Some(money.clone()),
        LineItem::Price { .. } => None,
    };
    let request = CheckoutRequest {
        user_id: input.user_id.clone(),
        customer_id,
        line_item: input.line_item,
        mode: input.mode,
        success_url: input.success_url,
        cancel_url: input.cancel_url,
    };
    let session = stripe.create_checkout_session(&request).await?;

    store
        .upsert_order(
            Provider::Stripe,
            &session.id,
            OrderPatch {
                user_id: Some(input.user_id.clone()),
                status: Some("open".into()),
                money,
                capture: None,
            },
        )
        .await;
    tracing::info!(user_id = %input.user_id, session_id = %session.id, mode = ?input.mode, "checkout session created");

    Ok(session)
}

async fn ensure_customer(
    store: &RecordStore,
    stripe: &dyn StripeGateway,
    user_id: &UserId,
    email: Option<&str>,
) -> Result<CustomerId, BrokerError> {
    let user = store.upsert_user(user_id, email).await;
    if let Some(existing) = user.customer_id() {
        return Ok(existing.clone());
    }

    let created = stripe.create_customer(user_id, user.email()).await?;
    match store.assign_customer_id(user_id, created.clone()).await {
        Ok(_) => Ok(created),
        Err(BrokerError::Inconsistency(msg)) => {
            // A concurrent checkout for the same user won the assignment.
            let winner = store
                .get_user(user_id)
                .await
                .and_then(|u| u.customer_id().cloned());
            match winner {
                Some(winner) => {
                    tracing::warn!(user_id = %user_id, orphan = %created, customer_id = %winner, "concurrent customer creation, using existing customer");
                    Ok(winner)
                }
                None => Err(BrokerError::Inconsistency(msg)),
            }
        }
        Err(e) => Err(e),
    }
}

pub async fn create_payment_intent(
    store: &RecordStore,
    stripe: &dyn StripeGateway,
    money: Money,
    user_id: Option<UserId>,
) -> Result<CreatedPaymentIntent, BrokerError> {
    let intent = stripe.create_payment_intent(&money, user_id.as_ref()).await?;

    store
        .upsert_order(
            Provider::Stripe,
            &intent.id,
            OrderPatch {
                user_id,
                status: Some("created".into()),
                money: Some(money),
                capture: None,
            },
        )
        .await;
    tracing::info!(payment_intent_id = %intent.id, "payment intent created");

    Ok(intent)
}

pub async fn create_paypal_order(
    store: &RecordStore,
    paypal: &dyn PaypalGateway,
    request: PaypalOrderRequest,
) -> Result<CreatedPaypalOrder, BrokerError> {
    let order = paypal.create_order(&request).await?;

    store
        .upsert_order(
            Provider::Paypal,
            &order.id,
            OrderPatch {
                user_id: request.user_id,
                status: Some(order.status.clone()),
                money: Some(request.money),
                capture: None,
            },
        )
        .await;
    tracing::info!(order_id = %order.id, status = %order.status, "paypal order created");

    Ok(order)
}

/// Capture a PayPal order. The provider's answer is returned as-is, even
/// when it reports a failure; only a successful capture touches the store.
pub async fn capture_paypal_order(
    store: &RecordStore,
    paypal: &dyn PaypalGateway,
    order_id: OrderId,
    user_id: Option<UserId>,
) -> Result<PaypalCapture, BrokerError> {
    let capture = paypal.capture_order(&order_id).await?;

    if capture.success {
        store
            .upsert_order(
                Provider::Paypal,
                &order_id,
                OrderPatch {
                    user_id,
                    status: Some(capture.status.clone().unwrap_or_else(|| "completed".into())),
                    money: None,
                    capture: Some(capture.body.clone()),
                },
            )
            .await;
        tracing::info!(order_id = %order_id, status = ?capture.status, "paypal order captured");
    } else {
        tracing::warn!(order_id = %order_id, body = %capture.body, "paypal capture rejected");
    }

    Ok(capture)
}

use {
    crate::{
        adapters::stripe::client::convert_subscription_status,
        domain::{
            error::BrokerError,
            event::{PaypalEvent, PaypalEventKind},
            id::{CustomerId, OrderId, SubscriptionId, UserId},
            order::{OrderPatch, Provider},
            user::SubscriptionStatus,
        },
        infra::memory::record_store::RecordStore,
    },
};

/// What a webhook did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    CheckoutCompleted {
        order_id: OrderId,
        activated: Option<UserId>,
    },
    SubscriptionSynced {
        user_id: UserId,
        status: SubscriptionStatus,
    },
    OrderUpdated {
        order_id: OrderId,
        status: String,
    },
    /// The event names a customer no local user owns.
    UnmatchedCustomer(CustomerId),
    /// Recognised but intentionally not applied.
    Logged,
    /// Event type we don't handle.
    Ignored,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted { .. } => "order_completed",
            Self::SubscriptionSynced { .. } => "subscription_updated",
            Self::OrderUpdated { .. } => "order_updated",
            Self::UnmatchedCustomer(_) => "unmatched",
            Self::Logged => "logged",
            Self::Ignored => "ignored",
        }
    }
}

fn customer_id(customer: &stripe::Expandable<stripe::Customer>) -> Result<CustomerId, BrokerError> {
    CustomerId::new(match customer {
        stripe::Expandable::Id(id) => id.to_string(),
        stripe::Expandable::Object(c) => c.id.to_string(),
    })
}

fn subscription_id(
    sub: &stripe::Expandable<stripe::Subscription>,
) -> Result<SubscriptionId, BrokerError> {
    SubscriptionId::new(match sub {
        stripe::Expandable::Id(id) => id.to_string(),
        stripe::Expandable::Object(s) => s.id.to_string(),
    })
}

/// The local user a session was opened for: `metadata.userId`, else
/// `client_reference_id`.
fn session_user(session: &stripe::CheckoutSession) -> Option<&str> {
    session
        .metadata
        .as_ref()
        .and_then(|m| m.get("userId"))
        .map(String::as_str)
        .or(session.client_reference_id.as_deref())
        .filter(|id| !id.is_empty())
}

pub async fn reconcile_stripe_event(
    store: &RecordStore,
    event: &stripe::Event,
) -> Result<ReconcileOutcome, BrokerError> {
    use stripe::{EventObject, EventType};

    match (&event.type_, &event.data.object) {
        (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
            checkout_completed(store, session).await
        }
        (EventType::InvoicePaymentSucceeded | EventType::InvoicePaid, _) => {
            tracing::info!(event_id = %event.id, "invoice paid, nothing to apply");
            Ok(ReconcileOutcome::Logged)
        }
        (
            EventType::CustomerSubscriptionCreated
            | EventType::CustomerSubscriptionUpdated
            | EventType::CustomerSubscriptionDeleted,
            EventObject::Subscription(sub),
        ) => sync_subscription(store, sub).await,
        (
            EventType::CheckoutSessionCompleted
            | EventType::CustomerSubscriptionCreated
            | EventType::CustomerSubscriptionUpdated
            | EventType::CustomerSubscriptionDeleted,
            _,
        ) => Err(BrokerError::Validation(format!(
            "{:?} carries an unexpected object",
            event.type_
        ))),
        (other, _) => {
            tracing::info!(event_type = ?other, "unhandled stripe event");
            Ok(ReconcileOutcome::Ignored)
        }
    }
}

async fn checkout_completed(
    store: &RecordStore,
    session: &stripe::CheckoutSession,
) -> Result<ReconcileOutcome, BrokerError> {
    let order_id = OrderId::new(session.id.to_string())?;
    let user_id = session_user(session).map(UserId::new).transpose()?;

    store
        .upsert_order(
            Provider::Stripe,
            &order_id,
            OrderPatch {
                user_id,
                status: Some("completed".into()),
                ..Default::default()
            },
        )
        .await;
    tracing::info!(order_id = %order_id, payment_status = ?session.payment_status, "checkout session completed");

    let Some(subscription) = &session.subscription else {
        return Ok(ReconcileOutcome::CheckoutCompleted {
            order_id,
            activated: None,
        });
    };
    let Some(customer) = &session.customer else {
        tracing::warn!(order_id = %order_id, "subscription checkout without customer");
        return Ok(ReconcileOutcome::CheckoutCompleted {
            order_id,
            activated: None,
        });
    };

    let customer_id = customer_id(customer)?;
    let subscription_id = subscription_id(subscription)?;
    match store
        .set_subscription_for_customer(&customer_id, subscription_id, SubscriptionStatus::Active)
        .await
    {
        Some(user) => {
            tracing::info!(user_id = %user.id(), customer_id = %customer_id, "subscription activated");
            Ok(ReconcileOutcome::CheckoutCompleted {
                order_id,
                activated: Some(user.id().clone()),
            })
        }
        None => {
            tracing::warn!(customer_id = %customer_id, "no user owns checkout customer");
            Ok(ReconcileOutcome::UnmatchedCustomer(customer_id))
        }
    }
}

async fn sync_subscription(
    store: &RecordStore,
    sub: &stripe::Subscription,
) -> Result<ReconcileOutcome, BrokerError> {
    let customer_id = customer_id(&sub.customer)?;
    let subscription_id = SubscriptionId::new(sub.id.to_string())?;
    let status = convert_subscription_status(sub.status);

    match store
        .set_subscription_for_customer(&customer_id, subscription_id, status)
        .await
    {
        Some(user) => {
            tracing::info!(user_id = %user.id(), status = %status, "subscription synced");
            Ok(ReconcileOutcome::SubscriptionSynced {
                user_id: user.id().clone(),
                status,
            })
        }
        None => {
            tracing::warn!(customer_id = %customer_id, "no user owns subscription customer");
            Ok(ReconcileOutcome::UnmatchedCustomer(customer_id))
        }
    }
}

pub async fn reconcile_paypal_event(
    store: &RecordStore,
    event: &PaypalEvent,
) -> Result<ReconcileOutcome, BrokerError> {
    let status = match event.kind() {
        PaypalEventKind::CaptureCompleted => "completed",
        PaypalEventKind::OrderApproved => "approved",
        PaypalEventKind::Unknown => {
            tracing::info!(event_type = %event.event_type, "unhandled paypal event");
            return Ok(ReconcileOutcome::Ignored);
        }
    };

    let order_id = event
        .order_id()
        .ok_or_else(|| BrokerError::Validation(format!("{} without order id", event.event_type)))
        .and_then(OrderId::new)?;
    let user_id = event
        .resource
        .get("custom_id")
        .and_then(|v| v.as_str())
        .map(UserId::new)
        .transpose()?;
    let capture = match event.kind() {
        PaypalEventKind::CaptureCompleted => Some(event.resource.clone()),
        _ => None,
    };

    store
        .upsert_order(
            Provider::Paypal,
            &order_id,
            OrderPatch {
                user_id,
                status: Some(status.into()),
                capture,
                ..Default::default()
            },
        )
        .await;
    tracing::info!(order_id = %order_id, status, "paypal order updated");

    Ok(ReconcileOutcome::OrderUpdated {
        order_id,
        status: status.into(),
    })
}

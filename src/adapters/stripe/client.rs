use {
    crate::domain::{
        error::BrokerError,
        id::{CustomerId, OrderId, UserId},
        money::{Currency, Money},
        user::SubscriptionStatus,
        provider::{
            CheckoutMode, CheckoutRequest, CreatedCheckoutSession, CreatedPaymentIntent, LineItem,
            ProviderFuture, StripeGateway,
        },
    },
    std::collections::HashMap,
};

pub struct StripeProvider {
    client: stripe::Client,
}

impl StripeProvider {
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: stripe::Client::new(secret_key),
        }
    }
}

impl StripeGateway for StripeProvider {
    fn create_customer<'a>(
        &'a self,
        user_id: &'a UserId,
        email: Option<&'a str>,
    ) -> ProviderFuture<'a, CustomerId> {
        Box::pin(async move { self.create_customer_inner(user_id, email).await })
    }

    fn create_checkout_session<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> ProviderFuture<'a, CreatedCheckoutSession> {
        Box::pin(async move { self.create_checkout_session_inner(request).await })
    }

    fn create_payment_intent<'a>(
        &'a self,
        money: &'a Money,
        user_id: Option<&'a UserId>,
    ) -> ProviderFuture<'a, CreatedPaymentIntent> {
        Box::pin(async move { self.create_payment_intent_inner(money, user_id).await })
    }
}

impl StripeProvider {
    async fn create_customer_inner(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> Result<CustomerId, BrokerError> {
        let mut params = stripe::CreateCustomer::new();
        params.email = email;
        params.metadata = Some(user_metadata(user_id));

        let customer = stripe::Customer::create(&self.client, params)
            .await
            .map_err(|e| BrokerError::Provider(e.to_string()))?;

        tracing::info!(user_id = %user_id, customer_id = %customer.id, "stripe customer created");
        CustomerId::new(customer.id.to_string())
    }

    async fn create_checkout_session_inner(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CreatedCheckoutSession, BrokerError> {
        let customer = request
            .customer_id
            .as_str()
            .parse::<stripe::CustomerId>()
            .map_err(|e| BrokerError::Validation(format!("invalid Customer id: {e}")))?;

        let line_item = match &request.line_item {
            LineItem::Price { price_id } => stripe::CreateCheckoutSessionLineItems {
                price: Some(price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            },
            LineItem::Amount {
                money,
                product_name,
            } => stripe::CreateCheckoutSessionLineItems {
                price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                    currency: to_stripe_currency(money.currency()),
                    unit_amount: Some(money.amount().minor_units()),
                    product_data: Some(
                        stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                            name: product_name.clone(),
                            ..Default::default()
                        },
                    ),
                    ..Default::default()
                }),
                quantity: Some(1),
                ..Default::default()
            },
        };

        let mut params = stripe::CreateCheckoutSession::new();
        params.customer = Some(customer);
        params.mode = Some(match request.mode {
            CheckoutMode::Payment => stripe::CheckoutSessionMode::Payment,
            CheckoutMode::Subscription => stripe::CheckoutSessionMode::Subscription,
        });
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.client_reference_id = Some(request.user_id.as_str());
        params.line_items = Some(vec![line_item]);
        params.metadata = Some(user_metadata(&request.user_id));

        let session = stripe::CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| BrokerError::Provider(e.to_string()))?;

        Ok(CreatedCheckoutSession {
            id: OrderId::new(session.id.to_string())?,
            url: session.url,
        })
    }

    async fn create_payment_intent_inner(
        &self,
        money: &Money,
        user_id: Option<&UserId>,
    ) -> Result<CreatedPaymentIntent, BrokerError> {
        let mut params = stripe::CreatePaymentIntent::new(
            money.amount().minor_units(),
            to_stripe_currency(money.currency()),
        );
        params.metadata = user_id.map(user_metadata);

        let pi = stripe::PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| BrokerError::Provider(e.to_string()))?;

        let client_secret = pi.client_secret.ok_or_else(|| {
            BrokerError::Provider(format!("payment intent {} has no client secret", pi.id))
        })?;

        Ok(CreatedPaymentIntent {
            id: OrderId::new(pi.id.to_string())?,
            client_secret,
        })
    }
}

fn user_metadata(user_id: &UserId) -> HashMap<String, String> {
    HashMap::from([("userId".to_string(), user_id.as_str().to_string())])
}

pub fn to_stripe_currency(c: &Currency) -> stripe::Currency {
    match c {
        Currency::Usd => stripe::Currency::USD,
        Currency::Eur => stripe::Currency::EUR,
        Currency::Gbp => stripe::Currency::GBP,
        Currency::Jpy => stripe::Currency::JPY,
        Currency::Cad => stripe::Currency::CAD,
        Currency::Aud => stripe::Currency::AUD,
    }
}

pub fn convert_subscription_status(status: stripe::SubscriptionStatus) -> SubscriptionStatus {
    #[allow(unreachable_patterns)]
    match status {
        stripe::SubscriptionStatus::Active => SubscriptionStatus::Active,
        stripe::SubscriptionStatus::Canceled => SubscriptionStatus::Canceled,
        stripe::SubscriptionStatus::Incomplete => SubscriptionStatus::Incomplete,
        stripe::SubscriptionStatus::IncompleteExpired => SubscriptionStatus::IncompleteExpired,
        stripe::SubscriptionStatus::PastDue => SubscriptionStatus::PastDue,
        stripe::SubscriptionStatus::Paused => SubscriptionStatus::Paused,
        stripe::SubscriptionStatus::Trialing => SubscriptionStatus::Trialing,
        stripe::SubscriptionStatus::Unpaid => SubscriptionStatus::Unpaid,
        other => {
            tracing::warn!("unknown SubscriptionStatus: {other:?}, defaulting to Incomplete");
            SubscriptionStatus::Incomplete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_statuses_map_one_to_one() {
        for (theirs, ours) in [
            (stripe::SubscriptionStatus::Active, SubscriptionStatus::Active),
            (stripe::SubscriptionStatus::Canceled, SubscriptionStatus::Canceled),
            (stripe::SubscriptionStatus::PastDue, SubscriptionStatus::PastDue),
            (stripe::SubscriptionStatus::Trialing, SubscriptionStatus::Trialing),
            (
                stripe::SubscriptionStatus::IncompleteExpired,
                SubscriptionStatus::IncompleteExpired,
            ),
        ] {
            assert_eq!(convert_subscription_status(theirs), ours);
        }
    }

    #[test]
    fn currencies_map_to_stripe_codes() {
        assert_eq!(to_stripe_currency(&Currency::Jpy), stripe::Currency::JPY);
        assert_eq!(to_stripe_currency(&Currency::default()), stripe::Currency::USD);
    }
}

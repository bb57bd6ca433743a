use {
    crate::{
        AppState,
        domain::error::BrokerError,
        services::reconciler::{ReconcileOutcome, reconcile_stripe_event},
        transport::http::errors::ApiError,
    },
    axum::{Json, extract::State, http::HeaderMap},
};

#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(event_id = tracing::field::Empty, event_type = tracing::field::Empty)
)]
pub async fn wh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sig = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok());

    let event = state.verifier.verify(&body, sig)?;

    tracing::Span::current()
        .record("event_id", tracing::field::display(&event.id))
        .record("event_type", tracing::field::debug(&event.type_));

    match reconcile_stripe_event(&state.store, &event).await {
        Ok(outcome) => {
            if let ReconcileOutcome::UnmatchedCustomer(customer_id) = &outcome {
                tracing::warn!(customer_id = %customer_id, "event for unknown customer acknowledged");
            }
            Ok(Json(serde_json::json!({
                "received": true,
                "status": outcome.as_str(),
            })))
        }
        Err(BrokerError::Validation(msg)) => {
            tracing::warn!("skipping invalid event data: {msg}");
            Ok(Json(serde_json::json!({
                "received": true,
                "status": "ignored_invalid_data",
            })))
        }
        Err(e) => {
            tracing::error!(error = %e, "webhook reconciliation failed");
            Err(BrokerError::Internal(e.to_string()).into())
        }
    }
}

use {
    crate::{
        AppState,
        domain::{error::BrokerError, event::PaypalEvent},
        services::reconciler::reconcile_paypal_event,
        transport::http::errors::ApiError,
    },
    axum::{Json, extract::State},
};

/// PayPal deliveries are not verified.
// TODO: call PayPal's verify-webhook-signature endpoint once PAYPAL_WEBHOOK_ID is configured.
#[tracing::instrument(
    name = "paypal_webhook",
    skip_all,
    fields(event_id = tracing::field::Empty, event_type = tracing::field::Empty)
)]
pub async fn paypal_wh_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event: PaypalEvent =
        serde_json::from_str(&body).map_err(|e| BrokerError::InvalidPayload(e.to_string()))?;

    tracing::Span::current()
        .record("event_id", tracing::field::debug(&event.id))
        .record("event_type", tracing::field::display(&event.event_type));

    match reconcile_paypal_event(&state.store, &event).await {
        Ok(outcome) => Ok(Json(serde_json::json!({
            "ok": true,
            "status": outcome.as_str(),
        }))),
        Err(BrokerError::Validation(msg)) => {
            tracing::warn!("skipping invalid paypal event data: {msg}");
            Ok(Json(serde_json::json!({
                "ok": true,
                "status": "ignored_invalid_data",
            })))
        }
        Err(e) => {
            tracing::error!(error = %e, "paypal webhook reconciliation failed");
            Err(BrokerError::Internal(e.to_string()).into())
        }
    }
}

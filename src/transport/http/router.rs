use {
    crate::{
        AppState,
        adapters::{paypal::webhook::paypal_wh_handler, stripe::webhook::wh_handler},
        transport::http::handlers,
    },
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    std::time::Duration,
    tower::ServiceBuilder,
    tower_http::timeout::TimeoutLayer,
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Provider events are well under this.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/create-checkout-session",
            post(handlers::create_checkout_session),
        )
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/create-paypal-order", post(handlers::create_paypal_order))
        .route("/capture-paypal-order", post(handlers::capture_paypal_order))
        .route("/subscription-status", get(handlers::subscription_status))
        .route("/orders/{provider}/{id}", get(handlers::get_order))
        .route("/webhook", post(wh_handler))
        .route("/paypal-webhook", post(paypal_wh_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        )
        .with_state(state)
}

use {
    pay_broker::{
        AppState,
        adapters::{
            paypal::client::PaypalProvider,
            stripe::{client::StripeProvider, signature::WebhookVerifier},
        },
        config::Config,
        infra::memory::record_store::RecordStore,
        transport::http::router,
    },
    std::sync::Arc,
    tokio::signal,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("invalid configuration");

    let verifier = WebhookVerifier::from_config(
        config.stripe_webhook_secret.as_deref(),
        config.allow_unverified_webhooks,
    );
    match &verifier {
        WebhookVerifier::Signed { .. } => {}
        WebhookVerifier::Unverified => {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set, accepting UNSIGNED webhooks")
        }
        WebhookVerifier::Disabled => {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set, stripe webhooks will be rejected")
        }
    }

    let state = AppState {
        store: Arc::new(RecordStore::new()),
        stripe: Arc::new(StripeProvider::new(&config.stripe_secret_key)),
        paypal: Arc::new(PaypalProvider::new(
            config.paypal_mode,
            &config.paypal_client_id,
            &config.paypal_client_secret,
        )),
        verifier: Arc::new(verifier),
        base_url: config.base_url.clone().into(),
    };

    let app = router::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!(paypal_mode = ?config.paypal_mode, "listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

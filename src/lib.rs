pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;
pub mod transport;

use {
    adapters::stripe::signature::WebhookVerifier,
    domain::provider::{PaypalGateway, StripeGateway},
    infra::memory::record_store::RecordStore,
    std::sync::Arc,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub stripe: Arc<dyn StripeGateway>,
    pub paypal: Arc<dyn PaypalGateway>,
    pub verifier: Arc<WebhookVerifier>,
    pub base_url: Arc<str>,
}

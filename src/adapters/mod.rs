pub mod paypal;
pub mod stripe;

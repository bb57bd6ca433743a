pub mod payments;
pub mod reconciler;

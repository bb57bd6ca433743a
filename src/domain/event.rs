use serde::Deserialize;

/// PayPal webhook delivery. Only the fields the reconciler reads.
#[derive(Debug, Clone, Deserialize)]
pub struct PaypalEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub resource: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaypalEventKind {
    CaptureCompleted,
    OrderApproved,
    Unknown,
}

impl From<&str> for PaypalEventKind {
    fn from(s: &str) -> Self {
        match s {
            "PAYMENT.CAPTURE.COMPLETED" => Self::CaptureCompleted,
            "CHECKOUT.ORDER.APPROVED" => Self::OrderApproved,
            _ => Self::Unknown,
        }
    }
}

impl PaypalEvent {
    pub fn kind(&self) -> PaypalEventKind {
        PaypalEventKind::from(self.event_type.as_str())
    }

    /// The order a capture belongs to. Capture resources carry it under
    /// `supplementary_data.related_ids.order_id`; order resources are the
    /// order itself.
    pub fn order_id(&self) -> Option<&str> {
        let related = self
            .resource
            .pointer("/supplementary_data/related_ids/order_id")
            .and_then(|v| v.as_str());
        match self.kind() {
            PaypalEventKind::CaptureCompleted => {
                related.or_else(|| self.resource.get("id").and_then(|v| v.as_str()))
            }
            _ => self.resource.get("id").and_then(|v| v.as_str()),
        }
    }
}

use {
    super::error::BrokerError,
    super::id::{OrderId, UserId},
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Stripe,
    Paypal,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Paypal => "paypal",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Provider {
    type Error = BrokerError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            other => Err(BrokerError::Validation(format!("unknown provider: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    id: OrderId,
    provider: Provider,
    user_id: Option<UserId>,
    status: String,
    money: Option<Money>,
    capture: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Fields to merge into an order. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub user_id: Option<UserId>,
    pub status: Option<String>,
    pub money: Option<Money>,
    pub capture: Option<serde_json::Value>,
}

impl OrderPatch {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }
}

impl OrderRecord {
    pub fn new(id: OrderId, provider: Provider, patch: OrderPatch) -> Self {
        let now = Utc::now();
        Self {
            id,
            provider,
            user_id: patch.user_id,
            status: patch.status.unwrap_or_else(|| "created".into()),
            money: patch.money,
            capture: patch.capture,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn merge(&mut self, patch: OrderPatch) {
        if let Some(user_id) = patch.user_id {
            self.user_id = Some(user_id);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(money) = patch.money {
            self.money = Some(money);
        }
        if let Some(capture) = patch.capture {
            self.capture = Some(capture);
        }
        self.updated_at = Utc::now();
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn money(&self) -> Option<&Money> {
        self.money.as_ref()
    }

    pub fn capture(&self) -> Option<&serde_json::Value> {
        self.capture.as_ref()
    }
}

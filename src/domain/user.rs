use {
    super::error::BrokerError,
    super::id::{CustomerId, SubscriptionId, UserId},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Subscription state as last reported by Stripe. `None` means the user
/// never had one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    None,
    Incomplete,
    IncompleteExpired,
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
        }
    }

    /// Whether the user currently has paid access.
    pub fn is_entitled(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    id: UserId,
    email: Option<String>,
    customer_id: Option<CustomerId>,
    subscription_id: Option<SubscriptionId>,
    subscription_status: SubscriptionStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(id: UserId, email: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            customer_id: None,
            subscription_id: None,
            subscription_status: SubscriptionStatus::None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn customer_id(&self) -> Option<&CustomerId> {
        self.customer_id.as_ref()
    }

    pub fn subscription_id(&self) -> Option<&SubscriptionId> {
        self.subscription_id.as_ref()
    }

    pub fn subscription_status(&self) -> SubscriptionStatus {
        self.subscription_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Customer ids are write-once. Re-assigning the same id is a no-op.
    pub fn assign_customer(&mut self, customer_id: CustomerId) -> Result<(), BrokerError> {
        match &self.customer_id {
            Some(existing) if *existing == customer_id => Ok(()),
            Some(existing) => Err(BrokerError::Inconsistency(format!(
                "user {} already has customer {existing}, refusing {customer_id}",
                self.id
            ))),
            None => {
                self.customer_id = Some(customer_id);
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    pub fn set_subscription(&mut self, id: SubscriptionId, status: SubscriptionStatus) {
        self.subscription_id = Some(id);
        self.subscription_status = status;
        self.updated_at = Utc::now();
    }
}

use {
    crate::domain::{
        error::BrokerError,
        id::{CustomerId, OrderId, SubscriptionId, UserId},
        order::{OrderPatch, OrderRecord, Provider},
        user::{SubscriptionStatus, UserRecord},
    },
    std::collections::HashMap,
    tokio::sync::RwLock,
};

#[derive(Default)]
struct Users {
    by_id: HashMap<UserId, UserRecord>,
    // Maintained on every customer assignment; the only way users are
    // looked up by customer.
    by_customer: HashMap<CustomerId, UserId>,
}

/// In-process users and orders. Nothing survives a restart.
///
/// Every operation takes one lock for its whole read-modify-write, so a
/// failed operation leaves nothing half-applied. Concurrent writers to the
/// same record are last-write-wins.
#[derive(Default)]
pub struct RecordStore {
    users: RwLock<Users>,
    orders: RwLock<HashMap<(Provider, OrderId), OrderRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the user if unseen, otherwise return it untouched. `email`
    /// only applies on creation.
    pub async fn upsert_user(&self, id: &UserId, email: Option<&str>) -> UserRecord {
        let mut users = self.users.write().await;
        users
            .by_id
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(user_id = %id, "user record created");
                UserRecord::new(id.clone(), email.map(str::to_string))
            })
            .clone()
    }

    pub async fn get_user(&self, id: &UserId) -> Option<UserRecord> {
        self.users.read().await.by_id.get(id).cloned()
    }

    pub async fn find_user_by_customer_id(&self, customer_id: &CustomerId) -> Option<UserRecord> {
        let users = self.users.read().await;
        users
            .by_customer
            .get(customer_id)
            .and_then(|user_id| users.by_id.get(user_id))
            .cloned()
    }

    /// Bind a customer to a user. Rejects a customer already bound to a
    /// different user, and a user already bound to a different customer.
    pub async fn assign_customer_id(
        &self,
        user_id: &UserId,
        customer_id: CustomerId,
    ) -> Result<UserRecord, BrokerError> {
        let mut guard = self.users.write().await;
        let users = &mut *guard;

        if let Some(owner) = users.by_customer.get(&customer_id) {
            if owner != user_id {
                return Err(BrokerError::Inconsistency(format!(
                    "customer {customer_id} is already assigned to user {owner}, refusing user {user_id}"
                )));
            }
        }

        let user = users
            .by_id
            .get_mut(user_id)
            .ok_or_else(|| BrokerError::NotFound(format!("user {user_id}")))?;
        user.assign_customer(customer_id.clone())?;
        users.by_customer.insert(customer_id, user_id.clone());
        Ok(user.clone())
    }

    /// Overwrite the subscription of whichever user owns `customer_id`.
    /// Returns `None` when no user does.
    pub async fn set_subscription_for_customer(
        &self,
        customer_id: &CustomerId,
        subscription_id: SubscriptionId,
        status: SubscriptionStatus,
    ) -> Option<UserRecord> {
        let mut guard = self.users.write().await;
        let users = &mut *guard;
        let user_id = users.by_customer.get(customer_id)?;
        let user = users.by_id.get_mut(user_id)?;
        user.set_subscription(subscription_id, status);
        Some(user.clone())
    }

    pub async fn upsert_order(
        &self,
        provider: Provider,
        id: &OrderId,
        patch: OrderPatch,
    ) -> OrderRecord {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&(provider, id.clone())) {
            Some(existing) => {
                existing.merge(patch);
                existing.clone()
            }
            None => {
                let order = OrderRecord::new(id.clone(), provider, patch);
                orders.insert((provider, id.clone()), order.clone());
                order
            }
        }
    }

    pub async fn get_order(&self, provider: Provider, id: &OrderId) -> Option<OrderRecord> {
        self.orders.read().await.get(&(provider, id.clone())).cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

mod common;

use axum::http::StatusCode;
use common::*;
use pay_broker::domain::id::{CustomerId, OrderId, SubscriptionId, UserId};
use pay_broker::domain::order::{OrderPatch, Provider};
use pay_broker::domain::user::SubscriptionStatus;
use pay_broker::infra::memory::record_store::RecordStore;
use serde_json::json;
use std::sync::Arc;

// ── concurrent checkouts for one user ──────────────────────────────────────
// 10 tasks check out the same user at once. The user must end with exactly
// one customer, and every session must be opened against that customer.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_bind_one_customer() {
    let app = Arc::new(test_app());

    let mut handles = Vec::new();
    for _ in 0..10 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.post_json(
                "/create-checkout-session",
                json!({"userId": "u_race", "priceId": "price_1", "mode": "subscription"}),
            )
            .await
        }));
    }
    for h in handles {
        let (status, _) = h.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let user = app
        .store
        .get_user(&UserId::new("u_race").unwrap())
        .await
        .unwrap();
    let bound = user.customer_id().unwrap().clone();

    let sessions = app.stripe.sessions.lock().unwrap();
    assert_eq!(sessions.len(), 10);
    assert!(sessions.iter().all(|s| s.customer_id == bound));
    drop(sessions);

    assert_eq!(
        app.store.find_user_by_customer_id(&bound).await.unwrap().id().as_str(),
        "u_race"
    );
}

// ── concurrent claims on one customer ──────────────────────────────────────
// Different users race to claim the same customer id. Exactly one wins.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_customer_claims_have_one_winner() {
    let store = Arc::new(RecordStore::new());
    for i in 0..8 {
        store.upsert_user(&UserId::new(format!("u{i}")).unwrap(), None).await;
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .assign_customer_id(
                    &UserId::new(format!("u{i}")).unwrap(),
                    CustomerId::new("cus_contested").unwrap(),
                )
                .await
        }));
    }

    let mut ok = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1, "exactly one user owns the customer");

    let mut owners = 0;
    for i in 0..8 {
        let user = store
            .get_user(&UserId::new(format!("u{i}")).unwrap())
            .await
            .unwrap();
        if user.customer_id().is_some() {
            owners += 1;
        }
    }
    assert_eq!(owners, 1);
}

// ── concurrent webhook deliveries ──────────────────────────────────────────
// The same completed event delivered 5 times in parallel activates the user
// once and leaves a single order behind.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_deliveries_are_idempotent() {
    let app = Arc::new(test_app());
    let customer = checkout_user(&app, "u1").await;
    checkout_user(&app, "u2").await;
    let orders_before = app.store.order_count().await;

    let event = stripe_event(
        "checkout.session.completed",
        checkout_session("cs_dup", Some(customer.as_str()), Some("sub_dup"), None),
    );

    let mut handles = Vec::new();
    for _ in 0..5 {
        let app = app.clone();
        let event = event.clone();
        handles.push(tokio::spawn(async move { app.stripe_webhook(event).await }));
    }
    for h in handles {
        let (status, _) = h.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.store.order_count().await, orders_before + 1);
    let u1 = app.store.get_user(&UserId::new("u1").unwrap()).await.unwrap();
    assert_eq!(u1.subscription_status(), SubscriptionStatus::Active);
    assert_eq!(u1.subscription_id().unwrap().as_str(), "sub_dup");
    let u2 = app.store.get_user(&UserId::new("u2").unwrap()).await.unwrap();
    assert_eq!(u2.subscription_status(), SubscriptionStatus::None);
}

// ── concurrent order patches ───────────────────────────────────────────────
// Patches touching different fields of one order never drop each other.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_order_patches_merge() {
    let store = Arc::new(RecordStore::new());
    let id = OrderId::new("ORDER-RACE").unwrap();

    let a = {
        let store = store.clone();
        let id = id.clone();
        tokio::spawn(async move {
            store
                .upsert_order(
                    Provider::Paypal,
                    &id,
                    OrderPatch {
                        user_id: Some(UserId::new("u1").unwrap()),
                        ..Default::default()
                    },
                )
                .await
        })
    };
    let b = {
        let store = store.clone();
        let id = id.clone();
        tokio::spawn(async move {
            store
                .upsert_order(Provider::Paypal, &id, OrderPatch::status("completed"))
                .await
        })
    };
    a.await.unwrap();
    b.await.unwrap();

    let order = store.get_order(Provider::Paypal, &id).await.unwrap();
    assert_eq!(order.user_id().unwrap().as_str(), "u1");
    assert_eq!(order.status(), "completed");
    assert_eq!(store.order_count().await, 1);
}

// ── subscription updates racing with a new customer ────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscription_updates_only_reach_the_owner() {
    let store = Arc::new(RecordStore::new());
    for i in 0..4 {
        let uid = UserId::new(format!("u{i}")).unwrap();
        store.upsert_user(&uid, None).await;
        store
            .assign_customer_id(&uid, CustomerId::new(format!("cus_{i}")).unwrap())
            .await
            .unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..4 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .set_subscription_for_customer(
                    &CustomerId::new(format!("cus_{i}")).unwrap(),
                    SubscriptionId::new(format!("sub_{i}")).unwrap(),
                    SubscriptionStatus::Active,
                )
                .await
        }));
    }
    for h in handles {
        assert!(h.await.unwrap().is_some());
    }

    for i in 0..4 {
        let user = store
            .get_user(&UserId::new(format!("u{i}")).unwrap())
            .await
            .unwrap();
        assert_eq!(user.subscription_id().unwrap().to_string(), format!("sub_{i}"));
    }
}

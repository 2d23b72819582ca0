use campus_db::models::{EntityType, MembershipRole, MembershipStatus, PlanType};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::fixtures::test_app::TestApp;

const WEBHOOK_SECRET: &str = "whsec_test_secret";

fn sign(payload: &str, timestamp: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

async fn spawn() -> TestApp {
    TestApp::spawn_with_settings(|s| s.stripe.webhook_secret = WEBHOOK_SECRET.to_string()).await
}

#[tokio::test]
async fn completed_checkout_activates_membership() {
    let app = spawn().await;
    let user = app.register_user("school", "u@test.com", "u").await;
    app.seed_community(user.domain, "c1", false).await;
    app.seed_plan(user.domain, "pro-c1", EntityType::Community, "c1", PlanType::OneTime)
        .await;
    let pending = app
        .seed_pending_membership(user.domain, user.id, EntityType::Community, "c1", "pro-c1")
        .await;

    let payload = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "metadata": {
            "membership_id": pending.id.unwrap().to_hex(),
            "payment_plan_id": "pro-c1",
        }}},
    })
    .to_string();

    let resp = app
        .client
        .post(app.url("/api/payment/webhook"))
        .header("Stripe-Signature", sign(&payload, "1700000000"))
        .header("Content-Type", "application/json")
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let membership = app
        .state
        .memberships
        .base
        .find_by_id(pending.id.unwrap())
        .await
        .unwrap();
    assert_eq!(membership.status, MembershipStatus::Active);
    assert_eq!(membership.role, Some(MembershipRole::Post));
}

#[tokio::test]
async fn webhook_with_bad_signature_is_rejected() {
    let app = spawn().await;
    let payload = json!({"type": "checkout.session.completed", "data": {"object": {}}}).to_string();

    let resp = app
        .client
        .post(app.url("/api/payment/webhook"))
        .header("Stripe-Signature", "t=1700000000,v1=deadbeef")
        .body(payload.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .client
        .post(app.url("/api/payment/webhook"))
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn unrelated_events_are_acknowledged() {
    let app = spawn().await;
    let payload = json!({"type": "invoice.paid", "data": {"object": {}}}).to_string();

    let resp = app
        .client
        .post(app.url("/api/payment/webhook"))
        .header("Stripe-Signature", sign(&payload, "1700000001"))
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

use bson::oid::ObjectId;
use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn mail_job_is_delivered_by_the_worker() {
    let app = TestApp::spawn().await;

    let resp = app
        .service_post("/job/mail")
        .json(&json!({
            "to": ["a@test.com", "b@test.com"],
            "subject": "Hello",
            "body": "<p>Hi</p>",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Success");

    let sent = app.wait_for_mail(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@test.com, b@test.com");
    assert_eq!(sent[0].from, app.settings.mail.from);
    assert_eq!(sent[0].subject, "Hello");
    assert_eq!(sent[0].html, "<p>Hi</p>");
}

#[tokio::test]
async fn explicit_sender_is_kept() {
    let app = TestApp::spawn().await;

    app.service_post("/job/mail")
        .json(&json!({
            "to": ["a@test.com"],
            "from": "Coach <coach@test.com>",
            "subject": "s",
            "body": "b",
        }))
        .send()
        .await
        .unwrap();

    let sent = app.wait_for_mail(1).await;
    assert_eq!(sent[0].from, "Coach <coach@test.com>");
}

#[tokio::test]
async fn job_endpoints_reject_missing_or_foreign_tokens() {
    let app = TestApp::spawn().await;
    let user = app.register_user("school", "u@test.com", "u").await;
    let body = json!({
        "domain": user.domain.to_hex(),
        "userId": user.id.to_hex(),
        "forUserIds": [ObjectId::new().to_hex()],
        "entityAction": "reply",
        "entityId": "p1",
    });

    let resp = app
        .client
        .post(app.queue_url("/job/notification"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // A user access token is not a service token.
    let resp = app
        .client
        .post(app.queue_url("/job/notification"))
        .header("Authorization", format!("Bearer {}", user.access_token))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .client
        .post(app.queue_url("/job/mail"))
        .json(&json!({"to": ["a@test.com"], "subject": "s", "body": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn job_endpoints_reject_empty_recipient_lists() {
    let app = TestApp::spawn().await;

    let resp = app
        .service_post("/job/mail")
        .json(&json!({"to": [], "subject": "s", "body": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .service_post("/job/notification")
        .json(&json!({
            "domain": ObjectId::new().to_hex(),
            "userId": ObjectId::new().to_hex(),
            "forUserIds": [],
            "entityAction": "reply",
            "entityId": "p1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn queue_endpoint_persists_one_notification_per_recipient() {
    let app = TestApp::spawn().await;
    let recipients = ["u1", "u2", "u3"];

    let resp = app
        .service_post("/job/notification")
        .json(&json!({
            "domain": ObjectId::new().to_hex(),
            "userId": "actor",
            "forUserIds": recipients,
            "entityAction": "mention",
            "entityId": "p1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    for recipient in recipients {
        assert_eq!(app.notifications_for(recipient).await.len(), 1);
    }
}

#[tokio::test]
async fn stats_report_completed_jobs() {
    let app = TestApp::spawn().await;

    app.service_post("/job/mail")
        .json(&json!({"to": ["a@test.com"], "subject": "s", "body": "b"}))
        .send()
        .await
        .unwrap();
    app.wait_for_mail(1).await;

    let mut completed = 0;
    for _ in 0..50 {
        let resp = app
            .client
            .get(app.queue_url("/job/stats"))
            .header("Authorization", format!("Bearer {}", app.service_token()))
            .send()
            .await
            .unwrap();
        let stats: Value = resp.json().await.unwrap();
        completed = stats["mail"]["completed"].as_u64().unwrap();
        if completed == 1 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(completed, 1);
}

use std::time::Duration;

use bson::oid::ObjectId;
use serde_json::{Value, json};

use crate::fixtures::sse::SseReader;
use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn notification_is_stored_once_per_recipient() {
    let app = TestApp::spawn().await;
    let actor = app.register_user("school", "actor@test.com", "actor").await;
    let u1 = ObjectId::new().to_hex();
    let u2 = ObjectId::new().to_hex();

    let resp = app
        .auth_post("/api/job/notification", &actor.access_token)
        .json(&json!({
            "forUserIds": [u1, u2],
            "entityAction": "comment_created",
            "entityId": "post-1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Success");

    for recipient in [&u1, &u2] {
        let stored = app.notifications_for(recipient).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, actor.id.to_hex());
        assert_eq!(stored[0].domain, actor.domain);
        assert_eq!(stored[0].entity_action, "comment_created");
        assert_eq!(stored[0].entity_id, "post-1");
        assert!(stored[0].entity_target_id.is_none());
    }
}

#[tokio::test]
async fn sse_listener_receives_only_its_own_notification() {
    let app = TestApp::spawn().await;
    let actor = app.register_user("school", "actor@test.com", "actor").await;
    let resp = app
        .client
        .get(app.queue_url("/sse/u1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(
        resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    let mut events = SseReader::new(Box::pin(resp.bytes_stream()));

    let resp = app
        .auth_post("/api/job/notification", &actor.access_token)
        .json(&json!({
            "forUserIds": ["u1", "u2"],
            "entityAction": "reply",
            "entityId": "post-7",
            "entityTargetId": "comment-3",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let data = events
        .next_data(Duration::from_secs(5))
        .await
        .expect("no SSE event for u1");
    let id: String = serde_json::from_str(&data).unwrap();

    let stored = app.notifications_for("u1").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.unwrap().to_hex(), id);
    assert_eq!(app.notifications_for("u2").await.len(), 1);
    assert_eq!(stored[0].entity_target_id.as_deref(), Some("comment-3"));

    assert!(
        events.next_data(Duration::from_millis(500)).await.is_none(),
        "u1 must not see u2's notification"
    );
}

#[tokio::test]
async fn plain_user_ids_are_stored_and_streamed() {
    let app = TestApp::spawn().await;
    let actor = app.register_user("school", "actor@test.com", "actor").await;

    let resp = app.client.get(app.queue_url("/sse/u1")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let mut events = SseReader::new(Box::pin(resp.bytes_stream()));

    let resp = app
        .auth_post("/api/job/notification", &actor.access_token)
        .json(&json!({
            "forUserIds": ["u1", "u2"],
            "entityAction": "comment",
            "entityId": "p1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let data = events
        .next_data(Duration::from_secs(5))
        .await
        .expect("no SSE event for u1");
    let id: String = serde_json::from_str(&data).unwrap();

    let for_u1 = app.notifications_for("u1").await;
    let for_u2 = app.notifications_for("u2").await;
    assert_eq!(for_u1.len(), 1);
    assert_eq!(for_u2.len(), 1);
    assert_eq!(for_u1[0].for_user_id, "u1");
    assert_eq!(for_u1[0].entity_action, "comment");
    assert_eq!(for_u1[0].entity_id, "p1");
    assert_eq!(for_u1[0].id.unwrap().to_hex(), id);
}

#[tokio::test]
async fn listener_registry_is_cleared_after_disconnect() {
    let app = TestApp::spawn().await;
    let broker = app.queue.as_ref().unwrap().broker.clone();
    let user = ObjectId::new().to_hex();

    let resp = app
        .client
        .get(app.queue_url(&format!("/sse/{user}")))
        .send()
        .await
        .unwrap();
    assert_eq!(broker.listener_count(&user), 1);

    drop(resp);
    let mut cleared = false;
    // Disconnect is noticed on the next write, at the latest the keep-alive.
    for _ in 0..100 {
        if broker.recipient_count() == 0 {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(cleared, "registry entry left behind after disconnect");
}

#[tokio::test]
async fn empty_recipient_list_is_rejected() {
    let app = TestApp::spawn().await;
    let actor = app.register_user("school", "actor@test.com", "actor").await;

    let resp = app
        .auth_post("/api/job/notification", &actor.access_token)
        .json(&json!({
            "forUserIds": [],
            "entityAction": "reply",
            "entityId": "post-7",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn notification_requires_user_token() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/job/notification"))
        .json(&json!({
            "forUserIds": [ObjectId::new().to_hex()],
            "entityAction": "reply",
            "entityId": "post-7",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

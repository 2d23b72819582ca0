use campus_services::MailJob;
use serde_json::json;

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn notifications_are_persisted_locally_when_queue_is_down() {
    let app = TestApp::spawn_without_queue().await;
    let actor = app.register_user("school", "actor@test.com", "actor").await;
    let resp = app
        .auth_post("/api/job/notification", &actor.access_token)
        .json(&json!({
            "forUserIds": ["u1", "u2"],
            "entityAction": "comment_created",
            "entityId": "post-1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    assert_eq!(app.notifications_for("u1").await.len(), 1);
    assert_eq!(app.notifications_for("u2").await.len(), 1);
}

#[tokio::test]
async fn mail_is_sent_per_recipient_when_queue_is_down() {
    let app = TestApp::spawn_without_queue().await;

    tokio_test::assert_ok!(
        app.state
            .queue
            .send_mail(MailJob {
                to: vec!["a@test.com".to_string(), "b@test.com".to_string()],
                from: None,
                subject: "Fallback".to_string(),
                body: "<p>direct</p>".to_string(),
            })
            .await
    );

    let sent = app.mail.sent().await;
    let mut recipients: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["a@test.com", "b@test.com"]);
    assert!(sent.iter().all(|m| m.from == app.settings.mail.from));
}

#[tokio::test]
async fn mail_without_recipients_is_rejected_before_any_delivery() {
    let app = TestApp::spawn_without_queue().await;

    let result = app
        .state
        .queue
        .send_mail(MailJob {
            to: vec![],
            from: None,
            subject: "s".to_string(),
            body: "b".to_string(),
        })
        .await;

    tokio_test::assert_err!(result);
    assert!(app.mail.sent().await.is_empty());
}

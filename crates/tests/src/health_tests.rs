use crate::fixtures::test_app::TestApp;
use serde_json::Value;

#[tokio::test]
async fn web_health_reports_ok() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn queue_root_reports_name_version_and_status() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.queue_url("/")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["name"], "campus-queue");
    assert!(json["version"].is_string());
    assert_eq!(json["status"], "ok");
}

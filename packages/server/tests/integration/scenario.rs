use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn first_contact_send_read_edit() {
    let app = TestApp::spawn().await;

    let none = app.get(routes::THREADS, 1).await;
    assert_eq!(none.body["threads"], json!([]));

    let t1 = app.open_direct(1, 2).await;

    let sent = app
        .post(&routes::messages(t1), &json!({ "content": "hi" }), 1)
        .await;
    assert_eq!(sent.status, 201, "{}", sent.text);
    assert_eq!(sent.body["pending_uploads"], json!([]));
    let m1 = sent.body["message_id"].as_i64().unwrap();

    let page = app.get(&routes::messages(t1), 2).await;
    assert_eq!(page.status, 200);
    assert_eq!(TestApp::ids(&page), vec![m1]);
    assert_eq!(app.last_read(t1, 2).await, Some(m1 as i32));

    let edited = app
        .patch(&routes::message(m1), &json!({ "content": "hi there" }), 1)
        .await;
    assert_eq!(edited.status, 200, "{}", edited.text);
    assert_eq!(edited.body["success"], true);
    assert_eq!(edited.body["message"]["is_edited"], true);
    assert_eq!(edited.body["message"]["content"], "hi there");

    let reread = app.get(&routes::messages(t1), 2).await;
    assert_eq!(reread.body["messages"][0]["content"], "hi there");
}

#[tokio::test]
async fn attachment_round_trip() {
    let app = TestApp::spawn().await;
    let t1 = app.open_direct(1, 2).await;

    let sent = app
        .post(
            &routes::messages(t1),
            &json!({
                "content": "results",
                "attachments": [{ "file_name": "../../etc/passwd", "size": 64 }]
            }),
            1,
        )
        .await;
    assert_eq!(sent.status, 201, "{}", sent.text);
    let attachment_id = sent.body["pending_uploads"][0]["attachment_id"]
        .as_str()
        .unwrap()
        .to_string();

    let path = app.storage_path(&attachment_id).await;
    assert_eq!(path.split('/').count(), 3, "file name cannot add path segments: {path}");

    app.upload(&attachment_id, 64).await;
    let confirmed = app.post(&routes::confirm(&attachment_id), &json!({}), 1).await;
    assert_eq!(confirmed.status, 200, "{}", confirmed.text);

    let download = app.get(&routes::download(&attachment_id), 2).await;
    assert_eq!(download.status, 200, "{}", download.text);

    let info = app.get(&routes::info(t1), 2).await;
    assert_eq!(info.body["recent_attachments"][0]["id"], attachment_id);
    assert_eq!(info.body["recent_attachments"][0]["byte_size"], 64);
}

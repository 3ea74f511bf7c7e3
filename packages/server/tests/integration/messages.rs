use common::limits::MAX_ATTACHMENT_BYTES;
use serde_json::json;

use crate::common::{TestApp, routes};

mod sending {
    use super::*;

    #[tokio::test]
    async fn text_message_has_no_pending_uploads() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;

        let res = app
            .post(&routes::messages(id), &json!({ "content": "  hello  " }), 1)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"]["content"], "hello");
        assert_eq!(res.body["message"]["kind"], "text");
        assert_eq!(res.body["message"]["sender_id"], 1);
        assert_eq!(res.body["pending_uploads"], json!([]));
    }

    #[tokio::test]
    async fn empty_messages_are_rejected() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;

        let res = app
            .post(&routes::messages(id), &json!({ "content": "   \n" }), 1)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "nothing_to_send");

        let res = app.post(&routes::messages(id), &json!({}), 1).await;
        assert_eq!(res.reason(), "nothing_to_send");
    }

    #[tokio::test]
    async fn overlong_content_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app
            .post(&routes::messages(id), &json!({ "content": "é".repeat(4001) }), 1)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "content_too_long");

        let ok = app
            .post(&routes::messages(id), &json!({ "content": "é".repeat(4000) }), 1)
            .await;
        assert_eq!(ok.status, 201);
    }

    #[tokio::test]
    async fn outsiders_cannot_send() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app
            .post(&routes::messages(id), &json!({ "content": "hi" }), 3)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "NOT_A_MEMBER");

        let missing = app
            .post(&routes::messages(4242), &json!({ "content": "hi" }), 1)
            .await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn replies_stay_within_the_thread() {
        let app = TestApp::spawn().await;
        let ab = app.open_direct(1, 2).await;
        let ac = app.open_direct(1, 3).await;
        let parent = app.send_text(1, ab, "question").await;
        let elsewhere = app.send_text(1, ac, "other").await;

        let ok = app
            .post(
                &routes::messages(ab),
                &json!({ "content": "answer", "reply_to_message_id": parent }),
                2,
            )
            .await;
        assert_eq!(ok.status, 201);
        assert_eq!(ok.body["message"]["reply_to_message_id"], parent);

        let cross = app
            .post(
                &routes::messages(ab),
                &json!({ "content": "answer", "reply_to_message_id": elsewhere }),
                2,
            )
            .await;
        assert_eq!(cross.status, 400);
        assert_eq!(cross.reason(), "invalid_reply");

        let dangling = app
            .post(
                &routes::messages(ab),
                &json!({ "content": "answer", "reply_to_message_id": 99999 }),
                2,
            )
            .await;
        assert_eq!(dangling.reason(), "invalid_reply");
    }
}

mod attachments {
    use super::*;

    #[tokio::test]
    async fn declared_attachments_get_upload_targets() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;

        let res = app
            .post(
                &routes::messages(id),
                &json!({
                    "attachments": [
                        { "file_name": "x-ray.png", "size": 1024 },
                        { "file_name": "report.pdf", "mime_type": "application/pdf" },
                    ]
                }),
                1,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"]["kind"], "image");
        assert!(res.body["message"]["content"].is_null());

        let attachments = res.body["message"]["attachments"].as_array().unwrap();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0]["mime_type"], "image/png");
        assert_eq!(attachments[0]["pending"], true);
        assert_eq!(attachments[1]["mime_type"], "application/pdf");

        let uploads = res.body["pending_uploads"].as_array().unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0]["file_name"], "x-ray.png");
        assert!(uploads[0]["upload"]["url"].as_str().unwrap().starts_with("memory://"));
        assert!(uploads[0]["upload"]["token"].as_str().is_some());
        assert_eq!(uploads[0]["attachment_id"], attachments[0]["id"]);

        let path = app
            .storage_path(uploads[1]["attachment_id"].as_str().unwrap())
            .await;
        assert!(path.starts_with(&format!("{id}/")));
        assert!(path.ends_with("_report.pdf"));
    }

    #[tokio::test]
    async fn first_attachment_decides_kind() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app
            .post(
                &routes::messages(id),
                &json!({
                    "content": "files",
                    "attachments": [
                        { "file_name": "notes.txt" },
                        { "file_name": "photo.jpg" },
                    ]
                }),
                1,
            )
            .await;
        assert_eq!(res.body["message"]["kind"], "file");
    }

    #[tokio::test]
    async fn oversized_attachment_rejects_whole_send() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;

        let res = app
            .post(
                &routes::messages(id),
                &json!({
                    "content": "scan attached",
                    "attachments": [
                        { "file_name": "small.png", "size": 10 },
                        { "file_name": "huge.bin", "size": MAX_ATTACHMENT_BYTES + 1 },
                    ]
                }),
                1,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "file_too_large");

        let page = app.get(&routes::messages(id), 1).await;
        assert_eq!(page.status, 200);
        assert!(TestApp::ids(&page).is_empty());
    }

    #[tokio::test]
    async fn exactly_the_ceiling_is_accepted() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app
            .post(
                &routes::messages(id),
                &json!({ "attachments": [{ "file_name": "max.bin", "size": MAX_ATTACHMENT_BYTES }] }),
                1,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn attachment_count_is_capped() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let many: Vec<_> = (0..11)
            .map(|i| json!({ "file_name": format!("{i}.txt") }))
            .collect();
        let res = app
            .post(&routes::messages(id), &json!({ "attachments": many }), 1)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "too_many_attachments");
    }

    #[tokio::test]
    async fn failed_reservation_leaves_no_message() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        app.store.fail_uploads_after(1);

        let res = app
            .post(
                &routes::messages(id),
                &json!({
                    "content": "two files",
                    "attachments": [{ "file_name": "a.txt" }, { "file_name": "b.txt" }]
                }),
                1,
            )
            .await;
        assert_eq!(res.status, 502, "{}", res.text);
        assert_eq!(res.code(), "DEPENDENCY_FAILURE");

        let page = app.get(&routes::messages(id), 1).await;
        assert!(TestApp::ids(&page).is_empty());
    }
}

mod editing {
    use super::*;

    #[tokio::test]
    async fn sender_edits_within_window() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "hi").await;
        app.backdate_message(msg, 59).await;

        let res = app
            .patch(&routes::message(msg), &json!({ "content": "hi there" }), 1)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"]["content"], "hi there");
        assert_eq!(res.body["message"]["is_edited"], true);
        assert!(res.body["message"]["edited_at"].is_string());
    }

    #[tokio::test]
    async fn edit_window_expires() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "hi").await;
        app.backdate_message(msg, 61).await;

        let res = app
            .patch(&routes::message(msg), &json!({ "content": "too late" }), 1)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "EXPIRED");
        assert_eq!(res.reason(), "edit_window_expired");
    }

    #[tokio::test]
    async fn only_sender_edits() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "hi").await;

        let res = app
            .patch(&routes::message(msg), &json!({ "content": "mine now" }), 2)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn deleted_messages_cannot_be_edited() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "hi").await;
        app.delete(&routes::message(msg), 1).await;

        let res = app
            .patch(&routes::message(msg), &json!({ "content": "revived" }), 1)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.reason(), "already_deleted");
    }

    #[tokio::test]
    async fn blank_edit_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "hi").await;
        let res = app
            .patch(&routes::message(msg), &json!({ "content": "  " }), 1)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "empty_content");
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app
            .patch(&routes::message(777), &json!({ "content": "x" }), 1)
            .await;
        assert_eq!(res.status, 404);
    }
}

mod deleting {
    use super::*;

    #[tokio::test]
    async fn soft_delete_clears_content_and_keeps_attachments() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let sent = app
            .post(
                &routes::messages(id),
                &json!({ "content": "see file", "attachments": [{ "file_name": "lab.pdf" }] }),
                1,
            )
            .await;
        let msg = sent.body["message_id"].as_i64().unwrap();
        let attachment_id = sent.body["pending_uploads"][0]["attachment_id"]
            .as_str()
            .unwrap()
            .to_string();
        app.upload(&attachment_id, 2048).await;
        let confirmed = app.post(&routes::confirm(&attachment_id), &json!({}), 1).await;
        assert_eq!(confirmed.status, 200, "{}", confirmed.text);

        let res = app.delete(&routes::message(msg), 1).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["message"]["content"].is_null());
        assert_eq!(res.body["message"]["is_deleted"], true);
        assert!(res.body["message"]["deleted_at"].is_string());
        assert_eq!(res.body["message"]["attachments"].as_array().unwrap().len(), 1);

        let download = app.get(&routes::download(&attachment_id), 2).await;
        assert_eq!(download.status, 200, "{}", download.text);
        assert!(app.store.contains(&app.storage_path(&attachment_id).await));

        // Tombstone stays in history.
        let page = app.get(&routes::messages(id), 2).await;
        assert_eq!(TestApp::ids(&page), vec![msg]);
        assert_eq!(page.body["messages"][0]["is_deleted"], true);
    }

    #[tokio::test]
    async fn repeated_delete_is_a_no_op() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "oops").await;

        let first = app.delete(&routes::message(msg), 1).await;
        let second = app.delete(&routes::message(msg), 1).await;
        assert_eq!(second.status, 200);
        assert_eq!(
            first.body["message"]["deleted_at"],
            second.body["message"]["deleted_at"]
        );
    }

    #[tokio::test]
    async fn only_sender_deletes() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "keep").await;
        let res = app.delete(&routes::message(msg), 2).await;
        assert_eq!(res.status, 403);
    }
}

mod hiding_and_pins {
    use super::*;

    #[tokio::test]
    async fn hide_only_affects_the_caller() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let keep = app.send_text(1, id, "keep").await;
        let hidden = app.send_text(2, id, "hide me").await;

        let res = app.post(&routes::hide(hidden), &json!({}), 1).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);

        // Hiding twice is fine.
        let again = app.post(&routes::hide(hidden), &json!({}), 1).await;
        assert_eq!(again.status, 200);

        let mine = app.get(&routes::messages(id), 1).await;
        assert_eq!(TestApp::ids(&mine), vec![keep]);
        let theirs = app.get(&routes::messages(id), 2).await;
        assert_eq!(TestApp::ids(&theirs), vec![keep, hidden]);
    }

    #[tokio::test]
    async fn outsiders_cannot_hide() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "private").await;
        let res = app.post(&routes::hide(msg), &json!({}), 3).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn message_pins_are_per_user() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let msg = app.send_text(1, id, "address: 12 Main St").await;

        let on = app.post(&routes::message_pin(msg), &json!({}), 2).await;
        assert_eq!(on.status, 200);
        assert_eq!(on.body["pinned"], true);

        let theirs = app.get(&routes::info(id), 2).await;
        assert_eq!(theirs.body["pinned_messages"][0]["id"], msg);
        let mine = app.get(&routes::info(id), 1).await;
        assert_eq!(mine.body["pinned_messages"], json!([]));

        let off = app.post(&routes::message_pin(msg), &json!({}), 2).await;
        assert_eq!(off.body["pinned"], false);

        let outsider = app.post(&routes::message_pin(msg), &json!({}), 3).await;
        assert_eq!(outsider.status, 403);
    }
}

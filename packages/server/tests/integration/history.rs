use serde_json::json;

use crate::common::{FakeDirectory, TestApp, routes};

mod paging {
    use super::*;

    #[tokio::test]
    async fn pages_reassemble_the_full_history() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;

        let mut sent = Vec::new();
        for i in 0..100 {
            let sender = if i % 2 == 0 { 1 } else { 2 };
            sent.push(app.send_text(sender, id, &format!("message {i}")).await);
        }

        let mut pages = Vec::new();
        let mut cursor: Option<i64> = None;
        for _ in 0..3 {
            let path = match cursor {
                Some(c) => format!("{}?limit=40&cursor={c}", routes::messages(id)),
                None => format!("{}?limit=40", routes::messages(id)),
            };
            let page = app.get(&path, 1).await;
            assert_eq!(page.status, 200, "{}", page.text);
            pages.push(TestApp::ids(&page));
            cursor = page.body["next_cursor"].as_i64();
        }

        assert_eq!(pages[0].len(), 40);
        assert_eq!(pages[1].len(), 40);
        assert_eq!(pages[2].len(), 20);
        assert_eq!(cursor, None, "oldest page has no next cursor");

        let mut all: Vec<i64> = pages.into_iter().rev().flatten().collect();
        assert_eq!(all, sent);
        all.dedup();
        assert_eq!(all.len(), 100);
    }

    #[tokio::test]
    async fn each_page_is_chronological() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let first = app.send_text(1, id, "first").await;
        let second = app.send_text(2, id, "second").await;
        let third = app.send_text(1, id, "third").await;

        let page = app.get(&routes::messages(id), 1).await;
        assert_eq!(TestApp::ids(&page), vec![first, second, third]);
        assert!(page.body["next_cursor"].is_null());
    }

    #[tokio::test]
    async fn limit_is_clamped() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        for i in 0..85 {
            app.send_text(1, id, &format!("m{i}")).await;
        }

        let big = app
            .get(&format!("{}?limit=500", routes::messages(id)), 1)
            .await;
        assert_eq!(TestApp::ids(&big).len(), 80);

        let default = app.get(&routes::messages(id), 1).await;
        assert_eq!(TestApp::ids(&default).len(), 40);
    }

    #[tokio::test]
    async fn foreign_cursor_is_rejected() {
        let app = TestApp::spawn().await;
        let ab = app.open_direct(1, 2).await;
        let ac = app.open_direct(1, 3).await;
        let elsewhere = app.send_text(1, ac, "x").await;

        let res = app
            .get(&format!("{}?cursor={elsewhere}", routes::messages(ab)), 1)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "invalid_cursor");
    }

    #[tokio::test]
    async fn outsiders_cannot_read() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app.get(&routes::messages(id), 3).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "NOT_A_MEMBER");
    }
}

mod read_receipts {
    use super::*;

    #[tokio::test]
    async fn newest_page_advances_the_marker() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        assert_eq!(app.last_read(id, 2).await, None);

        let m1 = app.send_text(1, id, "one").await;
        let m2 = app.send_text(1, id, "two").await;
        app.get(&routes::messages(id), 2).await;
        assert_eq!(app.last_read(id, 2).await, Some(m2 as i32));
        assert_ne!(m1, m2);
    }

    #[tokio::test]
    async fn older_pages_never_move_it_back() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(app.send_text(1, id, &format!("m{i}")).await);
        }

        let newest = app
            .get(&format!("{}?limit=2", routes::messages(id)), 2)
            .await;
        let cursor = newest.body["next_cursor"].as_i64().unwrap();
        assert_eq!(app.last_read(id, 2).await, Some(ids[4] as i32));

        let older = app
            .get(&format!("{}?limit=2&cursor={cursor}", routes::messages(id)), 2)
            .await;
        assert_eq!(TestApp::ids(&older), vec![ids[1], ids[2]]);
        assert_eq!(app.last_read(id, 2).await, Some(ids[4] as i32));
    }

    #[tokio::test]
    async fn unread_counts_follow_the_marker() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        for i in 0..3 {
            app.send_text(1, id, &format!("m{i}")).await;
        }

        let before = app.get(routes::THREADS, 2).await;
        assert_eq!(before.body["threads"][0]["unread_count"], 3);

        app.get(&routes::messages(id), 2).await;
        let after = app.get(routes::THREADS, 2).await;
        assert_eq!(after.body["threads"][0]["unread_count"], 0);

        app.send_text(1, id, "one more").await;
        let later = app.get(routes::THREADS, 2).await;
        assert_eq!(later.body["threads"][0]["unread_count"], 1);
    }

    #[tokio::test]
    async fn hidden_messages_do_not_stay_unread() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let m1 = app.send_text(1, id, "one").await;
        let m2 = app.send_text(1, id, "two").await;
        app.post(&routes::hide(m2), &json!({}), 2).await;

        let page = app.get(&routes::messages(id), 2).await;
        assert_eq!(TestApp::ids(&page), vec![m1]);
        assert_eq!(app.last_read(id, 2).await, Some(m1 as i32));

        let res = app.get(routes::THREADS, 2).await;
        assert_eq!(res.body["threads"][0]["unread_count"], 0);
    }

    #[tokio::test]
    async fn own_messages_are_never_unread() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        app.send_text(1, id, "mine").await;
        app.send_text(2, id, "theirs").await;

        let res = app.get(routes::THREADS, 1).await;
        assert_eq!(res.body["threads"][0]["unread_count"], 1);
    }
}

mod thread_list {
    use super::*;

    #[tokio::test]
    async fn shows_preview_and_counts() {
        let app = TestApp::spawn().await;
        let id = app.create_group(1, "Night shift", &[2, 3]).await;
        app.send_text(2, id, "handover at 7").await;

        let res = app.get(routes::THREADS, 1).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let row = &res.body["threads"][0];
        assert_eq!(row["id"], id);
        assert_eq!(row["kind"], "group");
        assert_eq!(row["display_name"], "Night shift");
        assert_eq!(row["member_count"], 3);
        assert_eq!(row["last_message"]["content"], "handover at 7");
        assert_eq!(row["pinned"], false);
        assert_eq!(row["muted"], false);
    }

    #[tokio::test]
    async fn pinned_first_then_most_recent() {
        let app = TestApp::spawn().await;
        let with_b = app.open_direct(1, 2).await;
        let with_c = app.open_direct(1, 3).await;
        let with_d = app.open_direct(1, 4).await;
        app.send_text(2, with_b, "older").await;
        app.send_text(3, with_c, "newer").await;

        let order = |res: &crate::common::TestResponse| -> Vec<i64> {
            res.body["threads"]
                .as_array()
                .unwrap()
                .iter()
                .map(|t| t["id"].as_i64().unwrap())
                .collect()
        };

        // A thread without messages ranks by its creation time.
        let res = app.get(routes::THREADS, 1).await;
        assert_eq!(order(&res), vec![with_c, with_b, with_d]);

        app.post(&routes::thread_pin(with_d), &json!({}), 1).await;
        let res = app.get(routes::THREADS, 1).await;
        assert_eq!(order(&res), vec![with_d, with_c, with_b]);
        assert_eq!(res.body["threads"][0]["pinned"], true);
    }

    #[tokio::test]
    async fn direct_threads_use_the_other_name() {
        let app =
            TestApp::spawn_with_directory(FakeDirectory::with_names(&[(1, "Ada"), (2, "Bea")]))
                .await;
        app.open_direct(1, 2).await;

        let mine = app.get(routes::THREADS, 1).await;
        assert_eq!(mine.body["threads"][0]["display_name"], "Bea");
        let theirs = app.get(routes::THREADS, 2).await;
        assert_eq!(theirs.body["threads"][0]["display_name"], "Ada");
    }

    #[tokio::test]
    async fn directory_outage_degrades_to_placeholder() {
        let app = TestApp::spawn_with_directory(FakeDirectory::with_names(&[(2, "Bea")])).await;
        app.open_direct(1, 2).await;
        app.directory.set_failing(true);

        let res = app.get(routes::THREADS, 1).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["threads"][0]["display_name"], "Unknown user");
    }

    #[tokio::test]
    async fn hidden_latest_message_is_not_previewed() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        app.send_text(1, id, "visible").await;
        let hidden = app.send_text(2, id, "hidden").await;
        app.post(&routes::hide(hidden), &json!({}), 1).await;

        let res = app.get(routes::THREADS, 1).await;
        assert_eq!(res.body["threads"][0]["last_message"]["content"], "visible");
    }
}

mod thread_info {
    use super::*;

    #[tokio::test]
    async fn lists_confirmed_files_of_live_messages() {
        let app = TestApp::spawn_with_directory(FakeDirectory::with_names(&[(1, "Ada")])).await;
        let id = app.open_direct(1, 2).await;

        let mut attachment_ids = Vec::new();
        for name in ["kept.pdf", "deleted.pdf", "pending.pdf"] {
            let res = app
                .post(
                    &routes::messages(id),
                    &json!({ "attachments": [{ "file_name": name }] }),
                    1,
                )
                .await;
            attachment_ids.push((
                res.body["message_id"].as_i64().unwrap(),
                res.body["pending_uploads"][0]["attachment_id"]
                    .as_str()
                    .unwrap()
                    .to_string(),
            ));
        }
        for (_, attachment_id) in &attachment_ids[..2] {
            app.upload(attachment_id, 100).await;
            app.post(&routes::confirm(attachment_id), &json!({}), 1).await;
        }
        app.delete(&routes::message(attachment_ids[1].0), 1).await;

        let res = app.get(&routes::info(id), 2).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let files = res.body["recent_attachments"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["file_name"], "kept.pdf");

        let members = res.body["members"].as_array().unwrap();
        let ada = members.iter().find(|m| m["user_id"] == 1).unwrap();
        assert_eq!(ada["profile"]["display_name"], "Ada");
        let unknown = members.iter().find(|m| m["user_id"] == 2).unwrap();
        assert_eq!(unknown["profile"]["display_name"], "Unknown user");
    }

    #[tokio::test]
    async fn requires_membership() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app.get(&routes::info(id), 3).await;
        assert_eq!(res.status, 403);
    }
}

mod search {
    use chat_server::services::search::{probe_full_text, select_searcher};

    use super::*;

    #[tokio::test]
    async fn matches_case_insensitively_newest_first() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let older = app.send_text(1, id, "Blood pressure is fine").await;
        app.send_text(2, id, "unrelated").await;
        let newer = app.send_text(2, id, "check BLOOD sugar too").await;

        let res = app.get(&routes::search(id, "blood"), 1).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(TestApp::ids(&res), vec![newer, older]);
    }

    #[tokio::test]
    async fn skips_deleted_and_hidden_messages() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let deleted = app.send_text(1, id, "dose 5mg").await;
        let hidden = app.send_text(2, id, "dose 10mg").await;
        let kept = app.send_text(2, id, "dose 20mg").await;
        app.delete(&routes::message(deleted), 1).await;
        app.post(&routes::hide(hidden), &json!({}), 1).await;

        let mine = app.get(&routes::search(id, "dose"), 1).await;
        assert_eq!(TestApp::ids(&mine), vec![kept]);
        let theirs = app.get(&routes::search(id, "dose"), 2).await;
        assert_eq!(TestApp::ids(&theirs), vec![kept, hidden]);
    }

    #[tokio::test]
    async fn wildcards_are_literal() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let literal = app.send_text(1, id, "100% done").await;
        app.send_text(1, id, "1000 steps").await;

        // "100%" url-encoded.
        let res = app.get(&routes::search(id, "100%25"), 1).await;
        assert_eq!(TestApp::ids(&res), vec![literal]);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app.get(&routes::search(id, "%20%20"), 1).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "empty_query");
    }

    #[tokio::test]
    async fn outsiders_cannot_search() {
        let app = TestApp::spawn().await;
        let id = app.open_direct(1, 2).await;
        let res = app.get(&routes::search(id, "x"), 3).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn sqlite_store_falls_back_to_substring_matching() {
        let app = TestApp::spawn().await;
        assert!(!probe_full_text(&app.db).await);
        assert_eq!(select_searcher(&app.db).await.name(), "substring");
    }
}

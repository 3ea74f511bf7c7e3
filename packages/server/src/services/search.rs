//! Message search within a single thread.
//!
//! Two strategies exist: Postgres full-text search and a portable
//! case-insensitive substring match. One is chosen at startup by probing the
//! store, so a request never pays for a failed full-text attempt.

use std::sync::Arc;

use async_trait::async_trait;
use common::limits::MAX_SEARCH_RESULTS;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{message, message_hide};
use crate::error::AppError;
use crate::models::shared::escape_like;
use crate::services::membership::require_member;

const MAX_QUERY_CHARS: usize = 200;

#[async_trait]
pub trait MessageSearcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Matching messages of `thread_id` visible to `viewer_id`, newest first.
    async fn search(
        &self,
        db: &DatabaseConnection,
        thread_id: i32,
        viewer_id: i32,
        query: &str,
        limit: u64,
    ) -> Result<Vec<message::Model>, DbErr>;
}

/// Base query shared by both strategies: one thread, not soft-deleted, not
/// hidden by the viewer.
fn visible_messages(thread_id: i32, viewer_id: i32) -> Select<message::Entity> {
    message::Entity::find()
        .filter(message::Column::ThreadId.eq(thread_id))
        .filter(message::Column::IsDeleted.eq(false))
        .filter(
            message::Column::Id.not_in_subquery(
                Query::select()
                    .column(message_hide::Column::MessageId)
                    .from(message_hide::Entity)
                    .and_where(message_hide::Column::UserId.eq(viewer_id))
                    .to_owned(),
            ),
        )
}

/// Postgres `tsvector` search with the `simple` configuration.
pub struct FullTextSearcher;

fn full_text_select(
    thread_id: i32,
    viewer_id: i32,
    query: &str,
    limit: u64,
) -> Select<message::Entity> {
    visible_messages(thread_id, viewer_id)
        .filter(Expr::cust_with_values(
            "to_tsvector('simple', coalesce(content, '')) @@ plainto_tsquery('simple', $1)",
            [query.to_string()],
        ))
        .order_by_desc(message::Column::CreatedAt)
        .order_by_desc(message::Column::Id)
        .limit(limit)
}

#[async_trait]
impl MessageSearcher for FullTextSearcher {
    fn name(&self) -> &'static str {
        "full_text"
    }

    async fn search(
        &self,
        db: &DatabaseConnection,
        thread_id: i32,
        viewer_id: i32,
        query: &str,
        limit: u64,
    ) -> Result<Vec<message::Model>, DbErr> {
        full_text_select(thread_id, viewer_id, query, limit)
            .all(db)
            .await
    }
}

/// Case-insensitive `LIKE '%term%'` match; works on every backend.
pub struct SubstringSearcher;

#[async_trait]
impl MessageSearcher for SubstringSearcher {
    fn name(&self) -> &'static str {
        "substring"
    }

    async fn search(
        &self,
        db: &DatabaseConnection,
        thread_id: i32,
        viewer_id: i32,
        query: &str,
        limit: u64,
    ) -> Result<Vec<message::Model>, DbErr> {
        let term = escape_like(query);
        visible_messages(thread_id, viewer_id)
            .filter(
                Expr::expr(Func::lower(Expr::col(message::Column::Content)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            )
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .limit(limit)
            .all(db)
            .await
    }
}

/// Whether the store understands Postgres full-text search.
pub async fn probe_full_text(db: &DatabaseConnection) -> bool {
    db.execute_unprepared(
        "SELECT to_tsvector('simple', 'probe') @@ plainto_tsquery('simple', 'probe')",
    )
    .await
    .is_ok()
}

/// Pick the search strategy for this store.
pub async fn select_searcher(db: &DatabaseConnection) -> Arc<dyn MessageSearcher> {
    let searcher: Arc<dyn MessageSearcher> = if probe_full_text(db).await {
        Arc::new(FullTextSearcher)
    } else {
        warn!("Full-text search unavailable, falling back to substring matching");
        Arc::new(SubstringSearcher)
    };
    info!(strategy = searcher.name(), "Message search ready");
    searcher
}

/// Search one thread on behalf of a member. Capped at 50 results.
pub async fn search_thread(
    db: &DatabaseConnection,
    searcher: &dyn MessageSearcher,
    caller_id: i32,
    thread_id: i32,
    query: &str,
) -> Result<Vec<message::Model>, AppError> {
    require_member(db, thread_id, caller_id).await?;

    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::validation(
            "empty_query",
            "Search query must not be empty",
        ));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::validation(
            "query_too_long",
            format!("Search query is limited to {MAX_QUERY_CHARS} characters"),
        ));
    }

    Ok(searcher
        .search(db, thread_id, caller_id, query, MAX_SEARCH_RESULTS)
        .await?)
}

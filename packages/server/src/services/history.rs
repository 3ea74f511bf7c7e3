//! Read side: thread list, paged history and thread info.

use std::collections::{HashMap, HashSet};

use common::limits::{DEFAULT_PAGE_SIZE, MAX_INFO_ATTACHMENTS, MAX_PAGE_SIZE, MAX_PINNED_MESSAGES};
use sea_orm::sea_query::Query;
use sea_orm::*;

use crate::entity::thread::ThreadKind;
use crate::entity::{attachment, message, message_hide, pinned_message, pinned_thread, thread, thread_member};
use crate::error::AppError;
use crate::models::attachment::AttachmentResponse;
use crate::models::message::{MessagePageResponse, MessageResponse};
use crate::models::thread::{MemberResponse, ThreadInfoResponse, ThreadSummary};
use crate::services::directory::{Directory, resolve_profiles};
use crate::services::membership::{advance_last_read, require_member};

/// Messages of a thread minus those the viewer hid for themselves.
fn visible_to(thread_id: i32, viewer_id: i32) -> Select<message::Entity> {
    message::Entity::find()
        .filter(message::Column::ThreadId.eq(thread_id))
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

/// Pair messages with their attachments, preserving message order.
pub async fn with_attachments<C: ConnectionTrait>(
    db: &C,
    messages: Vec<message::Model>,
) -> Result<Vec<MessageResponse>, AppError> {
    if messages.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = messages.iter().map(|m| m.id).collect();
    let mut by_message: HashMap<i32, Vec<AttachmentResponse>> = HashMap::new();
    for row in attachment::Entity::find()
        .filter(attachment::Column::MessageId.is_in(ids))
        .order_by_asc(attachment::Column::CreatedAt)
        .order_by_asc(attachment::Column::Id)
        .all(db)
        .await?
    {
        by_message
            .entry(row.message_id)
            .or_default()
            .push(AttachmentResponse::from(row));
    }

    Ok(messages
        .into_iter()
        .map(|m| {
            let attachments = by_message.remove(&m.id).unwrap_or_default();
            MessageResponse::new(m, attachments)
        })
        .collect())
}

/// One page of a thread's history, oldest to newest.
///
/// The scan runs newest-first on `(created_at, id)` and is reversed before
/// returning. `cursor` is the ID of the oldest message of the previous page.
/// Fetching the newest page (no cursor) advances the caller's read marker.
pub async fn list_messages(
    db: &DatabaseConnection,
    caller_id: i32,
    thread_id: i32,
    cursor: Option<i32>,
    limit: Option<u64>,
) -> Result<MessagePageResponse, AppError> {
    require_member(db, thread_id, caller_id).await?;

    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let mut select = visible_to(thread_id, caller_id);

    if let Some(cursor_id) = cursor {
        let anchor = message::Entity::find_by_id(cursor_id)
            .one(db)
            .await?
            .filter(|m| m.thread_id == thread_id)
            .ok_or_else(|| {
                AppError::validation("invalid_cursor", "Cursor does not belong to this thread")
            })?;
        select = select.filter(
            Condition::any()
                .add(message::Column::CreatedAt.lt(anchor.created_at))
                .add(
                    Condition::all()
                        .add(message::Column::CreatedAt.eq(anchor.created_at))
                        .add(message::Column::Id.lt(anchor.id)),
                ),
        );
    }

    let mut page = select
        .order_by_desc(message::Column::CreatedAt)
        .order_by_desc(message::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let next_cursor = if page.len() as u64 == limit {
        page.last().map(|m| m.id)
    } else {
        None
    };

    if cursor.is_none()
        && let Some(newest) = page.first()
    {
        advance_last_read(db, thread_id, caller_id, newest.id).await?;
    }

    page.reverse();
    Ok(MessagePageResponse {
        messages: with_attachments(db, page).await?,
        next_cursor,
    })
}

/// Messages from others posted after the member's read marker, or all of them
/// if unset. Messages the member hid never count.
async fn unread_count<C: ConnectionTrait>(
    db: &C,
    member: &thread_member::Model,
) -> Result<u64, AppError> {
    let mut select = visible_to(member.thread_id, member.user_id)
        .filter(message::Column::SenderId.ne(member.user_id));

    if let Some(last_read_id) = member.last_read_message_id
        && let Some(last_read) = message::Entity::find_by_id(last_read_id).one(db).await?
    {
        select = select.filter(message::Column::CreatedAt.gt(last_read.created_at));
    }

    Ok(select.count(db).await?)
}

/// The caller's threads with preview, unread count and pin/mute flags.
///
/// Pinned threads come first, then the most recently active.
pub async fn list_threads(
    db: &DatabaseConnection,
    directory: &dyn Directory,
    caller_id: i32,
) -> Result<Vec<ThreadSummary>, AppError> {
    let memberships = thread_member::Entity::find()
        .filter(thread_member::Column::UserId.eq(caller_id))
        .all(db)
        .await?;
    if memberships.is_empty() {
        return Ok(Vec::new());
    }

    let thread_ids: Vec<i32> = memberships.iter().map(|m| m.thread_id).collect();
    let threads: HashMap<i32, thread::Model> = thread::Entity::find()
        .filter(thread::Column::Id.is_in(thread_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let pinned: HashSet<i32> = pinned_thread::Entity::find()
        .filter(pinned_thread::Column::UserId.eq(caller_id))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.thread_id)
        .collect();

    let all_members = thread_member::Entity::find()
        .filter(thread_member::Column::ThreadId.is_in(thread_ids))
        .all(db)
        .await?;
    let mut members_by_thread: HashMap<i32, Vec<i32>> = HashMap::new();
    for m in all_members {
        members_by_thread.entry(m.thread_id).or_default().push(m.user_id);
    }

    // The other participant of each direct thread, for display names.
    let counterparts: HashMap<i32, i32> = threads
        .values()
        .filter(|t| t.kind == ThreadKind::Direct)
        .filter_map(|t| {
            members_by_thread
                .get(&t.id)?
                .iter()
                .find(|&&uid| uid != caller_id)
                .map(|&uid| (t.id, uid))
        })
        .collect();
    let lookup: Vec<i32> = counterparts
        .values()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let profiles = resolve_profiles(directory, &lookup).await;

    let mut summaries = Vec::with_capacity(memberships.len());
    for member in &memberships {
        let Some(thread) = threads.get(&member.thread_id) else {
            continue;
        };

        let last_message = visible_to(thread.id, caller_id)
            .order_by_desc(message::Column::CreatedAt)
            .order_by_desc(message::Column::Id)
            .one(db)
            .await?;

        let display_name = match thread.kind {
            ThreadKind::Group => thread.title.clone().unwrap_or_default(),
            ThreadKind::Direct => counterparts
                .get(&thread.id)
                .and_then(|uid| profiles.get(uid))
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| crate::services::directory::PLACEHOLDER_NAME.to_string()),
        };

        summaries.push((
            last_message
                .as_ref()
                .map(|m| m.created_at)
                .unwrap_or(thread.created_at),
            ThreadSummary {
                id: thread.id,
                kind: thread.kind,
                title: thread.title.clone(),
                display_name,
                member_count: members_by_thread
                    .get(&thread.id)
                    .map_or(0, |m| m.len() as u64),
                unread_count: unread_count(db, member).await?,
                last_message: last_message.map(Into::into),
                pinned: pinned.contains(&thread.id),
                muted: member.muted,
            },
        ));
    }

    summaries.sort_by(|(a_active, a), (b_active, b)| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b_active.cmp(a_active))
            .then_with(|| b.id.cmp(&a.id))
    });
    Ok(summaries.into_iter().map(|(_, s)| s).collect())
}

/// Members with profiles, recent attachments and the caller's pinned messages.
pub async fn thread_info(
    db: &DatabaseConnection,
    directory: &dyn Directory,
    caller_id: i32,
    thread_id: i32,
) -> Result<ThreadInfoResponse, AppError> {
    let (thread, _) = require_member(db, thread_id, caller_id).await?;

    let members = thread_member::Entity::find()
        .filter(thread_member::Column::ThreadId.eq(thread_id))
        .order_by_asc(thread_member::Column::JoinedAt)
        .order_by_asc(thread_member::Column::UserId)
        .all(db)
        .await?;
    let user_ids: Vec<i32> = members.iter().map(|m| m.user_id).collect();
    let mut profiles = resolve_profiles(directory, &user_ids).await;
    let members = members
        .into_iter()
        .map(|m| MemberResponse {
            profile: profiles
                .remove(&m.user_id)
                .unwrap_or_else(crate::services::directory::Profile::placeholder),
            user_id: m.user_id,
            role: m.role,
            joined_at: m.joined_at,
        })
        .collect();

    let recent_attachments = attachment::Entity::find()
        .filter(attachment::Column::ByteSize.is_not_null())
        .filter(
            attachment::Column::MessageId.in_subquery(
                Query::select()
                    .column(message::Column::Id)
                    .from(message::Entity)
                    .and_where(message::Column::ThreadId.eq(thread_id))
                    .and_where(message::Column::IsDeleted.eq(false))
                    .to_owned(),
            ),
        )
        .order_by_desc(attachment::Column::CreatedAt)
        .order_by_desc(attachment::Column::Id)
        .limit(MAX_INFO_ATTACHMENTS)
        .all(db)
        .await?
        .into_iter()
        .map(AttachmentResponse::from)
        .collect();

    let pins = pinned_message::Entity::find()
        .filter(pinned_message::Column::UserId.eq(caller_id))
        .filter(pinned_message::Column::ThreadId.eq(thread_id))
        .order_by_desc(pinned_message::Column::PinnedAt)
        .limit(MAX_PINNED_MESSAGES)
        .all(db)
        .await?;
    let pin_order: Vec<i32> = pins.iter().map(|p| p.message_id).collect();
    let mut pinned_rows: HashMap<i32, message::Model> = message::Entity::find()
        .filter(message::Column::Id.is_in(pin_order.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let ordered = pin_order
        .iter()
        .filter_map(|id| pinned_rows.remove(id))
        .collect();

    Ok(ThreadInfoResponse {
        thread: thread.into(),
        members,
        recent_attachments,
        pinned_messages: with_attachments(db, ordered).await?,
    })
}

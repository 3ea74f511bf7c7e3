//! Thread membership, block list, mute flags and per-user pins.

use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use tracing::info;

use crate::entity::thread::ThreadKind;
use crate::entity::thread_member::MemberRole;
use crate::entity::{block, message, pinned_message, pinned_thread, thread, thread_member};
use crate::error::AppError;

/// Most users a single add-members call may name.
const MAX_ADD_MEMBERS: usize = 100;

/// Look up a thread by ID, returning 404 if not found.
pub async fn find_thread<C: ConnectionTrait>(db: &C, id: i32) -> Result<thread::Model, AppError> {
    thread::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Thread not found".into()))
}

/// Look up a message by ID, returning 404 if not found.
pub async fn find_message<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<message::Model, AppError> {
    message::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".into()))
}

pub async fn find_member<C: ConnectionTrait>(
    db: &C,
    thread_id: i32,
    user_id: i32,
) -> Result<Option<thread_member::Model>, AppError> {
    Ok(thread_member::Entity::find_by_id((thread_id, user_id))
        .one(db)
        .await?)
}

/// Load the thread and the caller's membership row.
///
/// Fails with `NOT_FOUND` for a missing thread and `NOT_A_MEMBER` when the
/// caller does not belong to it.
pub async fn require_member<C: ConnectionTrait>(
    db: &C,
    thread_id: i32,
    user_id: i32,
) -> Result<(thread::Model, thread_member::Model), AppError> {
    let thread = find_thread(db, thread_id).await?;
    let member = find_member(db, thread_id, user_id)
        .await?
        .ok_or(AppError::NotAMember)?;
    Ok((thread, member))
}

/// User IDs of every current member of a thread.
pub async fn member_ids<C: ConnectionTrait>(
    db: &C,
    thread_id: i32,
) -> Result<BTreeSet<i32>, AppError> {
    let ids: Vec<i32> = thread_member::Entity::find()
        .filter(thread_member::Column::ThreadId.eq(thread_id))
        .select_only()
        .column(thread_member::Column::UserId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Set the caller's own mute flag. Returns the new value.
pub async fn set_muted<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    thread_id: i32,
    muted: bool,
) -> Result<bool, AppError> {
    let (_, member) = require_member(db, thread_id, caller_id).await?;

    let mut active: thread_member::ActiveModel = member.into();
    active.muted = Set(muted);
    let updated = active.update(db).await?;

    Ok(updated.muted)
}

/// Remove the caller from a group thread.
///
/// Direct threads cannot be left. A group whose last member leaves is kept.
pub async fn leave<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    thread_id: i32,
) -> Result<(), AppError> {
    let thread = find_thread(db, thread_id).await?;
    if thread.kind == ThreadKind::Direct {
        return Err(AppError::conflict(
            "cannot_leave_direct",
            "Direct conversations cannot be left",
        ));
    }

    let result = thread_member::Entity::delete_by_id((thread_id, caller_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotAMember);
    }

    info!(thread_id, user_id = caller_id, "Member left group");
    Ok(())
}

/// Add users to a group thread. Owner only.
///
/// Users that are already members are skipped. Returns the IDs actually added.
pub async fn add_members<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    thread_id: i32,
    user_ids: &[i32],
) -> Result<Vec<i32>, AppError> {
    if user_ids.is_empty() {
        return Err(AppError::validation(
            "no_members",
            "user_ids must not be empty",
        ));
    }
    if user_ids.len() > MAX_ADD_MEMBERS {
        return Err(AppError::validation(
            "too_many_members",
            format!("At most {MAX_ADD_MEMBERS} users can be added at once"),
        ));
    }

    let (thread, member) = require_member(db, thread_id, caller_id).await?;
    if thread.kind != ThreadKind::Group {
        return Err(AppError::conflict(
            "not_a_group",
            "Members can only be added to group threads",
        ));
    }
    if member.role != MemberRole::Owner {
        return Err(AppError::Forbidden(
            "Only the group owner can add members".into(),
        ));
    }

    let existing = member_ids(db, thread_id).await?;
    let wanted: BTreeSet<i32> = user_ids.iter().copied().collect();
    let added: Vec<i32> = wanted.difference(&existing).copied().collect();
    if added.is_empty() {
        return Ok(added);
    }

    let now = Utc::now();
    let rows = added.iter().map(|&user_id| thread_member::ActiveModel {
        thread_id: Set(thread_id),
        user_id: Set(user_id),
        role: Set(MemberRole::Member),
        joined_at: Set(now),
        muted: Set(false),
        last_read_message_id: Set(None),
    });
    thread_member::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                thread_member::Column::ThreadId,
                thread_member::Column::UserId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    info!(thread_id, added = added.len(), "Members added to group");
    Ok(added)
}

/// Move the member's read marker forward to `message_id`.
///
/// The update is conditional, so a stale page fetched by a second client can
/// never move the marker backwards.
pub async fn advance_last_read<C: ConnectionTrait>(
    db: &C,
    thread_id: i32,
    user_id: i32,
    message_id: i32,
) -> Result<(), AppError> {
    thread_member::Entity::update_many()
        .col_expr(
            thread_member::Column::LastReadMessageId,
            Expr::value(message_id),
        )
        .filter(thread_member::Column::ThreadId.eq(thread_id))
        .filter(thread_member::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(thread_member::Column::LastReadMessageId.is_null())
                .add(thread_member::Column::LastReadMessageId.lt(message_id)),
        )
        .exec(db)
        .await?;
    Ok(())
}

/// Whether either user has blocked the other.
pub async fn is_blocked_either_way<C: ConnectionTrait>(
    db: &C,
    a: i32,
    b: i32,
) -> Result<bool, AppError> {
    let count = block::Entity::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(block::Column::BlockerId.eq(a))
                        .add(block::Column::BlockedId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(block::Column::BlockerId.eq(b))
                        .add(block::Column::BlockedId.eq(a)),
                ),
        )
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Toggle the caller's block on `other_id`. Returns whether it is now blocked.
///
/// Only gates new direct threads; existing memberships and history stay.
pub async fn toggle_block<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    other_id: i32,
) -> Result<bool, AppError> {
    if caller_id == other_id {
        return Err(AppError::validation(
            "cannot_block_self",
            "You cannot block yourself",
        ));
    }

    let existing = block::Entity::find_by_id((caller_id, other_id))
        .one(db)
        .await?;
    if existing.is_some() {
        block::Entity::delete_by_id((caller_id, other_id))
            .exec(db)
            .await?;
        info!(blocker_id = caller_id, blocked_id = other_id, "User unblocked");
        return Ok(false);
    }

    let row = block::ActiveModel {
        blocker_id: Set(caller_id),
        blocked_id: Set(other_id),
        created_at: Set(Utc::now()),
    };
    let result = block::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([block::Column::BlockerId, block::Column::BlockedId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    info!(blocker_id = caller_id, blocked_id = other_id, "User blocked");
    Ok(true)
}

/// Blocks placed by the caller, newest first.
pub async fn blocked_by<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
) -> Result<Vec<block::Model>, AppError> {
    Ok(block::Entity::find()
        .filter(block::Column::BlockerId.eq(caller_id))
        .order_by_desc(block::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Toggle the caller's pin on a thread. Returns whether it is now pinned.
pub async fn toggle_thread_pin<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    thread_id: i32,
) -> Result<bool, AppError> {
    require_member(db, thread_id, caller_id).await?;

    let existing = pinned_thread::Entity::find_by_id((caller_id, thread_id))
        .one(db)
        .await?;
    if existing.is_some() {
        pinned_thread::Entity::delete_by_id((caller_id, thread_id))
            .exec(db)
            .await?;
        return Ok(false);
    }

    let row = pinned_thread::ActiveModel {
        user_id: Set(caller_id),
        thread_id: Set(thread_id),
        pinned_at: Set(Utc::now()),
    };
    let result = pinned_thread::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                pinned_thread::Column::UserId,
                pinned_thread::Column::ThreadId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Toggle the caller's pin on a message. Returns whether it is now pinned.
pub async fn toggle_message_pin<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    message_id: i32,
) -> Result<bool, AppError> {
    let message = find_message(db, message_id).await?;
    require_member(db, message.thread_id, caller_id).await?;

    let existing = pinned_message::Entity::find_by_id((caller_id, message_id))
        .one(db)
        .await?;
    if existing.is_some() {
        pinned_message::Entity::delete_by_id((caller_id, message_id))
            .exec(db)
            .await?;
        return Ok(false);
    }

    let row = pinned_message::ActiveModel {
        user_id: Set(caller_id),
        message_id: Set(message_id),
        thread_id: Set(message.thread_id),
        pinned_at: Set(Utc::now()),
    };
    let result = pinned_message::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                pinned_message::Column::UserId,
                pinned_message::Column::MessageId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

//! Direct and group thread creation.

use std::collections::BTreeSet;

use chrono::Utc;
use common::limits::MIN_GROUP_MEMBERS;
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::thread::{ThreadKind, direct_key};
use crate::entity::thread_member::MemberRole;
use crate::entity::{thread, thread_member};
use crate::error::AppError;
use crate::models::shared::validate_title;
use crate::services::membership::{is_blocked_either_way, member_ids};

/// Find or create the direct thread between the caller and `other_id`.
///
/// Returns the thread and whether this call created it.
pub async fn open_direct(
    db: &DatabaseConnection,
    caller_id: i32,
    other_id: i32,
) -> Result<(thread::Model, bool), AppError> {
    if caller_id == other_id {
        return Err(AppError::validation(
            "cannot_message_self",
            "A direct conversation needs another participant",
        ));
    }
    if is_blocked_either_way(db, caller_id, other_id).await? {
        return Err(AppError::conflict(
            "blocked",
            "One of the participants has blocked the other",
        ));
    }

    if let Some(existing) = find_direct(db, caller_id, other_id).await? {
        return Ok((existing, false));
    }

    match create_direct(db, caller_id, other_id).await {
        Ok(created) => {
            info!(thread_id = created.id, caller_id, other_id, "Direct thread created");
            Ok((created, true))
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // Another request created the pair first.
            warn!(caller_id, other_id, "Lost direct thread creation race");
            find_direct(db, caller_id, other_id)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| {
                    AppError::conflict(
                        "direct_thread_race",
                        "Conversation is being created, retry shortly",
                    )
                })
        }
        Err(e) => Err(e.into()),
    }
}

/// Scan the caller's direct threads for one whose members are exactly
/// `{caller_id, other_id}`.
///
/// Verifying the full member set, rather than matching on a single column,
/// keeps stray rows from turning a thread into a false match.
pub async fn find_direct<C: ConnectionTrait>(
    db: &C,
    caller_id: i32,
    other_id: i32,
) -> Result<Option<thread::Model>, AppError> {
    let thread_ids: Vec<i32> = thread_member::Entity::find()
        .filter(thread_member::Column::UserId.eq(caller_id))
        .select_only()
        .column(thread_member::Column::ThreadId)
        .into_tuple()
        .all(db)
        .await?;
    if thread_ids.is_empty() {
        return Ok(None);
    }

    let candidates = thread::Entity::find()
        .filter(thread::Column::Id.is_in(thread_ids))
        .filter(thread::Column::Kind.eq(ThreadKind::Direct))
        .order_by_asc(thread::Column::Id)
        .all(db)
        .await?;

    let wanted = BTreeSet::from([caller_id, other_id]);
    for candidate in candidates {
        if member_ids(db, candidate.id).await? == wanted {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

async fn create_direct(
    db: &DatabaseConnection,
    caller_id: i32,
    other_id: i32,
) -> Result<thread::Model, DbErr> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let created = thread::ActiveModel {
        kind: Set(ThreadKind::Direct),
        title: Set(None),
        creator_id: Set(caller_id),
        direct_key: Set(Some(direct_key(caller_id, other_id))),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let rows = [caller_id, other_id].map(|user_id| thread_member::ActiveModel {
        thread_id: Set(created.id),
        user_id: Set(user_id),
        role: Set(MemberRole::Member),
        joined_at: Set(now),
        muted: Set(false),
        last_read_message_id: Set(None),
    });
    thread_member::Entity::insert_many(rows)
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;
    Ok(created)
}

/// Create a titled group thread with the caller as owner.
///
/// `member_ids` may repeat or include the caller; the normalized set must
/// hold at least three users.
pub async fn create_group(
    db: &DatabaseConnection,
    caller_id: i32,
    title: &str,
    member_ids: &[i32],
) -> Result<thread::Model, AppError> {
    let mut members: BTreeSet<i32> = member_ids.iter().copied().collect();
    members.insert(caller_id);

    if members.len() < MIN_GROUP_MEMBERS {
        return Err(AppError::validation(
            "too_few_members",
            format!("A group needs at least {MIN_GROUP_MEMBERS} members"),
        ));
    }
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation(
            "missing_title",
            "A group needs a title",
        ));
    }
    validate_title(title)?;

    let txn = db.begin().await?;
    let now = Utc::now();

    let created = thread::ActiveModel {
        kind: Set(ThreadKind::Group),
        title: Set(Some(title.to_string())),
        creator_id: Set(caller_id),
        direct_key: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let rows = members.iter().map(|&user_id| thread_member::ActiveModel {
        thread_id: Set(created.id),
        user_id: Set(user_id),
        role: Set(if user_id == caller_id {
            MemberRole::Owner
        } else {
            MemberRole::Member
        }),
        joined_at: Set(now),
        muted: Set(false),
        last_read_message_id: Set(None),
    });
    thread_member::Entity::insert_many(rows)
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;

    info!(
        thread_id = created.id,
        caller_id,
        members = members.len(),
        "Group thread created"
    );
    Ok(created)
}

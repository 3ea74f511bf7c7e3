use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    #[sea_orm(string_value = "owner")]
    Owner,
    #[sea_orm(string_value = "member")]
    Member,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thread_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub thread_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,

    pub role: MemberRole,

    pub joined_at: DateTimeUtc,

    /// Suppresses notifications only; delivery is unaffected.
    #[sea_orm(default_value = false)]
    pub muted: bool,

    /// Newest message this member has fetched. Only ever moves forward.
    pub last_read_message_id: Option<i32>,
}

impl ActiveModelBehavior for ActiveModel {}

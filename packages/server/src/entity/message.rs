use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[sea_orm(string_value = "text")]
    Text,
    #[sea_orm(string_value = "image")]
    Image,
    #[sea_orm(string_value = "file")]
    File,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub thread_id: i32,

    pub sender_id: i32,

    /// NULL when the message only carries attachments or was soft-deleted.
    #[sea_orm(column_type = "Text")]
    pub content: Option<String>,

    pub kind: MessageKind,

    /// Always a message of the same thread.
    pub reply_to_message_id: Option<i32>,

    #[sea_orm(default_value = false)]
    pub is_edited: bool,
    pub edited_at: Option<DateTimeUtc>,

    #[sea_orm(default_value = false)]
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

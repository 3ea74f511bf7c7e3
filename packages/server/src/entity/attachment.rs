use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub message_id: i32,

    /// Original file name as supplied by the sender.
    pub file_name: String,

    pub mime_type: String,

    /// Confirmed size in bytes. NULL while the upload is pending.
    pub byte_size: Option<i64>,

    /// Object key: `<thread>/<message>/<random>_<sanitized name>`.
    #[sea_orm(unique)]
    pub storage_path: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_pending(&self) -> bool {
        self.byte_size.is_none()
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// "Delete for me": hides a message from one viewer only.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message_hide")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(primary_key)]
    pub message_id: i32,

    pub hidden_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pinned_message")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(primary_key)]
    pub message_id: i32,

    #[sea_orm(indexed)]
    pub thread_id: i32,

    pub pinned_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directional block: `blocker_id` blocked `blocked_id`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "block")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub blocker_id: i32,
    #[sea_orm(primary_key)]
    pub blocked_id: i32,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

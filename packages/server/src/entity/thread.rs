use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ThreadKind {
    /// Exactly two participants for the thread's whole lifetime.
    #[sea_orm(string_value = "direct")]
    Direct,
    /// Three or more participants at creation, with a title.
    #[sea_orm(string_value = "group")]
    Group,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thread")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub kind: ThreadKind,

    /// Group threads only.
    pub title: Option<String>,

    pub creator_id: i32,

    /// `"<min user id>:<max user id>"` for direct threads, NULL for groups.
    #[sea_orm(unique)]
    pub direct_key: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

/// Normalized key identifying the unordered pair of a direct thread.
pub fn direct_key(a: i32, b: i32) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}

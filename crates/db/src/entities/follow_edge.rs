//! Follow edge entity (directional follow relationships between users).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow_edge")]
pub struct Model {
    /// The user who is following
    #[sea_orm(primary_key, auto_increment = false)]
    pub follower_id: i64,

    /// The user being followed
    #[sea_orm(primary_key, auto_increment = false)]
    pub followee_id: i64,

    /// The reverse edge also exists (the two users follow each other)
    pub mutual: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user_login::Entity",
        from = "Column::FollowerId",
        to = "super::user_login::Column::UserId",
        on_delete = "Cascade"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::user_login::Entity",
        from = "Column::FolloweeId",
        to = "super::user_login::Column::UserId",
        on_delete = "Cascade"
    )]
    Followee,
}

impl ActiveModelBehavior for ActiveModel {}

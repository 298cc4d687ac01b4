//! User login entity (credentials row).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_login")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    #[sea_orm(unique)]
    pub username: String,

    /// Phone number, unique when present
    #[sea_orm(nullable)]
    pub phone: Option<String>,

    /// Email address, unique when present
    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// Argon2 password hash
    pub password: String,

    /// Soft-delete marker; set rows are invisible to lookups
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

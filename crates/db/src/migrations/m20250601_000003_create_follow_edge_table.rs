//! Create follow_edge table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FollowEdge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FollowEdge::FollowerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FollowEdge::FolloweeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FollowEdge::Mutual)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(FollowEdge::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(FollowEdge::FollowerId)
                            .col(FollowEdge::FolloweeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_edge_follower")
                            .from(FollowEdge::Table, FollowEdge::FollowerId)
                            .to(UserLogin::Table, UserLogin::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follow_edge_followee")
                            .from(FollowEdge::Table, FollowEdge::FolloweeId)
                            .to(UserLogin::Table, UserLogin::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: followee_id (for fan-list scans and follower counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_follow_edge_followee_id")
                    .table(FollowEdge::Table)
                    .col(FollowEdge::FolloweeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FollowEdge::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FollowEdge {
    Table,
    FollowerId,
    FolloweeId,
    Mutual,
    CreatedAt,
}

#[derive(Iden)]
enum UserLogin {
    Table,
    UserId,
}

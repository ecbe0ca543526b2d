use sea_orm_migration::prelude::*;

use crate::m20250901_000001_create_core_tables::{Predictions, Users};

#[derive(DeriveIden)]
enum UserPredictionAccess {
    Table,
    Id,
    UserId,
    PredictionId,
    PurchasedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserPredictionAccess::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserPredictionAccess::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserPredictionAccess::UserId).string().not_null())
                    .col(
                        ColumnDef::new(UserPredictionAccess::PredictionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserPredictionAccess::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_prediction_access_user")
                            .from(UserPredictionAccess::Table, UserPredictionAccess::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_prediction_access_prediction")
                            .from(UserPredictionAccess::Table, UserPredictionAccess::PredictionId)
                            .to(Predictions::Table, Predictions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One grant per (user, prediction) pair
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_user_prediction_access_pair")
                    .table(UserPredictionAccess::Table)
                    .col(UserPredictionAccess::UserId)
                    .col(UserPredictionAccess::PredictionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UserPredictionAccess::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

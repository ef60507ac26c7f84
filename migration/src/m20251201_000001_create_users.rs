use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Name, 250).not_null())
                    .col(string_len(Users::Email, 100).not_null().unique_key())
                    .col(string_len(Users::Password, 250).not_null())
                    .col(string_len(Users::Phone, 20).not_null())
                    .col(
                        string_len(Users::Role, 20)
                            .not_null()
                            .check(Expr::col(Users::Role).is_in(["admin", "customer"])),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Name,
    Email,
    Password,
    Phone,
    Role,
}

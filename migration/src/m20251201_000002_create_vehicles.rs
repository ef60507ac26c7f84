use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicles::Table)
                    .if_not_exists()
                    .col(pk_auto(Vehicles::Id))
                    .col(string_len(Vehicles::VehicleName, 250).not_null())
                    .col(
                        string_len(Vehicles::Type, 20)
                            .not_null()
                            .check(Expr::col(Vehicles::Type).is_in(["car", "bike", "van", "SUV"])),
                    )
                    .col(
                        string_len(Vehicles::RegistrationNumber, 20)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        integer(Vehicles::DailyRentPrice)
                            .not_null()
                            .check(Expr::col(Vehicles::DailyRentPrice).gt(0)),
                    )
                    .col(
                        string_len(Vehicles::AvailabilityStatus, 20)
                            .not_null()
                            .default("available")
                            .check(
                                Expr::col(Vehicles::AvailabilityStatus)
                                    .is_in(["available", "booked"]),
                            ),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicles {
    Table,
    Id,
    VehicleName,
    Type,
    RegistrationNumber,
    DailyRentPrice,
    AvailabilityStatus,
}

use sea_orm_migration::{prelude::*, schema::*};

use super::m20251201_000001_create_users::Users;
use super::m20251201_000002_create_vehicles::Vehicles;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(pk_auto(Bookings::Id))
                    .col(integer(Bookings::CustomerId).not_null())
                    .col(integer(Bookings::VehicleId).not_null())
                    .col(date(Bookings::RentStartDate).not_null())
                    .col(date(Bookings::RentEndDate).not_null())
                    .col(
                        integer(Bookings::TotalPrice)
                            .not_null()
                            .check(Expr::col(Bookings::TotalPrice).gt(0)),
                    )
                    .col(
                        string_len(Bookings::Status, 20)
                            .not_null()
                            .default("active")
                            .check(
                                Expr::col(Bookings::Status)
                                    .is_in(["active", "cancelled", "returned"]),
                            ),
                    )
                    .check(
                        Expr::col(Bookings::RentEndDate).gt(Expr::col(Bookings::RentStartDate)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Bookings::Table, Bookings::CustomerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_vehicle")
                            .from(Bookings::Table, Bookings::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_vehicle_status")
                    .table(Bookings::Table)
                    .col(Bookings::VehicleId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    CustomerId,
    VehicleId,
    RentStartDate,
    RentEndDate,
    TotalPrice,
    Status,
}

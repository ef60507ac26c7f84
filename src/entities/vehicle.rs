use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum VehicleType {
    #[sea_orm(string_value = "car")]
    #[serde(rename = "car")]
    Car,
    #[sea_orm(string_value = "bike")]
    #[serde(rename = "bike")]
    Bike,
    #[sea_orm(string_value = "van")]
    #[serde(rename = "van")]
    Van,
    #[sea_orm(string_value = "SUV")]
    #[serde(rename = "SUV")]
    Suv,
}

impl VehicleType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "car" => Some(Self::Car),
            "bike" => Some(Self::Bike),
            "van" => Some(Self::Van),
            "SUV" => Some(Self::Suv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "booked")]
    Booked,
}

impl AvailabilityStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(Self::Available),
            "booked" => Some(Self::Booked),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub vehicle_name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    #[sea_orm(unique)]
    pub registration_number: String,
    pub daily_rent_price: i32,
    pub availability_status: AvailabilityStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

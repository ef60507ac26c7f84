pub mod auth;
pub mod bookings;
pub mod health;
pub mod users;
pub mod vehicles;

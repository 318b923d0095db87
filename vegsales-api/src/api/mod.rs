//! HTTP API handlers

pub mod database;
pub mod health;
pub mod sales;

pub use database::database_routes;
pub use health::health_routes;
pub use sales::sales_routes;

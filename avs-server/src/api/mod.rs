//! HTTP API handlers for avs-server

pub mod card;
pub mod grade;
pub mod health;
pub mod review;

pub use card::card_routes;
pub use grade::grade_routes;
pub use health::health_routes;
pub use review::review_routes;

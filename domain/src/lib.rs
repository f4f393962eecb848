pub mod auth;
pub mod error;
pub mod navigation;
pub mod payment;

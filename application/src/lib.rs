#[cfg(any(feature = "adapters", feature = "reqwest"))]
compile_error!("application must not depend on adapters/framework crates");

pub mod auth;
pub mod error;
pub mod infrastructure_config;
pub mod ports;

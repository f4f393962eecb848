pub mod error_messages;
pub mod service;

pub mod credential_store_parse;
pub mod dto;
pub mod errors;

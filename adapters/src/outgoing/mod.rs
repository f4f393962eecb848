pub mod firebase_rest;
pub mod http;
pub mod parse_rest;
pub mod session_cell;
pub mod tokio_spawn;

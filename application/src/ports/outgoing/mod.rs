pub mod credential_store;
pub mod task_spawn;

pub mod credential_store_firebase;
pub mod errors;
pub mod firestore;
pub mod identity_toolkit;

pub mod account_repository;
pub mod argon2_password_hasher;
pub mod entity;
pub mod in_memory_session_store;
pub mod log_notifier;
pub mod security_key_repository;

pub mod account_repository;
pub mod security_key_repository;

pub mod account;
pub mod credential;
pub mod security_key;

pub mod accounts;
pub mod security_keys;

pub mod authentication_service;
pub mod notification_service;
pub mod password_service;
pub mod session_service;

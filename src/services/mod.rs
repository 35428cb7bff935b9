pub mod captcha;
pub mod file_service;
pub mod notifications;
pub mod text_extraction;

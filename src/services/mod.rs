pub mod file_service;
pub mod file_store;
pub mod mailer;
pub mod storage;

pub mod cache;
pub mod db;
pub mod mailer;
pub mod storage;

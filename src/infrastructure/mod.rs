pub mod auth;
pub mod db;
pub mod providers;
pub mod retry;
pub mod storage;

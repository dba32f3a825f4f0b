pub mod common;
pub mod config_tests;
pub mod event_tests;
pub mod lifecycle_tests;
pub mod storage_tests;

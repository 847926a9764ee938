pub mod api;
pub mod cache;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod i18n;
pub mod orchestrator;
pub mod provider;
pub mod retry;
pub mod store;

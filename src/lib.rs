pub mod api;
pub mod backend;
pub mod config;
pub mod database;
pub mod error;
pub mod utils;
pub mod workflows;

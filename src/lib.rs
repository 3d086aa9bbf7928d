//! Backend starter service library.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::AppConfig;
pub use http::{build_app, AppState, HttpServer};
pub use lifecycle::{Application, Shutdown};

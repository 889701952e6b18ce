pub mod analytics;
pub mod api;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod redirect;
pub mod registry;
pub mod service;
pub mod sweeper;

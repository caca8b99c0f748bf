pub mod cache;
pub mod config;
pub mod images;
pub mod models;
pub mod pipeline;
pub mod providers;

pub mod config;
pub mod listing;
pub mod plugin;
pub mod resolver;
pub mod router;
pub mod settings;
pub mod tmdb;

pub mod api_client;
pub mod chat;
pub mod commands;
pub mod config;
pub mod errors;
pub mod format;
pub mod listing;
pub mod models;
pub mod notify;
pub mod security;
pub mod terminal;
pub mod uploader;

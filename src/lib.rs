// Parko client - Library root
// Authenticated session layer for the fleet-management API

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;

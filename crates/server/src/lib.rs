//! Iris classifier HTTP server

pub mod api;
pub mod config;

//! Dididaren dispatch backend library
//!
//! Incident lifecycle, staff dispatch and zone risk evaluation behind an
//! axum HTTP surface, with Postgres or in-memory record storage.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

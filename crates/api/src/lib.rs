//! Formgate HTTP server library.
//!
//! Exposes configuration, state, error mapping, routes and the router
//! builder so the binary entrypoint and integration tests share them.

pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

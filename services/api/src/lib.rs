//! Roadmap API Library Crate
//!
//! This library contains the HTTP surface of the roadmap generator: the
//! application state, API handlers, request/response models and routing.
//! The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

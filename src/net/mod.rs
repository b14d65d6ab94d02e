//! Networking modules for the REST surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs the HTTP calls, `error` normalizes failures, and `types`
//! defines the wire schema shared with the backend.

pub mod api;
pub mod error;
pub mod types;

#[cfg(test)]
pub(crate) mod mock_server;

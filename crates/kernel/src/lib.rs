//! Scholaris CMS kernel library.
//!
//! Exposes the kernel internals to the `scholaris` binary and the
//! integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod lockout;
pub mod metrics;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;

//! API route handlers
//!
//! This module contains all HTTP route handlers for the server.

pub mod config;
pub mod health;
pub mod stream;

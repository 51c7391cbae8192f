//! Integration tests for planstream
//!
//! These tests drive the HTTP router end to end with a scripted oracle and
//! exercise the LLM-backed oracle against mock provider servers.

// Test utilities and common setup
mod common;

mod llm_oracle_tests;
mod stream_endpoint_tests;

pub use common::*;

//! CLI integration tests.

mod common;

mod build_tests;
mod resolve_tests;

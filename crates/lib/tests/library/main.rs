//! Library integration tests.

#[cfg(unix)]
mod common;
#[cfg(unix)]
mod pipeline_tests;
#[cfg(unix)]
mod recipe_tests;

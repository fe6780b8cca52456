//! Cross-module test suites.
//!
//! - `integration`: views and the API client against a `wiremock` backend
//! - `property`: `proptest` invariants of the derived view values

mod common;
mod property;

//! Integration tests
//!
//! `catalog_routes` drives the router in process against the in-memory
//! backends. `api_tests` talks to a running server and is ignored by default.

mod api_tests;
mod catalog_routes;
mod common;

//! Sift Kernel Library
//!
//! Dynamic query engine, store adapters, entity models and the HTTP
//! surface. The server entry point is the `sift` binary.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod state;

//! HTTP/JSON API server for evidence graph builds.
//!
//! Exposes the build/fetch/delete surface over the provenance traversal
//! engine: build requests are enqueued as asynchronous tasks and polled by
//! id, finished graphs are fetched and deleted by id. This crate contains
//! the server framework, API schema types, error handling, the graph
//! service, the task coordinator, and route definitions.

pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod service;
pub mod state;
pub mod tasks;

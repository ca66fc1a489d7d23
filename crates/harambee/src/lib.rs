//! Core library for the Harambee mutual-aid fund backend.
//!
//! The `fund` module owns the domain: member registry, case lifecycle, and
//! the contribution/probation engine, each exposed through a service facade
//! plus an axum router. Storage, notification delivery, and document blobs
//! are collaborator traits so deployments (and tests) supply their own
//! implementations.

pub mod config;
pub mod error;
pub mod fund;
pub mod telemetry;

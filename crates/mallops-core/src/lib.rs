//! MALLOPS Core — domain models, repository traits, and error types.
//!
//! This crate has no I/O of its own: storage lives in `mallops-db`,
//! authorization in `mallops-access`, and the HTTP surface in
//! `mallops-server`. Everything here is shared by all of them.

pub mod error;
pub mod models;
pub mod repository;

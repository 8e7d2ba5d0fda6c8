//! MALLOPS Server — the HTTP/JSON API over the permit, workflow, and
//! notification stores.
//!
//! The binary in `main.rs` wires configuration, the database connection,
//! and signal handling; everything routable lives here so the integration
//! tests can drive the router directly.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;

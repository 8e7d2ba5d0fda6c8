//! MALLOPS Access — the gate in front of every operation.
//!
//! Three layers, checked in order:
//! 1. **Credential resolution**: a bearer token or cookie is hashed and
//!    looked up in the session store ([`AccessService::authenticate`]).
//! 2. **Role policy**: a structured role/action table
//!    ([`policy::Action`], [`AccessService::require`]).
//! 3. **Ownership**: the resource's mall/tenant is cross-referenced
//!    against the caller's ([`AccessService::require_resource`]).
//!
//! Token *issuance* (passwords, MFA, refresh flows) is an external
//! collaborator; this crate only resolves what it is handed.

pub mod config;
pub mod error;
pub mod identity;
pub mod policy;
pub mod service;

pub use config::AccessConfig;
pub use error::AccessError;
pub use identity::{AuthContext, extract_token, token_hash};
pub use policy::Action;
pub use service::AccessService;

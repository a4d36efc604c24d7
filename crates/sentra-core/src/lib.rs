//! Sentra Core — domain models, repository traits, and shared errors.
//!
//! These are the types shared across all crates. Persistence and email
//! delivery live behind the traits defined here; the services in
//! `sentra-auth` hold no state of their own and re-derive truth from the
//! store on every call.

pub mod error;
pub mod mailer;
pub mod models;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use mailer::Mailer;

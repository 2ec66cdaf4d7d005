//! Lumen Core
//!
//! Domain crate for the Lumen console: the authentication state store, the
//! gate that decides which top-level view is shown, and the contract with
//! the external identity backend. No rendering or socket code lives here;
//! the console service composes these pieces around the live session.

pub mod auth;
pub mod gate;
pub mod identity;

pub use auth::{AuthSnapshot, AuthStore, UserRecord};
pub use gate::AuthGate;
pub use identity::{AuthError, HttpIdentityClient, IdentityService, StaticIdentityService};

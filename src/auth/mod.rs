//! # Authentication Module
//!
//! Token issuance and verification, revocation of logged-out tokens, the
//! authenticator combining both, and the middleware that gates protected
//! routes.

pub mod authenticator;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod revocation;

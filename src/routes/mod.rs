// # Routes Module
//
// HTTP route handlers, grouped by functionality. Routers are assembled in
// `server.rs`, which decides which routes sit behind the auth gate.

/// Health check endpoint
pub mod health;

/// Login, logout, registration and current-user endpoints
pub mod auth;

/// User management endpoints
pub mod users;

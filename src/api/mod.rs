//! API Module
//!
//! HTTP handlers and routing for the todo cache service.
//!
//! # Endpoints
//! - `GET /` - Liveness text
//! - `GET /get-todo` - Upstream todo list through the read-through cache
//! - `DELETE /cache/:key` - Invalidate a cached key
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

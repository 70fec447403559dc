//! API Module
//!
//! HTTP handlers and routing through which the host process exposes the
//! cache consumer API.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

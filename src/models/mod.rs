//! Request and Response models for the host API
//!
//! This module defines the DTOs used for serializing/deserializing HTTP
//! request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{PatternRequest, SetRequest, SuffixQuery};
pub use responses::{
    DeleteResponse, GetResponse, InvalidateResponse, MessageResponse, ReinitializeResponse,
    SetResponse,
};

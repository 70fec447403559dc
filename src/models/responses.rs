//! Response DTOs for the host API
//!
//! Statistics and health reports are serialized directly from the cache
//! types; the bodies here cover the single-key and invalidation routes.

use serde::Serialize;
use serde_json::Value;

use crate::remote::BackendState;

/// Response body for `GET /cache/:type/:id`
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for `PUT /cache/:type/:id`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub key: String,
    pub stored: bool,
}

/// Response body for `DELETE /cache/:type/:id`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub key: String,
    /// False when no tier held the key
    pub deleted: bool,
}

/// Response body for the invalidation routes
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

/// Response body for `POST /admin/reinitialize`
#[derive(Debug, Clone, Serialize)]
pub struct ReinitializeResponse {
    pub state: BackendState,
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

//! Transport adapters.
//!
//! Each adapter unwraps its platform envelope into [`RawRecord`]s, runs the
//! batch through the coordinator and wraps the batch result into an
//! [`InvocationResponse`].
//!
//! [`RawRecord`]: crate::domain::event::RawRecord

pub mod pull;
pub mod push;

use crate::application::coordinator::BatchResult;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Response handed back to the hosting environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    /// JSON-encoded [`BatchResult`].
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(result: &BatchResult) -> Result<Self> {
        Ok(Self {
            status_code: 200,
            body: serde_json::to_string(result)?,
        })
    }
}

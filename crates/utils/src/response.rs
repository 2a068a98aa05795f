use serde::Serialize;
use ts_rs::TS;

/// Plain `{message}` body used for deletions, 404 fallbacks and error
/// responses.
#[derive(Debug, Clone, Serialize, TS)]
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

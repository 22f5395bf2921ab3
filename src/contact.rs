//! Contact form. Messages are validated and handed to a sink; the bundled
//! sink only records receipt and transmits nothing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, ContentResult};

const MAX_FIELD_LEN: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> ContentResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(ContentError::Validation(format!("{} is required", field)));
            }
            if value.len() > MAX_FIELD_LEN {
                return Err(ContentError::Validation(format!("{} is too long", field)));
            }
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(ContentError::Validation("email is not valid".to_string())),
        }
    }
}

#[async_trait]
pub trait ContactSink: Send + Sync {
    async fn deliver(&self, message: &ContactMessage) -> ContentResult<()>;
}

/// Logs that a message arrived. Nothing leaves the process.
#[derive(Debug, Default, Clone)]
pub struct LocalContactSink;

#[async_trait]
impl ContactSink for LocalContactSink {
    async fn deliver(&self, message: &ContactMessage) -> ContentResult<()> {
        tracing::info!(
            from = %message.name,
            length = message.message.len(),
            "contact message received"
        );
        Ok(())
    }
}

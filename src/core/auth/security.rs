//! Security event handling
//!
//! Clears sensitive session state and reports suspicious activity to the
//! backend. Reports are best-effort and never block the local action.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crate::core::auth::SECURITY_ALERT_PATH;
use crate::core::auth::events::SessionEvent;
use crate::core::auth::models::SecurityAlert;
use crate::core::auth::service::{AuthError, SessionManager};

impl SecurityAlert {
    /// Alert stamped with the current UTC time
    pub fn now(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl SessionManager {
    /// Remove only the refresh token. Returns false if the store failed.
    pub async fn clear_refresh_token(&self, reason: &str) -> bool {
        match self.storage.clear_refresh_token().await {
            Ok(_) => {
                tracing::info!(reason, "Refresh token cleared");
                true
            }
            Err(e) => {
                tracing::error!(reason, "Error clearing refresh token: {}", e);
                false
            }
        }
    }

    /// Clear the refresh token after suspicious activity and notify the backend.
    ///
    /// The access token and cached profile are left in place. Returns whether
    /// the refresh token was cleared; a failed notification is only logged.
    pub async fn security_clear_refresh_token(&self, reason: &str) -> bool {
        tracing::warn!(reason, "Security measure triggered");

        let cleared = self.clear_refresh_token(&format!("security-{reason}")).await;
        self.emit(SessionEvent::SecurityAlert {
            reason: reason.to_string(),
        });

        let alert = SecurityAlert::now(reason);
        if let Err(e) = self
            .client
            .post::<_, Value>(SECURITY_ALERT_PATH, &alert)
            .await
        {
            tracing::warn!("Failed to notify server about security event: {}", e);
        }

        cleared
    }

    /// Clear the bearer and wipe the store. The bearer is cleared even when
    /// the wipe fails.
    pub(crate) async fn wipe_session(&self) -> Result<(), AuthError> {
        self.client.clear_bearer();
        self.storage.clear_all().await?;
        Ok(())
    }

    /// Wipe the session and tell subscribers the user must log in again
    pub async fn expire_session(&self, reason: &str) -> Result<(), AuthError> {
        self.wipe_session().await?;
        tracing::info!(reason, "Session expired");
        self.emit(SessionEvent::SessionExpired {
            reason: reason.to_string(),
        });
        Ok(())
    }
}

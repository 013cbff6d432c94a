//! Session lifecycle events and the notices shown for them

use serde::Serialize;

/// Emitted by the session manager on every session transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    LoggedIn,
    SignedUp,
    LoggedOut,
    TokenRefreshed,
    /// Stored session was wiped; the user must authenticate again
    SessionExpired { reason: String },
    /// Refresh token cleared after suspicious activity
    SecurityAlert { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient notification for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

impl SessionEvent {
    pub fn notice(&self) -> Notice {
        match self {
            SessionEvent::LoggedIn => Notice::new(NoticeLevel::Success, "Login successful!"),
            SessionEvent::SignedUp => Notice::new(NoticeLevel::Success, "Signup successful!"),
            SessionEvent::LoggedOut => {
                Notice::new(NoticeLevel::Success, "Logged out successfully!")
            }
            SessionEvent::TokenRefreshed => Notice::new(NoticeLevel::Info, "Session renewed"),
            SessionEvent::SessionExpired { .. } => {
                Notice::new(NoticeLevel::Warning, "Session expired. Please login again.")
            }
            SessionEvent::SecurityAlert { .. } => Notice::new(
                NoticeLevel::Warning,
                "For your security, please login again on your next visit.",
            ),
        }
    }

    /// Whether the UI should navigate to the login page
    pub fn requires_reauth(&self) -> bool {
        matches!(self, SessionEvent::SessionExpired { .. })
    }
}

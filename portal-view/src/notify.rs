use std::fmt::Display;

use portal_client::error::APIError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Success,
}

impl Severity {
    pub fn title(&self) -> &'static str {
        match self {
            Severity::Error => "Error",
            Severity::Success => "Success",
        }
    }
}

/// Message shown to the user once a workflow is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.severity.title()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Message with control characters blanked out, safe to print as is.
    pub fn plain_text(&self) -> String {
        self.message
            .chars()
            .map(|c| if c.is_control() && c != '\n' { ' ' } else { c })
            .collect()
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title(), self.plain_text())
    }
}

/// Where notices end up. Stays up until the user dismisses it.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
    fn dismiss(&self) {}
}

/// Text to show for a failed call: the portal's own message when it gave
/// one, `fallback` otherwise.
pub(crate) fn failure_detail(err: &APIError, fallback: &str) -> String {
    err.server_message().unwrap_or(fallback).to_string()
}

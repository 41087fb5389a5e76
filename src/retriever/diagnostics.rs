//! Failure classification and operator guidance.
//!
//! The retrieval tool reports failures as free text. This module sorts those
//! messages into a handful of kinds so the menu can say what went wrong and
//! what to try next, instead of echoing a stack of tool output.

use std::fmt;

/// Broad category of a retrieval failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Service demanded proof that the client is human
    BotCheck,
    /// HTTP 401/403 or similar refusal
    AccessDenied,
    /// HTTP 429
    RateLimited,
    /// Timeouts, DNS and connection failures
    Network,
    /// Resource is private, removed or region-locked
    Unavailable,
    /// The collaborator executable could not be started.
    /// Only spawn failures map here; [`FailureKind::classify`] never
    /// returns it for collaborator output.
    ToolMissing,
    /// Anything else
    Generic,
}

impl FailureKind {
    /// Classify a collaborator message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["sign in to confirm", "not a bot", "captcha", "unusual traffic"]) {
            Self::BotCheck
        } else if has(&["http error 429", "too many requests"]) {
            Self::RateLimited
        } else if has(&["http error 403", "http error 401", "forbidden", "access denied"]) {
            Self::AccessDenied
        } else if has(&[
            "private video",
            "video unavailable",
            "has been removed",
            "not available in your country",
            "members-only",
        ]) {
            Self::Unavailable
        } else if has(&[
            "timed out",
            "timeout",
            "connection reset",
            "connection refused",
            "getaddrinfo",
            "name or service not known",
            "network is unreachable",
            "temporary failure in name resolution",
        ]) {
            Self::Network
        } else {
            Self::Generic
        }
    }

    /// Short description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BotCheck => "the service flagged the request as automated",
            Self::AccessDenied => "the service refused the request",
            Self::RateLimited => "too many requests",
            Self::Network => "network failure",
            Self::Unavailable => "the resource is not available",
            Self::ToolMissing => "the retrieval tool could not be started",
            Self::Generic => "retrieval failed",
        }
    }

    /// Suggested remediation.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::BotCheck | Self::AccessDenied => {
                "Try again later or use a different network path (e.g. a VPN)"
            }
            Self::RateLimited => "Wait a few minutes before trying again",
            Self::Network => "Check your connection and try again",
            Self::Unavailable => "Check that the URL is public and playable in a browser",
            Self::ToolMissing => "Install yt-dlp and make sure it is on PATH",
            Self::Generic => "Try again later or use a different network path",
        }
    }

    /// Whether trying again later may help.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Unavailable | Self::ToolMissing)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A failure with its classification, ready to show an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Classification
    pub kind: FailureKind,
    /// Underlying message
    pub message: String,
}

impl FailureReport {
    /// Build a report.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Multi-line operator message: what happened, the detail, what to do.
    pub fn format(&self) -> String {
        format!(
            "Error: {}\n  Details: {}\n  Suggestion: {}",
            self.kind.description(),
            self.message,
            self.kind.suggestion()
        )
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Outcome definitions for individual locator attempts
use std::fmt;

/// What happened when the fetch worker processed one locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemOutcome {
    // ===== Success =====
    /// Page fetched and a product record extracted
    Extracted,

    // ===== Content =====
    /// Page fetched but no product metadata block could be read
    NoStructuredData,

    // ===== Transport =====
    /// Server answered with a non-success status
    HttpStatus,

    /// Retrieval exceeded the fetch timeout
    Timeout,

    /// Connection could not be established
    Unreachable,

    /// Any other transport or body-decode failure
    Failed,

    // ===== Input =====
    /// Locator URL could not be parsed into a fetchable URL
    InvalidUrl,
}

impl ItemOutcome {
    /// Returns true if the attempt produced a record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Extracted)
    }

    /// Returns true if the failure happened in transport and may be retried
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus | Self::Timeout | Self::Unreachable | Self::Failed
        )
    }

    /// Stable lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::NoStructuredData => "no_structured_data",
            Self::HttpStatus => "http_status",
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::Failed => "failed",
            Self::InvalidUrl => "invalid_url",
        }
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

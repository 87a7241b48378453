//! Request context carrying the acting user and the request time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context for the current request.
///
/// Built by the API layer (or the CLI) and passed into service methods so
/// that every mutation knows *who* is acting and *when*.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Acting user, when the caller supplied one.
    pub actor: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context stamped with the current time.
    pub fn new(actor: Option<String>) -> Self {
        Self {
            actor: actor
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            request_time: Utc::now(),
        }
    }

    /// Context for work the service does on its own behalf.
    pub fn system() -> Self {
        Self::new(None)
    }

    /// The acting user as a borrowed string.
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_actor_is_anonymous() {
        assert_eq!(RequestContext::new(Some("  ".into())).actor(), None);
        assert_eq!(RequestContext::new(Some(" ana ".into())).actor(), Some("ana"));
        assert_eq!(RequestContext::system().actor(), None);
    }
}

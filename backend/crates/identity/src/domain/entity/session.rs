//! Session Entity
//!
//! One logical login. Anchors the validity window of a refresh token:
//! a refresh token carries only the session id, so deleting the session
//! invalidates the token instantly.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::ids::{SessionId, UserId};

/// Session entity
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Opaque, informational only (session listings, audit logs)
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session valid for `ttl` from now
    pub fn new(user_id: UserId, user_agent: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            user_id,
            user_agent,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// A session past its expiry is logically dead even if the record
    /// still exists; every read path must check this.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Remaining validity, zero when expired
    pub fn remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).max(Duration::zero())
    }

    /// Whether the sliding refresh window has been reached:
    /// remaining validity at or below `threshold`.
    pub fn needs_rotation(&self, threshold: Duration) -> bool {
        self.remaining() <= threshold
    }

    /// Push expiry out to now + `ttl` (refresh rotation path only)
    pub fn extend(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_not_expired() {
        let session = Session::new(UserId::new(), None, Duration::days(30));
        assert!(!session.is_expired());
        assert!(session.remaining() > Duration::days(29));
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new(UserId::new(), None, Duration::days(30));
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
        assert_eq!(session.remaining(), Duration::zero());
    }

    #[test]
    fn test_needs_rotation() {
        let threshold = Duration::days(1);

        let fresh = Session::new(UserId::new(), None, Duration::days(30));
        assert!(!fresh.needs_rotation(threshold));

        let mut near_expiry = Session::new(UserId::new(), None, Duration::days(30));
        near_expiry.expires_at = Utc::now() + Duration::hours(6);
        assert!(near_expiry.needs_rotation(threshold));
    }

    #[test]
    fn test_extend_pushes_expiry() {
        let mut session = Session::new(UserId::new(), None, Duration::days(30));
        session.expires_at = Utc::now() + Duration::hours(6);

        session.extend(Duration::days(30));
        assert!(session.remaining() > Duration::days(29));
    }
}

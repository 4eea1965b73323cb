//! The session manager.
//!
//! Owns the process's single current session. One instance is created at
//! startup and injected into every component that needs session access;
//! there is no global. All operations run under one mutex, perform no
//! I/O while holding it, and return in bounded time, so the interactive
//! thread and background tasks can share an `Arc<SessionManager>`.
//!
//! Expiry is evaluated lazily on read. An expired session stays in the
//! slot, answering `SessionExpired`, until it is replaced or destroyed.

use std::sync::Arc;

use chrono::Duration;
use guardia_core::clock::{Clock, SystemClock, deadline};
use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::role::normalize_role_refs;
use guardia_core::models::session::{CreateSession, Session};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

pub struct SessionManager {
    current: Mutex<Option<Session>>,
    clock: Arc<dyn Clock>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl SessionManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            current: Mutex::new(None),
            clock,
        }
    }

    /// Start a session and make it current, discarding any previous one.
    ///
    /// Role names are lower-cased and de-duplicated, keeping first-seen
    /// order.
    pub fn create(&self, input: CreateSession) -> GuardiaResult<Session> {
        if input.ttl <= Duration::zero() {
            return Err(GuardiaError::Validation {
                message: "session lifetime must be positive".into(),
            });
        }

        let now = self.clock.now();
        let expires_at = deadline(now, input.ttl)?;
        let session = Session {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            username: input.username,
            roles: normalize_role_refs(input.roles),
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            created_at: now,
            last_activity: now,
            expires_at,
            metadata: Map::new(),
        };

        let replaced = self.current.lock().replace(session.clone());

        if let Some(old) = replaced {
            debug!(session_id = %old.id, "Replaced previous session");
        }
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            username = %session.username,
            expires_at = %session.expires_at,
            "Session created"
        );

        Ok(session)
    }

    /// The current session, if one exists and has not expired.
    ///
    /// Fails with `NotFound` when no session was ever set (or it was
    /// destroyed) and with `SessionExpired` once `now >= expires_at`.
    pub fn current(&self) -> GuardiaResult<Session> {
        let now = self.clock.now();
        let slot = self.current.lock();
        match slot.as_ref() {
            None => Err(no_session()),
            Some(session) if !session.is_live_at(now) => Err(GuardiaError::SessionExpired),
            Some(session) => Ok(session.clone()),
        }
    }

    /// Record activity on the current session.
    ///
    /// Never moves `last_activity` backward and never extends
    /// `expires_at`; use [`extend`](Self::extend) for sliding renewal.
    pub fn touch(&self) -> GuardiaResult<()> {
        let now = self.clock.now();
        self.with_live(now, |session| {
            if now > session.last_activity {
                session.last_activity = now;
            }
        })
    }

    /// Push the expiry of the live session to at least `now + by`.
    ///
    /// Also counts as activity. An expired session is not revived.
    pub fn extend(&self, by: Duration) -> GuardiaResult<Session> {
        if by <= Duration::zero() {
            return Err(GuardiaError::Validation {
                message: "extension must be positive".into(),
            });
        }

        let now = self.clock.now();
        let candidate = deadline(now, by)?;
        let session = self.with_live(now, |session| {
            if candidate > session.expires_at {
                session.expires_at = candidate;
            }
            if now > session.last_activity {
                session.last_activity = now;
            }
            session.clone()
        })?;

        debug!(
            session_id = %session.id,
            expires_at = %session.expires_at,
            "Session extended"
        );
        Ok(session)
    }

    /// Attach an extension value to the live session.
    pub fn set_metadata(&self, key: impl Into<String>, value: Value) -> GuardiaResult<()> {
        let now = self.clock.now();
        let key = key.into();
        self.with_live(now, move |session| {
            session.metadata.insert(key, value);
        })
    }

    /// Clear the current session. Destroying an absent session is not an
    /// error; the removed session is returned for auditing.
    pub fn destroy(&self) -> Option<Session> {
        let removed = self.current.lock().take();
        if let Some(session) = &removed {
            info!(
                session_id = %session.id,
                user_id = %session.user_id,
                "Session destroyed"
            );
        }
        removed
    }

    pub fn is_active(&self) -> bool {
        self.current().is_ok()
    }

    fn with_live<T>(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        f: impl FnOnce(&mut Session) -> T,
    ) -> GuardiaResult<T> {
        let mut slot = self.current.lock();
        match slot.as_mut() {
            None => Err(no_session()),
            Some(session) if !session.is_live_at(now) => Err(GuardiaError::SessionExpired),
            Some(session) => Ok(f(session)),
        }
    }
}

fn no_session() -> GuardiaError {
    GuardiaError::not_found("session", "current")
}

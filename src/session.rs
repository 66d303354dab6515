use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use log::info;
use uuid::Uuid;

use crate::table::Table;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "presences_session";

/// The file uploaded by one browser
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub table: Arc<Table>,
}

#[derive(Debug)]
struct Session {
    upload: Option<Upload>,
    last_seen: Instant,
}

/// Per-browser state: only the uploaded table survives between requests
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a new, empty session and return its id
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.write().insert(
            id.clone(),
            Session {
                upload: None,
                last_seen: Instant::now(),
            },
        );
        id
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read()
            .get(id)
            .map(|session| session.last_seen.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Replace the session's table; unknown ids are (re)created
    pub fn store(&self, id: &str, file_name: &str, table: Table) {
        self.write().insert(
            id.to_string(),
            Session {
                upload: Some(Upload {
                    file_name: file_name.to_string(),
                    table: Arc::new(table),
                }),
                last_seen: Instant::now(),
            },
        );
    }

    /// Table of a live session, refreshing its idle timer
    pub fn upload(&self, id: &str) -> Option<Upload> {
        let mut sessions = self.write();
        let session = sessions.get_mut(id)?;
        if session.last_seen.elapsed() >= self.ttl {
            sessions.remove(id);
            return None;
        }
        session.last_seen = Instant::now();
        session.upload.clone()
    }

    /// Drop idle sessions, returning how many were removed
    pub fn prune_expired(&self) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, session| session.last_seen.elapsed() < self.ttl);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("dropped {} expired sessions", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

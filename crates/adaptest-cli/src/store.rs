//! In-memory session storage for the orchestrating layer.
//!
//! The core assumes a single writer per session; here that discipline is
//! trivial because the command loop is the only caller. A service would
//! replace this with its own store keyed the same way.

use std::collections::HashMap;

use uuid::Uuid;

use adaptest_core::error::CatError;
use adaptest_core::session::Session;

/// Sessions keyed by id. The store never deletes a session; finished
/// sessions stay readable for reporting.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session and return its id.
    pub fn insert(&mut self, session: Session) -> Uuid {
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: Uuid) -> Result<&Session, CatError> {
        self.sessions.get(&id).ok_or(CatError::SessionNotFound(id))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Result<&mut Session, CatError> {
        self.sessions
            .get_mut(&id)
            .ok_or(CatError::SessionNotFound(id))
    }
}

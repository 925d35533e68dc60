use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One upload: the raw bytes are all that is kept between requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub bytes: Arc<[u8]>,
    pub fingerprint: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Session {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let fingerprint = blake3::hash(&bytes).to_hex().to_string();
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            bytes: bytes.into(),
            fingerprint,
            uploaded_at: Utc::now(),
        }
    }
}

/// In-memory sessions, capped at `capacity`; the oldest upload is evicted first.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Stores `session`, returning the ids evicted to make room.
    pub fn insert(&mut self, session: Session) -> Vec<Uuid> {
        let mut evicted = Vec::new();
        while self.sessions.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.sessions.remove(&oldest).is_some() {
                evicted.push(oldest);
            }
        }
        self.order.push_back(session.id);
        self.sessions.insert(session.id, session);
        evicted
    }

    pub fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.get(id).cloned()
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Session> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

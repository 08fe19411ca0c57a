//! Conversation state.
//!
//! - [`ConversationLog`] - the ordered, append-only list of turns of one session
//! - [`Session`] - a log plus the settings its queries run with
//! - [`SessionStore`] - every live session of the HTTP API
//!
//! Nothing here is persisted; a session lives as long as the shell or until
//! the API deletes it.

use crate::llm::ChatSettings;
use crate::rag::AnswerChain;
use crate::types::{AppError, Result, Turn};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Ordered turns of one conversation, in the order they were appended.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Remove every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Read-only view of all turns.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// One user's conversation and the settings their queries use.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    log: ConversationLog,
    /// Read fresh on every query.
    pub settings: ChatSettings,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            log: ConversationLog::new(),
            settings,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Clear the conversation, keeping the settings.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Ask `question` and record the exchange.
    ///
    /// The user turn is appended before the chain runs. On success exactly
    /// one assistant turn follows it and is returned; on failure the log
    /// keeps the user turn and the error is returned. A blank question is
    /// rejected without touching the log.
    pub async fn submit(&mut self, chain: &AnswerChain, k: usize, question: &str) -> Result<&Turn> {
        if question.trim().is_empty() {
            return Err(AppError::InvalidInput("Question must not be empty".to_string()));
        }

        self.log.append(Turn::user(question));
        let settings = self.settings;

        match chain.answer(question, k, &settings).await {
            Ok(answer) => {
                self.log
                    .append(Turn::assistant(answer.text, answer.sources));
                debug!(session = %self.id, turns = self.log.len(), "Recorded answer");
                self.log
                    .last()
                    .ok_or_else(|| AppError::Internal("Conversation log is empty".to_string()))
            }
            Err(e) => {
                warn!(session = %self.id, kind = e.kind(), error = %e, "Query failed");
                Err(e)
            }
        }
    }
}

/// Shared handle to one session. The mutex serializes queries within the
/// session; different sessions run independently.
pub type SessionHandle = Arc<Mutex<Session>>;

/// All live sessions, keyed by id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session and return its id and handle.
    pub fn create(&self, settings: ChatSettings) -> (Uuid, SessionHandle) {
        let session = Session::new(settings);
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().insert(id, Arc::clone(&handle));
        (id, handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().get(id).cloned()
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_log_keeps_append_order() {
        let mut log = ConversationLog::new();
        log.append(Turn::user("first"));
        log.append(Turn::assistant("second", vec![]));
        log.append(Turn::user("third"));

        let texts: Vec<&str> = log.all().iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(log.last().unwrap().role(), Role::User);
    }

    #[test]
    fn test_clear_empties_log_regardless_of_length() {
        for n in [0, 1, 7] {
            let mut log = ConversationLog::new();
            for i in 0..n {
                log.append(Turn::user(format!("q{}", i)));
            }
            log.clear();
            assert!(log.is_empty());
            assert_eq!(log.all().len(), 0);
        }
    }

    #[test]
    fn test_session_store_lifecycle() {
        let store = SessionStore::new();
        let (id, _) = store.create(ChatSettings::default());
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_some());
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }
}

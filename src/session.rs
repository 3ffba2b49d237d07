//! # Session Store Module
//!
//! This module provides the thread-safe, per-chat container for all session
//! state. Each chat owns one entry guarded by its own async mutex; every
//! check-then-act sequence (quota check+consume, awaiting-flow transition,
//! portion rescale) runs while holding that lock, so redelivered or
//! concurrent events for the same chat serialize instead of racing.
//!
//! # Entry Lifecycle
//!
//! - Entries are created lazily on first access for a chat
//! - Entries persist for the process lifetime and are never deleted
//!   (unbounded growth is a known limitation of the volatile store)
//!
//! # Thread Safety
//!
//! Uses `Mutex<HashMap<>>` internally for entry management; the map lock is
//! held only long enough to look up or insert an entry. No operation on one
//! chat blocks on another chat's state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use teloxide::types::ChatId;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::budget::UserProfile;
use crate::clock::DayKey;
use crate::config::BudgetConfig;
use crate::quota::UsageRecord;

/// All volatile state for one chat
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub usage: UsageRecord,
    pub profile: UserProfile,
}

impl ChatSession {
    pub fn new(day: DayKey, budget_config: &BudgetConfig) -> Self {
        Self {
            usage: UsageRecord::new(day),
            profile: UserProfile::new(day, budget_config),
        }
    }
}

/// Keyed, concurrency-safe container for per-chat sessions
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Arc<AsyncMutex<ChatSession>>>>,
    budget_config: BudgetConfig,
}

impl SessionStore {
    pub fn new(budget_config: BudgetConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            budget_config,
        }
    }

    /// Get the session entry for a chat, creating it on first access.
    /// Callers lock the returned mutex and perform their whole
    /// read-modify-write inside one lock hold.
    pub fn session(&self, chat_id: ChatId, today: DayKey) -> Arc<AsyncMutex<ChatSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        Arc::clone(sessions.entry(chat_id).or_insert_with(|| {
            debug!(user_id = %chat_id, "Creating session entry for chat");
            Arc::new(AsyncMutex::new(ChatSession::new(today, &self.budget_config)))
        }))
    }

    /// Number of chats with a session entry
    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> DayKey {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_entries_created_lazily_and_reused() {
        let store = SessionStore::new(BudgetConfig::default());
        assert_eq!(store.session_count(), 0);

        let first = store.session(ChatId(1), day());
        let again = store.session(ChatId(1), day());
        assert_eq!(store.session_count(), 1);
        assert!(Arc::ptr_eq(&first, &again));

        store.session(ChatId(2), day());
        assert_eq!(store.session_count(), 2);
    }

    #[tokio::test]
    async fn test_chats_do_not_share_state() {
        let store = SessionStore::new(BudgetConfig::default());

        {
            let session = store.session(ChatId(1), day());
            let mut session = session.lock().await;
            session.usage.credits = 7;
        }

        let other = store.session(ChatId(2), day());
        assert_eq!(other.lock().await.usage.credits, 0);
    }
}

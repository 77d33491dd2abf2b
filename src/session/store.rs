//! Process-local owner of the live query context.

use super::client::SessionClient;
use crate::context::ContextExtractor;
use crate::models::{ConversationTurn, QueryContext};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Keeps the current [`QueryContext`] and mirrors it to the backend.
///
/// The context is recomputed from the whole turn log on every refresh,
/// never patched. A push is only attempted when the value changed or the
/// previous push failed.
pub struct SessionContextStore {
    session_id: String,
    extractor: ContextExtractor,
    current: QueryContext,
    client: Arc<dyn SessionClient>,
    pending_push: bool,
}

impl SessionContextStore {
    pub fn new(
        session_id: impl Into<String>,
        extractor: ContextExtractor,
        client: Arc<dyn SessionClient>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            extractor,
            current: QueryContext::default(),
            client,
            pending_push: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The live context.
    pub fn current(&self) -> &QueryContext {
        &self.current
    }

    /// An owned copy of the live context.
    pub fn snapshot(&self) -> QueryContext {
        self.current.clone()
    }

    /// Whether the last push attempt failed.
    pub fn has_pending_push(&self) -> bool {
        self.pending_push
    }

    /// Recomputes the context from `turns`.
    ///
    /// Returns `Ok(true)` when a push was made. The new context is kept
    /// even if the push fails; the next refresh retries it.
    pub async fn refresh(&mut self, turns: &[ConversationTurn]) -> Result<bool> {
        let next = self.extractor.extract(turns);

        if next == self.current && !self.pending_push {
            debug!("Query context unchanged, skipping push");
            return Ok(false);
        }

        self.current = next;
        self.push().await?;
        Ok(true)
    }

    /// Resets to the empty context and pushes it right away.
    pub async fn clear(&mut self) -> Result<()> {
        self.current = QueryContext::default();
        self.push().await
    }

    async fn push(&mut self) -> Result<()> {
        match self
            .client
            .update_context(&self.session_id, &self.current)
            .await
        {
            Ok(()) => {
                self.pending_push = false;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to push query context: {}", e);
                self.pending_push = true;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageContext, Parameter};
    use crate::session::client::{HealthStatus, SessionInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        pushes: Mutex<Vec<QueryContext>>,
        fail: AtomicBool,
    }

    impl RecordingClient {
        fn push_count(&self) -> usize {
            self.pushes.lock().unwrap().len()
        }

        fn last_push(&self) -> Option<QueryContext> {
            self.pushes.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl SessionClient for RecordingClient {
        async fn create_session(&self) -> Result<SessionInfo> {
            Ok(SessionInfo {
                session_id: "test".to_string(),
            })
        }

        async fn send_message(
            &self,
            text: &str,
            _session_id: &str,
            _context: Option<&MessageContext>,
        ) -> Result<ConversationTurn> {
            Ok(ConversationTurn::assistant(format!("echo: {}", text), 0.9))
        }

        async fn update_context(&self, _session_id: &str, context: &QueryContext) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("backend unavailable");
            }
            self.pushes.lock().unwrap().push(context.clone());
            Ok(())
        }

        async fn get_health(&self) -> Result<HealthStatus> {
            Ok(HealthStatus::default())
        }
    }

    fn store_with(client: Arc<RecordingClient>) -> SessionContextStore {
        SessionContextStore::new("s1", ContextExtractor::default(), client)
    }

    #[test]
    fn test_refresh_pushes_only_on_change() {
        let client = Arc::new(RecordingClient::default());
        let mut store = store_with(client.clone());

        let mut turns = vec![ConversationTurn::user("Show me temperature near the equator")];
        assert!(tokio_test::block_on(store.refresh(&turns)).unwrap());
        assert_eq!(client.push_count(), 1);
        assert_eq!(store.current().location(), Some("equator"));

        // An assistant reply does not change the context.
        turns.push(ConversationTurn::assistant("Here you go", 0.9));
        assert!(!tokio_test::block_on(store.refresh(&turns)).unwrap());
        assert_eq!(client.push_count(), 1);

        turns.push(ConversationTurn::user("and salinity too"));
        assert!(tokio_test::block_on(store.refresh(&turns)).unwrap());
        assert_eq!(client.push_count(), 2);
        assert_eq!(
            client.last_push().unwrap().preferred_parameters,
            vec![Parameter::Temperature, Parameter::Salinity]
        );
    }

    #[test]
    fn test_empty_log_does_not_push() {
        let client = Arc::new(RecordingClient::default());
        let mut store = store_with(client.clone());

        assert!(!tokio_test::block_on(store.refresh(&[])).unwrap());
        assert_eq!(client.push_count(), 0);
        assert!(store.current().is_empty());
    }

    #[test]
    fn test_failed_push_is_retried() {
        let client = Arc::new(RecordingClient::default());
        client.fail.store(true, Ordering::SeqCst);
        let mut store = store_with(client.clone());

        let turns = vec![ConversationTurn::user("oxygen in the pacific")];
        assert!(tokio_test::block_on(store.refresh(&turns)).is_err());
        assert!(store.has_pending_push());
        // The new context is kept even though the push failed.
        assert_eq!(store.current().location(), Some("pacific"));

        client.fail.store(false, Ordering::SeqCst);
        assert!(tokio_test::block_on(store.refresh(&turns)).unwrap());
        assert!(!store.has_pending_push());
        assert_eq!(client.push_count(), 1);
    }

    #[test]
    fn test_clear_pushes_empty_context() {
        let client = Arc::new(RecordingClient::default());
        let mut store = store_with(client.clone());

        let turns = vec![ConversationTurn::user("float 2903334 nitrate")];
        tokio_test::block_on(store.refresh(&turns)).unwrap();
        assert_eq!(store.snapshot().recent_entity_ids, vec!["2903334"]);

        tokio_test::block_on(store.clear()).unwrap();
        assert!(store.current().is_empty());
        assert_eq!(client.push_count(), 2);
        assert!(client.last_push().unwrap().is_empty());
    }
}

//! Downstream capability provider traits.
//!
//! The router treats each provider as a black box with a simple
//! request/response surface plus a `ping` used by health probes and
//! recovery attempts. Concrete implementations live with the outer
//! system; tests use in-crate mocks.

use async_trait::async_trait;
use mnemo_core::{AgentId, EntryId, ProviderError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The three downstream providers the router coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Knowledge,
    History,
    Learning,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Knowledge => "knowledge",
            ProviderKind::History => "history",
            ProviderKind::Learning => "learning",
        }
    }

    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Knowledge,
        ProviderKind::History,
        ProviderKind::Learning,
    ];
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Knowledge storage: the authoritative store behind the read cache.
#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    /// Store content with a recognized schema.
    async fn store_structured(
        &self,
        agent_id: AgentId,
        kind: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> Result<EntryId, ProviderError>;

    /// Store free-form content.
    async fn store_unstructured(
        &self,
        agent_id: AgentId,
        kind: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> Result<EntryId, ProviderError>;

    /// Retrieve entries matching a query.
    async fn retrieve(
        &self,
        agent_id: AgentId,
        query: &str,
        kind: Option<&str>,
        filters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError>;

    /// Similarity search across all agents' entries. Results are opaque,
    /// cosine-ranked by the provider.
    async fn search_similar(
        &self,
        query: &str,
        top_k: usize,
        filters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError>;

    /// Lightweight round-trip used by health checks and recovery.
    async fn ping(&self) -> Result<(), ProviderError>;
}

/// Interaction history: write-through bookkeeping, never cached.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn log_conversation(
        &self,
        agent_id: AgentId,
        thread: &[Value],
    ) -> Result<EntryId, ProviderError>;

    async fn log_action(
        &self,
        agent_id: AgentId,
        action: &str,
        context: Option<&Value>,
        result: Option<&str>,
    ) -> Result<EntryId, ProviderError>;

    async fn get_agent_history(
        &self,
        agent_id: AgentId,
        limit: usize,
        filters: &Map<String, Value>,
    ) -> Result<Vec<Value>, ProviderError>;

    async fn ping(&self) -> Result<(), ProviderError>;
}

/// Learning analytics: outcome recording and recommendations.
#[async_trait]
pub trait LearningProvider: Send + Sync {
    async fn record_outcome(
        &self,
        agent_id: AgentId,
        task_type: &str,
        success: bool,
        details: &Value,
    ) -> Result<(), ProviderError>;

    async fn get_recommendations(
        &self,
        agent_id: AgentId,
        task_type: Option<&str>,
    ) -> Result<Vec<Value>, ProviderError>;

    async fn ping(&self) -> Result<(), ProviderError>;
}

//! Collaborator seams. The embedding model, the vector index, the lexical
//! index, the chunk store, generation backends and the analytics log are
//! all external; the engine consumes them through these traits.

use crate::types::{
    GenerationOutput, GenerationRequest, LogRecord, RetrievedChunk, StoredChunk, VectorEntry,
};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Results sorted by similarity descending; empty when nothing matches.
    async fn search(
        &self,
        embedding: &[f32],
        tenant_id: &str,
        top_k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>>;

    async fn upsert(&self, entries: &[VectorEntry]) -> anyhow::Result<()>;
}

#[async_trait]
pub trait LexicalSearch: Send + Sync {
    /// Results sorted by lexical rank descending; empty when nothing matches.
    async fn search(
        &self,
        query: &str,
        tenant_id: &str,
        top_k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>>;
}

#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Externally-produced chunks for one document, scoped to a tenant.
    async fn chunks_for_document(
        &self,
        document_id: &str,
        tenant_id: &str,
    ) -> anyhow::Result<Vec<StoredChunk>>;
}

/// One text-generation backend. Implementations are ranked into a priority
/// list at startup and tried in order by the fallback chain.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, req: &GenerationRequest) -> anyhow::Result<GenerationOutput>;
}

/// Best-effort analytics sink. A failing implementation never affects the
/// answer returned to the caller.
#[async_trait]
pub trait QueryLog: Send + Sync {
    async fn record(&self, record: LogRecord) -> anyhow::Result<()>;
}

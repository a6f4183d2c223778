//! The answering engine: question in, well-formed answer out.
//!
//! Pipeline: preprocess → cache lookup → embed → concurrent vector and
//! lexical retrieval → fusion and reranking → bounded context assembly →
//! provider fallback chain → confidence → cache write and best-effort log.
//!
//! Only a validation failure (missing tenant, empty question) surfaces as
//! an error. A degraded retrieval source becomes an empty list; both
//! sources empty yields the fixed no-evidence answer; exhausting every
//! generation provider yields the extractive fallback.

pub mod log;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, warn};

use askgrc_cache::{cache_key, ResponseCache};
use askgrc_core::config::{EngineConfig, RerankConfig, RetrievalConfig};
use askgrc_core::error::{EngineError, Result};
use askgrc_core::query::{self, ProcessedQuery};
use askgrc_core::traits::{
    ChunkStore, Embedder, GenerationProvider, LexicalSearch, QueryLog, VectorSearch,
};
use askgrc_core::types::{
    AnswerMeta, AnswerOptions, FusedResult, GeneratedAnswer, GenerationRequest, IngestOutcome,
    LogRecord, RetrievedChunk, SourceRef, VectorEntry,
};
use askgrc_generate::chain::{extractive_answer, truncate_chars, EXTRACTIVE_PROVIDER};
use askgrc_generate::{confidence, prompts, ChainOutcome, ProviderChain};

/// Answer text returned when no chunk survives retrieval and fusion.
pub const NO_EVIDENCE_TEXT: &str =
    "No relevant evidence was found in the tenant's documents for this question.";

/// Provider tag used on the no-evidence path, where nothing is invoked.
pub const NO_PROVIDER: &str = "none";

/// External collaborators the engine consumes but does not own.
pub struct Collaborators {
    pub embedder: Arc<dyn Embedder>,
    pub vector: Arc<dyn VectorSearch>,
    pub lexical: Arc<dyn LexicalSearch>,
    pub chunks: Arc<dyn ChunkStore>,
    pub query_log: Arc<dyn QueryLog>,
}

pub struct Engine {
    collab: Collaborators,
    chain: ProviderChain,
    cache: Arc<ResponseCache>,
    cfg: EngineConfig,
}

impl Engine {
    /// Providers must already be ranked in priority order; the chain tries
    /// them strictly in sequence.
    pub fn new(
        collab: Collaborators,
        providers: Vec<Arc<dyn GenerationProvider>>,
        cfg: EngineConfig,
    ) -> Self {
        let chain = ProviderChain::new(providers, Duration::from_millis(cfg.generation.timeout_ms));
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(cfg.cache.ttl_secs)));
        Self { collab, chain, cache, cfg }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Start the periodic cache sweep on the current runtime.
    pub fn start_cache_sweeper(&self) -> tokio::task::JoinHandle<()> {
        self.cache.spawn_sweeper(Duration::from_secs(self.cfg.cache.sweep_interval_secs))
    }

    /// Answer a natural-language question against the tenant's documents.
    pub async fn answer(&self, question: &str, opts: &AnswerOptions) -> Result<GeneratedAnswer> {
        if opts.tenant_id.trim().is_empty() {
            return Err(EngineError::Validation("tenant_id is required".to_string()));
        }
        let started = Instant::now();
        let query = query::prepare(question)?;

        let key = cache_key(&query.cleaned, &opts.tenant_id, opts.task_type);
        if let Some(hit) = self.cache.get(key) {
            debug!(tenant = %opts.tenant_id, task = opts.task_type.as_str(), "cache hit");
            return Ok(hit);
        }

        let retrieval = self.effective_retrieval(opts);
        let fetch_k = ((retrieval.top_k as f32) * retrieval.overfetch_factor).ceil() as usize;
        let call_timeout = Duration::from_millis(retrieval.timeout_ms);

        // An embedding failure degrades the vector source only; lexical
        // retrieval still runs.
        let embedding = self.embed_query(&query, call_timeout).await;
        let query = query.with_embedding(embedding.clone().unwrap_or_default());

        let (vector_hits, lexical_hits) = tokio::join!(
            self.vector_hits(embedding.as_deref(), &opts.tenant_id, fetch_k, call_timeout),
            self.lexical_hits(&query.cleaned, &opts.tenant_id, fetch_k, call_timeout),
        );

        let rerank = RerankConfig {
            enabled: opts.use_reranker.unwrap_or(self.cfg.rerank.enabled),
            ..self.cfg.rerank.clone()
        };
        let fused = askgrc_fusion::fuse(
            vector_hits,
            lexical_hits,
            &query.keywords,
            &retrieval,
            &rerank,
            Utc::now(),
        );

        let answer = if fused.is_empty() {
            debug!(tenant = %opts.tenant_id, "no evidence after fusion");
            no_evidence_answer(started.elapsed())
        } else {
            self.generate(&query, &fused, opts, started).await
        };

        self.cache.set(key, answer.clone());
        log::spawn_record(
            self.collab.query_log.clone(),
            LogRecord {
                question: query.original.clone(),
                answer_preview: truncate_chars(&answer.text, log::PREVIEW_LENGTH),
                confidence: answer.confidence,
                source_count: answer.sources.len(),
                provider: answer.meta.provider.clone(),
                duration_ms: answer.meta.duration_ms,
                tenant_id: opts.tenant_id.clone(),
                at: Utc::now(),
            },
        );
        Ok(answer)
    }

    /// Embed chunks of already-ingested documents and upsert them into the
    /// vector index. Per-document failures are recorded in the outcome
    /// list; the batch never aborts early.
    pub async fn ingest_for_answering(
        &self,
        document_ids: &[String],
        tenant_id: &str,
    ) -> Result<Vec<IngestOutcome>> {
        if tenant_id.trim().is_empty() {
            return Err(EngineError::Validation("tenant_id is required".to_string()));
        }
        let mut outcomes = Vec::with_capacity(document_ids.len());
        for document_id in document_ids {
            match self.ingest_document(document_id, tenant_id).await {
                Ok(chunks) => outcomes.push(IngestOutcome {
                    document_id: document_id.clone(),
                    success: true,
                    chunks,
                    error: None,
                }),
                Err(e) => {
                    warn!(document = %document_id, error = %e, "document ingest failed, continuing");
                    outcomes.push(IngestOutcome {
                        document_id: document_id.clone(),
                        success: false,
                        chunks: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        Ok(outcomes)
    }

    async fn ingest_document(&self, document_id: &str, tenant_id: &str) -> anyhow::Result<usize> {
        let chunks = self.collab.chunks.chunks_for_document(document_id, tenant_id).await?;
        if chunks.is_empty() {
            anyhow::bail!("no chunks stored for document {document_id}");
        }
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = self.collab.embedder.embed(&chunk.content).await?;
            let mut meta = chunk.meta;
            meta.insert("file_name".to_string(), chunk.file_name);
            if let Some(page) = chunk.page {
                meta.insert("page".to_string(), page.to_string());
            }
            entries.push(VectorEntry {
                id: chunk.id,
                doc_id: chunk.doc_id,
                content: chunk.content,
                embedding,
                tenant_id: tenant_id.to_string(),
                meta,
            });
        }
        self.collab.vector.upsert(&entries).await?;
        Ok(entries.len())
    }

    fn effective_retrieval(&self, opts: &AnswerOptions) -> RetrievalConfig {
        RetrievalConfig {
            top_k: opts.top_k.unwrap_or(self.cfg.retrieval.top_k),
            threshold: opts.threshold.unwrap_or(self.cfg.retrieval.threshold),
            ..self.cfg.retrieval.clone()
        }
    }

    async fn embed_query(&self, query: &ProcessedQuery, timeout: Duration) -> Option<Vec<f32>> {
        match tokio::time::timeout(timeout, self.collab.embedder.embed(&query.cleaned)).await {
            Ok(Ok(v)) => Some(v),
            Ok(Err(e)) => {
                warn!(error = %e, "embedding failed; vector retrieval degraded");
                None
            }
            Err(_) => {
                warn!("embedding timed out; vector retrieval degraded");
                None
            }
        }
    }

    async fn vector_hits(
        &self,
        embedding: Option<&[f32]>,
        tenant_id: &str,
        top_k: usize,
        timeout: Duration,
    ) -> Vec<RetrievedChunk> {
        let Some(embedding) = embedding else {
            return Vec::new();
        };
        match tokio::time::timeout(timeout, self.collab.vector.search(embedding, tenant_id, top_k))
            .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "vector search failed; degrading to empty result");
                Vec::new()
            }
            Err(_) => {
                warn!("vector search timed out; degrading to empty result");
                Vec::new()
            }
        }
    }

    async fn lexical_hits(
        &self,
        query: &str,
        tenant_id: &str,
        top_k: usize,
        timeout: Duration,
    ) -> Vec<RetrievedChunk> {
        match tokio::time::timeout(timeout, self.collab.lexical.search(query, tenant_id, top_k))
            .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "lexical search failed; degrading to empty result");
                Vec::new()
            }
            Err(_) => {
                warn!("lexical search timed out; degrading to empty result");
                Vec::new()
            }
        }
    }

    async fn generate(
        &self,
        query: &ProcessedQuery,
        fused: &[FusedResult],
        opts: &AnswerOptions,
        started: Instant,
    ) -> GeneratedAnswer {
        let context = askgrc_fusion::context::assemble(fused, self.cfg.context.max_context_length);
        let req = GenerationRequest {
            system_prompt: prompts::system_prompt(opts.task_type).to_string(),
            context,
            question: query.original.clone(),
            model: opts.model.clone(),
            max_tokens: opts.max_tokens.unwrap_or(self.cfg.generation.max_tokens),
            temperature: opts.temperature.unwrap_or(self.cfg.generation.temperature),
        };
        let sources = self.sources_from(fused);

        match self.chain.generate(&req).await {
            ChainOutcome::Generated { text, provider, tokens, errors } => GeneratedAnswer {
                confidence: confidence::score(&text, fused),
                text,
                sources,
                meta: AnswerMeta {
                    retrieved: fused.len(),
                    provider,
                    tokens,
                    duration_ms: started.elapsed().as_millis() as u64,
                    generation_errors: errors,
                },
            },
            ChainOutcome::Exhausted { errors } => {
                let text =
                    extractive_answer(&fused[0], self.cfg.generation.fallback_preview_length);
                GeneratedAnswer {
                    text,
                    confidence: confidence::EXTRACTIVE,
                    sources,
                    meta: AnswerMeta {
                        retrieved: fused.len(),
                        provider: EXTRACTIVE_PROVIDER.to_string(),
                        tokens: None,
                        duration_ms: started.elapsed().as_millis() as u64,
                        generation_errors: errors,
                    },
                }
            }
        }
    }

    fn sources_from(&self, fused: &[FusedResult]) -> Vec<SourceRef> {
        fused
            .iter()
            .map(|r| SourceRef {
                doc_id: r.chunk.doc_id.clone(),
                file_name: r.chunk.file_name.clone(),
                page: r.chunk.page,
                score: r.final_score,
                excerpt: truncate_chars(&r.chunk.content, self.cfg.context.excerpt_length),
            })
            .collect()
    }
}

fn no_evidence_answer(elapsed: Duration) -> GeneratedAnswer {
    GeneratedAnswer {
        text: NO_EVIDENCE_TEXT.to_string(),
        confidence: confidence::NO_EVIDENCE,
        sources: Vec::new(),
        meta: AnswerMeta {
            retrieved: 0,
            provider: NO_PROVIDER.to_string(),
            tokens: None,
            duration_ms: elapsed.as_millis() as u64,
            generation_errors: Vec::new(),
        },
    }
}

//! Domain types shared by the retrieval, fusion and generation stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// Indicates which retrieval collaborator produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Lexical,
}

/// A chunk returned by one retrieval collaborator.
///
/// `score` is in that collaborator's native scale; higher is always
/// better. Chunks are produced fresh per query and never mutated, only
/// enriched with normalized scores as they pass through fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub content: String,
    pub score: f32,
    pub source: SourceKind,
    pub file_name: String,
    pub page: Option<u32>,
    /// Caller-supplied creation time; absent means "not recent".
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: Meta,
}

/// A chunk after fusion, carrying per-source normalized scores.
///
/// Invariants: `vector_score` and `lexical_score` are in [0,1] (0 when the
/// chunk was absent from that source); `combined_score` is the α-weighted
/// mix of the two; `final_score` differs from `combined_score` only by
/// additive rerank boosts and is clamped to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResult {
    pub chunk: RetrievedChunk,
    pub vector_score: f32,
    pub lexical_score: f32,
    pub combined_score: f32,
    pub final_score: f32,
}

/// Task flavor selecting the system prompt. Unknown labels parse to
/// `GrcAnalysis`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    GrcAnalysis,
    AssessmentGeneration,
    RiskAnalysis,
    DocumentSummary,
    RegulatoryMapping,
}

impl TaskType {
    pub fn parse(label: &str) -> Self {
        match label {
            "assessment_generation" => Self::AssessmentGeneration,
            "risk_analysis" => Self::RiskAnalysis,
            "document_summary" => Self::DocumentSummary,
            "regulatory_mapping" => Self::RegulatoryMapping,
            _ => Self::GrcAnalysis,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GrcAnalysis => "grc_analysis",
            Self::AssessmentGeneration => "assessment_generation",
            Self::RiskAnalysis => "risk_analysis",
            Self::DocumentSummary => "document_summary",
            Self::RegulatoryMapping => "regulatory_mapping",
        }
    }
}

/// Per-call options. `None` fields fall back to the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct AnswerOptions {
    pub tenant_id: String,
    pub top_k: Option<usize>,
    pub threshold: Option<f32>,
    pub task_type: TaskType,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub use_reranker: Option<bool>,
}

impl AnswerOptions {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self { tenant_id: tenant_id.into(), ..Self::default() }
    }
}

/// One cited chunk in a returned answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    pub doc_id: String,
    pub file_name: String,
    pub page: Option<u32>,
    pub score: f32,
    pub excerpt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnswerMeta {
    /// Number of fused results that survived the threshold.
    pub retrieved: usize,
    /// Provider that produced the text, or `"extractive"` / `"none"`.
    pub provider: String,
    pub tokens: Option<u32>,
    pub duration_ms: u64,
    /// Errors from providers that were tried and failed before the final
    /// outcome was reached.
    pub generation_errors: Vec<String>,
}

/// The engine's sole output. Always well-formed: degraded paths produce a
/// fixed no-evidence answer (confidence 0) or an extractive fallback
/// (confidence 0.3), never a partial structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedAnswer {
    pub text: String,
    pub confidence: f32,
    pub sources: Vec<SourceRef>,
    pub meta: AnswerMeta,
}

/// Append-only analytics record, written best-effort after every answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub question: String,
    pub answer_preview: String,
    pub confidence: f32,
    pub source_count: usize,
    pub provider: String,
    pub duration_ms: u64,
    pub tenant_id: String,
    pub at: DateTime<Utc>,
}

/// Request handed to each generation provider in the fallback chain.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub context: String,
    pub question: String,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub text: String,
    pub tokens: Option<u32>,
}

/// Row upserted into the vector index during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: ChunkId,
    pub doc_id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub tenant_id: String,
    pub meta: Meta,
}

/// Chunk text and metadata as stored by the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub content: String,
    pub file_name: String,
    pub page: Option<u32>,
    #[serde(default)]
    pub meta: Meta,
}

/// Per-document result of a batch ingest. Failures never abort the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub document_id: String,
    pub success: bool,
    pub chunks: usize,
    pub error: Option<String>,
}

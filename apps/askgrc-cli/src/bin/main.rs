//! Offline smoke CLI: answers one question against a JSONL chunk file
//! using in-memory collaborators. With no generation providers configured
//! the engine's extractive fallback produces the answer text, which is
//! exactly what an offline run should show.

use std::env;
use std::fs;
use std::hash::Hasher;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use twox_hash::XxHash64;

use askgrc_core::config::EngineConfig;
use askgrc_core::traits::{ChunkStore, Embedder, LexicalSearch, VectorSearch};
use askgrc_core::types::{
    AnswerOptions, Meta, RetrievedChunk, SourceKind, StoredChunk, TaskType, VectorEntry,
};
use askgrc_engine::log::MemoryQueryLog;
use askgrc_engine::{Collaborators, Engine};

const EMBED_DIM: usize = 256;

#[derive(Debug, Clone, Deserialize)]
struct ChunkRecord {
    id: String,
    doc_id: String,
    tenant_id: String,
    content: String,
    file_name: String,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Deterministic bag-of-words embedding: tokens hashed into a fixed number
/// of buckets, L2 normalized. Good enough for an offline smoke run.
struct BagEmbedder;

fn bag_embed(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBED_DIM];
    for token in text.to_lowercase().split_whitespace() {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(token.as_bytes());
        v[(hasher.finish() as usize) % EMBED_DIM] += 1.0;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl Embedder for BagEmbedder {
    fn dim(&self) -> usize {
        EMBED_DIM
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(bag_embed(text))
    }
}

/// One in-memory store backing the vector index, the lexical index and the
/// chunk store for the CLI run.
struct MemoryIndex {
    rows: Mutex<Vec<(ChunkRecord, Vec<f32>)>>,
}

impl MemoryIndex {
    fn load(path: &str) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        let mut rows = Vec::new();
        for (n, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: ChunkRecord = serde_json::from_str(line)
                .with_context(|| format!("{path}:{} is not a chunk record", n + 1))?;
            let embedding = bag_embed(&record.content);
            rows.push((record, embedding));
        }
        Ok(Self { rows: Mutex::new(rows) })
    }

    fn to_chunk(record: &ChunkRecord, score: f32, source: SourceKind) -> RetrievedChunk {
        RetrievedChunk {
            id: record.id.clone(),
            doc_id: record.doc_id.clone(),
            content: record.content.clone(),
            score,
            source,
            file_name: record.file_name.clone(),
            page: record.page,
            created_at: record.created_at,
            meta: Meta::new(),
        }
    }
}

#[async_trait]
impl VectorSearch for MemoryIndex {
    async fn search(
        &self,
        embedding: &[f32],
        tenant_id: &str,
        top_k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<RetrievedChunk> = rows
            .iter()
            .filter(|(r, _)| r.tenant_id == tenant_id)
            .map(|(r, e)| MemoryIndex::to_chunk(r, cosine(embedding, e), SourceKind::Vector))
            .filter(|c| c.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn upsert(&self, entries: &[VectorEntry]) -> anyhow::Result<()> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        for entry in entries {
            rows.retain(|(r, _)| r.id != entry.id);
            rows.push((
                ChunkRecord {
                    id: entry.id.clone(),
                    doc_id: entry.doc_id.clone(),
                    tenant_id: entry.tenant_id.clone(),
                    content: entry.content.clone(),
                    file_name: entry
                        .meta
                        .get("file_name")
                        .cloned()
                        .unwrap_or_else(|| entry.doc_id.clone()),
                    page: entry.meta.get("page").and_then(|p| p.parse().ok()),
                    created_at: Some(Utc::now()),
                },
                entry.embedding.clone(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LexicalSearch for MemoryIndex {
    async fn search(
        &self,
        query: &str,
        tenant_id: &str,
        top_k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>> {
        let tokens: Vec<&str> = query.split_whitespace().filter(|t| t.len() > 2).collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<RetrievedChunk> = rows
            .iter()
            .filter(|(r, _)| r.tenant_id == tenant_id)
            .map(|(r, _)| {
                let content = r.content.to_lowercase();
                let found = tokens.iter().filter(|t| content.contains(**t)).count();
                MemoryIndex::to_chunk(r, found as f32 / tokens.len() as f32, SourceKind::Lexical)
            })
            .filter(|c| c.score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[async_trait]
impl ChunkStore for MemoryIndex {
    async fn chunks_for_document(
        &self,
        document_id: &str,
        tenant_id: &str,
    ) -> anyhow::Result<Vec<StoredChunk>> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        Ok(rows
            .iter()
            .filter(|(r, _)| r.doc_id == document_id && r.tenant_id == tenant_id)
            .map(|(r, _)| StoredChunk {
                id: r.id.clone(),
                doc_id: r.doc_id.clone(),
                content: r.content.clone(),
                file_name: r.file_name.clone(),
                page: r.page,
                meta: Meta::new(),
            })
            .collect())
    }
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {prog} ask \"<question>\" <tenant> [chunks.jsonl]");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = EngineConfig::load().map_err(|e| anyhow::anyhow!("loading config: {e}"))?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ask" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: askgrc ask \"<question>\" <tenant> [chunks.jsonl]");
                std::process::exit(1)
            });
            let tenant = args.get(1).cloned().unwrap_or_else(|| "default".to_string());
            let chunks_path =
                args.get(2).cloned().unwrap_or_else(|| "chunks.jsonl".to_string());

            let index = Arc::new(MemoryIndex::load(&chunks_path)?);
            let engine = Engine::new(
                Collaborators {
                    embedder: Arc::new(BagEmbedder),
                    vector: index.clone(),
                    lexical: index.clone(),
                    chunks: index,
                    query_log: Arc::new(MemoryQueryLog::new()),
                },
                Vec::new(), // offline: no generation providers, extractive fallback
                config,
            );

            let mut opts = AnswerOptions::for_tenant(tenant);
            opts.task_type = TaskType::GrcAnalysis;
            let answer = engine.answer(&question, &opts).await?;

            println!("{}", answer.text);
            println!();
            println!(
                "confidence: {:.2}  provider: {}  duration: {}ms",
                answer.confidence, answer.meta.provider, answer.meta.duration_ms
            );
            for s in &answer.sources {
                let page = s.page.map(|p| p.to_string()).unwrap_or_else(|| "n/a".to_string());
                println!("  [{:.3}] {} (page {page})", s.score, s.file_name);
            }
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            std::process::exit(1);
        }
    }
    Ok(())
}

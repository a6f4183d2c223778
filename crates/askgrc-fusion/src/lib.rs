//! Fusion of vector and lexical retrieval results into one ranked list.
//!
//! Stages: per-source min-max normalization, merge by chunk id with an
//! α-weighted combined score, optional heuristic reranking (keyword and
//! recency boosts), threshold filter, truncation.

pub mod context;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use askgrc_core::config::{RerankConfig, RetrievalConfig};
use askgrc_core::types::{FusedResult, RetrievedChunk};

/// Min-max normalize one source's raw scores to [0,1].
///
/// When all scores are equal (including a single-element list) every score
/// normalizes to 1.0. Empty lists pass through.
pub fn normalize(hits: Vec<RetrievedChunk>) -> Vec<(RetrievedChunk, f32)> {
    if hits.is_empty() {
        return Vec::new();
    }
    let min = hits.iter().map(|h| h.score).fold(f32::INFINITY, f32::min);
    let max = hits.iter().map(|h| h.score).fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;
    hits.into_iter()
        .map(|h| {
            let norm = if span > 0.0 { (h.score - min) / span } else { 1.0 };
            (h, norm)
        })
        .collect()
}

/// Merge two normalized lists by chunk id and combine scores.
///
/// A chunk present in only one source gets 0 for the other. The output is
/// sorted descending by combined score.
pub fn merge(
    vector_hits: Vec<(RetrievedChunk, f32)>,
    lexical_hits: Vec<(RetrievedChunk, f32)>,
    alpha: f32,
) -> Vec<FusedResult> {
    let mut by_id: HashMap<String, FusedResult> = HashMap::new();
    for (chunk, norm) in vector_hits {
        by_id
            .entry(chunk.id.clone())
            .and_modify(|r| r.vector_score = r.vector_score.max(norm))
            .or_insert(FusedResult {
                chunk,
                vector_score: norm,
                lexical_score: 0.0,
                combined_score: 0.0,
                final_score: 0.0,
            });
    }
    for (chunk, norm) in lexical_hits {
        by_id
            .entry(chunk.id.clone())
            .and_modify(|r| r.lexical_score = r.lexical_score.max(norm))
            .or_insert(FusedResult {
                chunk,
                vector_score: 0.0,
                lexical_score: norm,
                combined_score: 0.0,
                final_score: 0.0,
            });
    }
    let mut merged: Vec<FusedResult> = by_id.into_values().collect();
    for r in &mut merged {
        r.combined_score = r.vector_score * alpha + r.lexical_score * (1.0 - alpha);
        r.final_score = r.combined_score;
    }
    sort_by_final(&mut merged);
    merged
}

/// Apply additive, capped boosts and re-sort.
///
/// Keyword boost: up to `keyword_boost_max`, proportional to the fraction
/// of query keywords found in the chunk's file name or text. Recency
/// boost: flat `recency_boost` when the chunk was created within the
/// window; a missing timestamp never boosts. The result is clamped to 1.0.
pub fn rerank(results: &mut [FusedResult], keywords: &[String], cfg: &RerankConfig, now: DateTime<Utc>) {
    for r in results.iter_mut() {
        let mut score = r.combined_score;
        if !keywords.is_empty() {
            let haystack =
                format!("{} {}", r.chunk.file_name.to_lowercase(), r.chunk.content.to_lowercase());
            let found = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
            score += cfg.keyword_boost_max * (found as f32 / keywords.len() as f32);
        }
        if let Some(created) = r.chunk.created_at {
            if now.signed_duration_since(created) <= Duration::days(cfg.recency_window_days) {
                score += cfg.recency_boost;
            }
        }
        r.final_score = score.min(1.0);
    }
    sort_by_final(results);
}

/// Full pipeline: normalize each source, merge, optionally rerank, filter
/// by threshold, truncate to top_k.
///
/// Both sources empty yields an empty list, which is the engine's trigger
/// for the no-evidence answer.
pub fn fuse(
    vector_hits: Vec<RetrievedChunk>,
    lexical_hits: Vec<RetrievedChunk>,
    keywords: &[String],
    retrieval: &RetrievalConfig,
    rerank_cfg: &RerankConfig,
    now: DateTime<Utc>,
) -> Vec<FusedResult> {
    let mut merged = merge(normalize(vector_hits), normalize(lexical_hits), retrieval.alpha);
    if rerank_cfg.enabled {
        rerank(&mut merged, keywords, rerank_cfg, now);
    }
    merged.retain(|r| r.final_score >= retrieval.threshold);
    merged.truncate(retrieval.top_k);
    merged
}

fn sort_by_final(results: &mut [FusedResult]) {
    results.sort_by(|a, b| {
        b.final_score.partial_cmp(&a.final_score).unwrap_or(std::cmp::Ordering::Equal)
    });
}

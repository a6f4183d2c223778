//! Heuristic answer confidence. Not a calibrated probability.

use askgrc_core::types::FusedResult;

/// Confidence of the no-evidence answer. Set exactly, bypassing the scorer.
pub const NO_EVIDENCE: f32 = 0.0;

/// Confidence of the extractive fallback answer, bypassing the scorer.
pub const EXTRACTIVE: f32 = 0.3;

const DOMAIN_TERMS: &[&str] = &[
    "compliance", "control", "risk", "audit", "policy", "regulation", "framework", "assessment",
    "evidence", "governance", "requirement", "standard", "remediation", "mitigation",
];

/// Combine retrieval quality, answer length and domain-term density.
///
/// base 0.5 + mean(final scores) × 0.3 + min(0.2, len/1000)
/// + (domain-term hits / term list size) × 0.1, clamped to [0.1, 1.0].
pub fn score(answer: &str, fused: &[FusedResult]) -> f32 {
    let mut confidence = 0.5;

    if !fused.is_empty() {
        let mean: f32 = fused.iter().map(|r| r.final_score).sum::<f32>() / fused.len() as f32;
        confidence += mean * 0.3;
    }

    confidence += (answer.len() as f32 / 1000.0).min(0.2);

    let lowered = answer.to_lowercase();
    let hits = DOMAIN_TERMS.iter().filter(|t| lowered.contains(**t)).count();
    confidence += (hits as f32 / DOMAIN_TERMS.len() as f32) * 0.1;

    confidence.clamp(0.1, 1.0)
}

//! Bounded context assembly for the generation prompt.

use askgrc_core::types::FusedResult;

/// Greedily pack fused results (already in final-score order) into one
/// context string under a character budget.
///
/// Chunks are admitted whole or not at all; packing stops at the first
/// chunk that would exceed the budget. The first chunk is always admitted
/// even when it alone exceeds the budget, so an oversized top hit still
/// produces a usable context.
pub fn assemble(results: &[FusedResult], max_context_length: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for r in results {
        let entry = format_entry(r);
        // The budget counts characters, not bytes, so multibyte text
        // fills the context the same as ASCII.
        let entry_chars = entry.chars().count();
        if !out.is_empty() && used + entry_chars > max_context_length {
            break;
        }
        used += entry_chars;
        out.push_str(&entry);
    }
    out
}

fn format_entry(r: &FusedResult) -> String {
    let page = r
        .chunk
        .page
        .map(|p| format!("page {p}"))
        .unwrap_or_else(|| "page n/a".to_string());
    format!("[source: {}, {}]\n{}\n\n", r.chunk.file_name, page, r.chunk.content)
}

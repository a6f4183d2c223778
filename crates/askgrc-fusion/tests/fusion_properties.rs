use askgrc_core::config::{RerankConfig, RetrievalConfig};
use askgrc_core::types::{RetrievedChunk, SourceKind};
use askgrc_fusion::{fuse, merge, normalize};
use chrono::Utc;
use proptest::prelude::*;

fn chunk(id: usize, score: f32, source: SourceKind) -> RetrievedChunk {
    RetrievedChunk {
        id: format!("c{id}"),
        doc_id: format!("d{id}"),
        content: format!("text {id}"),
        score,
        source,
        file_name: format!("f{id}.pdf"),
        page: None,
        created_at: None,
        meta: Default::default(),
    }
}

proptest! {
    #[test]
    fn normalized_scores_stay_in_unit_interval(scores in prop::collection::vec(0.0f32..100.0, 1..50)) {
        let hits: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| chunk(i, *s, SourceKind::Vector))
            .collect();
        let out = normalize(hits);
        for (_, norm) in &out {
            prop_assert!((0.0..=1.0).contains(norm));
        }
        // The maximum raw score always normalizes to 1.0.
        let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let max_idx = scores.iter().position(|s| *s == max).unwrap();
        let max_norm = out.iter().find(|(c, _)| c.id == format!("c{max_idx}")).unwrap().1;
        prop_assert_eq!(max_norm, 1.0);
    }

    #[test]
    fn combined_score_stays_in_unit_interval(
        alpha in 0.0f32..=1.0,
        v in 0.0f32..=1.0,
        l in 0.0f32..=1.0,
    ) {
        let merged = merge(
            vec![(chunk(0, 0.0, SourceKind::Vector), v)],
            vec![(chunk(0, 0.0, SourceKind::Lexical), l)],
            alpha,
        );
        prop_assert_eq!(merged.len(), 1);
        prop_assert!((0.0..=1.0).contains(&merged[0].combined_score));
    }

    #[test]
    fn threshold_excludes_every_sub_threshold_result(
        threshold in 0.0f32..=1.0,
        scores in prop::collection::vec(0.0f32..10.0, 0..30),
    ) {
        let retrieval = RetrievalConfig { threshold, ..Default::default() };
        let rerank = RerankConfig { enabled: false, ..Default::default() };
        let hits: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| chunk(i, *s, SourceKind::Vector))
            .collect();
        let fused = fuse(hits, Vec::new(), &[], &retrieval, &rerank, Utc::now());
        for r in &fused {
            prop_assert!(r.final_score >= threshold);
        }
    }

    #[test]
    fn fuse_never_returns_more_than_top_k(
        top_k in 1usize..20,
        n in 0usize..60,
    ) {
        let retrieval = RetrievalConfig { top_k, threshold: 0.0, ..Default::default() };
        let rerank = RerankConfig::default();
        let hits: Vec<_> = (0..n).map(|i| chunk(i, i as f32, SourceKind::Vector)).collect();
        let fused = fuse(hits, Vec::new(), &[], &retrieval, &rerank, Utc::now());
        prop_assert!(fused.len() <= top_k);
    }

    #[test]
    fn rerank_boosts_are_additive_and_capped(
        combined in 0.0f32..=1.0,
        window_days in 1i64..365,
    ) {
        let rerank_cfg = RerankConfig { recency_window_days: window_days, ..Default::default() };
        let now = Utc::now();
        let mut c = chunk(0, 0.0, SourceKind::Vector);
        c.created_at = Some(now); // always inside the window
        let mut results = merge(vec![(c, combined)], vec![], 1.0);
        askgrc_fusion::rerank(&mut results, &["text".to_string()], &rerank_cfg, now);
        let r = &results[0];
        prop_assert!(r.final_score >= r.combined_score - 1e-6);
        prop_assert!(r.final_score <= 1.0);
        prop_assert!(r.final_score <= r.combined_score
            + rerank_cfg.keyword_boost_max
            + rerank_cfg.recency_boost
            + 1e-6);
    }
}

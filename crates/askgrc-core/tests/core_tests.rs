use std::fs;
use tempfile::TempDir;

use askgrc_core::config::EngineConfig;
use askgrc_core::query::{prepare, QueryIntent};
use askgrc_core::types::TaskType;

#[test]
fn prepare_full_question() {
    let q = prepare("What is required for access control?").expect("prepare");
    assert_eq!(q.cleaned, "what is required for access control");
    assert!(q.keywords.contains(&"access".to_string()));
    assert!(q.keywords.contains(&"control".to_string()));
    // "what is" matches the definition group before the compliance group.
    assert_eq!(q.intent, QueryIntent::Definition);
    assert!(q.embedding.is_empty(), "embedding attached later by the engine");
}

#[test]
fn with_embedding_attaches_vector() {
    let q = prepare("encryption at rest").expect("prepare").with_embedding(vec![0.1, 0.2]);
    assert_eq!(q.embedding.len(), 2);
}

#[test]
fn unknown_task_type_falls_back_to_default() {
    assert_eq!(TaskType::parse("grc_analysis"), TaskType::GrcAnalysis);
    assert_eq!(TaskType::parse("risk_analysis"), TaskType::RiskAnalysis);
    assert_eq!(TaskType::parse("no_such_task"), TaskType::GrcAnalysis);
    assert_eq!(TaskType::parse(""), TaskType::GrcAnalysis);
}

#[test]
fn load_from_missing_files_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let cfg = EngineConfig::load_from(tmp.path()).expect("load");
    assert_eq!(cfg.retrieval.top_k, 10);
    assert!((cfg.retrieval.alpha - 0.7).abs() < f32::EPSILON);
}

#[test]
fn load_from_config_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[engine.retrieval]\ntop_k = 3\nalpha = 0.4\n\n[engine.cache]\nttl_secs = 60\n",
    )
    .unwrap();

    let cfg = EngineConfig::load_from(tmp.path()).expect("load");
    assert_eq!(cfg.retrieval.top_k, 3);
    assert!((cfg.retrieval.alpha - 0.4).abs() < f32::EPSILON);
    assert_eq!(cfg.cache.ttl_secs, 60);
    // Untouched fields keep their defaults.
    assert!((cfg.retrieval.threshold - 0.5).abs() < f32::EPSILON);
    assert_eq!(cfg.context.max_context_length, 8_000);
}

#[test]
fn load_from_rejects_out_of_range_file_values() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[engine.retrieval]\nalpha = 1.5\n").unwrap();
    assert!(EngineConfig::load_from(tmp.path()).is_err());
}

#[test]
fn task_type_round_trips_through_labels() {
    for t in [
        TaskType::GrcAnalysis,
        TaskType::AssessmentGeneration,
        TaskType::RiskAnalysis,
        TaskType::DocumentSummary,
        TaskType::RegulatoryMapping,
    ] {
        assert_eq!(TaskType::parse(t.as_str()), t);
    }
}

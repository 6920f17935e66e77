use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use company_avail::check::REGISTRY_INCOMPLETE;
use company_avail::registry::{MatchKind, RetryPolicy};
use company_avail::{
    BatchError, CheckError, Engine, EngineConfig, InMemoryRegistry, NameError, Recommendation,
    Registry, RegistryError, RegistryRecord,
};

/// Answers from a fixed list, sleeping on any name containing "slow".
struct StubRegistry {
    records: InMemoryRegistry,
    delay: Duration,
}

impl Registry for StubRegistry {
    fn lookup(&self, normalized: &str) -> Result<Vec<RegistryRecord>, RegistryError> {
        if normalized.contains("slow") {
            thread::sleep(self.delay);
        }
        self.records.lookup(normalized)
    }

    fn health(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}

fn records() -> InMemoryRegistry {
    InMemoryRegistry::new(vec![
        RegistryRecord::new("Acme Tech Private Limited", "U72200DL2015PTC000001"),
        RegistryRecord::new("Zenith Foods Ltd", "U15400MH2010PLC000002"),
    ])
}

fn engine() -> Engine {
    Engine::with_registry(records())
}

fn stub_engine(delay: Duration, config: EngineConfig) -> Engine {
    Engine::new(
        Arc::new(StubRegistry {
            records: records(),
            delay,
        }),
        config,
    )
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        lookup_timeout_ms: 100,
        retry: RetryPolicy::none(),
        ..EngineConfig::default()
    }
}

#[test]
fn public_api_leading_digit_is_non_compliant() {
    let result = engine().check_one("1 A Pvt Ltd").unwrap();
    assert_eq!(result.recommendation, Recommendation::NonCompliant);
    assert!(!result.is_available);
    assert!(result.validation.score < 60);
    assert!(
        result
            .validation
            .errors
            .contains(&"Company name cannot start with a number".to_string())
    );
}

#[test]
fn public_api_clean_name_scores_full_marks() {
    let result = engine().check_one("XYZ Solutions Private Limited").unwrap();
    assert_eq!(result.recommendation, Recommendation::AvailableAndCompliant);
    assert!(result.is_available);
    assert_eq!(result.validation.score, 100);
}

#[test]
fn public_api_prohibited_terms_block_filing() {
    let result = engine().check_one("National Bank Services Ltd").unwrap();
    assert_eq!(result.recommendation, Recommendation::NonCompliant);
    assert!(!result.is_available);
    assert_eq!(result.validation.errors.len(), 2);
    assert_eq!(result.validation.score, 40);
}

#[test]
fn public_api_exact_registration_is_unavailable() {
    let result = engine().check_one("acme tech pvt. ltd.").unwrap();
    assert_eq!(result.recommendation, Recommendation::Unavailable);
    assert_eq!(result.existing_companies[0].kind, MatchKind::Exact);
    assert_eq!(result.existing_companies[0].identifier, "U72200DL2015PTC000001");
}

#[test]
fn public_api_empty_name_returns_error() {
    assert!(matches!(
        engine().check_one("Pvt Ltd"),
        Err(CheckError::Name(NameError::EmptyName { .. }))
    ));
}

#[test]
fn batch_keeps_order_when_one_lookup_times_out() {
    let engine = stub_engine(Duration::from_secs(2), fast_config());
    let names = [
        "Alpha Systems Pvt Ltd",
        "Beta Labs Pvt Ltd",
        "Slow Ventures Pvt Ltd",
        "Delta Works Pvt Ltd",
        "Gamma Labs Pvt Ltd",
    ];

    let started = Instant::now();
    let batch = engine.check_batch(&names).unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(batch.total_processed, 5);
    let returned: Vec<&str> = batch.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(returned, names);

    let slow = &batch.results[2];
    assert_eq!(slow.recommendation, Recommendation::Unknown);
    assert!(!slow.is_available);
    assert!(slow.degraded.as_deref().unwrap().contains("timed out"));
    assert!(slow.validation.errors.is_empty());
    assert_eq!(slow.validation.warnings.len(), 1);
    assert!(slow.validation.warnings[0].starts_with(REGISTRY_INCOMPLETE));
    assert_eq!(slow.validation.score, 90);

    for (i, result) in batch.results.iter().enumerate() {
        if i != 2 {
            assert_eq!(result.recommendation, Recommendation::AvailableAndCompliant, "{}", result.name);
        }
    }
    assert_eq!(batch.summary.available, 4);
    assert_eq!(batch.summary.degraded, 1);
}

#[test]
fn batch_folds_bad_names_into_results() {
    let batch = engine()
        .check_batch(&["Ab", "XYZ Solutions Private Limited"])
        .unwrap();
    assert_eq!(batch.results[0].recommendation, Recommendation::NonCompliant);
    assert_eq!(batch.results[0].normalized_name, None);
    assert_eq!(
        batch.results[1].recommendation,
        Recommendation::AvailableAndCompliant
    );
}

#[test]
fn batch_size_is_bounded() {
    let engine = engine();
    let empty: [&str; 0] = [];
    assert!(matches!(
        engine.check_batch(&empty),
        Err(CheckError::Batch(BatchError::InvalidBatchSize { size: 0, max: 20 }))
    ));

    let names: Vec<String> = (0..21).map(|i| format!("Company {i} Pvt Ltd")).collect();
    assert!(matches!(
        engine.check_batch(&names),
        Err(CheckError::Batch(BatchError::InvalidBatchSize { size: 21, max: 20 }))
    ));
    assert_eq!(engine.check_batch(&names[..20]).unwrap().total_processed, 20);
}

#[test]
fn batch_deadline_degrades_remaining_lookups() {
    let config = EngineConfig {
        workers: 1,
        lookup_timeout_ms: 1_000,
        batch_deadline_ms: Some(50),
        retry: RetryPolicy::none(),
        ..EngineConfig::default()
    };
    let engine = stub_engine(Duration::from_millis(300), config);

    let started = Instant::now();
    let batch = engine
        .check_batch(&["Slow One Pvt Ltd", "Slow Two Pvt Ltd", "Slow Three Pvt Ltd"])
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(
        batch
            .results
            .iter()
            .all(|r| r.recommendation == Recommendation::Unknown && !r.is_available)
    );
    assert_eq!(batch.summary.degraded, 3);
}

#[test]
fn alternatives_are_checked_after_the_base_name() {
    let batch = engine().check_with_alternatives("Acme Tech Pvt Ltd", 3).unwrap();
    assert_eq!(batch.total_processed, 4);
    assert_eq!(batch.results[0].name, "Acme Tech Pvt Ltd");
    assert_eq!(batch.results[0].recommendation, Recommendation::Unavailable);
    assert_eq!(batch.results[1].name, "Acme Solutions Private Limited");
    assert!(batch.results[1..].iter().all(|r| r.is_available));
}

#[test]
fn alternatives_are_trimmed_to_fit_one_batch() {
    let batch = engine().check_with_alternatives("Orbit", 20).unwrap();
    assert_eq!(batch.total_processed, 20);
    assert_eq!(batch.results[0].name, "Orbit");
}

#[test]
fn hyphenated_prohibited_term_is_non_compliant() {
    let result = engine().check_one("Bank-Corp Private Limited").unwrap();
    assert_eq!(result.recommendation, Recommendation::NonCompliant);
    assert!(!result.is_available);
}

#[test]
fn alternatives_reject_bad_counts() {
    assert!(matches!(
        engine().check_with_alternatives("Acme", 0),
        Err(CheckError::Name(NameError::InvalidSuggestionCount { .. }))
    ));
}

#[test]
fn suggestions_use_configured_suffix() {
    let config = EngineConfig {
        legal_suffix: "LLP".into(),
        ..EngineConfig::default()
    };
    let engine = Engine::new(Arc::new(records()), config);
    let set = engine.suggest("Orbit", 2).unwrap();
    assert_eq!(set.suggestions, ["Orbit Solutions LLP", "Orbit Systems LLP"]);
}

#[test]
fn health_is_reported() {
    let report = engine().health();
    assert!(report.reachable);
    assert!(report.message.is_none());
}
